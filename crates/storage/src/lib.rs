#![forbid(unsafe_code)]

pub mod http;
pub mod repository;

pub use http::{HttpRepository, HttpStoreConfig};
pub use repository::{
    InMemoryRepository, ProgressRepository, QuestionRecord, QuestionRepository, Storage,
    StorageError,
};
