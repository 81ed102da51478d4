use rand::seq::SliceRandom;
use rand::{Rng, rng};

use quiz_core::model::{Question, SessionSource};

/// Turns a fetched batch into the order a session serves it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlanner {
    shuffle: bool,
    limit: Option<usize>,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            shuffle: true,
            limit: None,
        }
    }
}

impl BatchPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the uniform shuffle applied to non-recommended batches.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Cap the number of questions served; applied after shuffling.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn plan(&self, source: &SessionSource, questions: Vec<Question>) -> Vec<Question> {
        self.plan_with_rng(source, questions, &mut rng())
    }

    /// Recommended batches keep the store's order; everything else is shuffled
    /// when shuffling is enabled.
    pub fn plan_with_rng<R: Rng + ?Sized>(
        &self,
        source: &SessionSource,
        mut questions: Vec<Question>,
        rng: &mut R,
    ) -> Vec<Question> {
        if self.shuffle && !source.is_store_ordered() {
            questions.as_mut_slice().shuffle(rng);
        }
        if let Some(limit) = self.limit {
            questions.truncate(limit);
        }
        questions
    }
}
