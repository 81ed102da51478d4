use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use quiz_core::model::{PracticeMode, QuestionFilter, QuestionKind, SessionSource};
use storage::http::{DEFAULT_BASE_URL, HttpInitError, HttpStoreConfig, parse_timeout};

const DEFAULT_HEARTBEAT_SECS: u64 = 5;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingCommand,
    UnknownArg(String),
    Store(HttpInitError),
    InvalidApi { raw: String },
    InvalidTimeout { raw: String },
    InvalidLimit { raw: String },
    InvalidHeartbeat { raw: String },
    InvalidType { raw: String },
    InvalidMode { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingCommand => write!(f, "no command given"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::Store(e) => write!(f, "invalid store configuration: {e}"),
            ArgsError::InvalidApi { raw } => write!(f, "invalid --api value: {raw}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidHeartbeat { raw } => {
                write!(f, "invalid QUIZ_HEARTBEAT_SECS value: {raw}")
            }
            ArgsError::InvalidType { raw } => write!(f, "invalid --type value: {raw}"),
            ArgsError::InvalidMode { raw } => write!(f, "invalid --mode value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filters,
    Stats,
    Import { path: PathBuf },
    Practice { source: SessionSource },
    Help,
}

/// Settings taken from the environment before flags are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDefaults {
    pub store: HttpStoreConfig,
    pub limit: Option<String>,
    pub heartbeat: Option<String>,
}

impl EnvDefaults {
    /// Store settings come from `HttpStoreConfig::from_env`; the rest from `QUIZ_*` variables.
    pub fn from_env() -> Result<Self, ArgsError> {
        Ok(Self {
            store: HttpStoreConfig::from_env().map_err(ArgsError::Store)?,
            limit: std::env::var("QUIZ_BATCH_LIMIT").ok(),
            heartbeat: std::env::var("QUIZ_HEARTBEAT_SECS").ok(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub store: HttpStoreConfig,
    pub limit: Option<usize>,
    pub heartbeat: Duration,
    pub command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_limit(raw: &str) -> Result<usize, ArgsError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ArgsError::InvalidLimit { raw: raw.to_string() })
}

impl Args {
    pub fn parse() -> Result<Self, ArgsError> {
        Self::parse_from(EnvDefaults::from_env()?, std::env::args().skip(1))
    }

    pub fn parse_from(
        env: EnvDefaults,
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut store = env.store;
        let mut limit = env.limit.as_deref().map(parse_limit).transpose()?;
        let heartbeat = match env.heartbeat {
            Some(raw) => parse_timeout(&raw).map_err(|_| ArgsError::InvalidHeartbeat { raw })?,
            None => Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
        };

        let mut command: Option<String> = None;
        let mut import_path: Option<PathBuf> = None;
        let mut filter = QuestionFilter::default();
        let mut wrong_book = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => {
                    let value = require_value(&mut args, "--api")?;
                    store = store
                        .with_base_url(&value)
                        .map_err(|_| ArgsError::InvalidApi { raw: value.clone() })?;
                }
                "--timeout" => {
                    let value = require_value(&mut args, "--timeout")?;
                    let timeout = parse_timeout(&value)
                        .map_err(|_| ArgsError::InvalidTimeout { raw: value.clone() })?;
                    store = store.with_timeout(timeout);
                }
                "--limit" => {
                    let value = require_value(&mut args, "--limit")?;
                    limit = Some(parse_limit(&value)?);
                }
                "--category" => {
                    filter.category = Some(require_value(&mut args, "--category")?);
                }
                "--type" => {
                    let value = require_value(&mut args, "--type")?;
                    let kind = value
                        .parse::<QuestionKind>()
                        .map_err(|_| ArgsError::InvalidType { raw: value.clone() })?;
                    filter.kind = Some(kind);
                }
                "--mode" => {
                    let value = require_value(&mut args, "--mode")?;
                    filter.mode = value
                        .parse::<PracticeMode>()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--wrong" => wrong_book = true,
                "--help" | "-h" => command = Some("help".into()),
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ if command.is_none() => command = Some(arg),
                _ if command.as_deref() == Some("import") && import_path.is_none() => {
                    import_path = Some(PathBuf::from(arg));
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match command.as_deref() {
            Some("filters") => Command::Filters,
            Some("stats") => Command::Stats,
            Some("import") => Command::Import {
                path: import_path.ok_or(ArgsError::MissingValue { flag: "import" })?,
            },
            Some("practice") => Command::Practice {
                source: if wrong_book {
                    SessionSource::wrong_book()
                } else {
                    SessionSource::Questions(filter)
                },
            },
            Some("help") => Command::Help,
            Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
            None => return Err(ArgsError::MissingCommand),
        };

        Ok(Self {
            store,
            limit,
            heartbeat,
            command,
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [options] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  filters                   List categories and question types");
    eprintln!("  stats                     Show answer statistics");
    eprintln!("  import <file.json>        Import questions from a JSON file");
    eprintln!("  practice                  Start a practice session");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --api <url>               Question store URL (default: {DEFAULT_BASE_URL})");
    eprintln!("  --timeout <secs>          Request timeout (default: 10)");
    eprintln!("  --category <name>         Practice one category");
    eprintln!("  --type <type>             choice | true_false | fill | short_answer");
    eprintln!("  --mode <mode>             all | undone | done | recommend (default: all)");
    eprintln!("  --wrong                   Practice the wrong book");
    eprintln!("  --limit <n>               Serve at most n questions");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_URL, QUIZ_TIMEOUT_SECS, QUIZ_BATCH_LIMIT, QUIZ_HEARTBEAT_SECS, RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> EnvDefaults {
        EnvDefaults {
            store: HttpStoreConfig::new(DEFAULT_BASE_URL).unwrap(),
            limit: None,
            heartbeat: None,
        }
    }

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse_from(defaults(), args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn practice_flags_build_a_filter() {
        let args = parse(&[
            "practice",
            "--category",
            "Joins",
            "--type",
            "fill",
            "--mode",
            "undone",
            "--limit",
            "5",
        ])
        .unwrap();
        let expected = QuestionFilter::default()
            .with_category("Joins")
            .with_kind(QuestionKind::Fill)
            .with_mode(PracticeMode::Undone);
        assert_eq!(
            args.command,
            Command::Practice {
                source: SessionSource::Questions(expected)
            }
        );
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.store.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn wrong_flag_selects_wrong_book() {
        let args = parse(&["--wrong", "practice"]).unwrap();
        assert_eq!(
            args.command,
            Command::Practice {
                source: SessionSource::wrong_book()
            }
        );
    }

    #[test]
    fn flags_override_environment() {
        let env = EnvDefaults {
            store: HttpStoreConfig::new("http://store:9000/api/")
                .unwrap()
                .with_timeout(Duration::from_secs(30)),
            limit: Some("20".into()),
            heartbeat: Some("2".into()),
        };
        let args = Args::parse_from(
            env.clone(),
            ["--timeout", "3", "stats"].iter().map(|s| (*s).to_string()),
        )
        .unwrap();
        assert_eq!(args.store.base_url().as_str(), "http://store:9000/api/");
        assert_eq!(args.store.timeout(), Duration::from_secs(3));
        assert_eq!(args.limit, Some(20));
        assert_eq!(args.heartbeat, Duration::from_secs(2));
        assert_eq!(args.command, Command::Stats);

        let args = Args::parse_from(
            env,
            ["--api", "https://quiz.example.com/api", "stats"]
                .iter()
                .map(|s| (*s).to_string()),
        )
        .unwrap();
        assert_eq!(args.store.base_url().as_str(), "https://quiz.example.com/api/");
        assert_eq!(args.store.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn import_needs_a_path() {
        assert!(matches!(
            parse(&["import"]),
            Err(ArgsError::MissingValue { flag: "import" })
        ));
        let args = parse(&["import", "bank.json"]).unwrap();
        assert_eq!(
            args.command,
            Command::Import {
                path: PathBuf::from("bank.json")
            }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&[]), Err(ArgsError::MissingCommand)));
        assert!(matches!(
            parse(&["practice", "--type", "essay"]),
            Err(ArgsError::InvalidType { .. })
        ));
        assert!(matches!(
            parse(&["practice", "--limit", "0"]),
            Err(ArgsError::InvalidLimit { .. })
        ));
        assert!(matches!(
            parse(&["--api", "ftp://store/", "stats"]),
            Err(ArgsError::InvalidApi { .. })
        ));
        assert!(matches!(
            parse(&["stats", "--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
