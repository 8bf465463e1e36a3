//! Settings read from `already.toml` (optional) and `ALREADY_*` variables.

use serde::Deserialize;

use crate::error::Result;
use crate::naming::{DEFAULT_RESERVED_WORDS, Vocabulary};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Words that may not be used as names.
    pub reserved_words: Vec<String>,
    /// Dictionary name of the backend's top concept.
    pub top_concept: String,
    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reserved_words: DEFAULT_RESERVED_WORDS.iter().map(|w| w.to_string()).collect(),
            top_concept: "Thing".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Loads `path` (or `already.*` in the working directory when `None`),
    /// then applies environment overrides such as
    /// `ALREADY_RESERVED_WORDS=some,only,not`.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.unwrap_or("already")).required(path.is_some()))
            .add_source(
                config::Environment::with_prefix("ALREADY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reserved_words"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::new(self.reserved_words.iter().cloned())
    }
}
