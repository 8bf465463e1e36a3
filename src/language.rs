//! A language bundles the grammar with a reserved-word vocabulary.
//!
//! ```text
//!             parse(text)          eval(action)             create / query
//! --> [Language]  ----->  [Action]   ----->   [Calculator]  <----->  [Backend]
//! ```

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::action::{Action, Evaluate};
use crate::backend::Backend;
use crate::calculator::{Calculator, Value};
use crate::config::Settings;
use crate::error::Result;
use crate::naming::Vocabulary;
use crate::parser;

#[derive(Debug, Clone, Default)]
pub struct Language {
    vocabulary: Vocabulary,
}

impl Language {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.vocabulary())
    }
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
    pub fn matches(&self, text: &str) -> bool {
        parser::matches(text)
    }
    pub fn parse(&self, text: &str) -> Result<Action> {
        parser::parse_with(text, &self.vocabulary)
    }
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Action> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading program");
        let text = fs::read_to_string(path)?;
        self.parse(&text)
    }
    /// Parses and evaluates `text`, returning the value of its last statement.
    pub fn run(&self, text: &str, calculator: &mut Calculator, backend: &mut dyn Backend) -> Result<Value> {
        self.parse(text)?.eval(calculator, backend)
    }
}
