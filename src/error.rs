use thiserror::Error;

use crate::backend::BackendError;
use crate::naming::Role;

#[derive(Error, Debug)]
pub enum AlreadyError {
    #[error("Syntax error at {line}:{col}: {message}")]
    Syntax { message: String, line: usize, col: usize },
    #[error("Naming convention violated: `{name}` is not a valid {role} name")]
    NamingConvention { name: String, role: Role },
    #[error("Reserved word `{name}` cannot be used as a name")]
    ReservedWord { name: String },
    #[error("Unbound name: {0} is not defined")]
    UnboundName(String),
    #[error("Immutable name: {0} could not be redefined")]
    ImmutableRebind(String),
    #[error("Unbound operator: {0}")]
    UnboundOperator(String),
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, AlreadyError>;

// Helper conversions
impl From<config::ConfigError> for AlreadyError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<std::io::Error> for AlreadyError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<pest::error::Error<crate::parser::Rule>> for AlreadyError {
    fn from(e: pest::error::Error<crate::parser::Rule>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        Self::Syntax { message: e.variant.message().into_owned(), line, col }
    }
}
