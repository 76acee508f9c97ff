//! Error types for the query language.

use thiserror::Error;

/// Errors raised while parsing or running a query expression.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at position {0}")]
    UnterminatedString(usize),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected {found} at position {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        pos: usize,
    },

    #[error("unexpected end of query, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("a projection step must be the last step of a query")]
    ProjectionNotLast,

    #[error("query argument ${0} was not supplied")]
    MissingArgument(usize),

    #[error("query produced values where records were expected")]
    ExpectedRecords,

    #[error("query produced records where values were expected")]
    ExpectedValues,
}
