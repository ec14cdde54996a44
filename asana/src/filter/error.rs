use thiserror::Error;

/// Reasons a filter expression is rejected at compile time
///
/// Positions are byte offsets into the expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("filter expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("invalid number '{text}' at position {pos}")]
    InvalidNumber { text: String, pos: usize },

    #[error("unexpected {found} at position {pos}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        pos: usize,
    },

    #[error("unexpected end of expression, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("unknown name '{name}' at position {pos}, paths must start with 'event'")]
    UnknownName { name: String, pos: usize },

    #[error("expression nested deeper than {max} levels at position {pos}")]
    TooDeep { max: usize, pos: usize },

    #[error("filter must be a boolean expression, found {found}")]
    NotBoolean { found: String },
}

pub type FilterResult<T> = Result<T, FilterError>;
