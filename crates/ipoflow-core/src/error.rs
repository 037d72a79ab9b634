use thiserror::Error;

/// Validation and contract errors exposed by `ipoflow-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error(
        "invalid sector override '{value}', expected one of auto, healthcare-biotech, \
         technology-growth, other"
    )]
    InvalidSectorOverride { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("price series must contain at least one point")]
    EmptyPriceSeries,
    #[error("price series dates must be strictly increasing (index {index})")]
    NonIncreasingDates { index: usize },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("trace_id must be 32 hex characters")]
    InvalidTraceId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source_chain must contain at least one source")]
    EmptySourceChain,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}
