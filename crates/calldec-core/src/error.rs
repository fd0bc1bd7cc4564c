//! Error types for the calldec decode pipeline.

use thiserror::Error;

/// Errors that can occur while building a selector index or decoding calldata.
///
/// ABI-level errors (`InvalidAbi`, `DuplicateSelector`) surface when the index
/// is built. Everything else is local to a single decode call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid ABI entry '{entry}': {reason}")]
    InvalidAbi { entry: String, reason: String },

    #[error("Selector {selector} is shared by '{first}' and '{second}'")]
    DuplicateSelector {
        selector: String,
        first: String,
        second: String,
    },

    #[error("Malformed calldata hex: {reason}")]
    MalformedHex { reason: String },

    #[error("Word {offset} is out of bounds ({words} words available)")]
    OutOfBounds { offset: usize, words: usize },

    #[error("Truncated input: {reason}")]
    TruncatedInput { reason: String },

    #[error("Unsupported type: {ty}")]
    UnsupportedType { ty: String },

    #[error("Nesting deeper than {max_depth} levels")]
    NestingTooDeep { max_depth: usize },

    #[error("Invalid offset {offset}: {reason}")]
    InvalidOffset { offset: String, reason: String },

    #[error("Invalid UTF-8 in string value: {reason}")]
    InvalidUtf8 { reason: String },

    #[error("ABI has no constructor definition")]
    MissingConstructor,

    #[error("Function '{name}' not found in ABI")]
    FunctionNotFound { name: String },

    #[error("Encode failed: {reason}")]
    Encode { reason: String },

    #[error("Serialization error: {0}")]
    Serde(String),
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::Serde(e.to_string())
    }
}

impl DecodeError {
    /// Short, stable label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::InvalidAbi { .. } => "invalid_abi",
            DecodeError::DuplicateSelector { .. } => "duplicate_selector",
            DecodeError::MalformedHex { .. } => "malformed_hex",
            DecodeError::OutOfBounds { .. } => "out_of_bounds",
            DecodeError::TruncatedInput { .. } => "truncated_input",
            DecodeError::UnsupportedType { .. } => "unsupported_type",
            DecodeError::NestingTooDeep { .. } => "nesting_too_deep",
            DecodeError::InvalidOffset { .. } => "invalid_offset",
            DecodeError::InvalidUtf8 { .. } => "invalid_utf8",
            DecodeError::MissingConstructor => "missing_constructor",
            DecodeError::FunctionNotFound { .. } => "function_not_found",
            DecodeError::Encode { .. } => "encode",
            DecodeError::Serde(_) => "serde",
        }
    }
}

/// Errors that can occur during batch decoding.
#[derive(Debug, Error)]
pub enum BatchDecodeError {
    #[error("Decode error at index {index}: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: DecodeError,
    },

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = DecodeError::OutOfBounds { offset: 7, words: 2 };
        assert_eq!(err.to_string(), "Word 7 is out of bounds (2 words available)");
        assert_eq!(err.kind(), "out_of_bounds");
    }

    #[test]
    fn batch_error_keeps_source() {
        use std::error::Error as _;
        let err = BatchDecodeError::ItemFailed {
            index: 3,
            source: DecodeError::MissingConstructor,
        };
        assert!(err.to_string().starts_with("Decode error at index 3"));
        assert!(err.source().is_some());
    }
}
