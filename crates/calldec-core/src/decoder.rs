//! Batch decode modes and results.

use crate::call::DecodedCall;
use crate::error::DecodeError;

/// Controls how batch decoding reacts to individual decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Silently skip payloads that fail to decode.
    #[default]
    Skip,
    /// Collect decode errors alongside successes and return both at the end.
    Collect,
    /// Abort the entire batch on first error.
    Throw,
}

impl std::str::FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(ErrorMode::Skip),
            "collect" => Ok(ErrorMode::Collect),
            "throw" => Ok(ErrorMode::Throw),
            other => Err(format!("unknown error mode '{other}' (skip|collect|throw)")),
        }
    }
}

/// The output of a batch decode: successful calls plus any collected errors.
#[derive(Debug, Default)]
pub struct BatchDecodeResult {
    /// `(input_index, call)` in input order
    pub calls: Vec<(usize, DecodedCall)>,
    /// Populated only when `ErrorMode::Collect` is used.
    pub errors: Vec<(usize, DecodeError)>,
    /// Total payloads processed
    pub total_input: usize,
}

impl BatchDecodeResult {
    /// Number of decoded calls whose selector matched no ABI function.
    pub fn unknown_count(&self) -> usize {
        self.calls.iter().filter(|(_, c)| c.is_unknown()).count()
    }
}
