//! # calldec-core
//!
//! Core types shared across the calldec crates: the ABI model, the closed
//! `TypeDescriptor` type system, decoded values and calls, configuration,
//! and errors. The EVM decoder, the CLI, and observability are built on top
//! of the definitions here.

pub mod abi;
pub mod call;
pub mod config;
pub mod decoder;
pub mod error;
pub mod types;

pub use abi::{AbiEntry, AbiParam, EntryKind};
pub use call::{DecodedArg, DecodedCall, DecodedConstructor, UNKNOWN_FUNCTION};
pub use config::{BatchConfig, DecoderConfig};
pub use decoder::{BatchDecodeResult, ErrorMode};
pub use error::{BatchDecodeError, DecodeError};
pub use types::{DecodedValue, TupleField, TypeDescriptor};
