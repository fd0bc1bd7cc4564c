//! # calldec-evm
//!
//! Decodes Ethereum transaction calldata against a contract ABI.
//!
//! ## Implementation notes
//! - `calldata[..4]` → function selector (keccak256 of the canonical signature)
//! - `calldata[4..]` → ABI-encoded arguments: a head of fixed-size words, with
//!   dynamic values stored in the tail behind byte offsets
//! - Offsets are relative to the start of the enclosing data region, never to
//!   the start of the calldata
//! - Unknown selectors decode to an `unknown` call with no arguments

pub mod batch;
pub mod call_decoder;
pub mod decoder;
pub mod encoder;
pub mod reader;
pub mod selector;

pub use batch::{decode_batch, decode_batch_chunked};
pub use call_decoder::{decode_call, parse_hex, CallDecoder};
pub use decoder::{decode_scalar, TypeDecoder};
pub use encoder::{encode_call, encode_params, value_from_json};
pub use reader::{Word, WordReader, WORD_SIZE};
pub use selector::{keccak256, selector_of, ResolvedEntry, SelectorIndex};
