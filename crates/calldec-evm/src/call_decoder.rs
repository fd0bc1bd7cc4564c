//! EVM function-call and constructor calldata decoder.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[..4] (the selector)
//! - Remaining bytes = ABI-encoded inputs, heads then tails, offsets relative
//!   to the start of the body
//! - Constructor: no selector prefix; all bytes = ABI-encoded constructor args

use calldec_core::{
    call::{DecodedArg, DecodedCall, DecodedConstructor},
    config::DecoderConfig,
    error::DecodeError,
    types::TypeDescriptor,
};
use tracing::{debug, trace};

use crate::decoder::TypeDecoder;
use crate::reader::WordReader;
use crate::selector::SelectorIndex;

/// Decodes calldata against one immutable [`SelectorIndex`].
///
/// The decoder holds no per-call state, so one instance can be shared across
/// threads and used for any number of concurrent decodes.
#[derive(Debug, Clone)]
pub struct CallDecoder {
    index: SelectorIndex,
    decoder: TypeDecoder,
}

impl CallDecoder {
    pub fn new(index: SelectorIndex, config: DecoderConfig) -> Self {
        Self {
            index,
            decoder: TypeDecoder::new(config),
        }
    }

    /// Create a decoder from a standard Ethereum ABI JSON string.
    ///
    /// # Errors
    /// Returns `InvalidAbi` / `DuplicateSelector` if the ABI cannot be indexed.
    pub fn from_abi_json(abi_json: &str, config: DecoderConfig) -> Result<Self, DecodeError> {
        Ok(Self::new(SelectorIndex::from_abi_json(abi_json)?, config))
    }

    pub fn index(&self) -> &SelectorIndex {
        &self.index
    }

    pub fn config(&self) -> &DecoderConfig {
        self.decoder.config()
    }

    /// Decode `0x`-prefixed hex calldata.
    ///
    /// An unknown selector is not an error: the result has no entry and no args.
    pub fn decode_call(&self, calldata_hex: &str) -> Result<DecodedCall, DecodeError> {
        let bytes = parse_hex(calldata_hex)?;
        self.decode_call_bytes(&bytes)
    }

    /// Decode raw calldata bytes, including the 4-byte selector.
    pub fn decode_call_bytes(&self, calldata: &[u8]) -> Result<DecodedCall, DecodeError> {
        if calldata.len() < 4 {
            return Err(DecodeError::TruncatedInput {
                reason: format!(
                    "calldata too short: {} bytes (need at least 4 for selector)",
                    calldata.len()
                ),
            });
        }

        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);
        let body = &calldata[4..];

        let Some(function) = self.index.get(selector) else {
            debug!(selector = %hex::encode(selector), "unknown selector");
            return Ok(DecodedCall::unknown(selector));
        };

        let args = self.decode_params(&function.params, body)?;

        Ok(DecodedCall {
            selector,
            entry: Some(function.entry.clone()),
            signature: Some(function.signature.clone()),
            args,
        })
    }

    /// Decode constructor arguments (ABI-encoded, no selector prefix).
    pub fn decode_constructor(&self, data_hex: &str) -> Result<DecodedConstructor, DecodeError> {
        let bytes = parse_hex(data_hex)?;
        self.decode_constructor_bytes(&bytes)
    }

    pub fn decode_constructor_bytes(&self, data: &[u8]) -> Result<DecodedConstructor, DecodeError> {
        let constructor = self.index.constructor().ok_or(DecodeError::MissingConstructor)?;
        let args = self.decode_params(&constructor.params, data)?;
        Ok(DecodedConstructor { args })
    }

    /// Decode a parameter list whose data region starts at the first byte of `body`.
    fn decode_params(
        &self,
        params: &[(String, TypeDescriptor)],
        body: &[u8],
    ) -> Result<Vec<DecodedArg>, DecodeError> {
        let max_depth = self.decoder.config().max_depth;
        if params.iter().any(|(_, ty)| ty.nesting_depth() > max_depth) {
            return Err(DecodeError::NestingTooDeep { max_depth });
        }

        let mut reader = WordReader::new(body);
        let values = self
            .decoder
            .decode_sequence(params.iter().map(|(_, ty)| ty), &mut reader, 0, 0)?;
        Ok(params
            .iter()
            .zip(values)
            .map(|((name, ty), value)| {
                trace!(arg = %name, ty = %ty, "decoded argument");
                DecodedArg {
                    name: name.clone(),
                    ty: ty.clone(),
                    value,
                }
            })
            .collect())
    }
}

/// Decode calldata against an index with the default [`DecoderConfig`].
pub fn decode_call(index: &SelectorIndex, calldata_hex: &str) -> Result<DecodedCall, DecodeError> {
    CallDecoder::new(index.clone(), DecoderConfig::default()).decode_call(calldata_hex)
}

/// Parse `0x`-prefixed, even-length hex. Surrounding whitespace and an
/// uppercase `0X` prefix are rejected; digits may be either case.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, DecodeError> {
    let digits = input.strip_prefix("0x").ok_or_else(|| DecodeError::MalformedHex {
        reason: "missing 0x prefix".into(),
    })?;
    if digits.len() % 2 != 0 {
        return Err(DecodeError::MalformedHex {
            reason: format!("odd number of hex digits ({})", digits.len()),
        });
    }
    hex::decode(digits).map_err(|e| DecodeError::MalformedHex {
        reason: e.to_string(),
    })
}
