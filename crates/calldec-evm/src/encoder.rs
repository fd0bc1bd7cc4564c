//! ABI encoder, the inverse of the type decoder.
//!
//! Encodes `DecodedValue`s into standard head/tail ABI layout. Used by the
//! `encode-call` CLI command and to check decoding against a round trip.
//!
//! # Usage
//! ```ignore
//! let index = SelectorIndex::from_abi_json(ABI_JSON)?;
//! let calldata = encode_call(&index, "transfer", &[
//!     DecodedValue::Address(to),
//!     DecodedValue::Uint { bits: 256, value: U256::from(1_000_000u64) },
//! ])?;
//! ```

use alloy_primitives::{Address, I256, U256};
use calldec_core::{
    error::DecodeError,
    types::{DecodedValue, TypeDescriptor},
};
use std::str::FromStr;

use crate::call_decoder::parse_hex;
use crate::decoder::decode_scalar;
use crate::reader::{Word, WORD_SIZE};
use crate::selector::SelectorIndex;

/// Encode a function call: `selector ++ encode_params(inputs, args)`.
///
/// Overloaded names resolve to the first declared function.
pub fn encode_call(
    index: &SelectorIndex,
    function_name: &str,
    args: &[DecodedValue],
) -> Result<Vec<u8>, DecodeError> {
    let func = index
        .by_name(function_name)
        .ok_or_else(|| DecodeError::FunctionNotFound {
            name: function_name.to_string(),
        })?;

    if args.len() != func.params.len() {
        return Err(encode_err(format!(
            "argument count mismatch: ABI has {}, got {}",
            func.params.len(),
            args.len()
        )));
    }

    let mut calldata = func.selector().to_vec();
    calldata.extend_from_slice(&encode_params(&func.types(), args)?);
    Ok(calldata)
}

/// Encode a parameter list as one head/tail sequence (no selector).
pub fn encode_params(types: &[TypeDescriptor], values: &[DecodedValue]) -> Result<Vec<u8>, DecodeError> {
    if types.len() != values.len() {
        return Err(encode_err(format!(
            "{} types but {} values",
            types.len(),
            values.len()
        )));
    }
    encode_sequence(types.iter().zip(values))
}

fn encode_sequence<'a, I>(items: I) -> Result<Vec<u8>, DecodeError>
where
    I: IntoIterator<Item = (&'a TypeDescriptor, &'a DecodedValue)>,
{
    // Values are validated and encoded before any head space is reserved.
    let encoded = items
        .into_iter()
        .map(|(ty, value)| Ok((ty.is_dynamic(), encode_value(ty, value)?)))
        .collect::<Result<Vec<_>, DecodeError>>()?;

    let heads_len: usize = encoded
        .iter()
        .map(|(dynamic, bytes)| if *dynamic { WORD_SIZE } else { bytes.len() })
        .sum();
    let total: usize = heads_len
        + encoded
            .iter()
            .filter(|(dynamic, _)| *dynamic)
            .map(|(_, bytes)| bytes.len())
            .sum::<usize>();

    let mut out = Vec::with_capacity(total);
    let mut tail_offset = heads_len;
    for (dynamic, bytes) in &encoded {
        if *dynamic {
            out.extend_from_slice(&usize_word(tail_offset));
            tail_offset += bytes.len();
        } else {
            out.extend_from_slice(bytes);
        }
    }
    for (_, bytes) in encoded.iter().filter(|(dynamic, _)| *dynamic) {
        out.extend_from_slice(bytes);
    }
    Ok(out)
}

/// Encode one value: the in-place words for static types, the tail payload
/// for dynamic ones.
fn encode_value(ty: &TypeDescriptor, value: &DecodedValue) -> Result<Vec<u8>, DecodeError> {
    match (ty, value) {
        (TypeDescriptor::Uint(bits), DecodedValue::Uint { value: v, .. }) => {
            let word = v.to_be_bytes::<32>();
            check_scalar_roundtrip(ty, &word, value, *bits)?;
            Ok(word.to_vec())
        }
        (TypeDescriptor::Int(bits), DecodedValue::Int { value: v, .. }) => {
            let word = v.into_raw().to_be_bytes::<32>();
            check_scalar_roundtrip(ty, &word, value, *bits)?;
            Ok(word.to_vec())
        }
        (TypeDescriptor::Bool, DecodedValue::Bool(b)) => Ok(usize_word(usize::from(*b)).to_vec()),
        (TypeDescriptor::Address, DecodedValue::Address(a)) => {
            let mut word = [0u8; WORD_SIZE];
            word[12..].copy_from_slice(a.as_slice());
            Ok(word.to_vec())
        }
        (TypeDescriptor::FixedBytes(n), DecodedValue::FixedBytes(b)) => left_aligned(b, *n, ty),
        (TypeDescriptor::Function, DecodedValue::FixedBytes(b)) => left_aligned(b, 24, ty),
        (TypeDescriptor::Bytes, DecodedValue::Bytes(b)) => Ok(length_prefixed(b)),
        (TypeDescriptor::String, DecodedValue::String(s)) => Ok(length_prefixed(s.as_bytes())),
        (TypeDescriptor::Array(elem), DecodedValue::Array(items)) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_sequence(items.iter().map(|v| (elem.as_ref(), v)))?);
            Ok(out)
        }
        (TypeDescriptor::FixedArray(elem, len), DecodedValue::Array(items)) => {
            if items.len() != *len {
                return Err(encode_err(format!(
                    "{ty}: expected {len} elements, got {}",
                    items.len()
                )));
            }
            encode_sequence(items.iter().map(|v| (elem.as_ref(), v)))
        }
        (TypeDescriptor::Tuple(fields), DecodedValue::Tuple(values)) => {
            if fields.len() != values.len() {
                return Err(encode_err(format!(
                    "{ty}: expected {} fields, got {}",
                    fields.len(),
                    values.len()
                )));
            }
            encode_sequence(fields.iter().map(|f| &f.ty).zip(values.iter().map(|(_, v)| v)))
        }
        _ => Err(encode_err(format!("cannot encode {value:?} as {ty}"))),
    }
}

/// The encoded word must decode back to the same value, i.e. fit in `bits`.
fn check_scalar_roundtrip(
    ty: &TypeDescriptor,
    word: &Word,
    value: &DecodedValue,
    bits: usize,
) -> Result<(), DecodeError> {
    let back = decode_scalar(ty, word)?;
    let same = match (&back, value) {
        (DecodedValue::Uint { value: a, .. }, DecodedValue::Uint { value: b, .. }) => a == b,
        (DecodedValue::Int { value: a, .. }, DecodedValue::Int { value: b, .. }) => a == b,
        _ => false,
    };
    if !same {
        return Err(encode_err(format!("{value} does not fit in {bits} bits")));
    }
    Ok(())
}

fn left_aligned(bytes: &[u8], n: usize, ty: &TypeDescriptor) -> Result<Vec<u8>, DecodeError> {
    if n == 0 || n > WORD_SIZE {
        return Err(DecodeError::UnsupportedType { ty: ty.to_string() });
    }
    if bytes.len() != n {
        return Err(encode_err(format!("{ty}: got {} bytes", bytes.len())));
    }
    let mut word = [0u8; WORD_SIZE];
    word[..n].copy_from_slice(bytes);
    Ok(word.to_vec())
}

fn length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
    let mut out = Vec::with_capacity(WORD_SIZE + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD_SIZE + padded, 0);
    out
}

fn usize_word(v: usize) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - 8..].copy_from_slice(&(v as u64).to_be_bytes());
    word
}

fn encode_err(reason: String) -> DecodeError {
    DecodeError::Encode { reason }
}

/// Convert a JSON argument into a `DecodedValue` of the expected type.
///
/// Integers accept JSON numbers or strings (decimal, or `0x` hex for
/// unsigned); byte types and addresses take `0x` hex strings; tuples take
/// either a positional array or an object keyed by field name.
pub fn value_from_json(ty: &TypeDescriptor, json: &serde_json::Value) -> Result<DecodedValue, DecodeError> {
    use serde_json::Value;

    let mismatch = || encode_err(format!("cannot convert {json} to {ty}"));

    match (ty, json) {
        (TypeDescriptor::Uint(bits), Value::Number(n)) => {
            let v = n.as_u64().ok_or_else(mismatch)?;
            Ok(DecodedValue::Uint { bits: *bits, value: U256::from(v) })
        }
        (TypeDescriptor::Uint(bits), Value::String(s)) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            let value = parsed.map_err(|e| encode_err(format!("{ty} parse '{s}': {e}")))?;
            Ok(DecodedValue::Uint { bits: *bits, value })
        }
        (TypeDescriptor::Int(bits), Value::Number(n)) => {
            let v = n.as_i64().ok_or_else(mismatch)?;
            let value = I256::try_from(v).map_err(|e| encode_err(e.to_string()))?;
            Ok(DecodedValue::Int { bits: *bits, value })
        }
        (TypeDescriptor::Int(bits), Value::String(s)) => {
            let value = I256::from_str(s).map_err(|e| encode_err(format!("{ty} parse '{s}': {e}")))?;
            Ok(DecodedValue::Int { bits: *bits, value })
        }
        (TypeDescriptor::Bool, Value::Bool(b)) => Ok(DecodedValue::Bool(*b)),
        (TypeDescriptor::Address, Value::String(s)) => {
            let addr = Address::from_str(s).map_err(|e| encode_err(format!("address parse: {e}")))?;
            Ok(DecodedValue::Address(addr))
        }
        (TypeDescriptor::FixedBytes(_) | TypeDescriptor::Function, Value::String(s)) => {
            Ok(DecodedValue::FixedBytes(parse_hex(s)?))
        }
        (TypeDescriptor::Bytes, Value::String(s)) => Ok(DecodedValue::Bytes(parse_hex(s)?)),
        (TypeDescriptor::String, Value::String(s)) => Ok(DecodedValue::String(s.clone())),
        (TypeDescriptor::Array(elem) | TypeDescriptor::FixedArray(elem, _), Value::Array(items)) => {
            let values = items
                .iter()
                .map(|item| value_from_json(elem, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DecodedValue::Array(values))
        }
        (TypeDescriptor::Tuple(fields), Value::Array(items)) if items.len() == fields.len() => {
            let values = fields
                .iter()
                .zip(items)
                .map(|(f, item)| Ok((f.name.clone(), value_from_json(&f.ty, item)?)))
                .collect::<Result<Vec<_>, DecodeError>>()?;
            Ok(DecodedValue::Tuple(values))
        }
        (TypeDescriptor::Tuple(fields), Value::Object(map)) => {
            let values = fields
                .iter()
                .map(|f| {
                    let item = map
                        .get(&f.name)
                        .ok_or_else(|| encode_err(format!("missing tuple field '{}'", f.name)))?;
                    Ok((f.name.clone(), value_from_json(&f.ty, item)?))
                })
                .collect::<Result<Vec<_>, DecodeError>>()?;
            Ok(DecodedValue::Tuple(values))
        }
        _ => Err(mismatch()),
    }
}
