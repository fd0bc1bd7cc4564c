//! ABI type descriptors and decoded values.
//!
//! Type strings from an ABI (`"uint256"`, `"bytes32[]"`, `"(address,uint256)[2]"`)
//! are parsed once into a closed [`TypeDescriptor`] so the decoder can dispatch
//! on a fixed set of variants. Decoding produces a [`DecodedValue`] tree.

use alloy_primitives::{Address, I256, U256};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::DecodeError;

/// Deepest array/tuple nesting a type may describe.
pub const MAX_TYPE_NESTING: usize = 256;

/// A parsed Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// `uintN`, width in bits (8..=256, multiple of 8)
    Uint(usize),
    /// `intN`, width in bits (8..=256, multiple of 8)
    Int(usize),
    Bool,
    Address,
    /// `bytesN`, length in bytes (1..=32)
    FixedBytes(usize),
    /// External function reference: address + selector, 24 bytes
    Function,
    Bytes,
    String,
    /// `T[N]`
    FixedArray(Box<TypeDescriptor>, usize),
    /// `T[]`
    Array(Box<TypeDescriptor>),
    /// Struct / tuple with named components in declaration order
    Tuple(Vec<TupleField>),
}

/// One named component of a tuple type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleField {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl TupleField {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self { name: name.into(), ty }
    }
}

impl TypeDescriptor {
    /// Parse a type string such as `uint256`, `bytes32[]` or `(address,uint256)[2]`.
    ///
    /// Tuple components parsed from a string have no names; they are named by
    /// position (`"0"`, `"1"`, ...).
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        Self::parse_at(s, 0)
    }

    fn parse_at(s: &str, depth: usize) -> Result<Self, DecodeError> {
        if depth > MAX_TYPE_NESTING {
            return Err(too_deep());
        }
        let s = s.trim();
        let (base, suffix) = split_array_suffix(s)?;
        let depth = depth + suffix.matches('[').count();

        let base_ty = if base.starts_with('(') {
            let inner = &base[1..base.len() - 1];
            if inner.trim().is_empty() {
                return Err(unsupported(s));
            }
            let fields = split_top_level(inner)
                .into_iter()
                .enumerate()
                .map(|(i, part)| Ok(TupleField::new(i.to_string(), Self::parse_at(part, depth + 1)?)))
                .collect::<Result<Vec<_>, DecodeError>>()?;
            TypeDescriptor::Tuple(fields)
        } else {
            parse_elementary(base).ok_or_else(|| unsupported(s))?
        };

        Self::with_array_suffix(base_ty, suffix, s)
    }

    /// Wrap `base` in the array dimensions described by `suffix`, read left to
    /// right: `"[2][]"` applied to `T` yields `T[2][]` (a dynamic array of `T[2]`).
    ///
    /// `original` is only used for error messages.
    pub fn with_array_suffix(
        base: TypeDescriptor,
        suffix: &str,
        original: &str,
    ) -> Result<Self, DecodeError> {
        let dims = suffix.matches('[').count();
        if base.nesting_depth().saturating_add(dims) > MAX_TYPE_NESTING {
            return Err(too_deep());
        }
        let mut ty = base;
        let mut rest = suffix;
        while !rest.is_empty() {
            let after_open = rest.strip_prefix('[').ok_or_else(|| unsupported(original))?;
            let close = after_open.find(']').ok_or_else(|| unsupported(original))?;
            let dim = &after_open[..close];
            ty = if dim.is_empty() {
                TypeDescriptor::Array(Box::new(ty))
            } else {
                let len: usize = dim.parse().map_err(|_| unsupported(original))?;
                if len == 0 {
                    return Err(unsupported(original));
                }
                TypeDescriptor::FixedArray(Box::new(ty), len)
            };
            rest = &after_open[close + 1..];
        }
        Ok(ty)
    }

    /// Dynamic types are encoded through an offset in the head and a tail payload.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeDescriptor::Bytes | TypeDescriptor::String | TypeDescriptor::Array(_) => true,
            TypeDescriptor::FixedArray(elem, _) => elem.is_dynamic(),
            TypeDescriptor::Tuple(fields) => fields.iter().any(|f| f.ty.is_dynamic()),
            _ => false,
        }
    }

    /// Number of 32-byte words this type occupies in its parent's head.
    pub fn head_words(&self) -> usize {
        if self.is_dynamic() {
            return 1;
        }
        match self {
            TypeDescriptor::FixedArray(elem, len) => elem.head_words().saturating_mul(*len),
            TypeDescriptor::Tuple(fields) => fields
                .iter()
                .fold(0usize, |acc, f| acc.saturating_add(f.ty.head_words())),
            _ => 1,
        }
    }

    /// Depth of array/tuple nesting; scalars are 0.
    pub fn nesting_depth(&self) -> usize {
        match self {
            TypeDescriptor::FixedArray(elem, _) | TypeDescriptor::Array(elem) => {
                1 + elem.nesting_depth()
            }
            TypeDescriptor::Tuple(fields) => {
                1 + fields.iter().map(|f| f.ty.nesting_depth()).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    /// Canonical form, as used in function signatures.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Uint(bits) => write!(f, "uint{bits}"),
            TypeDescriptor::Int(bits) => write!(f, "int{bits}"),
            TypeDescriptor::Bool => write!(f, "bool"),
            TypeDescriptor::Address => write!(f, "address"),
            TypeDescriptor::FixedBytes(n) => write!(f, "bytes{n}"),
            TypeDescriptor::Function => write!(f, "function"),
            TypeDescriptor::Bytes => write!(f, "bytes"),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::FixedArray(elem, len) => write!(f, "{elem}[{len}]"),
            TypeDescriptor::Array(elem) => write!(f, "{elem}[]"),
            TypeDescriptor::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|fl| fl.ty.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn unsupported(s: &str) -> DecodeError {
    DecodeError::UnsupportedType { ty: s.to_string() }
}

/// Split `"(a,b)[2][]"` into `("(a,b)", "[2][]")` and `"uint8[3]"` into `("uint8", "[3]")`.
fn too_deep() -> DecodeError {
    DecodeError::NestingTooDeep {
        max_depth: MAX_TYPE_NESTING,
    }
}

fn split_array_suffix(s: &str) -> Result<(&str, &str), DecodeError> {
    if s.starts_with('(') {
        let mut depth = 0usize;
        for (i, c) in s.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok((&s[..=i], &s[i + 1..]));
                    }
                }
                _ => {}
            }
        }
        return Err(unsupported(s));
    }
    match s.find('[') {
        Some(i) => Ok((&s[..i], &s[i..])),
        None => Ok((s, "")),
    }
}

/// Split tuple components on commas that are not nested inside parentheses.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_elementary(s: &str) -> Option<TypeDescriptor> {
    match s {
        "bool" => return Some(TypeDescriptor::Bool),
        "address" => return Some(TypeDescriptor::Address),
        "string" => return Some(TypeDescriptor::String),
        "bytes" => return Some(TypeDescriptor::Bytes),
        "function" => return Some(TypeDescriptor::Function),
        "uint" => return Some(TypeDescriptor::Uint(256)),
        "int" => return Some(TypeDescriptor::Int(256)),
        _ => {}
    }

    if let Some(bits) = s.strip_prefix("uint") {
        return parse_int_width(bits).map(TypeDescriptor::Uint);
    }
    if let Some(bits) = s.strip_prefix("int") {
        return parse_int_width(bits).map(TypeDescriptor::Int);
    }
    if let Some(len) = s.strip_prefix("bytes") {
        let n: usize = parse_digits(len)?;
        return (1..=32).contains(&n).then_some(TypeDescriptor::FixedBytes(n));
    }
    None
}

fn parse_int_width(s: &str) -> Option<usize> {
    let bits = parse_digits(s)?;
    ((8..=256).contains(&bits) && bits % 8 == 0).then_some(bits)
}

/// Digits only; rejects signs, whitespace and leading zeros.
fn parse_digits(s: &str) -> Option<usize> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// A decoded ABI value.
///
/// Integers keep their declared width and are stored exactly in 256 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Uint { bits: usize, value: U256 },
    Int { bits: usize, value: I256 },
    Bool(bool),
    Address(Address),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<DecodedValue>),
    /// Named fields in declaration order
    Tuple(Vec<(String, DecodedValue)>),
}

impl DecodedValue {
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            DecodedValue::Uint { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_i256(&self) -> Option<I256> {
        match self {
            DecodedValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DecodedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            DecodedValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    /// Byte payload of `bytes`, `bytesN` and `function` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DecodedValue::Bytes(b) | DecodedValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a tuple field by name.
    pub fn field(&self, name: &str) -> Option<&DecodedValue> {
        match self {
            DecodedValue::Tuple(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Uint { value, .. } => write!(f, "{value}"),
            DecodedValue::Int { value, .. } => write!(f, "{value}"),
            DecodedValue::Bool(b) => write!(f, "{b}"),
            DecodedValue::Address(a) => write!(f, "{}", a.to_checksum(None)),
            DecodedValue::FixedBytes(b) | DecodedValue::Bytes(b) => {
                write!(f, "0x{}", hex::encode(b))
            }
            DecodedValue::String(s) => write!(f, "{s:?}"),
            DecodedValue::Array(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            DecodedValue::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// JSON form: integers as decimal strings, byte sequences as `0x` hex,
/// addresses EIP-55 checksummed, tuples as objects.
impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DecodedValue::Uint { value, .. } => serializer.collect_str(value),
            DecodedValue::Int { value, .. } => serializer.collect_str(value),
            DecodedValue::Bool(b) => serializer.serialize_bool(*b),
            DecodedValue::Address(a) => serializer.serialize_str(&a.to_checksum(None)),
            DecodedValue::FixedBytes(b) | DecodedValue::Bytes(b) => {
                serializer.serialize_str(&format!("0x{}", hex::encode(b)))
            }
            DecodedValue::String(s) => serializer.serialize_str(s),
            DecodedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DecodedValue::Tuple(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}
