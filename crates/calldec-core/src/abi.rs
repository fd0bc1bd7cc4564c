//! The ABI model: entries and parameters as they appear in Ethereum ABI JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DecodeError;
use crate::types::{TupleField, TypeDescriptor};

/// Kind tag of an ABI entry (`"type"` in ABI JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    Error,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryKind::Function => "function",
            EntryKind::Constructor => "constructor",
            EntryKind::Event => "event",
            EntryKind::Fallback => "fallback",
            EntryKind::Receive => "receive",
            EntryKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// A single parameter of an ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    /// Raw type string, e.g. `"uint256"`, `"tuple[]"`
    #[serde(rename = "type")]
    pub ty: String,
    /// Components of a `tuple` type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
    /// Events only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    #[serde(rename = "internalType", default, skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            ..Default::default()
        }
    }

    /// A `tuple` parameter with the given components.
    pub fn tuple(name: impl Into<String>, ty: impl Into<String>, components: Vec<AbiParam>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            components,
            ..Default::default()
        }
    }

    /// Resolve this parameter into a [`TypeDescriptor`].
    ///
    /// `tuple`, `tuple[]`, `tuple[2][]` etc. are built from `components`;
    /// everything else goes through [`TypeDescriptor::parse`].
    pub fn resolve(&self) -> Result<TypeDescriptor, DecodeError> {
        let Some(suffix) = self.ty.strip_prefix("tuple") else {
            return TypeDescriptor::parse(&self.ty);
        };
        if self.components.is_empty() {
            return Err(DecodeError::UnsupportedType {
                ty: format!("{} (no components)", self.ty),
            });
        }
        let fields = self
            .components
            .iter()
            .enumerate()
            .map(|(i, c)| Ok(TupleField::new(positional_name(&c.name, i), c.resolve()?)))
            .collect::<Result<Vec<_>, DecodeError>>()?;
        TypeDescriptor::with_array_suffix(TypeDescriptor::Tuple(fields), suffix, &self.ty)
    }
}

/// One function / constructor / event / fallback description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    /// Events only
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub anonymous: bool,
}

impl AbiEntry {
    pub fn function(name: impl Into<String>, inputs: Vec<AbiParam>) -> Self {
        Self {
            kind: EntryKind::Function,
            name: name.into(),
            inputs,
            ..Default::default()
        }
    }

    pub fn constructor(inputs: Vec<AbiParam>) -> Self {
        Self {
            kind: EntryKind::Constructor,
            inputs,
            ..Default::default()
        }
    }

    /// Parse a standard ABI JSON array.
    pub fn parse_json(abi_json: &str) -> Result<Vec<AbiEntry>, DecodeError> {
        Ok(serde_json::from_str(abi_json)?)
    }

    /// Resolve every input into `(name, type)`; unnamed inputs become `arg{i}`.
    pub fn resolved_inputs(&self) -> Result<Vec<(String, TypeDescriptor)>, DecodeError> {
        self.inputs
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ty = p.resolve().map_err(|e| DecodeError::InvalidAbi {
                    entry: self.display_name(),
                    reason: format!("input {i}: {e}"),
                })?;
                Ok((arg_name(&p.name, i), ty))
            })
            .collect()
    }

    /// Canonical signature: `name(type1,type2,...)` with tuples expanded.
    pub fn signature(&self) -> Result<String, DecodeError> {
        let types: Vec<String> = self
            .resolved_inputs()?
            .iter()
            .map(|(_, ty)| ty.to_string())
            .collect();
        Ok(format!("{}({})", self.name, types.join(",")))
    }

    /// Name for messages; constructors and fallbacks have no `name`.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            self.kind.to_string()
        } else {
            self.name.clone()
        }
    }
}

fn arg_name(name: &str, i: usize) -> String {
    if name.is_empty() {
        format!("arg{i}")
    } else {
        name.to_string()
    }
}

fn positional_name(name: &str, i: usize) -> String {
    if name.is_empty() {
        i.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_ABI: &str = r#"[
        {
            "name": "fillOrders",
            "inputs": [
                {
                    "name": "orders",
                    "type": "tuple[]",
                    "components": [
                        {"name": "maker", "type": "address"},
                        {"name": "amount", "type": "uint256"},
                        {"name": "data", "type": "bytes"}
                    ]
                },
                {"name": "", "type": "uint"}
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {"type": "constructor", "inputs": [{"name": "owner", "type": "address"}]},
        {"type": "fallback"}
    ]"#;

    #[test]
    fn parses_abi_json_with_default_kind() {
        let entries = AbiEntry::parse_json(ORDER_ABI).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, EntryKind::Function);
        assert_eq!(entries[1].kind, EntryKind::Constructor);
        assert_eq!(entries[2].display_name(), "fallback");
    }

    #[test]
    fn signature_expands_tuples_and_aliases() {
        let entries = AbiEntry::parse_json(ORDER_ABI).unwrap();
        assert_eq!(
            entries[0].signature().unwrap(),
            "fillOrders((address,uint256,bytes)[],uint256)"
        );
    }

    #[test]
    fn resolved_inputs_names_unnamed_args() {
        let entries = AbiEntry::parse_json(ORDER_ABI).unwrap();
        let inputs = entries[0].resolved_inputs().unwrap();
        assert_eq!(inputs[0].0, "orders");
        assert_eq!(inputs[1].0, "arg1");
        match &inputs[0].1 {
            TypeDescriptor::Array(elem) => match elem.as_ref() {
                TypeDescriptor::Tuple(fields) => assert_eq!(fields[2].name, "data"),
                other => panic!("expected tuple, got {other:?}"),
            },
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn unparsable_type_is_invalid_abi() {
        let entry = AbiEntry::function("f", vec![AbiParam::new("x", "uint7")]);
        assert!(matches!(entry.signature(), Err(DecodeError::InvalidAbi { .. })));
    }

    #[test]
    fn tuple_without_components_is_rejected() {
        let p = AbiParam::new("t", "tuple");
        assert!(matches!(p.resolve(), Err(DecodeError::UnsupportedType { .. })));
    }

    #[test]
    fn built_tuple_param_resolves_with_suffix() {
        let leg = AbiParam::tuple(
            "legs",
            "tuple[2]",
            vec![AbiParam::new("active", "bool"), AbiParam::new("", "bytes")],
        );
        let entry = AbiEntry::function("route", vec![leg]);
        assert_eq!(entry.signature().unwrap(), "route((bool,bytes)[2])");

        let inputs = entry.resolved_inputs().unwrap();
        match &inputs[0].1 {
            TypeDescriptor::FixedArray(elem, 2) => match elem.as_ref() {
                TypeDescriptor::Tuple(fields) => {
                    assert_eq!(fields[0].name, "active");
                    assert_eq!(fields[1].name, "1");
                }
                other => panic!("expected tuple, got {other:?}"),
            },
            other => panic!("expected tuple[2], got {other:?}"),
        }
    }

    #[test]
    fn tuple_suffix_counts_toward_nesting_cap() {
        let suffix = "[]".repeat(crate::types::MAX_TYPE_NESTING);
        let p = AbiParam::tuple("t", format!("tuple{suffix}"), vec![AbiParam::new("x", "uint8")]);
        assert!(matches!(p.resolve(), Err(DecodeError::NestingTooDeep { .. })));
    }
}
