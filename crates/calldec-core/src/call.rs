//! Types for decoded function calls and constructor invocations.

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::abi::AbiEntry;
use crate::types::{DecodedValue, TypeDescriptor};

/// Name reported for calldata whose selector matches no ABI function.
pub const UNKNOWN_FUNCTION: &str = "unknown";

/// One decoded argument, tagged with its declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub value: DecodedValue,
}

/// Result of decoding a function call's calldata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedCall {
    /// First 4 bytes of calldata
    #[serde(serialize_with = "serialize_selector")]
    pub selector: [u8; 4],
    /// Matched ABI entry; `None` when the selector is unknown
    #[serde(rename = "method", serialize_with = "serialize_entry_name")]
    pub entry: Option<Arc<AbiEntry>>,
    /// Canonical signature of the matched entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Decoded arguments in declaration order; empty for unknown calls
    pub args: Vec<DecodedArg>,
}

impl DecodedCall {
    /// An "unknown call" result: no entry, no arguments.
    pub fn unknown(selector: [u8; 4]) -> Self {
        Self {
            selector,
            entry: None,
            signature: None,
            args: Vec::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.entry.is_none()
    }

    /// Function name, or `"unknown"`.
    pub fn function_name(&self) -> &str {
        self.entry
            .as_deref()
            .map(|e| e.name.as_str())
            .unwrap_or(UNKNOWN_FUNCTION)
    }

    /// Selector as a hex string ("0xaabbccdd")
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    /// Look up a decoded argument by name
    pub fn arg(&self, name: &str) -> Option<&DecodedValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Decoded values only, in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &DecodedValue> {
        self.args.iter().map(|a| &a.value)
    }

    /// e.g. `transfer(to=0xd8dA..., amount=1000000)`
    pub fn summary(&self) -> String {
        let args: Vec<_> = self
            .args
            .iter()
            .map(|a| format!("{}={}", a.name, a.value))
            .collect();
        format!("{}({})", self.function_name(), args.join(", "))
    }
}

impl fmt::Display for DecodedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Function:  {}", self.function_name())?;
        writeln!(f, "Selector:  {}", self.selector_hex())?;
        if let Some(sig) = &self.signature {
            writeln!(f, "Signature: {sig}")?;
        }
        writeln!(f, "Inputs:")?;
        for arg in &self.args {
            writeln!(f, "  {} ({}): {}", arg.name, arg.ty, arg.value)?;
        }
        Ok(())
    }
}

/// Result of decoding constructor arguments (no selector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedConstructor {
    pub args: Vec<DecodedArg>,
}

impl DecodedConstructor {
    /// Look up a decoded arg by name
    pub fn arg(&self, name: &str) -> Option<&DecodedValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

fn serialize_selector<S: Serializer>(selector: &[u8; 4], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{}", hex::encode(selector)))
}

fn serialize_entry_name<S: Serializer>(
    entry: &Option<Arc<AbiEntry>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(entry.as_deref().map(|e| e.name.as_str()).unwrap_or(UNKNOWN_FUNCTION))
}
