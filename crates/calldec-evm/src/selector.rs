//! Function selectors and the selector index.
//!
//! The selector of a function is the first 4 bytes of the keccak256 hash of
//! its canonical signature string, e.g.:
//!   keccak256("transfer(address,uint256)")[..4] → 0xa9059cbb
//!
//! The index is built once from an ABI and is read-only afterwards.

use calldec_core::{
    abi::{AbiEntry, EntryKind},
    error::DecodeError,
    types::TypeDescriptor,
};
use indexmap::IndexMap;
use std::sync::Arc;
use tiny_keccak::{Hasher, Keccak};
use tracing::debug;

/// keccak256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Selector of a canonical signature: `"name(type1,type2,...)"`.
pub fn selector_of(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A function (or constructor) with its parameter types resolved.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub entry: Arc<AbiEntry>,
    /// Canonical signature, e.g. `"transfer(address,uint256)"`
    pub signature: String,
    /// `(name, type)` per input, in declaration order
    pub params: Vec<(String, TypeDescriptor)>,
}

impl ResolvedEntry {
    fn resolve(entry: &AbiEntry) -> Result<Self, DecodeError> {
        let params = entry.resolved_inputs()?;
        let types: Vec<String> = params.iter().map(|(_, ty)| ty.to_string()).collect();
        let signature = format!("{}({})", entry.name, types.join(","));
        Ok(Self {
            entry: Arc::new(entry.clone()),
            signature,
            params,
        })
    }

    pub fn selector(&self) -> [u8; 4] {
        selector_of(&self.signature)
    }

    pub fn types(&self) -> Vec<TypeDescriptor> {
        self.params.iter().map(|(_, ty)| ty.clone()).collect()
    }
}

/// Maps 4-byte selectors to ABI functions.
#[derive(Debug, Clone, Default)]
pub struct SelectorIndex {
    functions: IndexMap<[u8; 4], ResolvedEntry>,
    constructor: Option<ResolvedEntry>,
}

impl SelectorIndex {
    /// Build the index from ABI entries.
    ///
    /// # Errors
    /// - `InvalidAbi` if any entry has a type string that does not parse.
    /// - `DuplicateSelector` if two distinct signatures share a selector.
    ///   The same signature listed twice keeps the first entry.
    pub fn build(entries: &[AbiEntry]) -> Result<Self, DecodeError> {
        let mut functions: IndexMap<[u8; 4], ResolvedEntry> = IndexMap::new();
        let mut constructor = None;

        for entry in entries {
            match entry.kind {
                EntryKind::Function => {
                    let resolved = ResolvedEntry::resolve(entry)?;
                    let selector = resolved.selector();
                    if let Some(existing) = functions.get(&selector) {
                        if existing.signature != resolved.signature {
                            return Err(DecodeError::DuplicateSelector {
                                selector: format!("0x{}", hex::encode(selector)),
                                first: existing.signature.clone(),
                                second: resolved.signature,
                            });
                        }
                        debug!(signature = %resolved.signature, "duplicate ABI entry ignored");
                        continue;
                    }
                    functions.insert(selector, resolved);
                }
                EntryKind::Constructor => {
                    if constructor.is_none() {
                        constructor = Some(ResolvedEntry::resolve(entry)?);
                    }
                }
                // Validated but not indexed: events are keyed by 32-byte topics.
                EntryKind::Event | EntryKind::Error => {
                    entry.resolved_inputs()?;
                }
                EntryKind::Fallback | EntryKind::Receive => {}
            }
        }

        debug!(
            functions = functions.len(),
            has_constructor = constructor.is_some(),
            "selector index built"
        );
        Ok(Self {
            functions,
            constructor,
        })
    }

    /// Parse a standard ABI JSON string and build the index.
    pub fn from_abi_json(abi_json: &str) -> Result<Self, DecodeError> {
        let entries = AbiEntry::parse_json(abi_json).map_err(|e| DecodeError::InvalidAbi {
            entry: "<json>".into(),
            reason: e.to_string(),
        })?;
        Self::build(&entries)
    }

    /// The ABI entry for a selector, if any.
    pub fn lookup(&self, selector: [u8; 4]) -> Option<&AbiEntry> {
        self.functions.get(&selector).map(|r| r.entry.as_ref())
    }

    /// The resolved function for a selector, if any.
    pub fn get(&self, selector: [u8; 4]) -> Option<&ResolvedEntry> {
        self.functions.get(&selector)
    }

    /// First function with the given name (overloads resolve to the first declared).
    pub fn by_name(&self, name: &str) -> Option<&ResolvedEntry> {
        self.functions.values().find(|r| r.entry.name == name)
    }

    pub fn constructor(&self) -> Option<&ResolvedEntry> {
        self.constructor.as_ref()
    }

    /// `(selector, function)` pairs in ABI declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (&[u8; 4], &ResolvedEntry)> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
