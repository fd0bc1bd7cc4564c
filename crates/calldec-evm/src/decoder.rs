//! Recursive ABI type decoder.
//!
//! # Head / tail layout
//! A sequence of values (the call arguments, a tuple's fields, an array's
//! elements) is laid out as a run of heads followed by tails. Static values
//! sit in the head in place. A dynamic value's head slot holds a byte offset,
//! relative to the start of the *enclosing* sequence (its data region), where
//! its tail begins.
//!
//! Every nesting level opens a new data region, so the decoder passes the
//! region's base word index explicitly into each recursive call instead of
//! sharing one cursor across levels.

use alloy_primitives::{Address, I256, U256};
use calldec_core::{
    config::DecoderConfig,
    error::DecodeError,
    types::{DecodedValue, TypeDescriptor},
};

use crate::reader::{Word, WordReader, WORD_SIZE};

/// Decodes values of a given [`TypeDescriptor`] out of a [`WordReader`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDecoder {
    config: DecoderConfig,
}

impl TypeDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one value of type `ty`.
    ///
    /// The value's head is read at `reader`'s cursor, which advances past it.
    /// `base` is the word index where the enclosing data region starts; a
    /// dynamic value's offset is resolved against it. `depth` is the current
    /// array/tuple nesting level.
    pub fn decode(
        &self,
        ty: &TypeDescriptor,
        reader: &mut WordReader<'_>,
        base: usize,
        depth: usize,
    ) -> Result<DecodedValue, DecodeError> {
        let mut budget = ReadBudget::for_reader(reader);
        self.decode_value(ty, reader, base, depth, &mut budget)
    }

    /// Decode a sequence of values laid out as heads then tails, starting at
    /// `reader`'s cursor. Dynamic offsets are relative to `base`.
    ///
    /// All values share one read budget.
    pub fn decode_sequence<'t, I>(
        &self,
        types: I,
        reader: &mut WordReader<'_>,
        base: usize,
        depth: usize,
    ) -> Result<Vec<DecodedValue>, DecodeError>
    where
        I: IntoIterator<Item = &'t TypeDescriptor>,
    {
        let mut budget = ReadBudget::for_reader(reader);
        self.decode_values(types, reader, base, depth, &mut budget)
    }

    fn decode_value(
        &self,
        ty: &TypeDescriptor,
        reader: &mut WordReader<'_>,
        base: usize,
        depth: usize,
        budget: &mut ReadBudget,
    ) -> Result<DecodedValue, DecodeError> {
        if depth > self.config.max_depth {
            return Err(DecodeError::NestingTooDeep {
                max_depth: self.config.max_depth,
            });
        }

        if ty.is_dynamic() {
            budget.charge(1)?;
            let head = reader.cursor_read().map_err(truncated)?;
            let tail = resolve_offset(&head, base)?;
            return self.decode_tail(ty, reader.fork_at(tail), depth, budget);
        }

        match ty {
            TypeDescriptor::FixedArray(elem, len) => {
                ensure_words(reader, reader.position(), ty.head_words(), ty)?;
                let mut items = Vec::with_capacity(*len);
                for _ in 0..*len {
                    items.push(self.decode_value(elem, reader, base, depth + 1, budget)?);
                }
                Ok(DecodedValue::Array(items))
            }
            TypeDescriptor::Tuple(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.decode_value(&field.ty, reader, base, depth + 1, budget)?;
                    values.push((field.name.clone(), value));
                }
                Ok(DecodedValue::Tuple(values))
            }
            scalar => {
                budget.charge(1)?;
                let word = reader.cursor_read().map_err(truncated)?;
                decode_scalar(scalar, &word)
            }
        }
    }

    fn decode_values<'t, I>(
        &self,
        types: I,
        reader: &mut WordReader<'_>,
        base: usize,
        depth: usize,
        budget: &mut ReadBudget,
    ) -> Result<Vec<DecodedValue>, DecodeError>
    where
        I: IntoIterator<Item = &'t TypeDescriptor>,
    {
        types
            .into_iter()
            .map(|ty| self.decode_value(ty, reader, base, depth, budget))
            .collect()
    }

    /// Decode the tail of a dynamic value. `tail`'s cursor sits on the first
    /// word of the payload.
    fn decode_tail(
        &self,
        ty: &TypeDescriptor,
        mut tail: WordReader<'_>,
        depth: usize,
        budget: &mut ReadBudget,
    ) -> Result<DecodedValue, DecodeError> {
        match ty {
            TypeDescriptor::Bytes => Ok(DecodedValue::Bytes(read_length_prefixed(&mut tail, budget)?)),
            TypeDescriptor::String => {
                let bytes = read_length_prefixed(&mut tail, budget)?;
                String::from_utf8(bytes)
                    .map(DecodedValue::String)
                    .map_err(|e| DecodeError::InvalidUtf8 {
                        reason: e.to_string(),
                    })
            }
            TypeDescriptor::Array(elem) => {
                budget.charge(1)?;
                let len = word_to_usize(&tail.cursor_read().map_err(truncated)?)
                    .ok_or_else(|| DecodeError::TruncatedInput {
                        reason: format!("{ty} length does not fit in memory"),
                    })?;
                if len == 0 {
                    return Ok(DecodedValue::Array(Vec::new()));
                }
                // Elements form their own data region right after the length word.
                let region = tail.position();
                let needed = len.checked_mul(elem.head_words()).ok_or_else(|| {
                    DecodeError::TruncatedInput {
                        reason: format!("{ty} length {len} overflows"),
                    }
                })?;
                ensure_words(&tail, region, needed, ty)?;
                let elems = std::iter::repeat(elem.as_ref()).take(len);
                let items = self.decode_values(elems, &mut tail, region, depth + 1, budget)?;
                Ok(DecodedValue::Array(items))
            }
            TypeDescriptor::FixedArray(elem, len) => {
                let region = tail.position();
                ensure_words(&tail, region, elem.head_words().saturating_mul(*len), ty)?;
                let elems = std::iter::repeat(elem.as_ref()).take(*len);
                let items = self.decode_values(elems, &mut tail, region, depth + 1, budget)?;
                Ok(DecodedValue::Array(items))
            }
            TypeDescriptor::Tuple(fields) => {
                let region = tail.position();
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    let value = self.decode_value(&field.ty, &mut tail, region, depth + 1, budget)?;
                    values.push((field.name.clone(), value));
                }
                Ok(DecodedValue::Tuple(values))
            }
            other => Err(DecodeError::UnsupportedType {
                ty: format!("{other} has no tail encoding"),
            }),
        }
    }
}

/// Word reads allowed per input word. A canonical encoding reads every word
/// once; offsets that alias one tail from many heads hit this limit.
const READ_BUDGET_FACTOR: usize = 4;

/// Remaining word reads for one top-level decode.
#[derive(Debug)]
struct ReadBudget {
    limit: usize,
    remaining: usize,
}

impl ReadBudget {
    fn for_reader(reader: &WordReader<'_>) -> Self {
        let limit = reader.word_count().saturating_mul(READ_BUDGET_FACTOR);
        Self {
            limit,
            remaining: limit,
        }
    }

    fn charge(&mut self, words: usize) -> Result<(), DecodeError> {
        self.remaining = self
            .remaining
            .checked_sub(words)
            .ok_or_else(|| DecodeError::TruncatedInput {
                reason: format!(
                    "read budget of {} words exhausted; offsets reuse the same data",
                    self.limit
                ),
            })?;
        Ok(())
    }
}

/// Decode a single-word static value.
pub fn decode_scalar(ty: &TypeDescriptor, word: &Word) -> Result<DecodedValue, DecodeError> {
    check_width(ty)?;
    match ty {
        TypeDescriptor::Uint(bits) => Ok(DecodedValue::Uint {
            bits: *bits,
            value: U256::from_be_bytes(*word) & low_mask(*bits),
        }),
        TypeDescriptor::Int(bits) => {
            let mask = low_mask(*bits);
            let mut raw = U256::from_be_bytes(*word) & mask;
            if *bits < 256 && raw.bit(*bits - 1) {
                raw |= !mask;
            }
            Ok(DecodedValue::Int {
                bits: *bits,
                value: I256::from_raw(raw),
            })
        }
        TypeDescriptor::Bool => Ok(DecodedValue::Bool(word[WORD_SIZE - 1] != 0)),
        TypeDescriptor::Address => Ok(DecodedValue::Address(Address::from_slice(&word[12..]))),
        TypeDescriptor::FixedBytes(n) => Ok(DecodedValue::FixedBytes(word[..*n].to_vec())),
        TypeDescriptor::Function => Ok(DecodedValue::FixedBytes(word[..24].to_vec())),
        other => Err(DecodeError::UnsupportedType {
            ty: format!("{other} is not a single-word type"),
        }),
    }
}

/// Rejects widths only a hand-built descriptor can carry.
fn check_width(ty: &TypeDescriptor) -> Result<(), DecodeError> {
    let valid = match ty {
        TypeDescriptor::Uint(bits) | TypeDescriptor::Int(bits) => {
            (8..=256).contains(bits) && bits % 8 == 0
        }
        TypeDescriptor::FixedBytes(n) => (1..=WORD_SIZE).contains(n),
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(DecodeError::UnsupportedType { ty: ty.to_string() })
    }
}

/// `bits` low bits set.
fn low_mask(bits: usize) -> U256 {
    if bits >= 256 {
        U256::MAX
    } else {
        (U256::from(1u8) << bits) - U256::from(1u8)
    }
}

/// Big-endian word as `usize`, or `None` if it does not fit.
pub(crate) fn word_to_usize(word: &Word) -> Option<usize> {
    if word[..WORD_SIZE - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD_SIZE - 8..]);
    usize::try_from(u64::from_be_bytes(low)).ok()
}

/// Turn a head word holding a byte offset into an absolute word index.
fn resolve_offset(head: &Word, base: usize) -> Result<usize, DecodeError> {
    let offset = word_to_usize(head).ok_or_else(|| DecodeError::TruncatedInput {
        reason: format!("offset 0x{} points past the end of the input", hex::encode(head)),
    })?;
    if offset % WORD_SIZE != 0 {
        return Err(DecodeError::InvalidOffset {
            offset: offset.to_string(),
            reason: "not a multiple of 32 bytes".into(),
        });
    }
    base.checked_add(offset / WORD_SIZE)
        .ok_or_else(|| DecodeError::TruncatedInput {
            reason: format!("offset {offset} overflows"),
        })
}

/// Length word followed by `ceil(len / 32)` payload words, truncated to `len`.
fn read_length_prefixed(
    tail: &mut WordReader<'_>,
    budget: &mut ReadBudget,
) -> Result<Vec<u8>, DecodeError> {
    budget.charge(1)?;
    let len = word_to_usize(&tail.cursor_read().map_err(truncated)?).ok_or_else(|| {
        DecodeError::TruncatedInput {
            reason: "byte length does not fit in memory".into(),
        }
    })?;
    if len == 0 {
        return Ok(Vec::new());
    }
    let words = len.div_ceil(WORD_SIZE);
    let payload = tail
        .read_words_at(tail.position(), words)
        .map_err(|_| DecodeError::TruncatedInput {
            reason: format!(
                "{len} bytes declared, {} words available",
                tail.remaining_from(tail.position())
            ),
        })?;
    budget.charge(words)?;
    Ok(payload[..len].to_vec())
}

fn ensure_words(
    reader: &WordReader<'_>,
    from: usize,
    needed: usize,
    ty: &TypeDescriptor,
) -> Result<(), DecodeError> {
    let available = reader.remaining_from(from);
    if needed > available {
        return Err(DecodeError::TruncatedInput {
            reason: format!("{ty} needs {needed} words at word {from}, {available} available"),
        });
    }
    Ok(())
}

fn truncated(err: DecodeError) -> DecodeError {
    match err {
        DecodeError::OutOfBounds { offset, words } => DecodeError::TruncatedInput {
            reason: format!("read of word {offset} past the end of the input ({words} words)"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_u64(v: u64) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&v.to_be_bytes());
        w
    }

    fn body(words: &[[u8; 32]]) -> Vec<u8> {
        words.concat()
    }

    fn decode_one(ty: &str, data: &[u8]) -> Result<DecodedValue, DecodeError> {
        let ty = TypeDescriptor::parse(ty).unwrap();
        let mut reader = WordReader::new(data);
        TypeDecoder::default().decode(&ty, &mut reader, 0, 0)
    }

    #[test]
    fn uint_is_masked_to_width() {
        let v = decode_one("uint8", &[0xff; 32]).unwrap();
        assert_eq!(v.as_u256(), Some(U256::from(255u64)));
    }

    #[test]
    fn uint256_max_is_exact() {
        let v = decode_one("uint256", &[0xff; 32]).unwrap();
        assert_eq!(v.as_u256(), Some(U256::MAX));
    }

    #[test]
    fn int_is_sign_extended() {
        let mut w = [0u8; 32];
        w[31] = 0xfe;
        let v = decode_one("int8", &w).unwrap();
        assert_eq!(v.as_i256(), Some(I256::try_from(-2i64).unwrap()));

        let v = decode_one("int16", &word_u64(0x7fff)).unwrap();
        assert_eq!(v.as_i256(), Some(I256::try_from(32767i64).unwrap()));

        let v = decode_one("int256", &[0xff; 32]).unwrap();
        assert_eq!(v.as_i256(), Some(I256::MINUS_ONE));
    }

    #[test]
    fn bool_address_and_fixed_bytes() {
        assert_eq!(decode_one("bool", &word_u64(1)).unwrap(), DecodedValue::Bool(true));
        assert_eq!(decode_one("bool", &word_u64(0)).unwrap(), DecodedValue::Bool(false));

        let mut w = [0u8; 32];
        w[12..].copy_from_slice(&[0xab; 20]);
        assert_eq!(
            decode_one("address", &w).unwrap(),
            DecodedValue::Address(Address::from([0xab; 20]))
        );

        let mut w = [0u8; 32];
        w[..3].copy_from_slice(b"abc");
        assert_eq!(
            decode_one("bytes3", &w).unwrap(),
            DecodedValue::FixedBytes(b"abc".to_vec())
        );
    }

    #[test]
    fn empty_dynamic_values() {
        let data = body(&[word_u64(0x20), word_u64(0)]);
        assert_eq!(decode_one("bytes", &data).unwrap(), DecodedValue::Bytes(vec![]));
        assert_eq!(decode_one("string", &data).unwrap(), DecodedValue::String(String::new()));
        assert_eq!(decode_one("uint256[]", &data).unwrap(), DecodedValue::Array(vec![]));
    }

    #[test]
    fn bytes_spanning_two_words() {
        let mut payload = [[0x11u8; 32], [0u8; 32]];
        payload[1][..8].copy_from_slice(&[0x22; 8]);
        let data = body(&[word_u64(0x20), word_u64(40), payload[0], payload[1]]);
        let v = decode_one("bytes", &data).unwrap();
        let bytes = v.as_bytes().unwrap();
        assert_eq!(bytes.len(), 40);
        assert_eq!(&bytes[32..], &[0x22; 8]);
    }

    #[test]
    fn string_array_uses_element_region() {
        // string[] ["a", "bb"]
        let mut a = [0u8; 32];
        a[0] = b'a';
        let mut bb = [0u8; 32];
        bb[..2].copy_from_slice(b"bb");
        let data = body(&[
            word_u64(0x20), // head: offset of the array
            word_u64(2),    // length
            word_u64(0x40), // elem 0 offset, relative to the word after the length
            word_u64(0x80), // elem 1 offset
            word_u64(1),
            a,
            word_u64(2),
            bb,
        ]);
        let v = decode_one("string[]", &data).unwrap();
        assert_eq!(
            v,
            DecodedValue::Array(vec![
                DecodedValue::String("a".into()),
                DecodedValue::String("bb".into()),
            ])
        );
    }

    #[test]
    fn static_fixed_array_is_inline() {
        let data = body(&[word_u64(1), word_u64(2), word_u64(3)]);
        let ty = TypeDescriptor::parse("uint8[2]").unwrap();
        let mut reader = WordReader::new(&data);
        let v = TypeDecoder::default().decode(&ty, &mut reader, 0, 0).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn read_past_end_is_truncated_input() {
        let data = body(&[word_u64(0x20), word_u64(64)]);
        assert!(matches!(decode_one("bytes", &data), Err(DecodeError::TruncatedInput { .. })));
        assert!(matches!(decode_one("uint256", &[0u8; 16]), Err(DecodeError::TruncatedInput { .. })));
    }

    #[test]
    fn huge_array_length_fails_before_allocating() {
        let data = body(&[word_u64(0x20), word_u64(u64::MAX)]);
        assert!(matches!(decode_one("uint256[]", &data), Err(DecodeError::TruncatedInput { .. })));
    }

    #[test]
    fn misaligned_offset_is_rejected() {
        let data = body(&[word_u64(0x21), word_u64(0), word_u64(0)]);
        assert!(matches!(decode_one("bytes", &data), Err(DecodeError::InvalidOffset { .. })));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut payload = [0u8; 32];
        payload[0] = 0xff;
        let data = body(&[word_u64(0x20), word_u64(1), payload]);
        assert!(matches!(decode_one("string", &data), Err(DecodeError::InvalidUtf8 { .. })));
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let data = body(&[word_u64(1), word_u64(2)]);
        let ty = TypeDescriptor::parse("uint8[1][1][1]").unwrap();
        let decoder = TypeDecoder::new(DecoderConfig::default().with_max_depth(2));
        let mut reader = WordReader::new(&data);
        assert_eq!(
            decoder.decode(&ty, &mut reader, 0, 0),
            Err(DecodeError::NestingTooDeep { max_depth: 2 })
        );
    }

    #[test]
    fn aliased_offsets_exhaust_the_read_budget() {
        // uint256[] nested 20 deep; every array has two elements whose offsets
        // both point at the same child, so a naive walk reads 2^20 leaves.
        let dims = 20;
        let mut words = vec![word_u64(0x20)];
        for _ in 1..dims {
            words.extend([word_u64(2), word_u64(0x40), word_u64(0x40)]);
        }
        words.extend([word_u64(2), word_u64(7), word_u64(7)]);
        let data = body(&words);

        let ty = format!("uint256{}", "[]".repeat(dims));
        let err = decode_one(&ty, &data).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedInput { .. }), "{err:?}");
    }

    #[test]
    fn shallow_aliasing_within_budget_still_decodes() {
        // uint256[][] with both elements sharing one child
        let data = body(&[
            word_u64(0x20),
            word_u64(2),
            word_u64(0x40),
            word_u64(0x40),
            word_u64(1),
            word_u64(9),
        ]);
        let v = decode_one("uint256[][]", &data).unwrap();
        let outer = v.as_array().unwrap();
        assert_eq!(outer.len(), 2);
        assert_eq!(outer[0], outer[1]);
    }

    #[test]
    fn sequence_shares_one_budget() {
        // three bytes values all pointing at one 4-word payload
        let mut words = vec![word_u64(0x60), word_u64(0x60), word_u64(0x60), word_u64(128)];
        words.extend([[0xaa; 32]; 4]);
        let data = body(&words);
        let ty = TypeDescriptor::Bytes;
        let decoder = TypeDecoder::default();

        let mut reader = WordReader::new(&data);
        assert!(decoder.decode_sequence([&ty; 2], &mut reader, 0, 0).is_ok());

        let many = [&ty; 12];
        let heads: Vec<[u8; 32]> = many.iter().map(|_| word_u64(12 * 32)).collect();
        let mut words = heads;
        words.push(word_u64(128));
        words.extend([[0xaa; 32]; 4]);
        let data = body(&words);
        let mut reader = WordReader::new(&data);
        assert!(matches!(
            decoder.decode_sequence(many, &mut reader, 0, 0),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn scalar_widths_outside_the_abi_are_unsupported() {
        let word = [0xff; 32];
        for ty in [
            TypeDescriptor::FixedBytes(33),
            TypeDescriptor::FixedBytes(0),
            TypeDescriptor::Int(0),
            TypeDescriptor::Uint(0),
            TypeDescriptor::Uint(7),
            TypeDescriptor::Int(264),
        ] {
            assert!(
                matches!(decode_scalar(&ty, &word), Err(DecodeError::UnsupportedType { .. })),
                "{ty:?} should be rejected"
            );
        }
        assert!(decode_scalar(&TypeDescriptor::FixedBytes(32), &word).is_ok());
    }
}
