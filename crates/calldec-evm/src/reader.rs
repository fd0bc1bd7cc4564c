//! Word-addressed view over an ABI-encoded body.
//!
//! The body (calldata minus the 4-byte selector) is a sequence of 32-byte
//! words. Heads are consumed sequentially through the cursor; dynamic tails
//! are reached by forking a reader at an absolute word index.

use calldec_core::error::DecodeError;

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

pub type Word = [u8; WORD_SIZE];

/// Borrowing reader over 32-byte words with a sequential cursor.
#[derive(Debug, Clone, Copy)]
pub struct WordReader<'a> {
    data: &'a [u8],
    words: usize,
    cursor: usize,
}

impl<'a> WordReader<'a> {
    /// A trailing partial word is never readable.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            words: data.len() / WORD_SIZE,
            cursor: 0,
        }
    }

    /// Number of whole words available.
    pub fn word_count(&self) -> usize {
        self.words
    }

    /// Current cursor position (word index).
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Words available from `index` to the end.
    pub fn remaining_from(&self, index: usize) -> usize {
        self.words.saturating_sub(index)
    }

    /// Read the word at an absolute word index.
    pub fn read_word_at(&self, index: usize) -> Result<Word, DecodeError> {
        if index >= self.words {
            return Err(DecodeError::OutOfBounds {
                offset: index,
                words: self.words,
            });
        }
        let start = index * WORD_SIZE;
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(&self.data[start..start + WORD_SIZE]);
        Ok(word)
    }

    /// Read the word at the cursor and advance by one.
    pub fn cursor_read(&mut self) -> Result<Word, DecodeError> {
        let word = self.read_word_at(self.cursor)?;
        self.cursor += 1;
        Ok(word)
    }

    /// Bytes of `count` consecutive words starting at `index`.
    pub fn read_words_at(&self, index: usize, count: usize) -> Result<&'a [u8], DecodeError> {
        let end = index.checked_add(count).filter(|end| *end <= self.words).ok_or(
            DecodeError::OutOfBounds {
                offset: index.saturating_add(count),
                words: self.words,
            },
        )?;
        Ok(&self.data[index * WORD_SIZE..end * WORD_SIZE])
    }

    /// A reader over the same bytes with its cursor at `index`.
    pub fn fork_at(&self, index: usize) -> WordReader<'a> {
        WordReader {
            data: self.data,
            words: self.words,
            cursor: index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: u8) -> Vec<u8> {
        (0..n).flat_map(|i| [i; WORD_SIZE]).collect()
    }

    #[test]
    fn cursor_advances_one_word() {
        let data = words(3);
        let mut r = WordReader::new(&data);
        assert_eq!(r.cursor_read().unwrap(), [0u8; 32]);
        assert_eq!(r.cursor_read().unwrap(), [1u8; 32]);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn read_past_end_is_out_of_bounds() {
        let data = words(2);
        let r = WordReader::new(&data);
        assert_eq!(
            r.read_word_at(2),
            Err(DecodeError::OutOfBounds { offset: 2, words: 2 })
        );
    }

    #[test]
    fn partial_trailing_word_is_ignored() {
        let mut data = words(1);
        data.extend_from_slice(&[0xff; 31]);
        let r = WordReader::new(&data);
        assert_eq!(r.word_count(), 1);
        assert!(r.read_word_at(1).is_err());
    }

    #[test]
    fn fork_has_independent_cursor() {
        let data = words(4);
        let mut parent = WordReader::new(&data);
        parent.cursor_read().unwrap();
        let mut child = parent.fork_at(3);
        assert_eq!(child.cursor_read().unwrap(), [3u8; 32]);
        assert_eq!(parent.position(), 1);
    }

    #[test]
    fn read_words_at_checks_bounds() {
        let data = words(3);
        let r = WordReader::new(&data);
        assert_eq!(r.read_words_at(1, 2).unwrap().len(), 64);
        assert!(r.read_words_at(2, 2).is_err());
        assert!(r.read_words_at(1, usize::MAX).is_err());
        assert_eq!(r.remaining_from(5), 0);
    }
}
