//! Tokenizer vocabulary and its first-byte index (spec §4.J, §6
//! `TokenizerInfo.from_vocab`). Grounded on the teacher's
//! `vocabulary::Vocabulary`: a `Token` newtype over raw bytes, an
//! id<->token map, and a per-first-byte [`FixedBitSet`] of candidate token
//! ids used to prune the bitmask projection's search space.
use ahash::AHashMap;
use fixedbitset_stack::FixedBitSet;
use std::array;

/// A single vocabulary entry in raw bytes. Kept distinct from `String`
/// because a token's bytes need not be valid UTF-8 (spec §6: the
/// tokenizer is an external collaborator referenced only through its
/// interface of "bytes of each token id").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Token(pub Box<[u8]>);

/// A tokenizer's vocabulary: every token id's bytes, plus derived indices
/// the bitmask projection (component J) needs. Constructed once per
/// session and shared read-only afterwards (spec §5).
#[derive(Debug, Clone)]
pub struct TokenizerInfo {
    id_to_token: AHashMap<u32, Token>,
    vocab_size: usize,
    eos_token_id: u32,
    /// `first_byte_to_token_ids[b]` is the set of token ids whose first
    /// byte is `b`. Used by the bitmask projection's fast path (spec
    /// §4.J #1): a token can only be accepted if its first byte is in the
    /// matcher's current `next_byte_set()`.
    first_byte_to_token_ids: Vec<FixedBitSet>,
}

impl TokenizerInfo {
    /// Builds a [`TokenizerInfo`] from a id->bytes vocabulary map and the
    /// tokenizer's end-of-sequence token id (spec §6).
    ///
    /// Tokens with empty byte strings are skipped from the first-byte
    /// index (they can never be the sole cause of a byte-level rejection)
    /// and a warning is logged, matching the teacher's handling of
    /// degenerate vocabulary entries.
    pub fn from_vocab(vocab: AHashMap<u32, Vec<u8>>, eos_token_id: u32) -> Self {
        let vocab_size = vocab.keys().copied().max().map(|m| m + 1).unwrap_or(0) as usize;
        let id_to_token: AHashMap<u32, Token> =
            vocab.into_iter().map(|(id, bytes)| (id, Token(bytes.into_boxed_slice()))).collect();

        let mut buckets: [Vec<u32>; 256] = array::from_fn(|_| Vec::new());
        for (&id, token) in id_to_token.iter() {
            match token.0.first() {
                Some(&b) => buckets[b as usize].push(id),
                None => log::warn!("token id {id} has an empty byte string; skipping it in the first-byte index"),
            }
        }
        let first_byte_to_token_ids = buckets
            .into_iter()
            .map(|ids| {
                let mut set = FixedBitSet::with_capacity(vocab_size);
                for id in ids {
                    set.insert(id as usize);
                }
                set
            })
            .collect();

        Self { id_to_token, vocab_size, eos_token_id, first_byte_to_token_ids }
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn eos_token_id(&self) -> u32 {
        self.eos_token_id
    }

    pub fn token_bytes(&self, id: u32) -> Option<&[u8]> {
        self.id_to_token.get(&id).map(|t| t.0.as_ref())
    }

    pub(crate) fn first_byte_bucket(&self, byte: u8) -> &FixedBitSet {
        &self.first_byte_to_token_ids[byte as usize]
    }

    /// All token ids present in the vocabulary, ascending.
    pub fn token_ids(&self) -> impl Iterator<Item = u32> + '_ {
        let mut ids: Vec<u32> = self.id_to_token.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
    }
}

/// Allocates a token bitmask buffer sized for `batch` sequences over a
/// vocabulary of `vocab_size` tokens: `ceil(vocab_size/32)` 32-bit words
/// per sequence (spec §3 "Lifecycle", §6 `allocate_token_bitmask`).
pub fn allocate_token_bitmask(batch: usize, vocab_size: usize) -> Vec<Vec<u32>> {
    let words = vocab_size.div_ceil(32);
    vec![vec![0u32; words]; batch]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> AHashMap<u32, Vec<u8>> {
        let mut v = AHashMap::default();
        v.insert(0, b"a".to_vec());
        v.insert(1, b"bc".to_vec());
        v.insert(2, b"".to_vec());
        v.insert(3, b"a1".to_vec());
        v
    }

    #[test]
    fn first_byte_bucket_groups_by_leading_byte() {
        let info = TokenizerInfo::from_vocab(vocab(), 99);
        let a_bucket = info.first_byte_bucket(b'a');
        assert!(a_bucket.contains(0));
        assert!(a_bucket.contains(3));
        assert!(!a_bucket.contains(1));
    }

    #[test]
    fn allocate_token_bitmask_rounds_up_to_words() {
        let buf = allocate_token_bitmask(2, 33);
        assert_eq!(buf.len(), 2);
        assert_eq!(buf[0].len(), 2);
    }
}
