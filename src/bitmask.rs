//! Vocabulary bitmask projection (spec §4.J, component J): the dominant
//! hot path, run on every model step. Given the matcher's current state
//! and a [`TokenizerInfo`], decides for every token id whether appending
//! it keeps at least one parse alive, and packs the decision into a
//! `vocab_size/32`-word bitmask. Grounded on the teacher's
//! `engine_base::EngineBase::compute_allowed_token_ids`/`mask_logits`
//! (`engine_base.rs`): a first-byte prefilter followed by a
//! speculative-accept-then-revert trial per surviving token, except this
//! crate reverts via [`GrammarMatcher::snapshot`]/[`restore`] rather than
//! the teacher's Earley-set undo log, and packs a `u32` bitmask (spec §6
//! `fill_next_token_bitmask`) rather than masking `f32` logits directly.
use std::time::Instant;

use crate::matcher::GrammarMatcher;
use crate::vocabulary::TokenizerInfo;

/// Outcome of a (possibly deadline-bounded) bitmask fill (spec §5
/// "Cancellation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmaskFillResult {
    /// `true` iff the deadline expired before every token id was decided.
    /// Bits for undecided tokens are left clear (conservative: treated as
    /// disallowed), matching spec §5's "all bits whose decision was
    /// reached; undecided bits cleared".
    pub aborted: bool,
}

fn set_bit(row: &mut [u32], token_id: usize) {
    row[token_id / 32] |= 1 << (token_id % 32);
}

/// Fills `bitmask[index]` with the set of token ids that keep at least one
/// parse alive from `matcher`'s current state (spec §4.J, §6
/// `fill_next_token_bitmask`). The matcher's observable state is
/// unchanged on return (spec §4.J "Output guarantee").
///
/// `bitmask` is shaped as produced by [`crate::vocabulary::allocate_token_bitmask`]:
/// one `Vec<u32>` row per batch entry, `index` selecting this call's row.
pub fn fill_next_token_bitmask(
    matcher: &mut GrammarMatcher,
    vocab: &TokenizerInfo,
    bitmask: &mut [Vec<u32>],
    index: usize,
) -> BitmaskFillResult {
    fill_next_token_bitmask_with_deadline(matcher, vocab, bitmask, index, None)
}

/// As [`fill_next_token_bitmask`], but aborts once `deadline` passes,
/// returning a conservative partial mask (spec §5).
pub fn fill_next_token_bitmask_with_deadline(
    matcher: &mut GrammarMatcher,
    vocab: &TokenizerInfo,
    bitmask: &mut [Vec<u32>],
    index: usize,
    deadline: Option<Instant>,
) -> BitmaskFillResult {
    let row = &mut bitmask[index];
    for word in row.iter_mut() {
        *word = 0;
    }

    // Fast path #1 (spec §4.J): a token can only survive if its first byte
    // is a legal next byte from the current state.
    let next_bytes = matcher.next_byte_set();
    let snapshot = matcher.snapshot();
    let mut aborted = false;

    'outer: for byte in 0u16..256 {
        if !next_bytes[byte as usize] {
            continue;
        }
        // Grouping optimization (spec §4.J): the vocabulary is pre-bucketed
        // by first byte, so only tokens that could possibly match this
        // byte are ever trialed.
        for token_id in vocab.first_byte_bucket(byte as u8).ones() {
            if let Some(dl) = deadline {
                if Instant::now() >= dl {
                    aborted = true;
                    break 'outer;
                }
            }
            let Some(bytes) = vocab.token_bytes(token_id as u32) else { continue };
            // Fast path #3 (spec §4.J): fork, trial the whole token,
            // revert. `accept_string` itself already short-circuits on the
            // first rejecting byte, which doubles as fast path #2 for
            // tokens sharing a rejected run with the current production.
            let accepted = matcher.accept_string(bytes);
            matcher.restore(snapshot.clone());
            if accepted {
                set_bit(row, token_id);
            }
        }
    }

    if !aborted && matcher.is_terminated() {
        set_bit(row, vocab.eos_token_id() as usize);
    }

    BitmaskFillResult { aborted }
}
