//! # Winner selection
//!
//! Pure function over an ordered entrant list and a published seed.
//! Anyone holding the recorded `(entrants, seed)` pair can recompute
//! the draw and check the winner, which is the audit story advertised
//! to participants.
//!
//! The selection is hash-mod, not cryptographically uniform: a party
//! who can pick the seed after seeing the entrant list can grind for a
//! preferred winner. The seed is therefore generated before the draw
//! and published with the result. Callers needing stronger fairness
//! should swap this for a uniform sampler fed by a verifiable
//! randomness beacon.

use crate::{error::AppError, models::Participant};

/// 32-bit rolling hash, `h = h * 31 + char`, with two's-complement
/// wrap. Signed overflow semantics are part of the published contract;
/// changing them would break recomputation of past draws.
pub fn seed_hash(seed: &str) -> i32 {
    let mut hash: i32 = 0;

    for c in seed.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(c as i32);
    }

    hash
}

/// Deterministically picks one entrant. The same `(entrants, seed)`
/// pair, in the same order, always yields the same winner.
pub fn select_winner<'a>(
    entrants: &'a [Participant],
    seed: &str,
) -> Result<&'a Participant, AppError> {
    if entrants.is_empty() {
        return Err(AppError::EmptyPool);
    }

    let index = seed_hash(seed).unsigned_abs() as usize % entrants.len();

    Ok(&entrants[index])
}
