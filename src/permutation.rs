//! Uniformly random permutations, used to shuffle block or share order so that positions
//! don't correlate across repeated queries.

use crate::pir_internals::{branch_opt_util, error::PIRError, params::SEED_BYTE_LEN};
use rand::{CryptoRng, RngCore, TryCryptoRng};
use turboshake::TurboShake128;

/// Deterministic cryptographic byte stream expanded from a seed with the TurboSHAKE128 XOF.
/// Parties holding the same seed squeeze the same stream, hence derive the same permutation.
pub struct SeededStream {
    xof: TurboShake128,
}

impl SeededStream {
    pub fn new(seed: &[u8; SEED_BYTE_LEN]) -> SeededStream {
        let mut xof = TurboShake128::default();
        xof.absorb(seed);
        xof.finalize::<{ TurboShake128::DEFAULT_DOMAIN_SEPARATOR }>();

        SeededStream { xof }
    }
}

impl RngCore for SeededStream {
    fn next_u32(&mut self) -> u32 {
        let mut word = [0u8; 4];
        self.xof.squeeze(&mut word);
        u32::from_le_bytes(word)
    }

    fn next_u64(&mut self) -> u64 {
        let mut word = [0u8; 8];
        self.xof.squeeze(&mut word);
        u64::from_le_bytes(word)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.xof.squeeze(dst);
    }
}

impl CryptoRng for SeededStream {}

/// Samples a permutation of `[0, size)` with Fisher-Yates shuffling.
///
/// Starting from identity, for `i` from `size - 1` down to 1, position `i` is swapped with position
/// `j = u64 % (i + 1)`, where `u64` is drawn from `rng`. All `size!` permutations are reachable; the modulo
/// reduction adds bias of at most `(i + 1) / 2^64`, which is negligible for any realistic `size`.
///
/// # Returns
///
/// * `Result<Vec<usize>, PIRError>` - `pi` s.t. each of `0..size` appears exactly once. Fails if randomness is unavailable.
pub fn generate_permutation<R: TryCryptoRng + ?Sized>(size: usize, rng: &mut R) -> Result<Vec<usize>, PIRError> {
    let mut pi = (0..size).collect::<Vec<usize>>();

    for i in (1..size).rev() {
        let rand_word = rng.try_next_u64().map_err(|e| PIRError::RandomnessUnavailable(e.to_string()))?;
        let j = (rand_word % (i as u64 + 1)) as usize;

        pi.swap(i, j);
    }

    Ok(pi)
}

/// Reorders `items` s.t. `res[i] = items[pi[i]]`.
pub fn apply_permutation<T: Clone>(pi: &[usize], items: &[T]) -> Result<Vec<T>, PIRError> {
    if branch_opt_util::unlikely(!is_permutation(pi) || pi.len() != items.len()) {
        return Err(PIRError::InvalidPermutation);
    }

    Ok(pi.iter().map(|&idx| items[idx].clone()).collect())
}

/// Computes `inv` s.t. `inv[pi[i]] = i`, undoing `apply_permutation` with `pi`.
pub fn invert_permutation(pi: &[usize]) -> Result<Vec<usize>, PIRError> {
    if branch_opt_util::unlikely(!is_permutation(pi)) {
        return Err(PIRError::InvalidPermutation);
    }

    let mut inv = vec![0usize; pi.len()];
    pi.iter().enumerate().for_each(|(i, &pi_i)| inv[pi_i] = i);

    Ok(inv)
}

fn is_permutation(pi: &[usize]) -> bool {
    let mut seen = vec![false; pi.len()];

    pi.iter().all(|&idx| match seen.get_mut(idx) {
        Some(flag) if !*flag => {
            *flag = true;
            true
        }
        _ => false,
    })
}
