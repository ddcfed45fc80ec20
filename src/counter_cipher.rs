//! AES counter-mode encryption of a single block with a fixed, all-zero initial counter.
//!
//! With the counter pinned to zero, two blocks encrypted under the same key leak the XOR of their plaintexts.
//! Keys are therefore wrapped in `SingleUseKey`, which `counter_encrypt` consumes, and which can't be cloned.
//! Decrypting is encrypting again under an identical key, usually re-derived from the same seed and context.

use crate::{
    group::fill_random,
    pir_internals::{branch_opt_util, error::PIRError, params::SEED_BYTE_LEN},
};
use aes::{
    Aes128, Aes192, Aes256,
    cipher::{KeyIvInit, StreamCipher},
};
use ctr::Ctr128BE;
use rand::TryCryptoRng;
use turboshake::TurboShake128;
use zeroize::{Zeroize, ZeroizeOnDrop};

const AES_BLOCK_SIZE: usize = 16;

/// AES key usable for exactly one `counter_encrypt` call. 16, 24 or 32 -bytes long, selecting AES-128/192/256.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SingleUseKey {
    bytes: Vec<u8>,
}

impl SingleUseKey {
    pub fn new(key: &[u8]) -> Result<SingleUseKey, PIRError> {
        match key.len() {
            16 | 24 | 32 => Ok(SingleUseKey { bytes: key.to_vec() }),
            len => {
                branch_opt_util::cold();
                Err(PIRError::InvalidSymmetricKeyLength(len))
            }
        }
    }

    /// Samples a fresh 32 -bytes key.
    pub fn generate<R: TryCryptoRng + ?Sized>(rng: &mut R) -> Result<SingleUseKey, PIRError> {
        let mut bytes = vec![0u8; 32];
        fill_random(rng, &mut bytes)?;

        Ok(SingleUseKey { bytes })
    }

    /// Derives a 32 -bytes key from a shared seed and a per-use context. Callers must never repeat
    /// a (seed, context) pair for two different blocks.
    pub fn derive(seed: &[u8; SEED_BYTE_LEN], context: &[u8]) -> SingleUseKey {
        let mut hasher = TurboShake128::default();
        hasher.absorb(seed);
        hasher.absorb(context);
        hasher.finalize::<{ TurboShake128::DEFAULT_DOMAIN_SEPARATOR }>();

        let mut bytes = vec![0u8; 32];
        hasher.squeeze(&mut bytes);

        SingleUseKey { bytes }
    }
}

impl std::fmt::Debug for SingleUseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SingleUseKey({} -bytes, redacted)", self.bytes.len())
    }
}

/// Encrypts `block` with AES in counter mode, the 128-bit big-endian counter starting at zero.
/// Output has the same length as `block`. The same call with an identical key decrypts.
///
/// # Returns
///
/// A `Result` holding the ciphertext. Fails if the key doesn't fit any AES variant, never returning `block` unencrypted.
pub fn counter_encrypt(key: SingleUseKey, block: &[u8]) -> Result<Vec<u8>, PIRError> {
    let iv = [0u8; AES_BLOCK_SIZE];
    let mut ciphertext = block.to_vec();

    match key.bytes.len() {
        16 => apply_keystream::<Ctr128BE<Aes128>>(&key.bytes, &iv, &mut ciphertext)?,
        24 => apply_keystream::<Ctr128BE<Aes192>>(&key.bytes, &iv, &mut ciphertext)?,
        _ => apply_keystream::<Ctr128BE<Aes256>>(&key.bytes, &iv, &mut ciphertext)?,
    }

    Ok(ciphertext)
}

#[inline(always)]
fn apply_keystream<C: KeyIvInit + StreamCipher>(key: &[u8], iv: &[u8; AES_BLOCK_SIZE], buf: &mut [u8]) -> Result<(), PIRError> {
    let mut cipher = C::new_from_slices(key, iv).map_err(|_| PIRError::InvalidSymmetricKeyLength(key.len()))?;
    cipher.apply_keystream(buf);

    Ok(())
}
