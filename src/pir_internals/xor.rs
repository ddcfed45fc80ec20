use super::{branch_opt_util, error::PIRError};
use rayon::prelude::*;

/// Number of bytes needed by a selection mask carrying one bit per block.
#[inline(always)]
pub const fn mask_byte_len(num_blocks: usize) -> usize {
    num_blocks.div_ceil(8)
}

/// Sets or clears bit `index` of a bit-packed mask. Bits are little-endian within each byte,
/// so bit 0 of byte 0 selects block 0.
///
/// # Panics
///
/// If `index` addresses a byte beyond the end of `mask`.
#[inline(always)]
pub fn set_bit(mask: &mut [u8], index: usize, bit: bool) {
    if bit {
        mask[index / 8] |= 1 << (index % 8);
    } else {
        mask[index / 8] &= !(1 << (index % 8));
    }
}

/// Reads bit `index` of a bit-packed mask, little-endian within each byte.
///
/// # Panics
///
/// If `index` addresses a byte beyond the end of `mask`.
#[inline(always)]
pub fn get_bit(mask: &[u8], index: usize) -> bool {
    (mask[index / 8] >> (index % 8)) & 1 == 1
}

/// XORs `src` into `dst` in place. When `dst` is longer than `src`, `src` is repeated
/// to tile across all of `dst`, which lets a short secret blind a whole block.
///
/// # Returns
///
/// * `Result<(), PIRError>` - Returns an error if `src` is empty or if `dst` length is not a multiple of `src` length.
pub fn xor_into(src: &[u8], dst: &mut [u8]) -> Result<(), PIRError> {
    if branch_opt_util::unlikely(src.is_empty()) {
        return Err(PIRError::EmptyBuffer);
    }
    if branch_opt_util::unlikely(dst.len() % src.len() != 0) {
        return Err(PIRError::NonTilingSecretLength);
    }

    dst.chunks_exact_mut(src.len()).for_each(|tile| {
        tile.iter_mut().zip(src).for_each(|(d, &s)| *d ^= s);
    });

    Ok(())
}

/// Computes bitwise XOR of all buffers, each of which must be as long as the first one.
///
/// # Returns
///
/// * `Result<Vec<u8>, PIRError>` - A freshly allocated buffer holding the XOR. Returns an error if there
///   is no buffer, the first buffer is empty or any buffer differs in length from the first one.
pub fn xor_all<B: AsRef<[u8]>>(bufs: &[B]) -> Result<Vec<u8>, PIRError> {
    let first = bufs.first().ok_or(PIRError::EmptyBuffer)?.as_ref();
    if branch_opt_util::unlikely(first.is_empty()) {
        return Err(PIRError::EmptyBuffer);
    }

    let mut res = vec![0u8; first.len()];
    for buf in bufs {
        let buf = buf.as_ref();
        if branch_opt_util::unlikely(buf.len() != res.len()) {
            return Err(PIRError::MismatchedBufferLength);
        }

        res.iter_mut().zip(buf).for_each(|(r, &b)| *r ^= b);
    }

    Ok(res)
}

/// Given `n` share groups, each holding `m` equal-length buffers, returns `m` buffers s.t.
/// `res[i]` is XOR of `groups[j][i]` over all `j`. This regroups shares which arrive
/// group-by-group (e.g. one group per server) into per-index reconstructions.
///
/// # Returns
///
/// * `Result<Vec<Vec<u8>>, PIRError>` - Per-index XOR. Returns an error if there are no groups,
///   if groups hold different number of buffers, or if any `xor_all` over an index fails.
pub fn transpose_xor<B: AsRef<[u8]> + Sync>(groups: &[Vec<B>]) -> Result<Vec<Vec<u8>>, PIRError> {
    let num_indices = groups.first().ok_or(PIRError::EmptyBuffer)?.len();
    if branch_opt_util::unlikely(groups.iter().any(|group| group.len() != num_indices)) {
        return Err(PIRError::MismatchedShareGroupLength);
    }

    (0..num_indices)
        .into_par_iter()
        .map(|idx| {
            let column = groups.iter().map(|group| group[idx].as_ref()).collect::<Vec<&[u8]>>();
            xor_all(&column)
        })
        .collect()
}

/// Computes the XOR-aggregated PIR answer over `blocks`.
///
/// Walks `mask` bit by bit, byte 0 bit 0 first, and XORs `blocks[i]` into a zero-initialized
/// accumulator for every set bit `i`. Mask bits beyond `blocks.len()` are padding and are ignored.
/// Finally `secret` is XORed, tiled if shorter, into the accumulator.
///
/// A server computing this learns nothing about the wanted index as long as the mask it holds
/// is one XOR share of a unit vector.
///
/// # Returns
///
/// * `Result<Vec<u8>, PIRError>` - Response of block length. Returns an error if there are no blocks,
///   blocks differ in length, the mask has fewer bits than blocks or the secret doesn't tile a block.
pub fn compute_response<B: AsRef<[u8]>>(blocks: &[B], mask: &[u8], secret: &[u8]) -> Result<Vec<u8>, PIRError> {
    let block_len = blocks.first().ok_or(PIRError::EmptyBlockCollection)?.as_ref().len();
    if branch_opt_util::unlikely(block_len == 0) {
        return Err(PIRError::EmptyBuffer);
    }
    if branch_opt_util::unlikely(blocks.iter().any(|block| block.as_ref().len() != block_len)) {
        return Err(PIRError::MismatchedBufferLength);
    }
    if branch_opt_util::unlikely(mask.len() * 8 < blocks.len()) {
        return Err(PIRError::MaskTooShort);
    }

    let mut response = vec![0u8; block_len];

    blocks
        .iter()
        .enumerate()
        .filter(|&(idx, _)| get_bit(mask, idx))
        .try_for_each(|(_, block)| xor_into(block.as_ref(), &mut response))?;

    xor_into(secret, &mut response)?;
    Ok(response)
}

/// Returns true iff every byte is zero, i.e. the response cancelled out.
#[inline]
pub fn all_zero(buf: &[u8]) -> bool {
    buf.iter().fold(0u8, |acc, &b| acc | b) == 0
}

#[inline]
pub fn slice_equals(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}

/// Linear scan for the first element of `set` byte-wise equal to `value`.
pub fn membership<B: AsRef<[u8]>>(value: &[u8], set: &[B]) -> Option<usize> {
    set.iter().position(|elem| slice_equals(value, elem.as_ref()))
}
