use crate::{
    chunker::BlockHash,
    group::fill_random,
    pir_internals::{
        branch_opt_util,
        error::PIRError,
        params::{Params, SECRET_SIZE},
        xor,
    },
};
use rand::TryCryptoRng;
use std::collections::HashMap;

/// Query for one server: its share of the selection mask and its share of the blinding secret.
pub type Query = (Vec<u8>, Vec<u8>);

/// Represents the client in the XOR secret-sharing PIR scheme.
///
/// The client XOR-shares a unit selection vector across all servers, so that each server sees a uniformly
/// random mask. XOR of all server responses then collapses to the wanted block, as the blinding secret shares
/// cancel out too.
#[derive(Clone, Debug)]
pub struct Client {
    params: Params,
}

impl Client {
    pub fn setup(params: Params) -> Client {
        Client { params }
    }

    #[inline(always)]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Splits the selection of block `target`, out of `num_blocks`, into `num_servers` masks.
    ///
    /// All but the last mask are uniformly random; the last one is chosen s.t. XOR of all masks has exactly bit `target` set.
    /// Any strict subset of masks is independent of `target`.
    ///
    /// # Returns
    ///
    /// A `Result` holding one mask per server. Fails if `target` is out of range or randomness is unavailable.
    pub fn share_mask<R: TryCryptoRng + ?Sized>(&self, target: usize, num_blocks: usize, rng: &mut R) -> Result<Vec<Vec<u8>>, PIRError> {
        if branch_opt_util::unlikely(num_blocks == 0) {
            return Err(PIRError::EmptyBlockCollection);
        }
        if branch_opt_util::unlikely(target >= num_blocks) {
            return Err(PIRError::BlockIndexOutOfRange);
        }

        let mut unit = vec![0u8; xor::mask_byte_len(num_blocks)];
        xor::set_bit(&mut unit, target, true);

        self.share(unit, rng)
    }

    /// Splits an all-zero `SECRET_SIZE` -bytes secret into `num_servers` blinding shares.
    /// Each share hides one server's response, while all of them cancel out in the XOR of responses.
    pub fn share_secret<R: TryCryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Vec<u8>>, PIRError> {
        self.share(vec![0u8; SECRET_SIZE], rng)
    }

    /// Prepares one query per server for fetching block `target`, out of `num_blocks`.
    pub fn query<R: TryCryptoRng + ?Sized>(&self, target: usize, num_blocks: usize, rng: &mut R) -> Result<Vec<Query>, PIRError> {
        let masks = self.share_mask(target, num_blocks, rng)?;
        let secrets = self.share_secret(rng)?;

        Ok(masks.into_iter().zip(secrets).collect())
    }

    /// Recovers the wanted block by XOR-ing responses of all servers.
    ///
    /// # Returns
    ///
    /// A `Result` holding the block. Fails unless there is exactly one response per server, all of equal length.
    pub fn reconstruct(&self, responses: &[Vec<u8>]) -> Result<Vec<u8>, PIRError> {
        if branch_opt_util::unlikely(responses.len() != self.params.num_servers()) {
            return Err(PIRError::InvalidNumberOfServers);
        }

        xor::xor_all(responses)
    }

    /// Resolves a content hash to its block index, using a parsed descriptor.
    pub fn locate(&self, hash: &BlockHash, descriptor: &HashMap<BlockHash, u64>) -> Option<usize> {
        descriptor.get(hash).map(|&offset| (offset / self.params.block_size() as u64) as usize)
    }

    /// XOR-shares `secret` into `num_servers` shares of the same length.
    fn share<R: TryCryptoRng + ?Sized>(&self, secret: Vec<u8>, rng: &mut R) -> Result<Vec<Vec<u8>>, PIRError> {
        let num_servers = self.params.num_servers();

        let mut shares = Vec::with_capacity(num_servers);
        let mut last = secret;

        for _ in 1..num_servers {
            let mut share = vec![0u8; last.len()];
            fill_random(rng, &mut share)?;

            xor::xor_into(&share, &mut last)?;
            shares.push(share);
        }

        shares.push(last);
        Ok(shares)
    }
}
