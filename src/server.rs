use crate::{
    chunker,
    pir_internals::{branch_opt_util, error::PIRError, params::Params, timing::time_track, xor},
};
use rayon::prelude::*;
use std::{path::Path, time::Instant};

/// Represents one of the `num_servers` servers in the XOR secret-sharing PIR scheme.
///
/// A server holds a full copy of the block store and answers each query with the XOR of the blocks its
/// mask share selects, blinded by a per-query secret share. It never learns which block the client wants.
#[derive(Clone, Debug)]
pub struct Server {
    params: Params,
    blocks: Vec<Vec<u8>>,
}

impl Server {
    /// Sets up a server from blocks already in memory.
    ///
    /// # Arguments
    ///
    /// * `params`: Deployment parameters, every block must be `params.block_size()` bytes long.
    /// * `blocks`: The block store, in block order.
    ///
    /// # Returns
    ///
    /// A `Result` holding the server. Returns an error if there is no block or if any block has unexpected length.
    pub fn setup(params: Params, blocks: Vec<Vec<u8>>) -> Result<Server, PIRError> {
        if branch_opt_util::unlikely(blocks.is_empty()) {
            return Err(PIRError::EmptyBlockCollection);
        }
        if branch_opt_util::unlikely(blocks.iter().any(|block| block.len() != params.block_size())) {
            return Err(PIRError::MismatchedBufferLength);
        }

        Ok(Server { params, blocks })
    }

    /// Sets up a server serving the zero-padded blocks of the file at `path`.
    pub fn setup_from_file<P: AsRef<Path>>(params: Params, path: P) -> Result<Server, PIRError> {
        let blocks = chunker::load_blocks(path, &params)?;
        Self::setup(params, blocks)
    }

    #[inline(always)]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    #[inline(always)]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Responds to a single query, i.e. one share of the selection mask along with one share of the blinding secret.
    ///
    /// # Returns
    ///
    /// A `Result` holding the `block_size` -bytes response. Returns an error if the mask has fewer bits than
    /// there are blocks, or if the secret doesn't tile a block.
    pub fn respond(&self, mask: &[u8], secret: &[u8]) -> Result<Vec<u8>, PIRError> {
        xor::compute_response(&self.blocks, mask, secret)
    }

    /// Responds to many queries, in parallel. Responses are in the same order as queries.
    pub fn respond_batch(&self, queries: &[(Vec<u8>, Vec<u8>)]) -> Result<Vec<Vec<u8>>, PIRError> {
        let start = Instant::now();

        let responses = queries
            .par_iter()
            .map(|(mask, secret)| self.respond(mask, secret))
            .collect::<Result<Vec<Vec<u8>>, PIRError>>()?;

        tracing::trace!(num_queries = queries.len(), num_blocks = self.num_blocks(), "Answered query batch");
        time_track(start, "respond_batch");

        Ok(responses)
    }
}

#[cfg(test)]
mod test {
    use super::Server;
    use crate::{PIRError, pir_internals::params::Params};
    use test_case::test_case;

    const BLOCK_SIZE: usize = 64;

    #[test_case(vec![vec![0u8; BLOCK_SIZE]; 4] => matches Ok(_); "Uniform blocks")]
    #[test_case(vec![] => matches Err(PIRError::EmptyBlockCollection); "No block")]
    #[test_case(vec![vec![0u8; BLOCK_SIZE], vec![0u8; BLOCK_SIZE - 1]] => matches Err(PIRError::MismatchedBufferLength); "Short block")]
    fn server_setup(blocks: Vec<Vec<u8>>) -> Result<Server, PIRError> {
        Server::setup(Params::new(BLOCK_SIZE, 2, 1).unwrap(), blocks)
    }

    #[test]
    fn batch_responses_match_single_responses() {
        let blocks = (0..10u8).map(|i| vec![i; BLOCK_SIZE]).collect::<Vec<Vec<u8>>>();
        let server = Server::setup(Params::new(BLOCK_SIZE, 2, 1).unwrap(), blocks).unwrap();

        let queries = (0..32u8).map(|i| (vec![i, i.wrapping_mul(7)], vec![i; 32])).collect::<Vec<(Vec<u8>, Vec<u8>)>>();

        let batch = server.respond_batch(&queries).expect("Server must respond to batch");
        assert_eq!(batch.len(), queries.len());

        for ((mask, secret), response) in queries.iter().zip(&batch) {
            assert_eq!(&server.respond(mask, secret).unwrap(), response);
        }

        assert_eq!(server.respond_batch(&[(vec![0xff], vec![0u8; 32])]), Err(PIRError::MaskTooShort));
    }
}
