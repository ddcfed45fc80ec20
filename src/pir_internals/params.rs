use super::{branch_opt_util, error::PIRError};

pub const BIT_SECURITY_LEVEL: usize = 128;
pub const SEED_BYTE_LEN: usize = (2 * BIT_SECURITY_LEVEL) / 8;
pub const HASH_SIZE: usize = (2 * BIT_SECURITY_LEVEL) / 8;
pub const SECRET_SIZE: usize = (2 * BIT_SECURITY_LEVEL) / 8;

// Use 1KB blocks for quick local experiments, production deployments agree on 1MB.
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_NUM_SERVERS: usize = 2;
pub const DEFAULT_MAX_ROUNDS: usize = 3;

/// Parameters every client and server of a deployment must agree on, before any round starts.
/// They are never negotiated at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    block_size: usize,
    num_servers: usize,
    max_rounds: usize,
}

impl Params {
    /// Validates and bundles deployment parameters.
    ///
    /// # Arguments
    ///
    /// * `block_size` - Byte length of each content-addressed block. Must be a non-zero multiple of `SECRET_SIZE`, so that a blinding secret tiles it.
    /// * `num_servers` - Number of servers the selection mask is XOR-shared across. Must be at least 2.
    /// * `max_rounds` - Number of concurrently driven protocol rounds. Must be at least 1.
    pub fn new(block_size: usize, num_servers: usize, max_rounds: usize) -> Result<Params, PIRError> {
        if branch_opt_util::unlikely(block_size == 0 || block_size % SECRET_SIZE != 0) {
            return Err(PIRError::InvalidBlockSize);
        }
        if branch_opt_util::unlikely(num_servers < 2) {
            return Err(PIRError::InvalidNumberOfServers);
        }
        if branch_opt_util::unlikely(max_rounds == 0) {
            return Err(PIRError::InvalidNumberOfRounds);
        }

        Ok(Params {
            block_size,
            num_servers,
            max_rounds,
        })
    }

    #[inline(always)]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }
    #[inline(always)]
    pub const fn num_servers(&self) -> usize {
        self.num_servers
    }
    #[inline(always)]
    pub const fn max_rounds(&self) -> usize {
        self.max_rounds
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            block_size: DEFAULT_BLOCK_SIZE,
            num_servers: DEFAULT_NUM_SERVERS,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}
