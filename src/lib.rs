//! XOR-PIR: Cryptographic core of a multi-server, XOR secret-sharing based **P**rivate **I**nformation **R**etrieval (PIR) scheme.
//!
//! A file is chunked into fixed-size, content-addressed blocks and every one of `num_servers` non-colluding servers holds
//! a full copy of them. To fetch block `i`, the client XOR-shares the unit selection vector `e_i` among the servers. Each
//! server answers with the XOR of the blocks its mask share selects, blinded by a share of an all-zero secret. XOR of all
//! responses is exactly block `i`, while no strict subset of servers learns anything about `i`.
//!
//! ## Features
//!
//! * **Response engine:** Bit-packed selection masks, XOR folding of block sets and the per-server response computation.
//! * **ElGamal transport:** Multi-recipient ElGamal over Ristretto255, for shipping short secrets (e.g. query seeds or symmetric keys)
//!   to the servers, with arbitrary-length messages embedded into group elements.
//! * **Oblivious shuffling:** Uniform random permutations, sampled from any cryptographically secure random source, including a
//!   deterministic TurboSHAKE128 stream so that parties sharing a seed derive the same shuffle.
//! * **Single-use counter mode:** AES-CTR under keys which can only be used once.
//! * **Chunker:** Splits files into blocks, hashes them and (de)serializes the resulting descriptor.
//! * **Round driver:** Bounded pool of workers repeatedly running protocol rounds, with explicit shutdown.
//!
//! ## Usage
//!
//! Network transport between clients and servers is out of scope of this crate. You'll typically interact with `Client` and `Server`,
//! moving queries and responses over your own transport.
//!
//! ```toml
//! [dependencies]
//! xor_pir = "=0.1.0"
//! rand = "=0.9.0"
//! rand_chacha = "=0.9.0"
//! ```
//!
//! ```rust
//! use xor_pir::{client::Client, server::Server, Params};
//! use rand::prelude::*;
//! use rand_chacha::ChaCha8Rng;
//!
//! fn main() {
//!     const BLOCK_SIZE: usize = 64;
//!     const NUM_SERVERS: usize = 3;
//!
//!     let params = Params::new(BLOCK_SIZE, NUM_SERVERS, 1).expect("Invalid parameters");
//!     let blocks = (0..10u8).map(|i| vec![i; BLOCK_SIZE]).collect::<Vec<Vec<u8>>>();
//!
//!     // Every server holds a full copy of the blocks
//!     let servers = (0..NUM_SERVERS)
//!         .map(|_| Server::setup(params, blocks.clone()).expect("Server setup failed"))
//!         .collect::<Vec<Server>>();
//!
//!     let mut rng = ChaCha8Rng::from_os_rng();
//!     let client = Client::setup(params);
//!
//!     // One query per server, no single server learns which block is wanted
//!     let queries = client.query(7, blocks.len(), &mut rng).expect("Failed to generate query");
//!
//!     let responses = servers
//!         .iter()
//!         .zip(&queries)
//!         .map(|(server, (mask, secret))| server.respond(mask, secret).expect("Server failed to respond"))
//!         .collect::<Vec<Vec<u8>>>();
//!
//!     let block = client.reconstruct(&responses).expect("Failed to reconstruct block");
//!     assert_eq!(block, blocks[7]);
//! }
//! ```
//!
//! ## Modules
//!
//! * `server`: Contains the `Server` struct, answering queries over a block store.
//! * `client`: Contains the `Client` struct, secret-sharing queries and reconstructing blocks.
//! * `chunker`: Content-addressed chunking of files and block descriptors.
//! * `group`: Prime-order group abstraction, along with its Ristretto255 instantiation.
//! * `elgamal`: Multi-recipient ElGamal encryption of byte strings.
//! * `permutation`: Random permutations and a seeded cryptographic stream.
//! * `counter_cipher`: AES-CTR with single-use keys.
//! * `round_driver`: Worker pool driving repeated protocol rounds.

pub use pir_internals::error::PIRError;
pub use pir_internals::params::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MAX_ROUNDS, DEFAULT_NUM_SERVERS, HASH_SIZE, Params, SECRET_SIZE, SEED_BYTE_LEN,
};
pub use pir_internals::xor::{all_zero, compute_response, get_bit, mask_byte_len, membership, set_bit, slice_equals, transpose_xor, xor_all, xor_into};

pub mod chunker;
pub mod client;
pub mod counter_cipher;
pub mod elgamal;
pub mod group;
pub mod permutation;
pub mod round_driver;
pub mod server;

mod pir_internals;

mod test_pir;
