use std::{error::Error, fmt::Display};

#[derive(Debug, PartialEq)]
pub enum PIRError {
    // Parameters
    InvalidBlockSize,
    InvalidNumberOfServers,
    InvalidNumberOfRounds,

    // XOR response engine
    EmptyBuffer,
    MismatchedBufferLength,
    NonTilingSecretLength,
    EmptyBlockCollection,
    MaskTooShort,
    MismatchedShareGroupLength,
    BlockIndexOutOfRange,

    // Permutation
    InvalidPermutation,

    // Group and ElGamal
    InvalidPointEncoding,
    PointDoesNotCarryEmbeddedData,
    ExhaustedAllEmbeddingAttempts,
    NoRecipientPublicKeys,
    MismatchedCiphertextLength,
    RandomnessUnavailable(String),

    // Symmetric cipher
    InvalidSymmetricKeyLength(usize),

    // Chunker
    FailedToOpenFile(String),
    FailedToReadFile(String),
    FailedToWriteFile(String),
    MisformattedDescriptorFile { file_size: u64, hash_size: usize },

    // Round driver
    RoundDriverAlreadyStopped,
    FailedToSpawnRoundWorker(String),
    RoundWorkerPanicked(usize),
}

impl Display for PIRError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBlockSize => write!(f, "Block size must be a non-zero multiple of the blinding secret size."),
            Self::InvalidNumberOfServers => write!(f, "XOR secret sharing needs at least two servers."),
            Self::InvalidNumberOfRounds => write!(f, "At least one protocol round must run."),

            Self::EmptyBuffer => write!(f, "Buffers taking part in XOR must be non-empty."),
            Self::MismatchedBufferLength => write!(f, "All buffers taking part in XOR must have the same length."),
            Self::NonTilingSecretLength => write!(f, "Destination length must be a multiple of source length."),
            Self::EmptyBlockCollection => write!(f, "Can not compute response over an empty block collection."),
            Self::MaskTooShort => write!(f, "Selection mask must carry at least one bit per block."),
            Self::MismatchedShareGroupLength => write!(f, "Every share group must hold the same number of buffers."),
            Self::BlockIndexOutOfRange => write!(f, "Requested block index is beyond the number of blocks."),

            Self::InvalidPermutation => write!(f, "Permutation must be a bijection over as many indices as items."),

            Self::InvalidPointEncoding => write!(f, "Byte string is not a valid encoding of a group element."),
            Self::PointDoesNotCarryEmbeddedData => write!(f, "Group element does not carry embedded data."),
            Self::ExhaustedAllEmbeddingAttempts => write!(f, "Exhausted all attempts to embed data into a group element."),
            Self::NoRecipientPublicKeys => write!(f, "Encryption needs at least one recipient public key."),
            Self::MismatchedCiphertextLength => write!(f, "Ciphertext must have as many c1 points as c2 points."),
            Self::RandomnessUnavailable(e) => write!(f, "Cryptographically secure randomness unavailable: {}", e),

            Self::InvalidSymmetricKeyLength(len) => write!(f, "AES key must be 16, 24 or 32 bytes, found {} bytes.", len),

            Self::FailedToOpenFile(e) => write!(f, "Failed to open file: {}", e),
            Self::FailedToReadFile(e) => write!(f, "Failed to read file: {}", e),
            Self::FailedToWriteFile(e) => write!(f, "Failed to write file: {}", e),
            Self::MisformattedDescriptorFile { file_size, hash_size } => {
                write!(f, "Descriptor file of {} bytes is not a multiple of {} -bytes hash.", file_size, hash_size)
            }

            Self::RoundDriverAlreadyStopped => write!(f, "Round driver was already shut down."),
            Self::FailedToSpawnRoundWorker(e) => write!(f, "Failed to spawn round worker thread: {}", e),
            Self::RoundWorkerPanicked(round) => write!(f, "Worker for round {} panicked.", round),
        }
    }
}

impl Error for PIRError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
