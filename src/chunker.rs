//! Content-addressed chunking of files into fixed-size blocks.
//!
//! A file of `n` bytes is split into `ceil(n / block_size)` blocks. The final block, if short, is zero-padded
//! to `block_size` bytes both before hashing and when served, so every block the response engine sees has the
//! same length. Block identity is the group hash of the padded block.
//!
//! The descriptor of a file is the flat concatenation of its block hashes, in block order, with no header.

use crate::{
    group::Group,
    pir_internals::{
        branch_opt_util,
        error::PIRError,
        params::{HASH_SIZE, Params},
        timing::time_track,
    },
};
use std::{
    collections::HashMap,
    fs,
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
    time::Instant,
};

pub type BlockHash = [u8; HASH_SIZE];

/// Block index of a chunked file: content hash to byte offset of the block within the file.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    name: String,
    block_hashes: Vec<BlockHash>,
    hashes: HashMap<BlockHash, u64>,
}

impl File {
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[inline(always)]
    pub fn num_blocks(&self) -> usize {
        self.block_hashes.len()
    }
    /// Hash of every block, in block order.
    #[inline(always)]
    pub fn block_hashes(&self) -> &[BlockHash] {
        &self.block_hashes
    }
    /// Hash to offset mapping. Blocks with identical content share one entry, pointing at the last of them.
    #[inline(always)]
    pub fn hashes(&self) -> &HashMap<BlockHash, u64> {
        &self.hashes
    }

    pub fn offset_of(&self, hash: &BlockHash) -> Option<u64> {
        self.hashes.get(hash).copied()
    }
}

/// Chunks the file at `path` and hashes every (zero-padded) block.
///
/// # Arguments
///
/// * `group`: Supplies the hash function.
/// * `path`: File to chunk.
/// * `params`: Supplies the agreed upon block size.
///
/// # Returns
///
/// A `Result` holding the `File` index. Fails with an I/O error if the file can't be opened or fully read.
pub fn build_file<G: Group, P: AsRef<Path>>(group: &G, path: P, params: &Params) -> Result<File, PIRError> {
    let start = Instant::now();
    let path = path.as_ref();

    let mut block_hashes = Vec::new();
    let mut hashes = HashMap::new();

    for_each_block(path, params, |block_idx, block| {
        let hash = group.hash(block);

        block_hashes.push(hash);
        hashes.insert(hash, (block_idx * params.block_size()) as u64);
    })?;

    tracing::debug!(path = %path.display(), num_blocks = block_hashes.len(), block_size = params.block_size(), "Chunked file");
    time_track(start, "build_file");

    Ok(File {
        name: path.display().to_string(),
        block_hashes,
        hashes,
    })
}

/// Reads the file at `path` as a sequence of zero-padded blocks, in block order.
pub fn load_blocks<P: AsRef<Path>>(path: P, params: &Params) -> Result<Vec<Vec<u8>>, PIRError> {
    let path = path.as_ref();

    let mut blocks = Vec::new();
    for_each_block(path, params, |_, block| blocks.push(block.to_vec()))?;

    tracing::debug!(path = %path.display(), num_blocks = blocks.len(), "Loaded blocks");
    Ok(blocks)
}

/// Parses a descriptor file, i.e. concatenated `HASH_SIZE` -bytes hashes, into a mapping from each hash
/// to its implied offset `index * block_size`.
///
/// # Returns
///
/// A `Result` holding the mapping. Fails with an I/O error if the file can't be read, or with a format error
/// if file size is not a multiple of `HASH_SIZE`.
pub fn parse_descriptor<P: AsRef<Path>>(path: P, params: &Params) -> Result<HashMap<BlockHash, u64>, PIRError> {
    let path = path.as_ref();

    let file = fs::File::open(path).map_err(|e| PIRError::FailedToOpenFile(format!("{}: {}", path.display(), e)))?;
    let file_size = file.metadata().map_err(|e| PIRError::FailedToReadFile(format!("{}: {}", path.display(), e)))?.len();

    if branch_opt_util::unlikely(file_size % HASH_SIZE as u64 != 0) {
        return Err(PIRError::MisformattedDescriptorFile {
            file_size,
            hash_size: HASH_SIZE,
        });
    }

    let num_hashes = (file_size / HASH_SIZE as u64) as usize;
    let mut reader = BufReader::new(file);
    let mut hashes = HashMap::with_capacity(num_hashes);

    for hash_idx in 0..num_hashes {
        let mut hash = [0u8; HASH_SIZE];
        reader
            .read_exact(&mut hash)
            .map_err(|e| PIRError::FailedToReadFile(format!("{}: {}", path.display(), e)))?;

        hashes.insert(hash, (hash_idx * params.block_size()) as u64);
    }

    tracing::debug!(path = %path.display(), num_hashes, "Parsed descriptor");
    Ok(hashes)
}

/// Writes the descriptor of `file`, i.e. its block hashes in block order, to `path`.
pub fn write_descriptor<P: AsRef<Path>>(file: &File, path: P) -> Result<(), PIRError> {
    let path = path.as_ref();
    let map_err = |e: std::io::Error| PIRError::FailedToWriteFile(format!("{}: {}", path.display(), e));

    let mut writer = BufWriter::new(fs::File::create(path).map_err(map_err)?);
    for hash in file.block_hashes() {
        writer.write_all(hash).map_err(map_err)?;
    }
    writer.flush().map_err(map_err)
}

/// Invokes `f` with index and content of every zero-padded block of the file. The file handle is dropped,
/// hence closed, on every return path.
fn for_each_block<F: FnMut(usize, &[u8])>(path: &Path, params: &Params, mut f: F) -> Result<(), PIRError> {
    let file = fs::File::open(path).map_err(|e| PIRError::FailedToOpenFile(format!("{}: {}", path.display(), e)))?;
    let file_size = file.metadata().map_err(|e| PIRError::FailedToReadFile(format!("{}: {}", path.display(), e)))?.len();

    let block_size = params.block_size();
    let num_blocks = file_size.div_ceil(block_size as u64) as usize;

    let mut reader = BufReader::new(file);
    let mut block = vec![0u8; block_size];

    for block_idx in 0..num_blocks {
        block.fill(0);

        let num_read = read_block(&mut reader, &mut block).map_err(|e| PIRError::FailedToReadFile(format!("{}: {}", path.display(), e)))?;
        if branch_opt_util::unlikely(num_read == 0) {
            return Err(PIRError::FailedToReadFile(format!("{}: file shrank while reading block {}", path.display(), block_idx)));
        }

        f(block_idx, &block);
    }

    Ok(())
}

/// Fills `buf` from `reader` until it is full or EOF is reached, returning the number of bytes read.
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}
