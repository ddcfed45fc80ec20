use divan;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::{fs, path::Path, time::Duration};
use tempfile::tempdir;
use xor_pir::{
    Params, chunker,
    group::Ristretto255,
    permutation::{SeededStream, apply_permutation, generate_permutation},
    server::Server,
};

fn main() {
    divan::main();
}

fn write_random_file(rng: &mut ChaCha8Rng, path: &Path, byte_len: usize) {
    assert!(byte_len > 0);

    let mut content = vec![0u8; byte_len];
    rng.fill_bytes(&mut content);
    fs::write(path, content).unwrap();
}

#[derive(Debug)]
struct FileConfig {
    file_byte_len: usize,
    block_size: usize,
}

const ARGS: &[FileConfig] = &[
    FileConfig {
        file_byte_len: 1usize << 20,
        block_size: 1usize << 12,
    },
    FileConfig {
        file_byte_len: (1usize << 24) + 1,
        block_size: 1usize << 20,
    },
];

#[divan::bench(args = ARGS, max_time = Duration::from_secs(100), skip_ext_time = true)]
fn chunk_file(bencher: divan::Bencher, file_config: &FileConfig) {
    let mut rng = ChaCha8Rng::from_os_rng();

    let dir = tempdir().unwrap();
    let path = dir.path().join("content.bin");
    write_random_file(&mut rng, &path, file_config.file_byte_len);

    let params = Params::new(file_config.block_size, 2, 1).unwrap();
    bencher.bench(|| chunker::build_file(&Ristretto255, divan::black_box(&path), &params));
}

#[divan::bench(args = ARGS, max_time = Duration::from_secs(100), skip_ext_time = true)]
fn server_setup(bencher: divan::Bencher, file_config: &FileConfig) {
    let mut rng = ChaCha8Rng::from_os_rng();

    let dir = tempdir().unwrap();
    let path = dir.path().join("content.bin");
    write_random_file(&mut rng, &path, file_config.file_byte_len);

    let params = Params::new(file_config.block_size, 2, 1).unwrap();
    bencher.bench(|| Server::setup_from_file(params, divan::black_box(&path)));
}

const NUM_BLOCKS: [usize; 3] = [1usize << 8, 1usize << 12, 1usize << 16];

#[divan::bench(consts = NUM_BLOCKS, max_time = Duration::from_secs(100), skip_ext_time = true)]
fn shuffle_blocks<const N: usize>(bencher: divan::Bencher) {
    let mut rng = ChaCha8Rng::from_os_rng();

    let mut seed = [0u8; xor_pir::SEED_BYTE_LEN];
    rng.fill_bytes(&mut seed);

    let block_ids = (0..N).collect::<Vec<usize>>();

    bencher.bench(|| {
        let pi = generate_permutation(N, &mut SeededStream::new(divan::black_box(&seed))).unwrap();
        apply_permutation(&pi, divan::black_box(&block_ids))
    });
}
