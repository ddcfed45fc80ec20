#![cfg(test)]

use crate::{
    SEED_BYTE_LEN,
    chunker::{self, BlockHash},
    client::Client,
    counter_cipher::{SingleUseKey, counter_encrypt},
    elgamal::{self, Ciphertext},
    group::{Group, Ristretto255},
    permutation::{SeededStream, apply_permutation, generate_permutation, invert_permutation},
    pir_internals::params::Params,
    server::Server,
};
use rand::prelude::*;
use rand_chacha::{ChaCha8Rng, ChaCha20Rng};
use std::{fs, path::Path};
use tempfile::tempdir;

const BLOCK_SIZE: usize = 256;

fn write_random_file(path: &Path, byte_len: usize, rng: &mut ChaCha8Rng) {
    let mut content = vec![0u8; byte_len];
    rng.fill_bytes(&mut content);
    fs::write(path, content).unwrap();
}

#[test]
fn test_block_retrieval_by_content_hash() {
    const NUM_SERVERS: usize = 3;
    const FILE_BYTE_LEN: usize = 37 * BLOCK_SIZE + 101;

    let dir = tempdir().unwrap();
    let path = dir.path().join("content.bin");
    let desc_path = dir.path().join("content.desc");

    let mut rng = ChaCha8Rng::from_os_rng();
    write_random_file(&path, FILE_BYTE_LEN, &mut rng);

    let group = Ristretto255;
    let params = Params::new(BLOCK_SIZE, NUM_SERVERS, 1).unwrap();

    // Offline phase: publisher chunks the file and publishes its descriptor, servers load the blocks
    let file = chunker::build_file(&group, &path, &params).expect("Chunking failed");
    chunker::write_descriptor(&file, &desc_path).expect("Writing descriptor failed");

    let servers = (0..NUM_SERVERS)
        .map(|_| Server::setup_from_file(params, &path).expect("Server setup failed"))
        .collect::<Vec<Server>>();

    // Online phase: client fetches every block, addressed by its hash
    let client = Client::setup(params);
    let descriptor = chunker::parse_descriptor(&desc_path, &params).expect("Parsing descriptor failed");

    let original = fs::read(&path).unwrap();
    let mut fetched = Vec::with_capacity(file.num_blocks() * BLOCK_SIZE);

    for hash in file.block_hashes() {
        let index = client.locate(hash, &descriptor).expect("Hash must be in descriptor");
        let queries = client.query(index, servers[0].num_blocks(), &mut rng).expect("Query generation failed");

        let responses = servers
            .iter()
            .zip(&queries)
            .map(|(server, (mask, secret))| server.respond(mask, secret).expect("Server can't respond"))
            .collect::<Vec<Vec<u8>>>();

        let block = client.reconstruct(&responses).expect("Client can't reconstruct block");
        assert_eq!(&group.hash(&block), hash);

        fetched.extend_from_slice(&block);
    }

    assert_eq!(fetched.len(), file.num_blocks() * BLOCK_SIZE);
    assert_eq!(&fetched[..original.len()], &original[..]);
    assert!(fetched[original.len()..].iter().all(|&byte| byte == 0));
}

#[test]
fn test_retrieval_from_shuffled_block_store() {
    const NUM_SERVERS: usize = 2;
    const NUM_BLOCKS: usize = 50;

    let mut rng = ChaCha8Rng::from_os_rng();

    let blocks = (0..NUM_BLOCKS)
        .map(|_| {
            let mut block = vec![0u8; BLOCK_SIZE];
            rng.fill_bytes(&mut block);
            block
        })
        .collect::<Vec<Vec<u8>>>();

    // Client and servers agree on a seed, hence on the shuffle
    let mut seed = [0u8; SEED_BYTE_LEN];
    rng.fill_bytes(&mut seed);

    let pi = generate_permutation(NUM_BLOCKS, &mut SeededStream::new(&seed)).unwrap();
    let shuffled = apply_permutation(&pi, &blocks).unwrap();

    let params = Params::new(BLOCK_SIZE, NUM_SERVERS, 1).unwrap();
    let servers = (0..NUM_SERVERS)
        .map(|_| Server::setup(params, shuffled.clone()).unwrap())
        .collect::<Vec<Server>>();

    let client = Client::setup(params);
    let client_pi = generate_permutation(NUM_BLOCKS, &mut SeededStream::new(&seed)).unwrap();
    let position_of = invert_permutation(&client_pi).unwrap();

    for (index, block) in blocks.iter().enumerate() {
        let queries = client.query(position_of[index], NUM_BLOCKS, &mut rng).unwrap();

        let responses = servers
            .iter()
            .map(|server| server.respond_batch(&queries[..]).unwrap())
            .enumerate()
            .map(|(server_idx, mut batch)| batch.swap_remove(server_idx))
            .collect::<Vec<Vec<u8>>>();

        assert_eq!(&client.reconstruct(&responses).unwrap(), block);
    }
}

#[test]
fn test_encrypted_query_and_response_transport() {
    const NUM_SERVERS: usize = 2;
    const NUM_BLOCKS: usize = 20;
    const NUM_TEST_ITERATIONS: usize = 8;

    let group = Ristretto255;
    let mut rng = ChaCha20Rng::from_os_rng();

    let blocks = (0..NUM_BLOCKS as u8).map(|i| vec![i.wrapping_mul(13); BLOCK_SIZE]).collect::<Vec<Vec<u8>>>();
    let params = Params::new(BLOCK_SIZE, NUM_SERVERS, 1).unwrap();

    let servers = (0..NUM_SERVERS)
        .map(|_| {
            let keys = group.keypair(&mut rng).unwrap();
            (Server::setup(params, blocks.clone()).unwrap(), keys)
        })
        .collect::<Vec<_>>();

    let client = Client::setup(params);

    for _ in 0..NUM_TEST_ITERATIONS {
        let target = rng.random_range(0..NUM_BLOCKS);
        let queries = client.query(target, NUM_BLOCKS, &mut rng).unwrap();

        let mut responses = Vec::with_capacity(NUM_SERVERS);

        for ((server, (sk, pk)), (mask, secret)) in servers.iter().zip(&queries) {
            // Query, along with a fresh session seed, travels ElGamal encrypted under the server's public key
            let mut session_seed = [0u8; SEED_BYTE_LEN];
            rng.fill_bytes(&mut session_seed);

            let payload = [mask.as_slice(), secret.as_slice(), &session_seed[..]].concat();
            let wire = elgamal::encrypt_multi(&group, &payload, &[*pk], &mut rng).unwrap().to_bytes(&group).unwrap();

            // Server side
            let received = Ciphertext::from_bytes(&group, &wire).unwrap();
            let plaintext = elgamal::decrypt_message(&group, &received, sk).unwrap();
            assert_eq!(plaintext, payload);

            let (received_mask, rest) = plaintext.split_at(mask.len());
            let (received_secret, received_seed) = rest.split_at(secret.len());
            let received_seed: [u8; SEED_BYTE_LEN] = received_seed.try_into().unwrap();

            let response = server.respond(received_mask, received_secret).unwrap();
            let encrypted_response = counter_encrypt(SingleUseKey::derive(&received_seed, b"response"), &response).unwrap();

            // Client side
            let response = counter_encrypt(SingleUseKey::derive(&session_seed, b"response"), &encrypted_response).unwrap();
            responses.push(response);
        }

        assert_eq!(client.reconstruct(&responses).unwrap(), blocks[target]);
    }
}

#[test]
fn test_single_server_view_is_independent_of_target() {
    const NUM_BLOCKS: usize = 16;
    const NUM_SAMPLES: usize = 4096;

    let params = Params::new(BLOCK_SIZE, 2, 1).unwrap();
    let client = Client::setup(params);
    let mut rng = ChaCha8Rng::from_os_rng();

    // Every bit of the first server's mask must be set about half of the time, whichever block is wanted
    for target in [0, NUM_BLOCKS / 2, NUM_BLOCKS - 1] {
        let mut set_counts = [0usize; NUM_BLOCKS];

        for _ in 0..NUM_SAMPLES {
            let masks = client.share_mask(target, NUM_BLOCKS, &mut rng).unwrap();
            for (idx, count) in set_counts.iter_mut().enumerate() {
                *count += crate::get_bit(&masks[0], idx) as usize;
            }
        }

        assert!(set_counts.iter().all(|&count| count > NUM_SAMPLES / 2 - NUM_SAMPLES / 8 && count < NUM_SAMPLES / 2 + NUM_SAMPLES / 8));
    }
}

#[test]
fn test_descriptor_hashes_match_served_blocks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("content.bin");

    let mut rng = ChaCha8Rng::from_os_rng();
    write_random_file(&path, 9 * BLOCK_SIZE + 1, &mut rng);

    let group = Ristretto255;
    let params = Params::new(BLOCK_SIZE, 2, 1).unwrap();

    let file = chunker::build_file(&group, &path, &params).unwrap();
    let blocks = chunker::load_blocks(&path, &params).unwrap();

    let hashes = blocks.iter().map(|block| group.hash(block)).collect::<Vec<BlockHash>>();
    assert_eq!(file.block_hashes(), &hashes[..]);
}
