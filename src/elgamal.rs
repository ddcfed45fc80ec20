//! ElGamal encryption of group elements, and of arbitrary byte strings through point embedding.
//!
//! The multi-recipient form produces ONE ciphertext decryptable by the sum of all recipients' private keys,
//! not one ciphertext per recipient. No single recipient can decrypt alone.

use crate::{
    group::Group,
    pir_internals::{branch_opt_util, error::PIRError, params::SECRET_SIZE},
};
use rand::TryCryptoRng;

/// Two equal-length sequences of points, one (c1, c2) pair per embedded chunk, in chunk order.
#[derive(Clone, Debug, PartialEq)]
pub struct Ciphertext<P> {
    pub c1: Vec<P>,
    pub c2: Vec<P>,
}

impl<P> Ciphertext<P> {
    #[inline(always)]
    pub fn num_chunks(&self) -> usize {
        self.c1.len()
    }

    /// Serializes as a 4 -bytes little-endian chunk count, followed by each (c1, c2) pair,
    /// every point taking `SECRET_SIZE` bytes.
    pub fn to_bytes<G: Group<Point = P>>(&self, group: &G) -> Result<Vec<u8>, PIRError> {
        if branch_opt_util::unlikely(self.c1.len() != self.c2.len()) {
            return Err(PIRError::MismatchedCiphertextLength);
        }

        let mut bytes = Vec::with_capacity(std::mem::size_of::<u32>() + 2 * SECRET_SIZE * self.num_chunks());
        bytes.extend_from_slice(&(self.num_chunks() as u32).to_le_bytes());

        for (c1, c2) in self.c1.iter().zip(&self.c2) {
            bytes.extend_from_slice(&group.marshal_point(c1));
            bytes.extend_from_slice(&group.marshal_point(c2));
        }

        Ok(bytes)
    }

    pub fn from_bytes<G: Group<Point = P>>(group: &G, bytes: &[u8]) -> Result<Ciphertext<P>, PIRError> {
        const OFFSET0: usize = 0;
        const OFFSET1: usize = OFFSET0 + std::mem::size_of::<u32>();

        if branch_opt_util::unlikely(bytes.len() < OFFSET1) {
            return Err(PIRError::MismatchedCiphertextLength);
        }

        let num_chunks = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let encoded_points = &bytes[OFFSET1..];

        if branch_opt_util::unlikely(encoded_points.len() != num_chunks * 2 * SECRET_SIZE) {
            return Err(PIRError::MismatchedCiphertextLength);
        }

        let mut c1 = Vec::with_capacity(num_chunks);
        let mut c2 = Vec::with_capacity(num_chunks);

        for pair in encoded_points.chunks_exact(2 * SECRET_SIZE) {
            let (c1_bytes, c2_bytes) = pair.split_at(SECRET_SIZE);
            c1.push(group.unmarshal_point(c1_bytes)?);
            c2.push(group.unmarshal_point(c2_bytes)?);
        }

        Ok(Ciphertext { c1, c2 })
    }
}

/// Encrypts `msg` for the aggregate of `pks`.
///
/// The message is cut into chunks, each embedded into one point. The embedding may consume a data-dependent
/// number of bytes, so chunking continues until the whole message is consumed. For every chunk a fresh
/// scalar `k` is drawn and
///
/// * `c1 = k·G`
/// * `c2 = Σ k·pk + m`
///
/// # Arguments
///
/// * `group`: The group to operate in.
/// * `msg`: Arbitrary length message. Empty message results in empty ciphertext.
/// * `pks`: Public keys of all recipients, must be non-empty.
/// * `rng`: Cryptographically secure source for ephemeral scalars and embedding.
///
/// # Returns
///
/// A `Result` holding the chunked ciphertext. Fails if there is no recipient or if randomness is unavailable.
pub fn encrypt_multi<G: Group, R: TryCryptoRng + ?Sized>(group: &G, msg: &[u8], pks: &[G::Point], rng: &mut R) -> Result<Ciphertext<G::Point>, PIRError> {
    if branch_opt_util::unlikely(pks.is_empty()) {
        return Err(PIRError::NoRecipientPublicKeys);
    }

    let mut ct = Ciphertext {
        c1: Vec::with_capacity(msg.len().div_ceil(group.embedding_capacity())),
        c2: Vec::with_capacity(msg.len().div_ceil(group.embedding_capacity())),
    };

    let mut remainder = msg;
    while !remainder.is_empty() {
        let (msg_pt, rest) = group.embed(remainder, rng)?;
        remainder = rest;

        let k = group.random_scalar(rng)?;
        let c1 = group.mul_base(&k);
        let shared = pks.iter().fold(group.identity(), |acc, pk| group.add(&acc, &group.mul(pk, &k)));
        let c2 = group.add(&shared, &msg_pt);

        ct.c1.push(c1);
        ct.c2.push(c2);
    }

    Ok(ct)
}

/// Encrypts one point for one recipient. Every call draws its own ephemeral scalar.
///
/// # Returns
///
/// A `Result` holding `(k·G, k·pk + msg_pt)`. Fails only if randomness is unavailable.
pub fn encrypt_single<G: Group, R: TryCryptoRng + ?Sized>(group: &G, msg_pt: &G::Point, pk: &G::Point, rng: &mut R) -> Result<(G::Point, G::Point), PIRError> {
    let k = group.random_scalar(rng)?;

    let c1 = group.mul_base(&k);
    let c2 = group.add(&group.mul(pk, &k), msg_pt);

    Ok((c1, c2))
}

/// Recovers `c2 - sk·c1`. For multi-recipient ciphertexts, `sk` must be the sum of all recipients' private keys.
/// Never fails, checking that the outcome is meaningful is up to the caller.
pub fn decrypt<G: Group>(group: &G, c1: &G::Point, c2: &G::Point, sk: &G::Scalar) -> G::Point {
    group.sub(c2, &group.mul(c1, sk))
}

/// Decrypts every (c1, c2) pair in order and concatenates the bytes embedded in recovered points.
pub fn decrypt_message<G: Group>(group: &G, ct: &Ciphertext<G::Point>, sk: &G::Scalar) -> Result<Vec<u8>, PIRError> {
    if branch_opt_util::unlikely(ct.c1.len() != ct.c2.len()) {
        return Err(PIRError::MismatchedCiphertextLength);
    }

    let mut msg = Vec::with_capacity(ct.num_chunks() * group.embedding_capacity());
    for (c1, c2) in ct.c1.iter().zip(&ct.c2) {
        let msg_pt = decrypt(group, c1, c2, sk);
        msg.extend_from_slice(&group.extract(&msg_pt)?);
    }

    Ok(msg)
}

#[inline]
pub fn marshal_point<G: Group>(group: &G, p: &G::Point) -> [u8; SECRET_SIZE] {
    group.marshal_point(p)
}

#[inline]
pub fn unmarshal_point<G: Group>(group: &G, bytes: &[u8]) -> Result<G::Point, PIRError> {
    group.unmarshal_point(bytes)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{group::Ristretto255, pir_internals::test_rng::FailingRng};
    use rand::prelude::*;
    use rand_chacha::{ChaCha8Rng, ChaCha20Rng};
    use test_case::test_case;

    #[test]
    fn single_recipient_encryption_can_be_decrypted() {
        const NUM_TEST_ITERATIONS: usize = 100;

        let group = Ristretto255;
        let mut rng = ChaCha20Rng::from_os_rng();

        for _ in 0..NUM_TEST_ITERATIONS {
            let (sk, pk) = group.keypair(&mut rng).unwrap();

            let mut data = [0u8; 16];
            rng.fill_bytes(&mut data);
            let (msg_pt, _) = group.embed(&data, &mut rng).unwrap();

            let (c1, c2) = encrypt_single(&group, &msg_pt, &pk, &mut rng).expect("Encryption must pass");
            assert_eq!(decrypt(&group, &c1, &c2, &sk), msg_pt);
        }
    }

    #[test]
    fn encryption_is_randomized() {
        let group = Ristretto255;
        let mut rng = ChaCha20Rng::from_os_rng();

        let (_, pk) = group.keypair(&mut rng).unwrap();
        let msg_pt = group.generator();

        let (c1_a, c2_a) = encrypt_single(&group, &msg_pt, &pk, &mut rng).unwrap();
        let (c1_b, c2_b) = encrypt_single(&group, &msg_pt, &pk, &mut rng).unwrap();

        assert_ne!(c1_a, c1_b);
        assert_ne!(c2_a, c2_b);
    }

    #[test]
    fn multi_recipient_ciphertext_needs_sum_of_private_keys() {
        const MIN_MSG_BYTE_LEN: usize = 1;
        const MAX_MSG_BYTE_LEN: usize = 256;
        const NUM_RECIPIENTS: usize = 3;

        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();

        let keys = (0..NUM_RECIPIENTS).map(|_| group.keypair(&mut rng).unwrap()).collect::<Vec<_>>();
        let pks = keys.iter().map(|(_, pk)| *pk).collect::<Vec<_>>();
        let sk_sum = keys.iter().skip(1).fold(keys[0].0, |acc, (sk, _)| group.add_scalars(&acc, sk));

        for msg_len in MIN_MSG_BYTE_LEN..=MAX_MSG_BYTE_LEN {
            let mut msg = vec![0u8; msg_len];
            rng.fill_bytes(&mut msg);

            let ct = encrypt_multi(&group, &msg, &pks, &mut rng).expect("Encryption must pass");
            assert_eq!(ct.c1.len(), ct.c2.len());
            assert_eq!(ct.num_chunks(), msg_len.div_ceil(group.embedding_capacity()));

            assert_eq!(decrypt_message(&group, &ct, &sk_sum), Ok(msg.clone()));

            // A lone recipient recovers garbage, if it recovers anything at all.
            assert_ne!(decrypt_message(&group, &ct, &keys[0].0), Ok(msg));
        }
    }

    #[test]
    fn empty_message_and_missing_recipients() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();
        let (_, pk) = group.keypair(&mut rng).unwrap();

        let ct = encrypt_multi(&group, &[], &[pk], &mut rng).expect("Empty message must be encryptable");
        assert_eq!(ct.num_chunks(), 0);

        assert_eq!(encrypt_multi(&group, b"secret", &[], &mut rng), Err(PIRError::NoRecipientPublicKeys));
    }

    #[test]
    fn unavailable_randomness_aborts_encryption() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();
        let (_, pk) = group.keypair(&mut rng).unwrap();

        assert!(matches!(
            encrypt_multi(&group, b"secret", &[pk], &mut FailingRng),
            Err(PIRError::RandomnessUnavailable(_))
        ));
        assert!(matches!(
            encrypt_single(&group, &group.generator(), &pk, &mut FailingRng),
            Err(PIRError::RandomnessUnavailable(_))
        ));
    }

    fn ciphertext_of_shape(num_c1: usize, num_c2: usize) -> Ciphertext<curve25519_dalek::ristretto::RistrettoPoint> {
        let group = Ristretto255;
        Ciphertext {
            c1: vec![group.identity(); num_c1],
            c2: vec![group.identity(); num_c2],
        }
    }

    #[test_case(2, 2 => Ok(vec![]); "Identity pairs decrypt to empty chunks")]
    #[test_case(2, 1 => Err(PIRError::MismatchedCiphertextLength); "More c1 than c2 points")]
    #[test_case(0, 1 => Err(PIRError::MismatchedCiphertextLength); "More c2 than c1 points")]
    fn decrypting_ciphertext_of_shape(num_c1: usize, num_c2: usize) -> Result<Vec<u8>, PIRError> {
        let group = Ristretto255;
        let sk = group.random_scalar(&mut ChaCha8Rng::from_os_rng()).unwrap();

        decrypt_message(&group, &ciphertext_of_shape(num_c1, num_c2), &sk)
    }

    #[test_case(1, 1 => matches Ok(_); "Equal halves serialize")]
    #[test_case(3, 2 => matches Err(PIRError::MismatchedCiphertextLength); "More c1 than c2 points")]
    #[test_case(1, 2 => matches Err(PIRError::MismatchedCiphertextLength); "More c2 than c1 points")]
    fn serializing_ciphertext_of_shape(num_c1: usize, num_c2: usize) -> Result<Vec<u8>, PIRError> {
        ciphertext_of_shape(num_c1, num_c2).to_bytes(&Ristretto255)
    }

    #[test]
    fn serialized_ciphertext_can_be_deserialized() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();

        let (sk, pk) = group.keypair(&mut rng).unwrap();
        let msg = b"a short secret which spans more than one embedded chunk";

        let ct = encrypt_multi(&group, msg, &[pk], &mut rng).unwrap();
        let ct_bytes = ct.to_bytes(&group).unwrap();
        assert_eq!(ct_bytes.len(), 4 + ct.num_chunks() * 2 * SECRET_SIZE);

        let decoded = Ciphertext::from_bytes(&group, &ct_bytes).expect("Ciphertext must be deserialized");
        assert_eq!(decoded, ct);
        assert_eq!(decrypt_message(&group, &decoded, &sk), Ok(msg.to_vec()));

        assert_eq!(Ciphertext::from_bytes(&group, &ct_bytes[..ct_bytes.len() - 1]), Err(PIRError::MismatchedCiphertextLength));
        assert_eq!(Ciphertext::from_bytes(&group, &ct_bytes[..2]), Err(PIRError::MismatchedCiphertextLength));
    }

    #[test]
    fn marshalled_point_roundtrip_through_engine() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();
        let (_, pk) = group.keypair(&mut rng).unwrap();

        let bytes = marshal_point(&group, &pk);
        assert_eq!(unmarshal_point(&group, &bytes), Ok(pk));
        assert_eq!(unmarshal_point(&group, &bytes[1..]), Err(PIRError::InvalidPointEncoding));
    }
}
