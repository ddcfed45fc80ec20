//! Prime-order group capability consumed by the ElGamal engine and the chunker.
//!
//! Nothing in this crate reaches for a process-wide group or random source; a `Group`
//! implementation and a cryptographically secure RNG are handed to every operation which needs them.

use crate::pir_internals::{
    branch_opt_util,
    error::PIRError,
    params::{HASH_SIZE, SECRET_SIZE},
};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
    traits::Identity,
};
use rand::TryCryptoRng;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

/// Fills `buf` from a cryptographically secure source. A failing source aborts the caller's
/// operation, there is no fallback to a weaker generator.
pub(crate) fn fill_random<R: TryCryptoRng + ?Sized>(rng: &mut R, buf: &mut [u8]) -> Result<(), PIRError> {
    rng.try_fill_bytes(buf).map_err(|e| PIRError::RandomnessUnavailable(e.to_string()))
}

pub trait Group: Send + Sync {
    type Scalar: Clone + Send + Sync;
    type Point: Clone + PartialEq + Debug + Send + Sync;

    fn generator(&self) -> Self::Point;
    fn identity(&self) -> Self::Point;

    fn add(&self, a: &Self::Point, b: &Self::Point) -> Self::Point;
    fn sub(&self, a: &Self::Point, b: &Self::Point) -> Self::Point;
    fn mul(&self, p: &Self::Point, k: &Self::Scalar) -> Self::Point;
    fn add_scalars(&self, a: &Self::Scalar, b: &Self::Scalar) -> Self::Scalar;

    fn mul_base(&self, k: &Self::Scalar) -> Self::Point {
        self.mul(&self.generator(), k)
    }

    /// Samples a uniform random scalar.
    fn random_scalar<R: TryCryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Self::Scalar, PIRError>;

    /// Maximum number of message bytes `embed` packs into a single point.
    fn embedding_capacity(&self) -> usize;

    /// Reversibly embeds a prefix of `data` into a group element.
    ///
    /// # Returns
    ///
    /// * `Result<(Self::Point, &[u8]), PIRError>` - The point carrying the prefix and the bytes of `data` still left to embed.
    fn embed<'a, R: TryCryptoRng + ?Sized>(&self, data: &'a [u8], rng: &mut R) -> Result<(Self::Point, &'a [u8]), PIRError>;

    /// Recovers the bytes `embed` packed into `p`.
    fn extract(&self, p: &Self::Point) -> Result<Vec<u8>, PIRError>;

    fn marshal_point(&self, p: &Self::Point) -> [u8; SECRET_SIZE];
    fn unmarshal_point(&self, bytes: &[u8]) -> Result<Self::Point, PIRError>;

    fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE];

    /// Samples a private key `sk` and returns it along with public key `sk·G`.
    fn keypair<R: TryCryptoRng + ?Sized>(&self, rng: &mut R) -> Result<(Self::Scalar, Self::Point), PIRError> {
        let sk = self.random_scalar(rng)?;
        let pk = self.mul_base(&sk);
        Ok((sk, pk))
    }
}

/// Ristretto group over Curve25519, paired with SHA-256 for content hashing.
///
/// Data is embedded into the 32 -bytes canonical point encoding: byte 0 holds the embedded length
/// shifted left by one (so that the encoding stays non-negative), the following bytes carry data and
/// the tail is random. Random tails are resampled until the candidate decodes to a valid point, for a bounded
/// number of attempts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ristretto255;

impl Ristretto255 {
    const EMBED_CAPACITY: usize = SECRET_SIZE - 3;
    /// About one in four random candidates decodes, a cryptographically secure source never realistically exhausts this.
    const EMBED_MAX_ATTEMPT_COUNT: usize = 1024;
}

impl Group for Ristretto255 {
    type Scalar = Scalar;
    type Point = RistrettoPoint;

    fn generator(&self) -> RistrettoPoint {
        curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT
    }

    fn identity(&self) -> RistrettoPoint {
        RistrettoPoint::identity()
    }

    fn add(&self, a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
        a + b
    }

    fn sub(&self, a: &RistrettoPoint, b: &RistrettoPoint) -> RistrettoPoint {
        a - b
    }

    fn mul(&self, p: &RistrettoPoint, k: &Scalar) -> RistrettoPoint {
        p * k
    }

    fn add_scalars(&self, a: &Scalar, b: &Scalar) -> Scalar {
        a + b
    }

    fn mul_base(&self, k: &Scalar) -> RistrettoPoint {
        RistrettoPoint::mul_base(k)
    }

    fn random_scalar<R: TryCryptoRng + ?Sized>(&self, rng: &mut R) -> Result<Scalar, PIRError> {
        let mut wide = [0u8; 64];
        fill_random(rng, &mut wide)?;
        Ok(Scalar::from_bytes_mod_order_wide(&wide))
    }

    fn embedding_capacity(&self) -> usize {
        Self::EMBED_CAPACITY
    }

    fn embed<'a, R: TryCryptoRng + ?Sized>(&self, data: &'a [u8], rng: &mut R) -> Result<(RistrettoPoint, &'a [u8]), PIRError> {
        let embed_len = data.len().min(Self::EMBED_CAPACITY);
        let (head, rest) = data.split_at(embed_len);

        let mut candidate = [0u8; SECRET_SIZE];
        for _ in 0..Self::EMBED_MAX_ATTEMPT_COUNT {
            fill_random(rng, &mut candidate)?;

            candidate[0] = (embed_len as u8) << 1;
            candidate[1..=embed_len].copy_from_slice(head);
            candidate[SECRET_SIZE - 1] &= 0x7f;

            if let Some(point) = CompressedRistretto(candidate).decompress() {
                return Ok((point, rest));
            }
        }

        branch_opt_util::cold();
        Err(PIRError::ExhaustedAllEmbeddingAttempts)
    }

    fn extract(&self, p: &RistrettoPoint) -> Result<Vec<u8>, PIRError> {
        let encoded = p.compress().to_bytes();
        let embed_len = (encoded[0] >> 1) as usize;

        if branch_opt_util::unlikely(embed_len > Self::EMBED_CAPACITY) {
            return Err(PIRError::PointDoesNotCarryEmbeddedData);
        }

        Ok(encoded[1..=embed_len].to_vec())
    }

    fn marshal_point(&self, p: &RistrettoPoint) -> [u8; SECRET_SIZE] {
        p.compress().to_bytes()
    }

    fn unmarshal_point(&self, bytes: &[u8]) -> Result<RistrettoPoint, PIRError> {
        let encoded: [u8; SECRET_SIZE] = bytes.try_into().map_err(|_| PIRError::InvalidPointEncoding)?;
        CompressedRistretto(encoded).decompress().ok_or(PIRError::InvalidPointEncoding)
    }

    fn hash(&self, data: &[u8]) -> [u8; HASH_SIZE] {
        let digest = Sha256::digest(data);

        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&digest);
        hash
    }
}

#[cfg(test)]
mod test {
    use super::{Group, Ristretto255};
    use crate::{
        PIRError,
        pir_internals::{
            params::SECRET_SIZE,
            test_rng::{ConstantRng, FailingRng},
        },
    };
    use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, traits::Identity};
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;
    use test_case::test_case;

    #[test]
    fn marshalled_point_can_be_unmarshalled() {
        const NUM_TEST_ITERATIONS: usize = 100;

        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();

        for _ in 0..NUM_TEST_ITERATIONS {
            let k = group.random_scalar(&mut rng).expect("Must be able to sample scalar");
            let p = group.mul_base(&k);

            let bytes = group.marshal_point(&p);
            assert_eq!(bytes.len(), SECRET_SIZE);
            assert_eq!(group.unmarshal_point(&bytes), Ok(p));
        }
    }

    #[test_case(&[0u8; SECRET_SIZE - 1] => matches Err(PIRError::InvalidPointEncoding); "Truncated encoding")]
    #[test_case(&[0u8; SECRET_SIZE + 1] => matches Err(PIRError::InvalidPointEncoding); "Overlong encoding")]
    #[test_case(&[0xffu8; SECRET_SIZE] => matches Err(PIRError::InvalidPointEncoding); "Non-canonical encoding")]
    #[test_case(&[0u8; SECRET_SIZE] => matches Ok(_); "All zero bytes encode the identity")]
    fn unmarshalling_malformed_points(bytes: &[u8]) -> Result<curve25519_dalek::ristretto::RistrettoPoint, PIRError> {
        Ristretto255.unmarshal_point(bytes)
    }

    #[test]
    fn embedded_data_can_be_extracted() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();

        for data_len in 0..=(2 * group.embedding_capacity()) {
            let mut data = vec![0u8; data_len];
            rng.fill_bytes(&mut data);

            let (point, rest) = group.embed(&data, &mut rng).expect("Must be able to embed data");
            let consumed = data_len.min(group.embedding_capacity());

            assert_eq!(rest, &data[consumed..]);
            assert_eq!(group.extract(&point), Ok(data[..consumed].to_vec()));
        }
    }

    #[test]
    fn embedding_gives_up_when_no_candidate_decodes() {
        // Filling with 0x02 yields the candidate 0x00 || 0x02^31, which is not a valid encoding.
        assert_eq!(Ristretto255.embed(&[], &mut ConstantRng(0x02)), Err(PIRError::ExhaustedAllEmbeddingAttempts));
    }

    #[test_case(RISTRETTO_BASEPOINT_POINT => Err(PIRError::PointDoesNotCarryEmbeddedData); "Generator encoding has first byte 0xe2")]
    #[test_case(RistrettoPoint::identity() => Ok(vec![]); "Identity carries empty data")]
    fn extracting_embedded_data(p: RistrettoPoint) -> Result<Vec<u8>, PIRError> {
        Ristretto255.extract(&p)
    }

    #[test]
    fn unavailable_randomness_aborts_sampling() {
        let group = Ristretto255;

        assert!(matches!(group.random_scalar(&mut FailingRng), Err(PIRError::RandomnessUnavailable(_))));
        assert!(matches!(group.keypair(&mut FailingRng), Err(PIRError::RandomnessUnavailable(_))));
        assert!(matches!(group.embed(b"data", &mut FailingRng), Err(PIRError::RandomnessUnavailable(_))));
    }

    #[test]
    fn keypair_public_key_matches_private_key() {
        let group = Ristretto255;
        let mut rng = ChaCha8Rng::from_os_rng();

        let (sk, pk) = group.keypair(&mut rng).unwrap();
        assert_eq!(pk, group.mul(&group.generator(), &sk));
        assert_eq!(group.sub(&pk, &pk), group.identity());
    }

    #[test]
    fn hash_is_sha256() {
        // SHA-256("abc"), FIPS 180-2 appendix B.1
        let expected = [
            0xba, 0x78, 0x16, 0xbf, 0x8f, 0x01, 0xcf, 0xea, 0x41, 0x41, 0x40, 0xde, 0x5d, 0xae, 0x22, 0x23, 0xb0, 0x03, 0x61, 0xa3, 0x96, 0x17, 0x7a, 0x9c, 0xb4, 0x10, 0xff, 0x61, 0xf2, 0x00,
            0x15, 0xad,
        ];
        assert_eq!(Ristretto255.hash(b"abc"), expected);
    }
}
