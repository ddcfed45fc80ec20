#![cfg(test)]

use rand::{CryptoRng, RngCore, TryCryptoRng, TryRngCore};
use std::io;

/// Random source which is never available, every draw fails.
pub struct FailingRng;

impl TryRngCore for FailingRng {
    type Error = io::Error;

    fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
        Err(io::Error::other("entropy source unavailable"))
    }

    fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
        Err(io::Error::other("entropy source unavailable"))
    }

    fn try_fill_bytes(&mut self, _: &mut [u8]) -> Result<(), Self::Error> {
        Err(io::Error::other("entropy source unavailable"))
    }
}

impl TryCryptoRng for FailingRng {}

/// Degenerate source repeating a single byte forever.
pub struct ConstantRng(pub u8);

impl RngCore for ConstantRng {
    fn next_u32(&mut self) -> u32 {
        u32::from_le_bytes([self.0; 4])
    }

    fn next_u64(&mut self) -> u64 {
        u64::from_le_bytes([self.0; 8])
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(self.0);
    }
}

impl CryptoRng for ConstantRng {}
