pub mod branch_opt_util;
pub mod error;
pub mod params;
pub mod test_rng;
pub mod timing;
pub mod xor;
