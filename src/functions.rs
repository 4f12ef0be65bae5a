use num_bigint::{BigInt, Sign};
use num_integer::Integer as _;
use num_traits::{One, Zero};
use rand::{rngs::OsRng, RngCore};
use rug::{integer::Order, rand::RandState, Integer};
use sha2::{Digest, Sha256};
use std::convert::TryInto;
use thiserror::Error;

const PRIME_TEST_ROUNDS: u32 = 40;

#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("random number generation failed")]
    RandomNumberGeneration,
    #[error("invalid bit length")]
    InvalidBitLength,
}

/// Uniform random integer in `[0, n)`.
pub fn random_mod(n: &BigInt, rng: &mut impl RngCore) -> Result<BigInt, FunctionError> {
    if n <= &BigInt::zero() {
        return Err(FunctionError::RandomNumberGeneration);
    }
    let mut bytes = vec![0u8; (n.bits() as usize + 7) / 8];
    let mut result;
    loop {
        rng.fill_bytes(&mut bytes);
        result = BigInt::from_bytes_be(Sign::Plus, &bytes);
        if result < *n {
            break;
        }
    }
    Ok(result)
}

/// Uniform random integer in `(0, n)` coprime to `n`.
///
/// This is the blinding-factor sampler: the gcd filter keeps the value
/// invertible modulo `n`, which encryption requires.
pub fn random_coprime(n: &BigInt, rng: &mut impl RngCore) -> Result<BigInt, FunctionError> {
    loop {
        let r = random_mod(n, rng)?;
        if !r.is_zero() && r.gcd(n).is_one() {
            return Ok(r);
        }
    }
}

/// Random probable prime of exactly `bit_len` bits.
pub fn generate_prime(bit_len: usize) -> Result<BigInt, FunctionError> {
    if bit_len < 2 {
        return Err(FunctionError::InvalidBitLength);
    }
    let bit_len_u32: u32 =
        TryInto::<u32>::try_into(bit_len).map_err(|_| FunctionError::InvalidBitLength)?;
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    let mut rand_state = RandState::new();
    rand_state.seed(&Integer::from_digits(&seed, Order::Msf));
    loop {
        let mut p: Integer = Integer::random_bits(bit_len_u32, &mut rand_state).into();
        p.set_bit(bit_len_u32 - 1, true);
        p = p.next_prime();
        if p.significant_bits() == bit_len_u32
            && p.is_probably_prime(PRIME_TEST_ROUNDS) != rug::integer::IsPrime::No
        {
            return Ok(BigInt::from_bytes_be(
                Sign::Plus,
                &p.to_digits::<u8>(Order::Msf),
            ));
        }
    }
}

/// SHA-256 of `data` as a lowercase hex string. Used for ballot receipts;
/// not part of the homomorphic scheme.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
