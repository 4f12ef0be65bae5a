use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{One, Signed, Zero};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::ciphertext::Ciphertext;
use crate::functions::{generate_prime, random_coprime};

/// Minimum accepted modulus size in bits.
const MIN_BIT_SIZE: usize = 64;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("bit size too small: {0} < {1}")]
    BitSizeTooSmall(usize, usize),
    #[error("prime generation failed: {0}")]
    PrimeGeneration(String),
    #[error("malformed key encoding: {0}")]
    MalformedKey(String),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("plaintext out of range for the plaintext space")]
    InvalidPlaintext,
    #[error("randomness is not invertible modulo the key modulus")]
    InvalidRandomness,
    #[error("random number generation failed: {0}")]
    RandomNumberError(String),
    #[error("operation requires the private key")]
    MissingPrivateKey,
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("ciphertext incompatible with this key: {0}")]
    KeyMismatch(String),
}

/// Public half of a key pair: the modulus `n` and the generator `g = n + 1`.
/// Freely shareable; everything a voter or a verifier needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    #[serde(with = "crate::serde_bigint")]
    pub g: BigInt,
    #[serde(with = "crate::serde_bigint")]
    pub n: BigInt,
}

/// Private half: the totient `phi = (p - 1)(q - 1)`, known only to the
/// tallying authority. Serialized separately from the public half and
/// zeroized on drop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivateKey {
    #[serde(with = "crate::serde_bigint")]
    pub phi: BigInt,
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.phi = BigInt::zero();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl PublicKey {
    /// Parse a serialized public key record, failing closed on anything
    /// that is not a well-formed `(g, n)` pair as produced by
    /// [`KeyPair::generate`].
    pub fn from_json(encoded: &str) -> Result<Self, KeyError> {
        let key: PublicKey =
            serde_json::from_str(encoded).map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        key.validate()?;
        Ok(key)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("public key serialization")
    }

    fn validate(&self) -> Result<(), KeyError> {
        if self.n < BigInt::from(2) {
            return Err(KeyError::MalformedKey(
                "modulus must be at least 2".to_string(),
            ));
        }
        if self.g != &self.n + BigInt::one() {
            return Err(KeyError::MalformedKey(
                "generator must equal n + 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn n_squared(&self) -> BigInt {
        &self.n * &self.n
    }

    /// Encrypt `m` with fresh randomness drawn coprime to the modulus. The
    /// returned ciphertext carries its blinding factor; callers that
    /// persist the value must discard it.
    pub fn encrypt(&self, m: &BigInt) -> Result<Ciphertext, CryptoError> {
        let r = random_coprime(&self.n, &mut OsRng)
            .map_err(|e| CryptoError::RandomNumberError(e.to_string()))?;
        let value = self.encrypt_raw(m, &r)?;
        Ok(Ciphertext::with_randomness(value, r))
    }

    /// Deterministic encryption with caller-supplied randomness, used
    /// verbatim. This is how the tally engine and the verifier reproduce
    /// each other's ciphertexts bit for bit.
    pub fn encrypt_fixed(&self, m: &BigInt, r: &BigInt) -> Result<Ciphertext, CryptoError> {
        let value = self.encrypt_raw(m, r)?;
        Ok(Ciphertext::with_randomness(value, r.clone()))
    }

    fn encrypt_raw(&self, m: &BigInt, r: &BigInt) -> Result<BigInt, CryptoError> {
        if m.abs() >= self.n {
            return Err(CryptoError::InvalidPlaintext);
        }
        if r <= &BigInt::zero() || !r.gcd(&self.n).is_one() {
            return Err(CryptoError::InvalidRandomness);
        }
        let n_squared = self.n_squared();
        // Negative plaintexts land in their residue class first, so the
        // tally engine and the verifier produce identical values.
        let m = m.mod_floor(&self.n);
        let g_m = self.g.modpow(&m, &n_squared);
        let r_n = r.modpow(&self.n, &n_squared);
        Ok((g_m * r_n) % &n_squared)
    }

    /// Homomorphic addition: the product of two ciphertexts decrypts to the
    /// sum of their plaintexts. When both operands carry randomness the
    /// result carries their product modulo `n`, letting blinding be tracked
    /// algebraically through a chain of additions without decryption.
    ///
    /// Key compatibility is detected approximately, by modulus bounds.
    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext, CryptoError> {
        let n_squared = self.n_squared();
        if !a.in_group(&n_squared) {
            return Err(CryptoError::KeyMismatch(
                "left operand out of bounds".to_string(),
            ));
        }
        if !b.in_group(&n_squared) {
            return Err(CryptoError::KeyMismatch(
                "right operand out of bounds".to_string(),
            ));
        }
        let value = (&a.value * &b.value) % &n_squared;
        let randomness = match (&a.randomness, &b.randomness) {
            (Some(ra), Some(rb)) => Some((ra * rb).mod_floor(&self.n)),
            _ => None,
        };
        Ok(Ciphertext { value, randomness })
    }
}

impl PrivateKey {
    pub fn from_json(encoded: &str) -> Result<Self, KeyError> {
        let key: PrivateKey =
            serde_json::from_str(encoded).map_err(|e| KeyError::MalformedKey(e.to_string()))?;
        if key.phi <= BigInt::zero() {
            return Err(KeyError::MalformedKey(
                "totient must be positive".to_string(),
            ));
        }
        Ok(key)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("private key serialization")
    }
}

/// A key pair with an optional private half: encrypting and verifying
/// roles hold only the public part, the tallying authority holds both.
///
/// Deliberately not serializable as a unit: the halves persist separately
/// so the totient never travels with public material.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    private: Option<PrivateKey>,
}

impl KeyPair {
    /// Generate a fresh key pair from two distinct random primes of
    /// `bit_size / 2` bits each. Retries until `gcd(n, phi) == 1`, which
    /// randomness extraction requires.
    pub fn generate(bit_size: usize) -> Result<Self, KeyError> {
        if bit_size < MIN_BIT_SIZE {
            return Err(KeyError::BitSizeTooSmall(bit_size, MIN_BIT_SIZE));
        }
        let p_size = (bit_size + 1) / 2;
        let q_size = bit_size - p_size;
        loop {
            let p =
                generate_prime(p_size).map_err(|e| KeyError::PrimeGeneration(e.to_string()))?;
            let q = loop {
                let q =
                    generate_prime(q_size).map_err(|e| KeyError::PrimeGeneration(e.to_string()))?;
                if q != p {
                    break q;
                }
            };
            let n = &p * &q;
            let phi = (&p - BigInt::one()) * (&q - BigInt::one());
            if n.gcd(&phi).is_one() {
                let g = &n + BigInt::one();
                return Ok(KeyPair {
                    public: PublicKey { g, n },
                    private: Some(PrivateKey { phi }),
                });
            }
        }
    }

    /// Assemble a pair from parsed halves (the tallying-authority path).
    pub fn new(public: PublicKey, private: PrivateKey) -> Self {
        KeyPair {
            public,
            private: Some(private),
        }
    }

    /// Public-only pair for encrypting and verifying roles.
    pub fn from_public(public: PublicKey) -> Self {
        KeyPair {
            public,
            private: None,
        }
    }

    pub fn has_private(&self) -> bool {
        self.private.is_some()
    }

    /// Private half, for separate persistence by the tallying authority.
    /// `None` for public-only pairs.
    pub fn private_key(&self) -> Option<&PrivateKey> {
        self.private.as_ref()
    }

    fn private(&self) -> Result<&PrivateKey, CryptoError> {
        self.private.as_ref().ok_or(CryptoError::MissingPrivateKey)
    }

    /// Decrypt a ciphertext with the private exponent.
    pub fn decrypt(&self, ct: &Ciphertext) -> Result<BigInt, CryptoError> {
        let phi = &self.private()?.phi;
        let n = &self.public.n;
        let n_squared = self.public.n_squared();
        if !ct.in_group(&n_squared) {
            return Err(CryptoError::DecryptionFailed(
                "ciphertext out of bounds".to_string(),
            ));
        }
        if !ct.value.gcd(n).is_one() {
            return Err(CryptoError::DecryptionFailed(
                "ciphertext shares a factor with the modulus".to_string(),
            ));
        }
        let mu = phi.modinv(n).ok_or_else(|| {
            CryptoError::DecryptionFailed("totient not invertible modulo n".to_string())
        })?;
        let x = ct.value.modpow(phi, &n_squared);
        let l = (&x - BigInt::one()) / n;
        Ok((l * mu).mod_floor(n))
    }

    /// Recover the blinding factor of a ciphertext known to encrypt zero:
    /// the unique `r` with `encrypt_fixed(0, r) == ct`.
    ///
    /// Well-defined only when `ct` genuinely encrypts zero; otherwise the
    /// result is meaningless rather than an error. Callers confirm with
    /// [`KeyPair::verify_zero`].
    pub fn extract_randomness_from_zero(&self, ct: &Ciphertext) -> Result<BigInt, CryptoError> {
        let phi = &self.private()?.phi;
        let n = &self.public.n;
        let exponent = n.modinv(phi).ok_or_else(|| {
            CryptoError::DecryptionFailed("modulus not invertible modulo the totient".to_string())
        })?;
        Ok(ct.value.mod_floor(n).modpow(&exponent, n))
    }

    /// Whether `ct` encrypts zero: recover a candidate blinding factor,
    /// re-encrypt zero with it, and compare values exactly.
    pub fn verify_zero(&self, ct: &Ciphertext) -> Result<bool, CryptoError> {
        let r = self.extract_randomness_from_zero(ct)?;
        if r.is_zero() || !r.gcd(&self.public.n).is_one() {
            return Ok(false);
        }
        let reencrypted = self.public.encrypt_fixed(&BigInt::zero(), &r)?;
        Ok(reencrypted.value == ct.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1009 and 1013 are primes with gcd(n, phi) = 1, so extraction works.
    fn test_keypair() -> KeyPair {
        let p = BigInt::from(1009u32);
        let q = BigInt::from(1013u32);
        let n = &p * &q;
        let phi = (&p - BigInt::one()) * (&q - BigInt::one());
        KeyPair::new(
            PublicKey {
                g: &n + BigInt::one(),
                n,
            },
            PrivateKey { phi },
        )
    }

    #[test]
    fn test_generate() {
        let keys = KeyPair::generate(128).unwrap();
        assert_eq!(keys.public.g, &keys.public.n + BigInt::one());
        assert!(keys.has_private());
        let m = BigInt::from(42);
        let ct = keys.public.encrypt(&m).unwrap();
        assert_eq!(keys.decrypt(&ct).unwrap(), m);
    }

    #[test]
    fn test_generate_rejects_small_bit_size() {
        match KeyPair::generate(32) {
            Err(KeyError::BitSizeTooSmall(32, _)) => (),
            other => panic!("expected BitSizeTooSmall, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_round_trip() {
        let keys = test_keypair();
        for m in [0i64, 1, 2, 17, 1000] {
            let ct = keys.public.encrypt(&BigInt::from(m)).unwrap();
            assert_eq!(keys.decrypt(&ct).unwrap(), BigInt::from(m));
        }
    }

    #[test]
    fn test_negative_plaintext_lands_in_residue_class() {
        let keys = test_keypair();
        let ct = keys.public.encrypt(&BigInt::from(-5)).unwrap();
        let expected = &keys.public.n - BigInt::from(5);
        assert_eq!(keys.decrypt(&ct).unwrap(), expected);
    }

    #[test]
    fn test_encrypt_fixed_is_deterministic() {
        let keys = test_keypair();
        let m = BigInt::from(7);
        let r = BigInt::from(123);
        let a = keys.public.encrypt_fixed(&m, &r).unwrap();
        let b = keys.public.encrypt_fixed(&m, &r).unwrap();
        assert_eq!(a.value, b.value);
        assert_eq!(a.randomness, Some(r));
    }

    #[test]
    fn test_fresh_randomness_differs() {
        let keys = test_keypair();
        let m = BigInt::from(1);
        let a = keys.public.encrypt(&m).unwrap();
        let b = keys.public.encrypt(&m).unwrap();
        assert_ne!(a.value, b.value, "blinding factors were reused");
    }

    #[test]
    fn test_invalid_plaintext() {
        let keys = test_keypair();
        let n = keys.public.n.clone();
        assert!(matches!(
            keys.public.encrypt(&n),
            Err(CryptoError::InvalidPlaintext)
        ));
        assert!(matches!(
            keys.public.encrypt(&(-&n)),
            Err(CryptoError::InvalidPlaintext)
        ));
        assert!(keys.public.encrypt(&(&n - BigInt::one())).is_ok());
    }

    #[test]
    fn test_invalid_randomness() {
        let keys = test_keypair();
        // 1009 divides n, so it is not invertible.
        assert!(matches!(
            keys.public.encrypt_fixed(&BigInt::one(), &BigInt::from(1009)),
            Err(CryptoError::InvalidRandomness)
        ));
        assert!(matches!(
            keys.public.encrypt_fixed(&BigInt::one(), &BigInt::zero()),
            Err(CryptoError::InvalidRandomness)
        ));
    }

    #[test]
    fn test_homomorphic_addition() {
        let keys = test_keypair();
        let a = keys.public.encrypt(&BigInt::from(42)).unwrap();
        let b = keys.public.encrypt(&BigInt::from(58)).unwrap();
        let sum = keys.public.add(&a, &b).unwrap();
        assert_eq!(keys.decrypt(&sum).unwrap(), BigInt::from(100));
    }

    #[test]
    fn test_addition_tracks_randomness() {
        let keys = test_keypair();
        let a = keys.public.encrypt_fixed(&BigInt::from(2), &BigInt::from(3)).unwrap();
        let b = keys.public.encrypt_fixed(&BigInt::from(7), &BigInt::from(5)).unwrap();
        let sum = keys.public.add(&a, &b).unwrap();
        assert_eq!(sum.randomness, Some(BigInt::from(15)));
        // Re-encrypting under the tracked randomness reproduces the value.
        let reencrypted = keys
            .public
            .encrypt_fixed(&BigInt::from(9), &BigInt::from(15))
            .unwrap();
        assert_eq!(sum.value, reencrypted.value);
    }

    #[test]
    fn test_addition_without_randomness_carries_none() {
        let keys = test_keypair();
        let a = keys.public.encrypt(&BigInt::from(2)).unwrap().into_public();
        let b = keys.public.encrypt(&BigInt::from(3)).unwrap();
        let sum = keys.public.add(&a, &b).unwrap();
        assert_eq!(sum.randomness, None);
    }

    #[test]
    fn test_add_rejects_out_of_group_operand() {
        let keys = test_keypair();
        let good = keys.public.encrypt(&BigInt::from(1)).unwrap();
        let bad = Ciphertext::new(keys.public.n_squared() + BigInt::one());
        assert!(matches!(
            keys.public.add(&good, &bad),
            Err(CryptoError::KeyMismatch(_))
        ));
        let negative = Ciphertext::new(BigInt::from(-1));
        assert!(matches!(
            keys.public.add(&negative, &good),
            Err(CryptoError::KeyMismatch(_))
        ));
    }

    #[test]
    fn test_decrypt_requires_private_key() {
        let keys = test_keypair();
        let ct = keys.public.encrypt(&BigInt::from(9)).unwrap();
        let public_only = KeyPair::from_public(keys.public.clone());
        assert!(matches!(
            public_only.decrypt(&ct),
            Err(CryptoError::MissingPrivateKey)
        ));
        assert!(matches!(
            public_only.extract_randomness_from_zero(&ct),
            Err(CryptoError::MissingPrivateKey)
        ));
    }

    #[test]
    fn test_decrypt_rejects_malformed_ciphertext() {
        let keys = test_keypair();
        assert!(matches!(
            keys.decrypt(&Ciphertext::new(BigInt::zero())),
            Err(CryptoError::DecryptionFailed(_))
        ));
        assert!(matches!(
            keys.decrypt(&Ciphertext::new(keys.public.n_squared())),
            Err(CryptoError::DecryptionFailed(_))
        ));
        // n itself is in bounds but shares a factor with the modulus.
        assert!(matches!(
            keys.decrypt(&Ciphertext::new(keys.public.n.clone())),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_extract_randomness_from_zero() {
        let keys = test_keypair();
        let r = BigInt::from(271);
        let ct = keys.public.encrypt_fixed(&BigInt::zero(), &r).unwrap();
        assert_eq!(keys.extract_randomness_from_zero(&ct).unwrap(), r);
    }

    #[test]
    fn test_verify_zero_soundness() {
        let keys = test_keypair();
        let zero = keys.public.encrypt(&BigInt::zero()).unwrap();
        assert!(keys.verify_zero(&zero).unwrap());
        let nonzero = keys.public.encrypt(&BigInt::from(3)).unwrap();
        assert!(!keys.verify_zero(&nonzero).unwrap());
    }

    #[test]
    fn test_public_key_json_round_trip() {
        let keys = test_keypair();
        let encoded = keys.public.to_json();
        let decoded = PublicKey::from_json(&encoded).unwrap();
        assert_eq!(decoded, keys.public);
    }

    #[test]
    fn test_public_key_parsing_fails_closed() {
        assert!(PublicKey::from_json("not json").is_err());
        assert!(PublicKey::from_json(r#"{"g":"12","n":"ten"}"#).is_err());
        // Generator must be n + 1.
        assert!(matches!(
            PublicKey::from_json(r#"{"g":"17","n":"21"}"#),
            Err(KeyError::MalformedKey(_))
        ));
        assert!(PublicKey::from_json(r#"{"g":"2","n":"1"}"#).is_err());
        assert!(PublicKey::from_json(r#"{"g":"22","n":"21"}"#).is_ok());
    }

    #[test]
    fn test_private_key_json_round_trip() {
        let private = PrivateKey {
            phi: BigInt::from(1020096),
        };
        let decoded = PrivateKey::from_json(&private.to_json()).unwrap();
        assert_eq!(decoded.phi, private.phi);
        assert!(PrivateKey::from_json(r#"{"phi":"0"}"#).is_err());
        assert!(PrivateKey::from_json(r#"{"phi":"-3"}"#).is_err());
    }

    #[test]
    fn test_private_key_zeroize() {
        let mut private = PrivateKey {
            phi: BigInt::from(123456),
        };
        private.zeroize();
        assert_eq!(private.phi, BigInt::zero());
    }
}
