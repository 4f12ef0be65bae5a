use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// A Paillier ciphertext: a value in the group modulo `n^2`, plus the
/// blinding factor while the holder that chose it is still working with it.
///
/// Randomness is transient by design. Voter ballots never carry it; the
/// tally artifacts either publish it separately (`zero_randomness`) or fix
/// it by protocol (`negative_total` uses the constant 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    #[serde(rename = "ciphertext", with = "crate::serde_bigint")]
    pub value: BigInt,
    #[serde(default, with = "crate::serde_bigint::opt")]
    pub randomness: Option<BigInt>,
}

impl Ciphertext {
    pub fn new(value: BigInt) -> Self {
        Ciphertext {
            value,
            randomness: None,
        }
    }

    pub fn with_randomness(value: BigInt, randomness: BigInt) -> Self {
        Ciphertext {
            value,
            randomness: Some(randomness),
        }
    }

    /// Drop the transient blinding factor, keeping only the public value.
    pub fn into_public(self) -> Self {
        Ciphertext {
            value: self.value,
            randomness: None,
        }
    }

    /// Whether `value` lies within the ciphertext group bounds for a key
    /// with the given `n_squared`.
    pub(crate) fn in_group(&self, n_squared: &BigInt) -> bool {
        self.value > BigInt::zero() && &self.value < n_squared
    }
}
