//! Decimal-string serde adapters for big integers.
//!
//! Every persisted integer (keys, ciphertext vectors, tally artifacts)
//! travels as a base-10 string under a fixed schema. Parsing is strict:
//! digits only, no signs, no surrounding whitespace, so read paths fail
//! closed on anything that was not written by this crate.

use num_bigint::BigInt;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};

pub(crate) fn parse_decimal(s: &str) -> Result<BigInt, String> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("not a decimal integer: {:?}", s));
    }
    s.parse::<BigInt>().map_err(|e| e.to_string())
}

pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
    let s = String::deserialize(deserializer)?;
    parse_decimal(&s).map_err(DeError::custom)
}

/// `Option<BigInt>` fields: a decimal string or `null`.
pub mod opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<BigInt>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_some(&v.to_str_radix(10)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<BigInt>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => parse_decimal(&s).map(Some).map_err(DeError::custom),
            None => Ok(None),
        }
    }
}

/// `Vec<BigInt>` fields: a list of decimal strings.
pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[BigInt], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| v.to_str_radix(10)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigInt>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| parse_decimal(s).map_err(DeError::custom))
            .collect()
    }
}
