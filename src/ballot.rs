use num_bigint::BigInt;
use num_traits::{One, Zero};
use thiserror::Error;

use crate::functions::sha256_hex;
use crate::keys::{CryptoError, PublicKey};

/// Stable identifier for a candidate within one election.
pub type CandidateId = u64;

#[derive(Error, Debug)]
pub enum BallotError {
    #[error("candidate {0} is not in the election's candidate list")]
    CandidateNotFound(CandidateId),
    #[error("a ballot already exists for this voter and election")]
    AlreadyVoted,
    #[error("malformed ballot encoding: {0}")]
    MalformedBallot(String),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// One voter's encrypted ballot: the one-hot choice vector, encrypted
/// component-wise over the election's candidate order, plus the submission
/// receipt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub encrypted_vector: Vec<BigInt>,
    pub receipt: String,
}

/// Encrypt `chosen` as a one-hot vector over `candidate_ids`.
///
/// The candidate order is fixed at encoding time and must match the order
/// the tally later uses. Every element is encrypted with independently
/// drawn fresh randomness (reuse across positions or ballots would break
/// ballot secrecy) and the blinding factors are discarded: ballots never
/// expose them.
///
/// `existing` is the caller's lookup for this (voter, election) pair.
/// Duplicate detection belongs to the persistence layer, but the encoder
/// refuses to silently overwrite.
pub fn encode_ballot(
    candidate_ids: &[CandidateId],
    chosen: CandidateId,
    key: &PublicKey,
    existing: Option<&Ballot>,
) -> Result<Ballot, BallotError> {
    if existing.is_some() {
        return Err(BallotError::AlreadyVoted);
    }
    if !candidate_ids.contains(&chosen) {
        return Err(BallotError::CandidateNotFound(chosen));
    }
    let mut encrypted_vector = Vec::with_capacity(candidate_ids.len());
    for &id in candidate_ids {
        let m = if id == chosen {
            BigInt::one()
        } else {
            BigInt::zero()
        };
        let ct = key.encrypt(&m)?;
        encrypted_vector.push(ct.into_public().value);
    }
    let receipt = receipt_for(&encrypted_vector);
    Ok(Ballot {
        encrypted_vector,
        receipt,
    })
}

fn canonical_vector_json(encrypted_vector: &[BigInt]) -> String {
    let strings: Vec<String> = encrypted_vector
        .iter()
        .map(|v| v.to_str_radix(10))
        .collect();
    serde_json::to_string(&strings).expect("ballot vector serialization")
}

fn receipt_for(encrypted_vector: &[BigInt]) -> String {
    sha256_hex(canonical_vector_json(encrypted_vector).as_bytes())
}

impl Ballot {
    /// Canonical wire form: a JSON list of decimal strings, one ciphertext
    /// value per candidate. No randomness is ever included.
    pub fn to_json(&self) -> String {
        canonical_vector_json(&self.encrypted_vector)
    }

    /// Parse a stored ballot vector, failing closed on anything that is
    /// not a list of positive decimal integers. The receipt is recomputed
    /// from the canonical serialization.
    pub fn from_json(encoded: &str) -> Result<Self, BallotError> {
        let strings: Vec<String> =
            serde_json::from_str(encoded).map_err(|e| BallotError::MalformedBallot(e.to_string()))?;
        let mut encrypted_vector = Vec::with_capacity(strings.len());
        for s in &strings {
            let value =
                crate::serde_bigint::parse_decimal(s).map_err(BallotError::MalformedBallot)?;
            if value.is_zero() {
                return Err(BallotError::MalformedBallot(
                    "zero ciphertext value".to_string(),
                ));
            }
            encrypted_vector.push(value);
        }
        let receipt = receipt_for(&encrypted_vector);
        Ok(Ballot {
            encrypted_vector,
            receipt,
        })
    }

    /// Shortened receipt for display.
    pub fn short_receipt(&self) -> String {
        format!("{}...", &self.receipt[..16])
    }
}
