use num_bigint::BigInt;
use num_traits::One;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ballot::Ballot;
use crate::ciphertext::Ciphertext;
use crate::keys::{CryptoError, KeyPair};

#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("malformed tally artifacts: {0}")]
    MalformedArtifacts(String),
}

/// The auditable record a closed election publishes. All five lists share
/// the election's candidate ordering at tally time; they are produced
/// together, exactly once, and never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyArtifacts {
    pub election_id: String,
    /// Homomorphic sum of every ballot's encrypted vector, per candidate.
    pub positive_total: Vec<Ciphertext>,
    /// Plaintext per-candidate counts: the decryption of `positive_total`.
    #[serde(with = "crate::serde_bigint::vec")]
    pub decrypted_total: Vec<BigInt>,
    /// Encryption of the negated counts under fixed randomness 1.
    pub negative_total: Vec<Ciphertext>,
    /// `positive_total + negative_total`; decrypts to zero iff the
    /// published counts open the published ciphertexts.
    pub zero_sum: Vec<Ciphertext>,
    /// Blinding factor recovered from each `zero_sum` element, published so
    /// a key-less verifier can recompute `zero_sum` independently.
    #[serde(with = "crate::serde_bigint::vec")]
    pub zero_randomness: Vec<BigInt>,
}

impl TallyArtifacts {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("tally artifacts serialization")
    }

    pub fn from_json(encoded: &str) -> Result<Self, TallyError> {
        serde_json::from_str(encoded).map_err(|e| TallyError::MalformedArtifacts(e.to_string()))
    }
}

/// Outcome of a close attempt that did not abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The election closed and the artifacts are complete.
    /// `skipped_ballots` lists the indices of ballots excluded as
    /// structurally malformed (vector length differing from the election's
    /// candidate count); exclusion is reported, never silent.
    Closed {
        artifacts: TallyArtifacts,
        skipped_ballots: Vec<usize>,
    },
    /// Nothing to tally. The election stays open; no artifact exists.
    NoVotes,
}

/// Close an election: homomorphically aggregate every ballot, decrypt the
/// per-candidate totals, and derive the zero-sum audit artifacts.
///
/// Runs to completion or not at all. Any cryptographic failure in the
/// aggregation, decryption, or extraction steps aborts with no partial
/// state; every intermediate lives in this function, so an early return
/// leaves nothing behind. The caller persists the returned artifacts
/// atomically and must guarantee at most one close per election.
///
/// The candidate count is fixed by the first non-empty ballot. A ballot
/// with a different vector length is skipped and reported; a ciphertext
/// value outside the group aborts the whole close.
pub fn close_tally(
    election_id: &str,
    ballots: &[Ballot],
    keys: &KeyPair,
) -> Result<CloseOutcome, TallyError> {
    let candidate_count = ballots
        .iter()
        .find(|b| !b.encrypted_vector.is_empty())
        .map(|b| b.encrypted_vector.len())
        .unwrap_or(0);
    if candidate_count == 0 {
        return Ok(CloseOutcome::NoVotes);
    }

    let mut skipped_ballots = Vec::new();
    let mut valid = Vec::new();
    for (index, ballot) in ballots.iter().enumerate() {
        if ballot.encrypted_vector.len() == candidate_count {
            valid.push(ballot);
        } else {
            skipped_ballots.push(index);
        }
    }

    // Per-candidate homomorphic sums, in ballot-arrival order. The first
    // valid ballot seeds the accumulators.
    let mut positive_total: Vec<Ciphertext> = valid[0]
        .encrypted_vector
        .iter()
        .map(|v| Ciphertext::new(v.clone()))
        .collect();
    for ballot in &valid[1..] {
        for (i, value) in ballot.encrypted_vector.iter().enumerate() {
            positive_total[i] = keys
                .public
                .add(&positive_total[i], &Ciphertext::new(value.clone()))?;
        }
    }

    let mut decrypted_total = Vec::with_capacity(candidate_count);
    for ct in &positive_total {
        decrypted_total.push(keys.decrypt(ct)?);
    }

    // Negated counts under fixed randomness 1, so a key-less verifier can
    // re-derive these exact ciphertexts from the published counts.
    let one = BigInt::one();
    let mut negative_total = Vec::with_capacity(candidate_count);
    for total in &decrypted_total {
        negative_total.push(keys.public.encrypt_fixed(&(-total), &one)?);
    }

    // The zero sums must decrypt to zero. They are not decrypted here;
    // the verifier re-derives them from public data.
    let mut zero_sum = Vec::with_capacity(candidate_count);
    for (pos, neg) in positive_total.iter().zip(&negative_total) {
        zero_sum.push(keys.public.add(pos, neg)?);
    }

    let mut zero_randomness = Vec::with_capacity(candidate_count);
    for ct in &zero_sum {
        zero_randomness.push(keys.extract_randomness_from_zero(ct)?);
    }

    let artifacts = TallyArtifacts {
        election_id: election_id.to_string(),
        positive_total: positive_total
            .into_iter()
            .map(Ciphertext::into_public)
            .collect(),
        decrypted_total,
        negative_total: negative_total
            .into_iter()
            .map(Ciphertext::into_public)
            .collect(),
        zero_sum: zero_sum.into_iter().map(Ciphertext::into_public).collect(),
        zero_randomness,
    };
    Ok(CloseOutcome::Closed {
        artifacts,
        skipped_ballots,
    })
}
