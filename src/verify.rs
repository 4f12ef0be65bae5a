use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::ciphertext::Ciphertext;
use crate::keys::PublicKey;

/// Result of a tally audit. These are outcomes of a successful computation,
/// not errors: `Indeterminate` means the evidence could not be checked,
/// which is distinct from evidence of tampering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyVerification {
    /// Every recomputed zero-sum matches the published one exactly.
    Verified,
    /// At least one index mismatched: the published counts do not open the
    /// published ciphertexts.
    Failed,
    /// An artifact was missing, malformed, or unparseable.
    Indeterminate,
}

/// Check, from public data only, that `decrypted_total` is a faithful
/// opening of `positive_total`.
///
/// Re-derives the negated totals under fixed randomness 1, recomputes each
/// zero sum, re-encrypts zero under the published `zero_randomness`, and
/// requires exact ciphertext equality at every index. Never needs the
/// private key. Malformed inputs degrade to `Indeterminate` rather than
/// propagating errors, since verification runs on untrusted, best-effort
/// hosts. Pure and idempotent.
pub fn verify_tally(
    public_key: &PublicKey,
    decrypted_total: &[BigInt],
    positive_total: &[Ciphertext],
    zero_randomness: &[BigInt],
) -> TallyVerification {
    if decrypted_total.is_empty()
        || positive_total.len() != decrypted_total.len()
        || zero_randomness.len() != decrypted_total.len()
    {
        return TallyVerification::Indeterminate;
    }
    let one = BigInt::one();
    for i in 0..decrypted_total.len() {
        let negated = -&decrypted_total[i];
        let negative = match public_key.encrypt_fixed(&negated, &one) {
            Ok(ct) => ct,
            Err(_) => return TallyVerification::Indeterminate,
        };
        let zero_sum = match public_key.add(&positive_total[i], &negative) {
            Ok(ct) => ct,
            Err(_) => return TallyVerification::Indeterminate,
        };
        let expected_zero = match public_key.encrypt_fixed(&BigInt::zero(), &zero_randomness[i]) {
            Ok(ct) => ct,
            Err(_) => return TallyVerification::Indeterminate,
        };
        if zero_sum.value != expected_zero.value {
            return TallyVerification::Failed;
        }
    }
    TallyVerification::Verified
}
