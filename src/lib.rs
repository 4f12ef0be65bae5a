//! Homomorphic ballot encryption and publicly verifiable tallying.
//!
//! Paillier's additively homomorphic cryptosystem applied to elections:
//! each ballot is an encrypted one-hot vector, per-candidate totals are
//! computed without decrypting any individual vote, and the published
//! tally comes with artifacts that let anyone holding only the public key
//! confirm it is a faithful decryption of the published ciphertexts.
//!
//! # Example
//! ```
//! use num_bigint::BigInt;
//! use paillier_tally::{
//!     close_tally, encode_ballot, verify_tally, CloseOutcome, KeyPair, TallyVerification,
//! };
//!
//! let keys = KeyPair::generate(512).unwrap();
//! let candidates: [u64; 3] = [10, 20, 30];
//! let ballots = vec![
//!     encode_ballot(&candidates, 10, &keys.public, None).unwrap(),
//!     encode_ballot(&candidates, 10, &keys.public, None).unwrap(),
//!     encode_ballot(&candidates, 20, &keys.public, None).unwrap(),
//! ];
//! match close_tally("demo", &ballots, &keys).unwrap() {
//!     CloseOutcome::Closed { artifacts, .. } => {
//!         assert_eq!(
//!             artifacts.decrypted_total,
//!             vec![BigInt::from(2), BigInt::from(1), BigInt::from(0)]
//!         );
//!         let outcome = verify_tally(
//!             &keys.public,
//!             &artifacts.decrypted_total,
//!             &artifacts.positive_total,
//!             &artifacts.zero_randomness,
//!         );
//!         assert_eq!(outcome, TallyVerification::Verified);
//!     }
//!     CloseOutcome::NoVotes => unreachable!(),
//! }
//! ```

pub mod ballot;
pub mod ciphertext;
pub mod functions;
pub mod keys;
pub mod serde_bigint;
pub mod tally;
pub mod verify;

pub use ballot::{encode_ballot, Ballot, BallotError, CandidateId};
pub use ciphertext::Ciphertext;
pub use functions::sha256_hex;
pub use keys::{CryptoError, KeyError, KeyPair, PrivateKey, PublicKey};
pub use tally::{close_tally, CloseOutcome, TallyArtifacts, TallyError};
pub use verify::{verify_tally, TallyVerification};
