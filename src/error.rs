use anon_vote::{FieldElement, FieldError, ProofError};
use thiserror::Error;

use crate::model::NetworkState;

pub type Result<T> = std::result::Result<T, Error>;

/// The backend error taxonomy.
///
/// Data-model operations fail fast and synchronously; a vote, election, or
/// registration is either fully recorded or not recorded at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The operation is disallowed in the current network phase.
    #[error("operation requires the {required} phase")]
    InvalidPhase { required: NetworkState },
    /// The ballot id has already been recorded for this election.
    #[error("ballot {0} has already been submitted")]
    DuplicateBallot(FieldElement),
    /// An election with this commitment already exists.
    #[error("election {0} already exists")]
    DuplicateElection(FieldElement),
    /// Unknown commitment or election.
    #[error("not found: {0}")]
    NotFound(String),
    /// The proof was rejected. Never auto-retried: it signals either malice
    /// or a stale membership proof, and is surfaced to the operator/voter.
    #[error("proof verification failed")]
    Verification,
    /// The witness cannot satisfy the statement; raised before submission.
    #[error("cannot build a proof: {0}")]
    ProofGeneration(String),
    /// A required field is missing or invalid on deserialization.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<FieldError> for Error {
    fn from(err: FieldError) -> Self {
        Error::MalformedPayload(err.to_string())
    }
}

impl From<ProofError> for Error {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Unsatisfiable(msg) => Error::ProofGeneration(msg),
            ProofError::Malformed => Error::MalformedPayload(err.to_string()),
        }
    }
}
