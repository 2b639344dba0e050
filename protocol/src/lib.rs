//! # anon-vote
//!
//! The core cryptographic protocol for our anonymous, verifiable voting
//! system: a deterministic one-way hash over a fixed prime field, the
//! commitment/nullifier scheme built on it, the append-only Merkle
//! accumulator of voter commitments, per-election attribute masks, and the
//! public statement / private witness contract that the external proving
//! subsystem must satisfy.
//!
//! This crate is deliberately transport-free; the backend layers the
//! registrar service and voter clients on top of it.

pub mod attributes;
pub mod field;
pub mod hash;
pub mod registry;
pub mod statement;

pub use attributes::AttributeMask;
pub use field::{FieldElement, FieldError};
pub use hash::{
    answer_hash, ballot_id, election_commitment, empty_hash, hash, string_commitment,
    voter_commitment,
};
pub use registry::{MembershipProof, PathNode, RegistryError, Side, VoterRegistry};
pub use statement::{
    Proof, ProofError, ProofSystem, SimulatedProofSystem, VoteStatement, VoteWitness, PROOF_LEN,
};
