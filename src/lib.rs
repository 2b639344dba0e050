//! # anonvote-backend
//!
//! Backend for our anonymous, verifiable voting system: one coordinating
//! registrar and many voter clients. Registered voters cast at most one
//! vote per election, identities and votes stay unlinkable beyond what the
//! protocol intentionally discloses, and anyone can recompute a public
//! tally from the recorded votes.
//!
//! The cryptographic core (field hash, commitments, nullifiers, the Merkle
//! accumulator, and the statement/witness contract) lives in the `anon-vote`
//! protocol crate. This crate layers the registrar service, the voter-client
//! mirror, the wire payloads, and the network-phase state machine on top.
//! Wire transport, interactive shells, and the proving circuit's internal
//! arithmetic are external collaborators, specified only at their
//! interfaces.

pub mod api;
pub mod config;
pub mod error;
pub mod model;

pub use config::Config;
pub use error::{Error, Result};
