//! Wire payload shapes and their validated conversions into model types.
//!
//! Every conversion type-checks every field and fails with
//! [`Error::MalformedPayload`](crate::error::Error::MalformedPayload);
//! payloads never bypass a type's normal construction.

use anon_vote::{AttributeMask, FieldElement, MembershipProof};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Election, NetworkState, Vote};

/// An election as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionPayload {
    pub summary: String,
    /// Ordered sequence of nullable constraint strings; `null` and `""`
    /// both mean "no constraint".
    pub attribute_mask: Vec<Option<String>>,
}

impl ElectionPayload {
    /// Validated factory: build the election, deriving its commitment.
    pub fn into_election(self) -> Result<Election> {
        if self.summary.is_empty() {
            return Err(Error::MalformedPayload(
                "election summary must not be empty".to_string(),
            ));
        }
        let slots = self
            .attribute_mask
            .into_iter()
            .map(|slot| slot.filter(|s| !s.is_empty()))
            .collect();
        Ok(Election::new(self.summary, AttributeMask::new(slots)))
    }

    pub fn from_election(election: &Election) -> Self {
        Self {
            summary: election.summary.clone(),
            attribute_mask: election.mask.slots().to_vec(),
        }
    }
}

/// A vote as it travels over the wire. All field elements serialize as
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    pub voter_commitment: String,
    pub election_commitment: String,
    pub ballot: String,
    pub answer: bool,
}

impl VotePayload {
    /// Validated factory: parse and range-check every field element.
    pub fn into_vote(self) -> Result<Vote> {
        Ok(Vote {
            voter_commitment: parse_element("voterCommitment", &self.voter_commitment)?,
            election_commitment: parse_element("electionCommitment", &self.election_commitment)?,
            ballot: parse_element("ballot", &self.ballot)?,
            answer: self.answer,
        })
    }

    pub fn from_vote(vote: &Vote) -> Self {
        Self {
            voter_commitment: vote.voter_commitment.to_string(),
            election_commitment: vote.election_commitment.to_string(),
            ballot: vote.ballot.to_string(),
            answer: vote.answer,
        }
    }
}

fn parse_element(field: &str, value: &str) -> Result<FieldElement> {
    value
        .parse()
        .map_err(|err| Error::MalformedPayload(format!("{field}: {err}")))
}

/// Response to a `proveMembership` request: the proof plus the root it was
/// issued against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub membership_proof: MembershipProof,
    pub merkle_root: FieldElement,
}

/// Response to an `init` request: everything a client needs to build its
/// local mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub network_state: NetworkState,
    pub proof_system_key_hash: FieldElement,
    pub elections: Vec<ElectionPayload>,
    pub votes: Vec<VotePayload>,
}
