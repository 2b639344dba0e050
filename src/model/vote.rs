use anon_vote::{answer_hash, FieldElement, VoteStatement};

use crate::error::{Error, Result};
use crate::model::election::Election;
use crate::model::voter::Voter;

/// A single recorded vote: one (voter, election, answer) record.
///
/// The ballot id is the nullifier `hash([secret, election commitment])`:
/// repeated attempts by the same voter in the same election collide on it,
/// while any other pair is distinct with overwhelming probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter_commitment: FieldElement,
    pub election_commitment: FieldElement,
    pub ballot: FieldElement,
    pub answer: bool,
}

impl Vote {
    pub fn new(voter: &Voter, election: &Election, answer: bool) -> Self {
        Self {
            voter_commitment: voter.commitment(),
            election_commitment: election.commitment,
            ballot: voter.ballot(election.commitment),
            answer,
        }
    }

    /// Build the public statement for this vote against the given
    /// accumulator root; the election must be the one the vote was cast in.
    pub fn statement(&self, merkle_root: FieldElement, election: &Election) -> Result<VoteStatement> {
        if election.commitment != self.election_commitment {
            return Err(Error::MalformedPayload(format!(
                "vote belongs to election {}, not {}",
                self.election_commitment, election.commitment
            )));
        }
        Ok(VoteStatement {
            merkle_root,
            ballot: self.ballot,
            answer_hash: answer_hash(self.answer),
            attribute_slots: election.mask.witness(),
            election_commitment: self.election_commitment,
        })
    }
}
