use std::collections::{HashMap, HashSet};

use anon_vote::{election_commitment, AttributeMask, FieldElement};

use crate::error::{Error, Result};
use crate::model::vote::Vote;

/// Per-question election state: the eligibility mask, the recorded votes,
/// and the set of ballot ids already seen.
///
/// The commitment is a deterministic function of (summary, mask), so the
/// eligibility rules cannot be altered post hoc without changing the
/// election's identity.
#[derive(Debug, Clone)]
pub struct Election {
    /// Human-readable question text.
    pub summary: String,
    /// Eligibility rules, folded into the commitment.
    pub mask: AttributeMask,
    /// The election's identity commitment.
    pub commitment: FieldElement,
    votes: Vec<Vote>,
    ballots: HashSet<FieldElement>,
}

impl Election {
    pub fn new(summary: String, mask: AttributeMask) -> Self {
        let commitment = election_commitment(&summary, &mask);
        Self {
            summary,
            mask,
            commitment,
            votes: Vec::new(),
            ballots: HashSet::new(),
        }
    }

    /// Record a vote, enforcing ballot uniqueness: at most one vote with a
    /// given ballot id is ever accepted. All-or-nothing; a rejected vote
    /// leaves the election untouched. Equality of ballot ids is the entire
    /// check, so the registrar never learns which voter produced which id.
    pub fn record_vote(&mut self, vote: Vote) -> Result<()> {
        if self.ballots.contains(&vote.ballot) {
            return Err(Error::DuplicateBallot(vote.ballot));
        }
        self.ballots.insert(vote.ballot);
        self.votes.push(vote);
        Ok(())
    }

    /// The recorded votes, in acceptance order.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    /// Fold the votes into yes/no counts. Order-independent: any
    /// permutation of the same vote multiset tallies identically.
    pub fn tally(&self) -> Tally {
        self.votes.iter().fold(Tally::default(), |mut tally, vote| {
            if vote.answer {
                tally.yes += 1;
            } else {
                tally.no += 1;
            }
            tally
        })
    }
}

/// A public tally, recomputable by anyone from the recorded votes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Tally {
    pub yes: u64,
    pub no: u64,
}

/// The collection of elections, keyed by commitment, preserving insertion
/// order for enumeration.
#[derive(Debug, Clone, Default)]
pub struct ElectionDb {
    elections: HashMap<FieldElement, Election>,
    order: Vec<FieldElement>,
}

impl ElectionDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new election; fails if the commitment already exists.
    pub fn add(&mut self, election: Election) -> Result<()> {
        if self.elections.contains_key(&election.commitment) {
            return Err(Error::DuplicateElection(election.commitment));
        }
        self.order.push(election.commitment);
        self.elections.insert(election.commitment, election);
        Ok(())
    }

    pub fn get(&self, commitment: FieldElement) -> Option<&Election> {
        self.elections.get(&commitment)
    }

    pub fn contains(&self, commitment: FieldElement) -> bool {
        self.elections.contains_key(&commitment)
    }

    /// Enumerate elections in insertion order.
    pub fn dump(&self) -> impl Iterator<Item = &Election> {
        self.order.iter().map(|commitment| &self.elections[commitment])
    }

    /// Look up the vote's election and delegate to it.
    pub fn record_vote(&mut self, vote: Vote) -> Result<()> {
        let election = self
            .elections
            .get_mut(&vote.election_commitment)
            .ok_or_else(|| Error::NotFound(format!("election {}", vote.election_commitment)))?;
        election.record_vote(vote)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
