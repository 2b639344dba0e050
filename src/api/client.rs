//! The voter side: a local read-only mirror of the registrar's state,
//! synchronized from the broadcast streams, plus vote construction.

use anon_vote::{FieldElement, Proof, ProofSystem};
use log::{debug, warn};

use crate::api::events::Event;
use crate::api::payload::{ElectionPayload, InitPayload, VotePayload};
use crate::error::{Error, Result};
use crate::model::{ElectionDb, NetworkState, Vote, Voter};

/// A voter client's view of the network.
///
/// Streams may interleave: a vote can arrive before its election is locally
/// known. Such votes are buffered and drained once the election shows up.
/// The client never mutates shared state; it only mirrors broadcasts.
#[derive(Debug)]
pub struct VoterClient {
    voter: Voter,
    elections: ElectionDb,
    state: NetworkState,
    pending_votes: Vec<VotePayload>,
}

impl VoterClient {
    /// Build the mirror from an `init` response.
    pub fn new(voter: Voter, init: InitPayload) -> Result<Self> {
        let mut client = Self {
            voter,
            elections: ElectionDb::new(),
            state: init.network_state,
            pending_votes: Vec::new(),
        };
        for payload in init.elections {
            client.apply_election(payload)?;
        }
        for payload in init.votes {
            client.apply_vote(payload)?;
        }
        Ok(client)
    }

    pub fn voter(&self) -> &Voter {
        &self.voter
    }

    pub fn voter_mut(&mut self) -> &mut Voter {
        &mut self.voter
    }

    pub fn network_state(&self) -> NetworkState {
        self.state
    }

    pub fn elections(&self) -> &ElectionDb {
        &self.elections
    }

    /// The number of votes waiting for their election to arrive.
    pub fn pending_votes(&self) -> usize {
        self.pending_votes.len()
    }

    /// Apply one broadcast event to the mirror.
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::NetworkState(state) => {
                self.state = state;
                Ok(())
            }
            Event::Election(payload) => self.apply_election(payload),
            Event::Vote(payload) => self.apply_vote(payload),
        }
    }

    /// Build the vote payload and proof for an election in the local
    /// mirror. Requires an issued membership proof and eligibility under
    /// the election's mask; the statement is built against the
    /// issuance-time root.
    pub fn cast(
        &self,
        election_commitment: FieldElement,
        answer: bool,
        system: &impl ProofSystem,
    ) -> Result<(VotePayload, Proof)> {
        let election = self
            .elections
            .get(election_commitment)
            .ok_or_else(|| Error::NotFound(format!("election {election_commitment}")))?;

        let unsatisfied = self.voter.unsatisfied_constraints(election);
        if !unsatisfied.is_empty() {
            return Err(Error::ProofGeneration(format!(
                "unsatisfied attribute constraints in slots {unsatisfied:?}"
            )));
        }

        let membership = self.voter.membership().ok_or_else(|| {
            Error::ProofGeneration("no membership proof has been issued".to_string())
        })?;
        let vote = Vote::new(&self.voter, election, answer);
        let statement = vote.statement(membership.root, election)?;
        let proof = system.prove(&statement, &self.voter.witness()?)?;
        Ok((VotePayload::from_vote(&vote), proof))
    }

    fn apply_election(&mut self, payload: ElectionPayload) -> Result<()> {
        let election = payload.into_election()?;
        let commitment = election.commitment;
        match self.elections.add(election) {
            Ok(()) => {}
            // A replayed election event is harmless.
            Err(Error::DuplicateElection(_)) => {
                debug!("ignoring duplicate election {commitment}");
                return Ok(());
            }
            Err(err) => return Err(err),
        }

        // Drain any votes that were waiting for this election. Buffered
        // payloads were validated before buffering, so the parse succeeds.
        let (ready, pending): (Vec<VotePayload>, Vec<VotePayload>) =
            std::mem::take(&mut self.pending_votes)
                .into_iter()
                .partition(|payload| {
                    payload
                        .election_commitment
                        .parse::<FieldElement>()
                        .map(|parsed| parsed == commitment)
                        .unwrap_or(false)
                });
        self.pending_votes = pending;
        for payload in ready {
            self.apply_vote(payload)?;
        }
        Ok(())
    }

    fn apply_vote(&mut self, payload: VotePayload) -> Result<()> {
        let vote = payload.clone().into_vote()?;
        if !self.elections.contains(vote.election_commitment) {
            // Cross-stream reordering: hold the vote until its election
            // arrives.
            self.pending_votes.push(payload);
            return Ok(());
        }
        match self.elections.record_vote(vote) {
            Ok(()) => Ok(()),
            // The registrar already enforced uniqueness; a duplicate here is
            // a replayed event.
            Err(Error::DuplicateBallot(ballot)) => {
                warn!("ignoring replayed ballot {ballot}");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
