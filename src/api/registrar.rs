//! The registrar: single writer of the voter registry, the election
//! database, and the network state.

use std::sync::mpsc::channel;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration as StdDuration;

use anon_vote::{FieldElement, Proof, ProofSystem, VoterRegistry};
use log::{info, warn};

use crate::api::events::{Event, EventBus};
use crate::api::payload::{ElectionPayload, InitPayload, MembershipPayload, VotePayload};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{ElectionDb, NetworkState};

/// The registrar service behind the request/response surface (the transport
/// itself lives elsewhere).
///
/// Mutating operations are mutually exclusive per shared resource, so
/// "append leaf" and "check-then-insert ballot id" are atomic under
/// concurrent callers. Proof verification never holds a lock: statements
/// are snapshotted under a read lock, verified lock-free, and only the
/// final commit reacquires exclusivity (re-checking ballot uniqueness).
pub struct Registrar<P> {
    config: Config,
    proof_system: Arc<P>,
    registry: RwLock<VoterRegistry>,
    elections: RwLock<ElectionDb>,
    state: RwLock<NetworkState>,
    events: EventBus,
}

impl<P> Registrar<P>
where
    P: ProofSystem + Send + Sync + 'static,
{
    pub fn new(config: Config, proof_system: P) -> Self {
        Self {
            config,
            proof_system: Arc::new(proof_system),
            registry: RwLock::new(VoterRegistry::new()),
            elections: RwLock::new(ElectionDb::new()),
            state: RwLock::new(NetworkState::Registration),
            events: EventBus::new(),
        }
    }

    /// Subscribe to the broadcast streams. Per-stream order follows the
    /// registrar's commit order.
    pub fn subscribe(&self) -> std::sync::mpsc::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn network_state(&self) -> NetworkState {
        *self.state.read().expect("state lock poisoned")
    }

    /// Initial state for a connecting client: the phase, the proof-system
    /// key digest, and every recorded election and vote.
    pub fn init(&self) -> InitPayload {
        let elections = self.elections.read().expect("election lock poisoned");
        InitPayload {
            network_state: self.network_state(),
            proof_system_key_hash: self.proof_system.key_hash(),
            elections: elections.dump().map(ElectionPayload::from_election).collect(),
            votes: elections
                .dump()
                .flat_map(|election| election.votes().iter().map(VotePayload::from_vote))
                .collect(),
        }
    }

    /// Register a voter commitment. Legal only while registration is open.
    /// Duplicate commitments are the caller's concern.
    pub fn register(&self, commitment: FieldElement) -> Result<()> {
        self.require_phase(NetworkState::Registration)?;
        self.registry
            .write()
            .expect("registry lock poisoned")
            .register(commitment)
            .map_err(|_| Error::InvalidPhase {
                required: NetworkState::Registration,
            })?;
        info!("registered voter commitment {commitment}");
        Ok(())
    }

    /// Issue a membership proof and the root it is valid against. Legal in
    /// either phase for an already-registered commitment.
    pub fn prove_membership(&self, commitment: FieldElement) -> Result<MembershipPayload> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let membership_proof = registry
            .prove_membership(commitment)
            .map_err(|_| Error::NotFound(format!("commitment {commitment}")))?;
        Ok(MembershipPayload {
            membership_proof,
            merkle_root: registry.merkle_root(),
        })
    }

    /// Operator-triggered, irreversible transition to `Polling`. The
    /// registry is sealed before the state flips, and the new state is then
    /// broadcast.
    pub fn close_registration(&self) -> Result<()> {
        {
            let mut state = self.state.write().expect("state lock poisoned");
            self.registry
                .write()
                .expect("registry lock poisoned")
                .close_registration()
                .map_err(|_| Error::InvalidPhase {
                    required: NetworkState::Registration,
                })?;
            *state = NetworkState::Polling;
        }
        info!("registration closed, polling begins");
        self.events.emit(Event::NetworkState(NetworkState::Polling));
        Ok(())
    }

    /// Create a new election for voters to vote on. Polling phase only.
    pub fn create_election(&self, payload: ElectionPayload) -> Result<()> {
        self.require_phase(NetworkState::Polling)?;
        let election = payload.clone().into_election()?;
        let commitment = election.commitment;
        self.elections
            .write()
            .expect("election lock poisoned")
            .add(election)?;
        info!("created election {commitment}");
        self.events.emit(Event::Election(payload));
        Ok(())
    }

    /// Cast a vote: reconstruct the statement from the stored election and
    /// the registry's current root, verify the proof, and commit
    /// all-or-nothing. On rejection nothing is recorded.
    pub fn cast_vote(&self, payload: VotePayload, proof: &Proof) -> Result<()> {
        self.require_phase(NetworkState::Polling)?;
        let vote = payload.clone().into_vote()?;

        // Snapshot the statement under read locks, then verify lock-free so
        // independent votes' proofs can be checked concurrently.
        let statement = {
            let elections = self.elections.read().expect("election lock poisoned");
            let election = elections
                .get(vote.election_commitment)
                .ok_or_else(|| Error::NotFound(format!("election {}", vote.election_commitment)))?;
            let root = self
                .registry
                .read()
                .expect("registry lock poisoned")
                .merkle_root();
            vote.statement(root, election)?
        };

        if !self.verify_bounded(statement, proof.clone()) {
            warn!("rejected ballot {} for election {}", vote.ballot, vote.election_commitment);
            return Err(Error::Verification);
        }

        let ballot = vote.ballot;
        let election_commitment = vote.election_commitment;
        self.elections
            .write()
            .expect("election lock poisoned")
            .record_vote(vote)?;
        info!("recorded ballot {ballot} for election {election_commitment}");
        self.events.emit(Event::Vote(payload));
        Ok(())
    }

    /// Run verification on its own thread, bounded by the configured
    /// timeout. A timed-out verification discards its partial result and
    /// counts as a rejection for this attempt; retrying is the caller's
    /// decision.
    fn verify_bounded(&self, statement: anon_vote::VoteStatement, proof: Proof) -> bool {
        let timeout = self
            .config
            .verify_timeout()
            .to_std()
            .unwrap_or(StdDuration::MAX);
        let (sender, receiver) = channel();
        let system = Arc::clone(&self.proof_system);
        thread::spawn(move || {
            let _ = sender.send(system.verify(&statement, &proof));
        });
        match receiver.recv_timeout(timeout) {
            Ok(accepted) => accepted,
            Err(_) => {
                warn!("proof verification timed out, treating as rejection");
                false
            }
        }
    }

    fn require_phase(&self, required: NetworkState) -> Result<()> {
        if self.network_state() != required {
            return Err(Error::InvalidPhase { required });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use anon_vote::SimulatedProofSystem;

    use crate::model::{Election, Vote, Voter};

    fn registrar() -> Registrar<SimulatedProofSystem> {
        Registrar::new(Config::default(), SimulatedProofSystem::default())
    }

    /// Register the voter and, once registration closes, fetch and store
    /// its membership proof.
    fn acquire_membership<P>(registrar: &Registrar<P>, voter: &mut Voter)
    where
        P: ProofSystem + Send + Sync + 'static,
    {
        let payload = registrar.prove_membership(voter.commitment()).unwrap();
        voter.set_membership(payload.membership_proof, payload.merkle_root);
    }

    /// Build a vote payload and proof the way a voter client does.
    fn prepare_vote(voter: &Voter, election: &Election, answer: bool) -> (VotePayload, Proof) {
        let vote = Vote::new(voter, election, answer);
        let membership = voter.membership().unwrap();
        let statement = vote.statement(membership.root, election).unwrap();
        let proof = SimulatedProofSystem::default()
            .prove(&statement, &voter.witness().unwrap())
            .unwrap();
        (VotePayload::from_vote(&vote), proof)
    }

    #[test]
    fn phase_gating() {
        let registrar = registrar();
        let election = ElectionPayload::from_election(&Election::example());

        // Registration phase: register succeeds, createElection does not.
        registrar.register(FieldElement::from(1_u64)).unwrap();
        assert_eq!(
            registrar.create_election(election.clone()),
            Err(Error::InvalidPhase {
                required: NetworkState::Polling
            })
        );

        registrar.close_registration().unwrap();
        assert_eq!(registrar.network_state(), NetworkState::Polling);

        // Polling phase: the gates swap.
        assert_eq!(
            registrar.register(FieldElement::from(2_u64)),
            Err(Error::InvalidPhase {
                required: NetworkState::Registration
            })
        );
        registrar.create_election(election).unwrap();

        // The transition is one-way.
        assert_eq!(
            registrar.close_registration(),
            Err(Error::InvalidPhase {
                required: NetworkState::Registration
            })
        );
    }

    #[test]
    fn membership_proofs_in_both_phases() {
        let registrar = registrar();
        let commitment = FieldElement::from(7_u64);
        registrar.register(commitment).unwrap();

        let before = registrar.prove_membership(commitment).unwrap();
        registrar.close_registration().unwrap();
        let after = registrar.prove_membership(commitment).unwrap();
        assert_eq!(before, after);

        assert!(matches!(
            registrar.prove_membership(FieldElement::from(8_u64)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn full_voting_round() {
        // This test exercises the whole backend, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(
            ["anon_vote", "anonvote_backend"],
            None,
            None,
        );

        let registrar = registrar();
        let events = registrar.subscribe();

        let mut alice = Voter::example();
        let mut bob = Voter::with_secret(FieldElement::from(0xb0b_u64), Voter::example_attributes());
        registrar.register(alice.commitment()).unwrap();
        registrar.register(bob.commitment()).unwrap();
        registrar.close_registration().unwrap();
        acquire_membership(&registrar, &mut alice);
        acquire_membership(&registrar, &mut bob);

        let election = Election::example();
        registrar
            .create_election(ElectionPayload::from_election(&election))
            .unwrap();

        let (alice_vote, alice_proof) = prepare_vote(&alice, &election, true);
        let (bob_vote, bob_proof) = prepare_vote(&bob, &election, false);
        registrar.cast_vote(alice_vote.clone(), &alice_proof).unwrap();
        registrar.cast_vote(bob_vote, &bob_proof).unwrap();

        // A repeat attempt by the same voter collides on the ballot id,
        // even with a fresh proof for a different answer.
        let (repeat, repeat_proof) = prepare_vote(&alice, &election, false);
        assert_eq!(
            registrar.cast_vote(repeat, &repeat_proof),
            Err(Error::DuplicateBallot(
                alice.ballot(election.commitment)
            ))
        );

        // The tally reflects exactly the two accepted votes.
        let init = registrar.init();
        assert_eq!(init.votes.len(), 2);
        assert_eq!(init.elections.len(), 1);
        let recorded = init
            .elections
            .first()
            .map(|payload| payload.clone().into_election().unwrap())
            .unwrap();
        assert_eq!(recorded.commitment, election.commitment);

        // Events arrived in commit order.
        assert_eq!(
            events.try_recv().unwrap(),
            Event::NetworkState(NetworkState::Polling)
        );
        assert!(matches!(events.try_recv().unwrap(), Event::Election(_)));
        assert_eq!(events.try_recv().unwrap(), Event::Vote(alice_vote));
        assert!(matches!(events.try_recv().unwrap(), Event::Vote(_)));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn rejected_proofs_record_nothing() {
        let registrar = registrar();
        let mut voter = Voter::example();
        registrar.register(voter.commitment()).unwrap();
        registrar.close_registration().unwrap();
        acquire_membership(&registrar, &mut voter);

        let election = Election::example();
        registrar
            .create_election(ElectionPayload::from_election(&election))
            .unwrap();

        // A proof over a different statement (flipped answer) rejects.
        let (_, proof) = prepare_vote(&voter, &election, false);
        let (payload, _) = prepare_vote(&voter, &election, true);
        assert_eq!(registrar.cast_vote(payload, &proof), Err(Error::Verification));
        assert!(registrar.init().votes.is_empty());
    }

    #[test]
    fn stale_membership_proofs_are_rejected() {
        let registrar = registrar();
        let mut voter = Voter::example();
        registrar.register(voter.commitment()).unwrap();

        // Proof issued before a later registration is stale afterwards.
        acquire_membership(&registrar, &mut voter);
        registrar.register(FieldElement::from(5_u64)).unwrap();
        registrar.close_registration().unwrap();

        let election = Election::example();
        registrar
            .create_election(ElectionPayload::from_election(&election))
            .unwrap();

        // The prover itself refuses the stale path against the current root;
        // a proof built against the stale root fails registrar verification.
        let vote = Vote::new(&voter, &election, true);
        let membership = voter.membership().unwrap();
        let stale_statement = vote.statement(membership.root, &election).unwrap();
        let proof = SimulatedProofSystem::default()
            .prove(&stale_statement, &voter.witness().unwrap())
            .unwrap();
        assert_eq!(
            registrar.cast_vote(VotePayload::from_vote(&vote), &proof),
            Err(Error::Verification)
        );
        assert!(registrar.init().votes.is_empty());
    }

    /// Delegates to the simulated system, but verification sleeps past the
    /// configured bound.
    struct SlowProofSystem {
        inner: SimulatedProofSystem,
        delay: StdDuration,
    }

    impl ProofSystem for SlowProofSystem {
        fn prove(
            &self,
            statement: &anon_vote::VoteStatement,
            witness: &anon_vote::VoteWitness,
        ) -> std::result::Result<Proof, anon_vote::ProofError> {
            self.inner.prove(statement, witness)
        }

        fn verify(&self, statement: &anon_vote::VoteStatement, proof: &Proof) -> bool {
            thread::sleep(self.delay);
            self.inner.verify(statement, proof)
        }

        fn key_hash(&self) -> FieldElement {
            self.inner.key_hash()
        }
    }

    #[test]
    fn timed_out_verification_is_a_rejection() {
        let registrar = Registrar::new(
            Config::new(1),
            SlowProofSystem {
                inner: SimulatedProofSystem::default(),
                delay: StdDuration::from_secs(3),
            },
        );
        let mut voter = Voter::example();
        registrar.register(voter.commitment()).unwrap();
        registrar.close_registration().unwrap();
        acquire_membership(&registrar, &mut voter);

        let election = Election::example();
        registrar
            .create_election(ElectionPayload::from_election(&election))
            .unwrap();

        // The vote and proof are valid; only the verification bound expires.
        // The late result is discarded and nothing is recorded.
        let (payload, proof) = prepare_vote(&voter, &election, true);
        assert_eq!(registrar.cast_vote(payload, &proof), Err(Error::Verification));
        assert!(registrar.init().votes.is_empty());
    }

    #[test]
    fn unknown_elections_are_not_found() {
        let registrar = registrar();
        let mut voter = Voter::example();
        registrar.register(voter.commitment()).unwrap();
        registrar.close_registration().unwrap();
        acquire_membership(&registrar, &mut voter);

        let election = Election::example();
        let (payload, proof) = prepare_vote(&voter, &election, true);
        assert!(matches!(
            registrar.cast_vote(payload, &proof),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn malformed_vote_payloads_are_rejected() {
        let registrar = registrar();
        registrar.close_registration().unwrap();

        let payload = VotePayload {
            voter_commitment: "xyz".to_string(),
            election_commitment: "1".to_string(),
            ballot: "2".to_string(),
            answer: true,
        };
        let proof = Proof::from_bytes(vec![0; anon_vote::PROOF_LEN]).unwrap();
        assert!(matches!(
            registrar.cast_vote(payload, &proof),
            Err(Error::MalformedPayload(_))
        ));
    }

    #[test]
    fn duplicate_elections_are_rejected() {
        let registrar = registrar();
        registrar.close_registration().unwrap();
        let payload = ElectionPayload::from_election(&Election::example());
        registrar.create_election(payload.clone()).unwrap();
        assert!(matches!(
            registrar.create_election(payload),
            Err(Error::DuplicateElection(_))
        ));
        assert_eq!(registrar.init().elections.len(), 1);
    }

    #[test]
    fn init_reports_the_key_hash() {
        let registrar = registrar();
        assert_eq!(
            registrar.init().proof_system_key_hash,
            SimulatedProofSystem::default().key_hash()
        );
        assert_eq!(registrar.init().network_state, NetworkState::Registration);
    }
}
