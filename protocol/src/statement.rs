//! The public statement / private witness contract that the proving
//! subsystem must satisfy, plus a simulated proof system used as the
//! reference black box.
//!
//! The real proving and verification algorithms are external collaborators;
//! they are only specified here at their interface ([`ProofSystem`]).

use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::field::FieldElement;
use crate::hash::{ballot_id, string_commitment, voter_commitment};
use crate::registry::MembershipProof;

/// Errors arising from the proving subsystem.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProofError {
    /// The witness cannot satisfy the statement; raised before submission.
    #[error("witness does not satisfy the statement: {0}")]
    Unsatisfiable(String),
    /// The proof encoding itself is invalid (as opposed to a well-formed
    /// proof that fails verification).
    #[error("malformed proof encoding")]
    Malformed,
}

/// The public inputs of a vote proof.
///
/// Everything here is disclosed; nothing in it reveals the voter's secret,
/// attribute values, or tree position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteStatement {
    /// The accumulator root the membership path is checked against.
    pub merkle_root: FieldElement,
    /// The ballot id (nullifier).
    pub ballot: FieldElement,
    /// Commitment to the disclosed yes/no answer.
    pub answer_hash: FieldElement,
    /// Per-slot attribute constraint commitments, zero for empty slots.
    pub attribute_slots: Vec<FieldElement>,
    /// The election's identity commitment.
    pub election_commitment: FieldElement,
}

impl VoteStatement {
    /// The fixed public-input order expected by the circuit:
    /// `[root, ballot, answer hash, slots..., election commitment]`.
    pub fn to_elements(&self) -> Vec<FieldElement> {
        let mut elements = vec![self.merkle_root, self.ballot, self.answer_hash];
        elements.extend(&self.attribute_slots);
        elements.push(self.election_commitment);
        elements
    }
}

/// The private inputs of a vote proof. Never serialized, never logged.
#[derive(Clone)]
pub struct VoteWitness {
    /// The voter's secret value.
    pub secret: FieldElement,
    /// The membership proof issued by the registrar.
    pub membership_proof: MembershipProof,
    /// The voter's raw attribute values, aligned with the mask slots.
    pub attributes: Vec<Option<String>>,
}

impl Debug for VoteWitness {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The secret and attribute values must not leak through logs.
        f.debug_struct("VoteWitness").finish_non_exhaustive()
    }
}

/// The fixed byte length of an encoded proof.
pub const PROOF_LEN: usize = 32;

/// An opaque proof emitted by a proof system. On the wire it round-trips
/// through a lowercase hex string of fixed length.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Proof(Vec<u8>);

impl Proof {
    /// Validate the fixed encoding. Malformed encodings fail here; a
    /// well-formed proof that does not verify is a plain rejection instead.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ProofError> {
        if bytes.len() != PROOF_LEN {
            return Err(ProofError::Malformed);
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for Proof {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Proof({self})")
    }
}

impl Display for Proof {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", HEXLOWER.encode(&self.0))
    }
}

impl FromStr for Proof {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = HEXLOWER
            .decode(s.as_bytes())
            .map_err(|_| ProofError::Malformed)?;
        Self::from_bytes(bytes)
    }
}

impl From<Proof> for String {
    fn from(proof: Proof) -> Self {
        proof.to_string()
    }
}

impl TryFrom<String> for Proof {
    type Error = ProofError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// The external proving subsystem, treated as a black box.
pub trait ProofSystem {
    /// Produce a proof that the witness satisfies the statement, or fail
    /// with [`ProofError::Unsatisfiable`] if it does not (invalid membership
    /// path, unmet attribute constraint, mis-derived ballot id).
    fn prove(&self, statement: &VoteStatement, witness: &VoteWitness) -> Result<Proof, ProofError>;

    /// Check a proof against a statement: pure accept/reject. Well-typed
    /// proofs never error here; malformed encodings are caught when the
    /// proof is decoded.
    fn verify(&self, statement: &VoteStatement, proof: &Proof) -> bool;

    /// A digest of the proving/verification key material, so clients can
    /// detect key mismatches at startup.
    fn key_hash(&self) -> FieldElement;
}

/// A deterministic stand-in for the external circuit.
///
/// `prove` enforces the circuit's constraints directly on the witness and
/// emits a keyed digest over the public inputs; `verify` recomputes that
/// digest, so any statement mutation (a stale root included) rejects. This
/// is sound only against provers that go through [`ProofSystem::prove`],
/// which is exactly what the protocol needs from a simulation.
#[derive(Debug, Clone)]
pub struct SimulatedProofSystem {
    key_seed: [u8; 32],
}

impl SimulatedProofSystem {
    const PROOF_TAG: &'static [u8] = b"anon-vote-simulated-proof-v1";

    pub fn new(key_seed: [u8; 32]) -> Self {
        Self { key_seed }
    }

    fn tag(&self, statement: &VoteStatement) -> Proof {
        let mut hasher = Sha256::new();
        hasher.update(Self::PROOF_TAG);
        hasher.update(self.key_seed);
        for element in statement.to_elements() {
            hasher.update(element.to_be_bytes());
        }
        Proof(hasher.finalize().to_vec())
    }
}

impl Default for SimulatedProofSystem {
    fn default() -> Self {
        Self::new([0; 32])
    }
}

impl ProofSystem for SimulatedProofSystem {
    fn prove(&self, statement: &VoteStatement, witness: &VoteWitness) -> Result<Proof, ProofError> {
        // (a) The secret's commitment is in the tree at the statement root.
        let leaf = voter_commitment(witness.secret);
        if witness.membership_proof.fold(leaf) != statement.merkle_root {
            return Err(ProofError::Unsatisfiable(
                "membership path does not recompute the statement root".to_string(),
            ));
        }

        // (b) The ballot id is derived from the secret and this election.
        if ballot_id(witness.secret, statement.election_commitment) != statement.ballot {
            return Err(ProofError::Unsatisfiable(
                "ballot id is not derived from the secret and election".to_string(),
            ));
        }

        // (c) Every constrained slot matches the voter's attribute.
        for (index, &slot) in statement.attribute_slots.iter().enumerate() {
            if slot == FieldElement::ZERO {
                continue;
            }
            let satisfied = witness
                .attributes
                .get(index)
                .and_then(Option::as_deref)
                .map(string_commitment)
                == Some(slot);
            if !satisfied {
                return Err(ProofError::Unsatisfiable(format!(
                    "attribute constraint in slot {index} is not met"
                )));
            }
        }

        // (d) The disclosed answer hash is bound by the proof tag along with
        // every other public input.
        Ok(self.tag(statement))
    }

    fn verify(&self, statement: &VoteStatement, proof: &Proof) -> bool {
        self.tag(statement) == *proof
    }

    fn key_hash(&self) -> FieldElement {
        let mut hasher = Sha256::new();
        hasher.update(b"anon-vote-simulated-keys-v1");
        hasher.update(self.key_seed);
        FieldElement::from_bytes_mod_order(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::attributes::AttributeMask;
    use crate::hash::{answer_hash, election_commitment};
    use crate::registry::VoterRegistry;

    /// A registry of three voters plus a satisfying statement/witness pair
    /// for the middle one, against the example attribute mask.
    fn fixture() -> (VoteStatement, VoteWitness, SimulatedProofSystem) {
        let secret = FieldElement::from(7777_u64);
        let mut registry = VoterRegistry::new();
        registry.register(FieldElement::from(1_u64)).unwrap();
        registry.register(voter_commitment(secret)).unwrap();
        registry.register(FieldElement::from(2_u64)).unwrap();
        registry.close_registration().unwrap();

        let mask = AttributeMask::example();
        let election = election_commitment("Is this a test?", &mask);

        let statement = VoteStatement {
            merkle_root: registry.merkle_root(),
            ballot: ballot_id(secret, election),
            answer_hash: answer_hash(true),
            attribute_slots: mask.witness(),
            election_commitment: election,
        };
        let witness = VoteWitness {
            secret,
            membership_proof: registry.prove_membership(voter_commitment(secret)).unwrap(),
            attributes: AttributeMask::example_attributes(),
        };
        (statement, witness, SimulatedProofSystem::default())
    }

    #[test]
    fn statement_elements_are_ordered() {
        let (statement, _, _) = fixture();
        let elements = statement.to_elements();
        assert_eq!(elements.len(), 3 + statement.attribute_slots.len() + 1);
        assert_eq!(elements[0], statement.merkle_root);
        assert_eq!(elements[1], statement.ballot);
        assert_eq!(elements[2], statement.answer_hash);
        assert_eq!(elements[3..6], statement.attribute_slots[..]);
        assert_eq!(elements[6], statement.election_commitment);
    }

    #[test]
    fn satisfying_witness_is_accepted() {
        let (statement, witness, system) = fixture();
        let proof = system.prove(&statement, &witness).unwrap();
        assert!(system.verify(&statement, &proof));
    }

    #[test]
    fn missing_attribute_is_unsatisfiable() {
        let (statement, mut witness, system) = fixture();
        witness.attributes[2] = None;
        assert_eq!(
            system.prove(&statement, &witness),
            Err(ProofError::Unsatisfiable(
                "attribute constraint in slot 2 is not met".to_string()
            ))
        );
    }

    #[test]
    fn wrong_secret_is_unsatisfiable() {
        let (statement, mut witness, system) = fixture();
        witness.secret = FieldElement::from(1234_u64);
        assert!(matches!(
            system.prove(&statement, &witness),
            Err(ProofError::Unsatisfiable(_))
        ));
    }

    #[test]
    fn mis_derived_ballot_id_is_unsatisfiable() {
        let (mut statement, witness, system) = fixture();
        statement.ballot = FieldElement::from(9_u64);
        assert!(matches!(
            system.prove(&statement, &witness),
            Err(ProofError::Unsatisfiable(_))
        ));
    }

    #[test]
    fn mutated_statement_rejects() {
        let (statement, witness, system) = fixture();
        let proof = system.prove(&statement, &witness).unwrap();

        // A stale root (or any other mutation) must reject.
        let mut stale = statement.clone();
        stale.merkle_root = FieldElement::from(1_u64);
        assert!(!system.verify(&stale, &proof));

        let mut flipped = statement;
        flipped.answer_hash = answer_hash(false);
        assert!(!system.verify(&flipped, &proof));
    }

    #[test]
    fn different_keys_reject_each_other() {
        let (statement, witness, system) = fixture();
        let proof = system.prove(&statement, &witness).unwrap();
        let other = SimulatedProofSystem::new([1; 32]);
        assert!(!other.verify(&statement, &proof));
        assert_ne!(system.key_hash(), other.key_hash());
    }

    #[test]
    fn proof_encoding_round_trips() {
        let (statement, witness, system) = fixture();
        let proof = system.prove(&statement, &witness).unwrap();
        let encoded = proof.to_string();
        assert_eq!(encoded.parse::<Proof>().unwrap(), proof);
    }

    #[test]
    fn malformed_encodings_are_rejected() {
        assert_eq!("zz".parse::<Proof>(), Err(ProofError::Malformed));
        assert_eq!("abcd".parse::<Proof>(), Err(ProofError::Malformed));
        assert_eq!(Proof::from_bytes(vec![0; 31]), Err(ProofError::Malformed));
    }

    #[test]
    fn witness_debug_redacts_the_secret() {
        let (_, witness, _) = fixture();
        let rendered = format!("{witness:?}");
        assert!(!rendered.contains("7777"));
        assert!(!rendered.contains("age>=18"));
    }
}
