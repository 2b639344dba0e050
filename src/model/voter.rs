use std::fmt::{self, Debug, Formatter};

use anon_vote::{ballot_id, voter_commitment, FieldElement, MembershipProof, VoteWitness};
use rand::{CryptoRng, RngCore};

use crate::error::{Error, Result};
use crate::model::election::Election;

/// A membership proof together with the accumulator root it was issued
/// against. Proofs go stale as later registrations change the root, so the
/// pair travels together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub proof: MembershipProof,
    pub root: FieldElement,
}

/// A voter's private state: the secret value, the raw attribute values, and
/// (after registration) the issued membership proof.
///
/// The secret never leaves this struct: it is not serialized, not logged
/// (`Debug` redacts it), and only flows into witnesses handed to the proving
/// subsystem.
#[derive(Clone)]
pub struct Voter {
    secret: FieldElement,
    attributes: Vec<Option<String>>,
    membership: Option<Membership>,
}

impl Voter {
    /// A fresh voter with a random secret.
    pub fn random(rng: &mut (impl RngCore + CryptoRng), attributes: Vec<Option<String>>) -> Self {
        Self::with_secret(FieldElement::random(rng), attributes)
    }

    /// A voter from an existing secret, e.g. loaded from a key file.
    pub fn with_secret(secret: FieldElement, attributes: Vec<Option<String>>) -> Self {
        Self {
            secret,
            attributes,
            membership: None,
        }
    }

    /// The public commitment sent to the registrar: `hash([secret])`.
    pub fn commitment(&self) -> FieldElement {
        voter_commitment(self.secret)
    }

    /// The ballot id this voter would use in the given election.
    pub fn ballot(&self, election_commitment: FieldElement) -> FieldElement {
        ballot_id(self.secret, election_commitment)
    }

    /// Store the membership proof issued by the registrar, together with
    /// the root it was issued against.
    pub fn set_membership(&mut self, proof: MembershipProof, root: FieldElement) {
        self.membership = Some(Membership { proof, root });
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    pub fn attributes(&self) -> &[Option<String>] {
        &self.attributes
    }

    /// The mask slots of the election that this voter's attributes do not
    /// satisfy. Empty means eligible.
    pub fn unsatisfied_constraints(&self, election: &Election) -> Vec<usize> {
        election.mask.unsatisfied_by(&self.attributes)
    }

    pub fn can_vote(&self, election: &Election) -> bool {
        self.unsatisfied_constraints(election).is_empty()
    }

    /// The private inputs for a vote proof. Fails if no membership proof
    /// has been issued yet.
    pub fn witness(&self) -> Result<VoteWitness> {
        let membership = self.membership.as_ref().ok_or_else(|| {
            Error::ProofGeneration("no membership proof has been issued".to_string())
        })?;
        Ok(VoteWitness {
            secret: self.secret,
            membership_proof: membership.proof.clone(),
            attributes: self.attributes.clone(),
        })
    }
}

impl Debug for Voter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Voter")
            .field("commitment", &self.commitment())
            .finish_non_exhaustive()
    }
}
