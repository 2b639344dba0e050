//! The one-way hash underpinning every commitment and nullifier.
//!
//! The hash is a binding commitment, not a proof of knowledge: equal input
//! sequences always reproduce the same element, and inversion is infeasible.

use sha2::{Digest, Sha256};

use crate::attributes::AttributeMask;
use crate::field::FieldElement;

/// Domain separation tag, absorbed before every input sequence.
const DOMAIN_TAG: &[u8] = b"anon-vote-hash-v1";

/// Hash an ordered sequence of field elements into a single field element.
///
/// The element count is absorbed alongside the tag so that sequences of
/// different lengths can never collide by concatenation.
pub fn hash(elements: &[FieldElement]) -> FieldElement {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_TAG);
    hasher.update((elements.len() as u64).to_be_bytes());
    for element in elements {
        hasher.update(element.to_be_bytes());
    }
    FieldElement::from_bytes_mod_order(hasher.finalize().into())
}

/// The hash of the empty sequence, used as the Merkle padding sentinel.
pub fn empty_hash() -> FieldElement {
    hash(&[])
}

/// Commit to a string by hashing the sequence of its character code points.
/// Code points always fit the 254-bit field, so no range check is needed
/// here; out-of-range values only arise when decoding wire strings.
pub fn string_commitment(s: &str) -> FieldElement {
    let code_points: Vec<FieldElement> = s.chars().map(|c| FieldElement::from(c as u32)).collect();
    hash(&code_points)
}

/// A voter's public commitment to their private secret.
pub fn voter_commitment(secret: FieldElement) -> FieldElement {
    hash(&[secret])
}

/// The ballot id (nullifier) binding a voter secret to one election.
///
/// Repeated attempts by the same voter in the same election reproduce the
/// same id; any other (secret, election) pair yields a distinct id with
/// overwhelming probability. The secret is not recoverable from the id.
pub fn ballot_id(secret: FieldElement, election_commitment: FieldElement) -> FieldElement {
    hash(&[secret, election_commitment])
}

/// An election's identity commitment, binding its summary and eligibility
/// mask. The rules cannot be altered post hoc without changing the identity.
pub fn election_commitment(summary: &str, mask: &AttributeMask) -> FieldElement {
    let mut elements = vec![string_commitment(summary)];
    elements.extend(mask.witness());
    hash(&elements)
}

/// The public commitment to a yes/no answer, disclosed in the statement.
pub fn answer_hash(answer: bool) -> FieldElement {
    hash(&[FieldElement::from(answer as u64)])
}
