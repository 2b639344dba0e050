//! The voter-membership accumulator: an append-only binary Merkle tree of
//! voter commitments with compact membership proofs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::FieldElement;
use crate::hash::{empty_hash, hash};

/// Errors arising from registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registration is closed")]
    Sealed,
    #[error("commitment is not registered")]
    NotFound,
}

/// Which side of the current node a path sibling sits on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// One step of a membership path: the sibling hash and its orientation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNode {
    pub sibling: FieldElement,
    pub side: Side,
}

/// A compact proof that a leaf is included in the accumulator.
///
/// A proof is only valid against the root captured at issuance time: later
/// registrations change the root and leave the proof stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    /// The leaf's position in the registration order.
    pub index: usize,
    /// Sibling hashes from the leaf up to (but excluding) the root.
    pub path: Vec<PathNode>,
}

impl MembershipProof {
    /// Recompute the root by folding the leaf up the path, honoring each
    /// sibling's orientation. Verification compares the result against the
    /// issuance-time root; statements referencing any other root reject.
    pub fn fold(&self, leaf: FieldElement) -> FieldElement {
        self.path.iter().fold(leaf, |current, node| match node.side {
            Side::Right => hash(&[current, node.sibling]),
            Side::Left => hash(&[node.sibling, current]),
        })
    }
}

/// The append-only registry of voter commitments.
///
/// The root is a pure function of the leaf sequence. Once sealed, no further
/// leaves are ever appended. Duplicate commitments are a caller
/// responsibility, not structurally rejected.
#[derive(Debug, Clone, Default)]
pub struct VoterRegistry {
    leaves: Vec<FieldElement>,
    sealed: bool,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a voter commitment. Fails once registration has closed.
    pub fn register(&mut self, commitment: FieldElement) -> Result<(), RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed);
        }
        self.leaves.push(commitment);
        Ok(())
    }

    /// Irreversibly seal the registry. A second call fails.
    pub fn close_registration(&mut self) -> Result<(), RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed);
        }
        self.sealed = true;
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// The current Merkle root: a public input to every vote statement.
    pub fn merkle_root(&self) -> FieldElement {
        self.levels()
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_else(empty_hash)
    }

    /// Issue a membership proof for a registered commitment, legal whether
    /// or not the registry is sealed. The registry only issues proofs;
    /// verification happens inside the proving circuit.
    pub fn prove_membership(
        &self,
        commitment: FieldElement,
    ) -> Result<MembershipProof, RegistryError> {
        let index = self
            .leaves
            .iter()
            .position(|&leaf| leaf == commitment)
            .ok_or(RegistryError::NotFound)?;

        let mut path = Vec::new();
        let mut position = index;
        for level in self.levels() {
            if level.len() == 1 {
                break;
            }
            let (sibling, side) = if position % 2 == 0 {
                (level[position + 1], Side::Right)
            } else {
                (level[position - 1], Side::Left)
            };
            path.push(PathNode { sibling, side });
            position /= 2;
        }

        Ok(MembershipProof { index, path })
    }

    /// The tree levels from leaves to root, each level padded to an even
    /// node count with the sentinel leaf (the hash of the empty sequence).
    /// Path length is therefore ceil(log2(leaf count)).
    fn levels(&self) -> Vec<Vec<FieldElement>> {
        if self.leaves.is_empty() {
            return Vec::new();
        }
        let mut levels = vec![self.leaves.clone()];
        while levels.last().expect("at least one level").len() > 1 {
            let level = levels.last_mut().expect("at least one level");
            if level.len() % 2 == 1 {
                level.push(empty_hash());
            }
            let next = level
                .chunks(2)
                .map(|pair| hash(&[pair[0], pair[1]]))
                .collect();
            levels.push(next);
        }
        levels
    }
}
