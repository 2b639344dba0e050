use serde::{Deserialize, Serialize};

use crate::field::FieldElement;
use crate::hash::string_commitment;

/// An election's eligibility rules: an ordered sequence of optional
/// constraint strings, one slot per recognized attribute tag.
///
/// An empty slot places no constraint on that attribute. The mask's witness
/// is folded into the election commitment, making the rules tamper-evident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMask {
    slots: Vec<Option<String>>,
}

impl AttributeMask {
    /// A mask from explicit slots.
    pub fn new(slots: Vec<Option<String>>) -> Self {
        Self { slots }
    }

    /// A mask from plain strings, treating the empty string as "no
    /// constraint". This is how masks arrive off the wire.
    pub fn from_strings(constraints: impl IntoIterator<Item = String>) -> Self {
        let slots = constraints
            .into_iter()
            .map(|c| if c.is_empty() { None } else { Some(c) })
            .collect();
        Self { slots }
    }

    /// The per-slot field elements folded into the election commitment and
    /// disclosed as public inputs: a fixed zero element for empty slots, the
    /// constraint's string commitment otherwise.
    pub fn witness(&self) -> Vec<FieldElement> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Some(constraint) => string_commitment(constraint),
                None => FieldElement::ZERO,
            })
            .collect()
    }

    /// The indices of constrained slots that the given attribute values do
    /// not satisfy. A slot is satisfied when the holder's value matches the
    /// constraint verbatim (equal string commitments).
    pub fn unsatisfied_by(&self, attributes: &[Option<String>]) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(index, slot)| match slot {
                Some(constraint) => {
                    attributes.get(*index).and_then(Option::as_deref) != Some(constraint.as_str())
                }
                None => false,
            })
            .map(|(index, _)| index)
            .collect()
    }

    pub fn slots(&self) -> &[Option<String>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
