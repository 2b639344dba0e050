use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Phases in the network lifecycle.
///
/// The transition is explicit, operator-triggered, and irreversible: the
/// registrar owns the state, flips it through exactly one method, and
/// broadcasts the change. There is no way back to `Registration`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkState {
    /// Voters may register commitments. Initial phase.
    Registration,
    /// The registry is sealed; elections run and votes are cast.
    Polling,
}

impl Display for NetworkState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            NetworkState::Registration => write!(f, "Registration"),
            NetworkState::Polling => write!(f, "Polling"),
        }
    }
}
