pub mod election;
pub mod state;
pub mod vote;
pub mod voter;

pub use election::{Election, ElectionDb, Tally};
pub use state::NetworkState;
pub use vote::Vote;
pub use voter::{Membership, Voter};
