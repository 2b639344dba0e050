pub mod client;
pub mod events;
pub mod payload;
pub mod registrar;

pub use client::VoterClient;
pub use events::{Event, EventBus};
pub use payload::{ElectionPayload, InitPayload, MembershipPayload, VotePayload};
pub use registrar::Registrar;
