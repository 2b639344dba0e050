//! Broadcast events pushed from the registrar to subscribed clients.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use crate::api::payload::{ElectionPayload, VotePayload};
use crate::model::NetworkState;

/// One broadcast event. Within a single stream (all `Vote` events, say)
/// delivery order is preserved; clients must tolerate reordering across
/// streams by buffering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NetworkState(NetworkState),
    Election(ElectionPayload),
    Vote(VotePayload),
}

/// Fan-out of events to any number of subscribers.
///
/// Each subscriber gets its own channel, so every subscriber observes the
/// emission order. Disconnected subscribers are pruned on the next emit.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<Event> {
        let (sender, receiver) = channel();
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .push(sender);
        receiver
    }

    pub fn emit(&self, event: Event) {
        self.subscribers
            .lock()
            .expect("event bus lock poisoned")
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
