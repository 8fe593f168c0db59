//! Agent events, published over a broadcast channel.
//!
//! Every persisted state transition of a protocol record is published as
//! [`AgentEvent::StateChanged`]. Callers that need to block until an exchange
//! reaches some state subscribe first and then wait with a timeout.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult};

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct StateChangedEvent {
    pub record_type: String,
    pub record_id: String,
    pub thread_id: String,
    pub connection_id: Option<String>,
    pub previous_state: Option<String>,
    pub state: String,
    /// The record as persisted after the transition.
    pub record: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    StateChanged(StateChangedEvent),
    MessageProcessed {
        message_id: String,
        message_type: String,
        connection_id: Option<String>,
    },
    DidRotated {
        connection_id: String,
        our_did: Option<(String, String)>,
        their_did: Option<(String, String)>,
    },
    HandshakeReused {
        connection_id: String,
        out_of_band_id: String,
        reuse_thread_id: String,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<AgentEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn emit(&self, event: AgentEvent) {
        if self.sender.send(event).is_err() {
            trace!("EventBus::emit >> no subscribers, event dropped");
        }
    }

    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receives the events emitted after it was created.
#[derive(Debug)]
pub struct EventSubscription {
    receiver: broadcast::Receiver<AgentEvent>,
}

impl EventSubscription {
    /// Resolves with the first event matching `predicate`, or fails with
    /// [`AriesVcxErrorKind::Timeout`] once `timeout` has passed.
    pub async fn wait_for<F>(&mut self, predicate: F, timeout: Duration) -> VcxResult<AgentEvent>
    where
        F: Fn(&AgentEvent) -> bool,
    {
        let receiver = &mut self.receiver;
        let next_match = async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if predicate(&event) => return Ok(event),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("EventSubscription::wait_for >> lagged behind, {skipped} events skipped");
                    }
                    Err(RecvError::Closed) => {
                        return Err(AriesVcxError::from_msg(
                            AriesVcxErrorKind::NotReady,
                            "Event bus was closed",
                        ))
                    }
                }
            }
        };
        tokio::time::timeout(timeout, next_match)
            .await
            .map_err(|_| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::Timeout,
                    format!("No matching event received within {timeout:?}"),
                )
            })?
    }

    pub async fn wait_for_state(
        &mut self,
        record_id: &str,
        state: impl ToString,
        timeout: Duration,
    ) -> VcxResult<StateChangedEvent> {
        let state = state.to_string();
        let event = self
            .wait_for(
                |event| {
                    matches!(event, AgentEvent::StateChanged(changed)
                        if changed.record_id == record_id && changed.state == state)
                },
                timeout,
            )
            .await?;
        match event {
            AgentEvent::StateChanged(changed) => Ok(changed),
            other => Err(AriesVcxError::from_msg(
                AriesVcxErrorKind::InvalidState,
                format!("Unexpected event {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state_changed(record_id: &str, state: &str) -> AgentEvent {
        AgentEvent::StateChanged(StateChangedEvent {
            record_type: "proof".to_owned(),
            record_id: record_id.to_owned(),
            thread_id: "thid".to_owned(),
            connection_id: None,
            previous_state: None,
            state: state.to_owned(),
            record: json!({}),
        })
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let bus = EventBus::default();
        let mut subscription = bus.subscribe();
        bus.emit(state_changed("a", "request-sent"));
        bus.emit(state_changed("b", "done"));
        bus.emit(state_changed("a", "done"));

        let event = subscription
            .wait_for_state("a", "done", Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(event.record_id, "a");
        assert_eq!(event.state, "done");
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let bus = EventBus::new(4);
        let mut subscription = bus.subscribe();
        bus.emit(state_changed("a", "request-sent"));

        let err = subscription
            .wait_for_state("a", "done", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AriesVcxErrorKind::Timeout);
    }

    #[test]
    fn test_emit_without_subscribers() {
        EventBus::new(1).emit(state_changed("a", "done"));
    }
}
