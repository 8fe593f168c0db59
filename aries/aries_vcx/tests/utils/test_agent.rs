use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use aries_vcx::{
    agent::{Agent, AgentConfig},
    errors::error::{AriesVcxError, AriesVcxErrorKind, VcxResult},
    events::{AgentEvent, EventSubscription, StateChangedEvent},
    transport::{InboundMessageContext, MessageSender, OutboundMessage},
};
use async_trait::async_trait;
use log::{error, info};
use test_utils::devsetup::dev_build_in_memory_wallet;
use url::Url;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers outbound messages to the agent registered for their endpoint.
/// Every delivery runs on its own task, the way separate envelopes would
/// arrive over a real transport.
#[derive(Clone, Debug, Default)]
pub struct Loopback {
    agents: Arc<RwLock<HashMap<Url, Agent>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl Loopback {
    pub fn register(&self, endpoint: Url, agent: Agent) {
        self.agents.write().unwrap().insert(endpoint, agent);
    }

    /// Every message sent so far, by any agent, in sending order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for Loopback {
    async fn send_message(&self, outbound: OutboundMessage) -> VcxResult<()> {
        self.sent.lock().unwrap().push(outbound.clone());
        let agent = self
            .agents
            .read()
            .unwrap()
            .get(&outbound.endpoint)
            .cloned()
            .ok_or_else(|| {
                AriesVcxError::from_msg(
                    AriesVcxErrorKind::NotReady,
                    format!("Nobody listens on {}", outbound.endpoint),
                )
            })?;
        let ctx = InboundMessageContext::new(outbound.message)
            .with_keys(outbound.sender_key, outbound.recipient_keys.first().cloned());
        tokio::spawn(async move {
            let message_id = ctx.message.id().to_owned();
            if let Err(err) = agent.receive_message(ctx).await {
                error!("Loopback >> delivery of {message_id} failed: {err}");
            }
        });
        Ok(())
    }
}

pub struct TestAgent {
    pub agent: Agent,
    pub endpoint: Url,
}

/// Waits for the first record of `record_type` to reach `state`, for
/// records whose id is only known once the peer's message arrived.
pub async fn wait_for_new_record(
    subscription: &mut EventSubscription,
    record_type: &str,
    state: impl ToString,
) -> StateChangedEvent {
    let state = state.to_string();
    match subscription
        .wait_for(
            |event| {
                matches!(event, AgentEvent::StateChanged(changed)
                    if changed.record_type == record_type && changed.state == state)
            },
            TIMEOUT,
        )
        .await
        .unwrap()
    {
        AgentEvent::StateChanged(changed) => changed,
        other => panic!("Unexpected event {other:?}"),
    }
}

pub fn create_test_agent(
    loopback: &Loopback,
    label: &str,
    endpoint: &str,
    configure: impl FnOnce(AgentConfig) -> AgentConfig,
) -> TestAgent {
    let endpoint = Url::parse(endpoint).unwrap();
    let config = configure(
        AgentConfig::builder()
            .label(label)
            .endpoint(endpoint.clone())
            .build(),
    );
    let agent = Agent::new(
        config,
        dev_build_in_memory_wallet(),
        Arc::new(loopback.clone()),
    );
    loopback.register(endpoint.clone(), agent.clone());
    info!("create_test_agent >> {label} listens on {endpoint}");
    TestAgent { agent, endpoint }
}
