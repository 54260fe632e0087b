//! Bench harness that drives the real engine against the in-memory
//! collaborators, following a scripted timeline of taps and commands.

use crate::application::engine::{RunSummary, TopUpEngine};
use crate::application::supervisor::ConnectionSupervisor;
use crate::domain::card::CardIdentity;
use crate::domain::ports::Message;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory_broker::InMemoryBroker;
use crate::infrastructure::in_memory_card::{InMemoryCardReader, SimulatedCard};
use crate::interfaces::csv::publication_writer::Publication;
use crate::interfaces::csv::scenario_reader::{EventKind, ScenarioEvent};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub struct ScenarioReplay {
    events: Vec<ScenarioEvent>,
    reader: InMemoryCardReader,
    broker: InMemoryBroker,
    block: u8,
    top_up_topic: String,
}

impl ScenarioReplay {
    /// `reader` and `broker` must be handles onto the same collaborators the
    /// engine was built with.
    pub fn new(
        mut events: Vec<ScenarioEvent>,
        reader: InMemoryCardReader,
        broker: InMemoryBroker,
        engine: &TopUpEngine,
        block: u8,
    ) -> Self {
        events.sort_by_key(|e| e.tick);
        Self {
            events,
            reader,
            broker,
            block,
            top_up_topic: engine.topics().top_up.clone(),
        }
    }

    /// Enough ticks to play every event and observe its effect.
    pub fn natural_length(&self) -> u64 {
        self.events.last().map_or(1, |e| e.tick.saturating_add(2))
    }

    pub async fn run(
        &self,
        engine: &TopUpEngine,
        supervisor: &ConnectionSupervisor,
        ticks: u64,
        tick_interval: Duration,
    ) -> (Vec<Publication>, RunSummary) {
        supervisor.start(engine.message_channel()).await;

        let mut publications = Vec::new();
        let mut summary = RunSummary::default();
        for tick in 0..ticks {
            for event in self.events.iter().filter(|e| e.tick == tick) {
                if let Err(e) = self.apply(event).await {
                    warn!(tick, error = %e, "Skipping scenario event");
                }
            }

            let outcome = engine.step(supervisor).await;
            summary.record(&outcome);

            for message in self.broker.take_published().await {
                publications.push(Publication {
                    tick,
                    topic: message.topic,
                    payload: String::from_utf8_lossy(&message.payload).into_owned(),
                });
            }
            tokio::time::sleep(tick_interval).await;
        }
        (publications, summary)
    }

    /// Final balance of every registered card, ordered by identity.
    pub async fn balances(&self) -> Vec<(CardIdentity, Option<u32>)> {
        let mut balances = Vec::new();
        for (uid, _) in self.reader.cards().await {
            let balance = self.reader.balance(&uid, self.block).await;
            balances.push((uid, balance));
        }
        balances.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        balances
    }

    async fn apply(&self, event: &ScenarioEvent) -> Result<()> {
        debug!(?event, "Applying scenario event");
        match event.event {
            EventKind::Card => {
                let uid = Self::identity(event)?;
                let balance = match event.value.as_deref() {
                    Some(value) => value.parse::<u32>().map_err(|e| {
                        LedgerError::Scenario(format!("card balance {value:?}: {e}"))
                    })?,
                    None => 0,
                };
                self.reader
                    .insert_card(uid, SimulatedCard::with_balance(self.block, balance))
                    .await;
            }
            EventKind::Tap => {
                let uid = Self::identity(event)?;
                if !self.reader.present(&uid).await {
                    return Err(LedgerError::Scenario(format!("card {uid} was never registered")));
                }
            }
            EventKind::Lift => self.reader.remove().await,
            EventKind::Topup => {
                let mut body = serde_json::Map::new();
                if let Some(uid) = &event.uid {
                    body.insert("uid".to_string(), json!(uid));
                }
                if let Some(value) = &event.value {
                    let amount = value
                        .parse::<i64>()
                        .map_or_else(|_| Value::String(value.clone()), Value::from);
                    body.insert("amount".to_string(), amount);
                }
                let payload = Value::Object(body).to_string();
                self.broker
                    .deliver(Message::new(&self.top_up_topic, payload))
                    .await;
            }
            EventKind::Payload => {
                let payload = event.value.clone().unwrap_or_default();
                self.broker
                    .deliver(Message::new(&self.top_up_topic, payload))
                    .await;
            }
            EventKind::Drop => self.broker.drop_link().await,
        }
        Ok(())
    }

    fn identity(event: &ScenarioEvent) -> Result<CardIdentity> {
        let uid = event
            .uid
            .as_deref()
            .ok_or_else(|| LedgerError::Scenario(format!("{:?} event needs a uid", event.event)))?;
        uid.parse()
            .map_err(|e| LedgerError::Scenario(format!("uid {uid:?}: {e}")))
    }
}
