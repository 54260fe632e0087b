use crate::application::supervisor::ConnectionSupervisor;
use crate::config::{ControllerConfig, Topics};
use crate::domain::card::{BalanceBlock, CardIdentity};
use crate::domain::codec;
use crate::domain::command::TopUpCommand;
use crate::domain::ports::{CardChannelBox, Message, MessageChannel, MessageChannelBox};
use crate::domain::report::{BalanceObservation, BalanceUpdateReport};
use crate::error::{LedgerError, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// Result of the top-up command drained this tick, if one arrived.
    pub command: Option<Result<BalanceUpdateReport>>,
    /// Result of the passive scan; `None` when no card was in the field.
    pub observation: Option<Result<BalanceObservation>>,
    /// Set when the message channel reported a connectivity failure.
    pub link_lost: bool,
}

/// Running totals over the ticks of one `run`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub top_ups_applied: u64,
    pub commands_rejected: u64,
    pub observations: u64,
    pub scan_failures: u64,
    pub reconnects: u64,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match &outcome.command {
            Some(Ok(_)) => self.top_ups_applied += 1,
            Some(Err(_)) => self.commands_rejected += 1,
            None => {}
        }
        match &outcome.observation {
            Some(Ok(_)) => self.observations += 1,
            Some(Err(_)) => self.scan_failures += 1,
            None => {}
        }
        if outcome.link_lost {
            self.reconnects += 1;
        }
    }
}

/// The balance ledger control loop.
///
/// Each tick drains at most one top-up command and applies it to the card in
/// the field, then passively scans for a card and reports its balance. Every
/// card session opened during a tick is released before the tick ends.
pub struct TopUpEngine {
    card: CardChannelBox,
    messages: MessageChannelBox,
    config: Arc<ControllerConfig>,
    topics: Topics,
}

impl TopUpEngine {
    pub fn new(
        card: CardChannelBox,
        messages: MessageChannelBox,
        config: Arc<ControllerConfig>,
    ) -> Self {
        let topics = config.topics();
        Self {
            card,
            messages,
            config,
            topics,
        }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn message_channel(&self) -> &dyn MessageChannel {
        self.messages.as_ref()
    }

    /// Brings the link up, then ticks until `max_ticks` is reached (forever
    /// when `None`), sleeping the configured interval after each tick.
    pub async fn run(
        &self,
        supervisor: &ConnectionSupervisor,
        max_ticks: Option<u64>,
    ) -> RunSummary {
        supervisor.start(self.message_channel()).await;
        info!("System ready, scanning for cards");

        let mut summary = RunSummary::default();
        while max_ticks.is_none_or(|limit| summary.ticks < limit) {
            let outcome = self.step(supervisor).await;
            summary.record(&outcome);
            tokio::time::sleep(self.config.timing.tick_interval()).await;
        }
        summary
    }

    /// One tick followed by link recovery if the tick saw the link drop.
    pub async fn step(&self, supervisor: &ConnectionSupervisor) -> TickOutcome {
        let outcome = self.tick().await;
        if outcome.link_lost {
            supervisor.recover(self.message_channel()).await;
        }
        outcome
    }

    /// Runs one iteration: at most one inbound command, then the passive scan.
    /// Never fails; every error is recorded in the returned outcome.
    pub async fn tick(&self) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        match self.messages.poll_once().await {
            Ok(Some(message)) => {
                outcome.command = self.handle_message(message, &mut outcome.link_lost).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Polling for messages failed");
                outcome.link_lost = true;
            }
        }

        outcome.observation = self.scan().await;
        if let Some(Ok(observation)) = &outcome.observation {
            self.publish(&self.topics.status, observation, &mut outcome.link_lost)
                .await;
        }

        outcome
    }

    async fn handle_message(
        &self,
        message: Message,
        link_lost: &mut bool,
    ) -> Option<Result<BalanceUpdateReport>> {
        if message.topic != self.topics.top_up {
            debug!(topic = %message.topic, "Ignoring message on unexpected topic");
            return None;
        }

        let result = self.process_command(&message.payload).await;
        match &result {
            Ok(report) => {
                self.publish(&self.topics.balance, report, link_lost).await;
            }
            Err(e) => warn!(error = %e, "Top-up command dropped"),
        }
        Some(result)
    }

    /// Parses, validates and applies one raw top-up payload.
    pub async fn process_command(&self, payload: &[u8]) -> Result<BalanceUpdateReport> {
        let command = TopUpCommand::from_payload(payload)?;
        info!(
            uid = %command.target,
            amount = %command.amount(),
            "Top-up command received"
        );
        self.apply_top_up(&command).await
    }

    /// Credits `command` to the card in the field if it is the requested one.
    pub async fn apply_top_up(&self, command: &TopUpCommand) -> Result<BalanceUpdateReport> {
        if !self.card.detect().await {
            return Err(LedgerError::NoCardPresent);
        }
        let result = self.top_up_session(command).await;
        self.card.release_session().await;
        result
    }

    async fn top_up_session(&self, command: &TopUpCommand) -> Result<BalanceUpdateReport> {
        let identity = self.card.read_identity().await?;
        if identity != command.target {
            return Err(LedgerError::IdentityMismatch {
                presented: identity,
                requested: command.target.clone(),
            });
        }

        let block = self.authenticate_and_read(&identity).await?;
        let balance = codec::decode(&block);
        let new_balance = command.credit(balance)?;

        let updated = codec::encode(new_balance, &block.tail());
        self.card.write_block(self.config.card.block, &updated).await?;
        info!(uid = %identity, balance, new_balance, "Balance updated");

        Ok(BalanceUpdateReport {
            uid: identity,
            new_balance,
        })
    }

    /// Reads the balance of whatever card is in the field, without writing.
    pub async fn scan(&self) -> Option<Result<BalanceObservation>> {
        if !self.card.detect().await {
            return None;
        }
        let result = self.scan_session().await;
        self.card.release_session().await;

        if let Err(e) = &result {
            warn!(error = %e, "Passive scan failed");
        }
        Some(result)
    }

    async fn scan_session(&self) -> Result<BalanceObservation> {
        let identity = self.card.read_identity().await?;
        debug!(uid = %identity, "Card detected");

        let block = self.authenticate_and_read(&identity).await?;
        let balance = codec::decode(&block);
        info!(uid = %identity, balance, "Balance read");

        Ok(BalanceObservation {
            uid: identity,
            balance,
        })
    }

    async fn authenticate_and_read(&self, identity: &CardIdentity) -> Result<BalanceBlock> {
        let block = self.config.card.block;
        if !self
            .card
            .authenticate(block, &self.config.card.key, identity)
            .await
        {
            return Err(LedgerError::Authentication { block });
        }
        self.card.read_block(block).await
    }

    async fn publish<T: Serialize>(&self, topic: &str, body: &T, link_lost: &mut bool) {
        let payload = match serde_json::to_vec(body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(topic, error = %e, "Could not serialize outbound message");
                return;
            }
        };
        if let Err(e) = self.messages.publish(topic, &payload).await {
            warn!(topic, error = %e, "Publish failed");
            if e.is_connectivity() {
                *link_lost = true;
            }
        }
    }
}
