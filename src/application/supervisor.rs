use crate::config::ControllerConfig;
use crate::domain::ports::{MessageChannel, NetworkLinkBox};
use crate::error::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Keeps the wireless link and the message channel usable for the engine.
///
/// Association is bounded and gives up quietly; the message channel is retried
/// without limit since the controller has nothing else to do without it.
pub struct ConnectionSupervisor {
    network: NetworkLinkBox,
    config: Arc<ControllerConfig>,
}

impl ConnectionSupervisor {
    pub fn new(network: NetworkLinkBox, config: Arc<ControllerConfig>) -> Self {
        Self { network, config }
    }

    /// Startup sequence: associate, then connect and subscribe.
    pub async fn start(&self, channel: &dyn MessageChannel) -> u32 {
        self.connect_network().await;
        self.establish(channel).await
    }

    /// Called after the engine observed the link drop.
    pub async fn recover(&self, channel: &dyn MessageChannel) -> u32 {
        warn!("Message channel lost, re-establishing");
        self.start(channel).await
    }

    /// Returns whether the link came up within the configured attempts.
    pub async fn connect_network(&self) -> bool {
        if self.network.is_connected().await {
            return true;
        }

        let network = &self.config.network;
        let timing = &self.config.timing;
        info!(ssid = %network.ssid, "Connecting to network");
        self.network.associate(&network.ssid, &network.password).await;

        for attempt in 1..=timing.association_attempts {
            if self.network.is_connected().await {
                info!(ssid = %network.ssid, attempt, "Network connected");
                return true;
            }
            tokio::time::sleep(timing.association_poll()).await;
        }

        if self.network.is_connected().await {
            info!(ssid = %network.ssid, "Network connected");
            return true;
        }
        warn!(
            ssid = %network.ssid,
            attempts = timing.association_attempts,
            "Network connection failed, continuing without it"
        );
        false
    }

    /// Connects and subscribes to the top-up topic, retrying until both
    /// succeed. Returns the number of attempts it took.
    pub async fn establish(&self, channel: &dyn MessageChannel) -> u32 {
        let topic = self.config.topics().top_up;
        let delay = self.config.timing.retry_delay();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match Self::connect_and_subscribe(channel, &topic).await {
                Ok(()) => {
                    info!(topic = %topic, attempt, "Message channel connected and subscribed");
                    return attempt;
                }
                Err(e) => {
                    warn!(attempt, error = %e, retry_in = ?delay, "Message channel connect failed");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn connect_and_subscribe(channel: &dyn MessageChannel, topic: &str) -> Result<()> {
        channel.connect().await?;
        channel.subscribe(topic).await
    }
}
