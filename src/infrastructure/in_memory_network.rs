use crate::domain::ports::NetworkLink;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LinkState {
    connected: bool,
    /// Status checks still to answer "not yet" after association starts;
    /// `None` means association never completes.
    pending_checks: Option<u32>,
    associating: bool,
    associations: Vec<String>,
}

/// A wireless link simulated in memory.
#[derive(Default, Clone)]
pub struct InMemoryNetwork {
    state: Arc<RwLock<LinkState>>,
}

impl InMemoryNetwork {
    /// Associates on the first status check after `associate`.
    pub fn available() -> Self {
        Self::after_checks(0)
    }

    /// Associates once `checks` status checks have answered "not yet".
    pub fn after_checks(checks: u32) -> Self {
        Self {
            state: Arc::new(RwLock::new(LinkState {
                pending_checks: Some(checks),
                ..Default::default()
            })),
        }
    }

    /// Never associates.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        state.connected = false;
        state.associating = false;
    }

    /// SSIDs passed to every `associate` call, in order.
    pub async fn associations(&self) -> Vec<String> {
        self.state.read().await.associations.clone()
    }
}

#[async_trait]
impl NetworkLink for InMemoryNetwork {
    async fn is_connected(&self) -> bool {
        let mut state = self.state.write().await;
        if !state.connected && state.associating {
            let pending = state.pending_checks;
            match pending {
                Some(0) => state.connected = true,
                Some(left) => state.pending_checks = Some(left - 1),
                None => {}
            }
        }
        state.connected
    }

    async fn associate(&self, ssid: &str, _password: &str) {
        let mut state = self.state.write().await;
        state.associating = true;
        state.associations.push(ssid.to_string());
    }
}
