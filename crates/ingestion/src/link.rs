//! LinkGate - connectivity readiness signal
//!
//! The connectivity collaborator reports its state here; the runtime waits
//! on the gate before arming the packet callback and the publish timer.

use std::sync::Arc;
use std::time::Duration;

use contracts::{ContractError, LinkState};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Shared readiness signal; clones observe and drive the same state
#[derive(Debug, Clone)]
pub struct LinkGate {
    tx: Arc<watch::Sender<LinkState>>,
}

impl Default for LinkGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkGate {
    /// Gate starting in `Disconnected`
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LinkState::Disconnected);
        Self { tx: Arc::new(tx) }
    }

    /// Gate that is already open (local sources need no network)
    pub fn connected() -> Self {
        let gate = Self::new();
        gate.set(LinkState::Connected);
        gate
    }

    /// Report a new link state
    pub fn set(&self, state: LinkState) {
        let previous = self.tx.send_replace(state);
        if previous != state {
            debug!(from = ?previous, to = ?state, "Link state changed");
        }
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        *self.tx.borrow()
    }

    /// Receiver for state changes
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.tx.subscribe()
    }

    /// Wait until the link reports `Connected`.
    ///
    /// # Errors
    /// `LinkTimeout` when `timeout` elapses first.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<(), ContractError> {
        let mut rx = self.tx.subscribe();

        let result = match tokio::time::timeout(timeout, rx.wait_for(|state| state.is_connected())).await {
            Ok(Ok(_)) => {
                info!("Link connected");
                Ok(())
            }
            Ok(Err(_)) => Err(ContractError::LinkClosed),
            Err(_) => {
                let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(waited_ms, state = ?self.state(), "Link not connected in time");
                Err(ContractError::LinkTimeout { waited_ms })
            }
        };
        result
    }
}
