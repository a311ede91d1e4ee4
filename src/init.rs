//! Explicit initialization state machine
//!
//! `Uninitialized → Loading → {Ready | DegradedReady}`. The gate is owned by
//! the process entry point and handed to request handlers as a capability
//! object; no module-global flags. A degraded start never blocks serving,
//! and the first successful bridge-backed call upgrades the gate to `Ready`.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::bridge::MailBridge;

/// Lifecycle states of the bridge connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Loading,
    /// Connectivity confirmed
    Ready,
    /// The probe window expired; serving lazily, bridge calls may still fail
    DegradedReady,
}

/// Capability object carrying the initialization state
#[derive(Debug)]
pub struct InitGate {
    state: Mutex<InitState>,
}

impl InitGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InitState::Uninitialized),
        }
    }

    pub fn current(&self) -> InitState {
        *self.state.lock().unwrap()
    }

    /// Probe bridge connectivity within a bounded window
    ///
    /// Moves through `Loading` and settles on `Ready` when the probe
    /// succeeds in time, or `DegradedReady` when it times out or fails.
    /// Startup is never blocked on an unreachable mail application.
    pub async fn bootstrap(&self, bridge: &Arc<dyn MailBridge>, window: Duration) {
        self.transition(InitState::Loading);
        match timeout(window, bridge.check_connectivity()).await {
            Ok(Ok(())) => {
                info!("mail application reachable, serving ready");
                self.transition(InitState::Ready);
            }
            Ok(Err(error)) => {
                warn!(%error, "connectivity probe failed, serving degraded");
                self.transition(InitState::DegradedReady);
            }
            Err(_) => {
                warn!(
                    window_ms = window.as_millis() as u64,
                    "connectivity probe timed out, serving degraded"
                );
                self.transition(InitState::DegradedReady);
            }
        }
    }

    /// Record a successful bridge-backed call
    ///
    /// Upgrades `DegradedReady` to `Ready`; all other states are unchanged.
    pub fn record_success(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == InitState::DegradedReady {
            info!("bridge call succeeded, upgrading from degraded to ready");
            *state = InitState::Ready;
        }
    }

    fn transition(&self, next: InitState) {
        *self.state.lock().unwrap() = next;
    }
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}
