//! Interrupt propagation to running child processes

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shared cancellation flag
///
/// Cloning yields a handle to the same flag. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation of the running command and all pending work
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as self, so wait_for only returns once the flag flips.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Trip the signal on Ctrl-C
pub fn cancel_on_ctrl_c(signal: CancelSignal) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, terminating the running session");
                signal.cancel();
            }
            Err(e) => {
                warn!("Failed to listen for Ctrl+C signal: {}", e);
            }
        }
    });
}
