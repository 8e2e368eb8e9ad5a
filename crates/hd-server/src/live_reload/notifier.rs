//! Reload fan-out.

use std::sync::Arc;

use super::registry::{ClientRegistry, ReloadSignal};

/// Something a change source can report to.
pub trait Notify: Send + Sync {
    /// Announce a change. `reason` is diagnostic text only.
    fn notify(&self, reason: Option<&str>);
}

/// Broadcasts the reload signal to every open client in a registry.
///
/// Each call is an independent full round: nothing is coalesced, closed
/// clients are skipped, and delivery failures are swallowed. The registry is
/// never modified here; connection tasks remove their own clients.
pub struct Notifier {
    registry: Arc<ClientRegistry>,
}

impl Notifier {
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>) -> Self {
        Self { registry }
    }
}

impl Notify for Notifier {
    fn notify(&self, reason: Option<&str>) {
        if let Some(reason) = reason {
            tracing::info!("{reason}");
        }

        let mut delivered = 0usize;
        for client in self.registry.snapshot() {
            if !client.is_open() {
                continue;
            }
            match client.send(ReloadSignal) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(error = %e, "Reload signal not delivered"),
            }
        }

        tracing::debug!(clients = delivered, "Reload signal broadcast");
    }
}
