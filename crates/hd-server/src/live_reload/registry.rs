//! Client registry.
//!
//! The set of currently connected reload listeners. The reload channel server
//! owns it and hands it to the notifier by `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The one message a reload client ever receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReloadSignal;

impl ReloadSignal {
    /// Wire form of the signal.
    pub const TEXT: &'static str = "reload";

    #[must_use]
    pub fn as_str(self) -> &'static str {
        Self::TEXT
    }
}

impl fmt::Display for ReloadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::TEXT)
    }
}

/// A reload signal could not be delivered because the connection is gone.
#[derive(Debug, thiserror::Error)]
#[error("reload client connection closed")]
pub struct SendError;

/// A connected reload listener.
///
/// Any transport satisfying this capability can be registered: a WebSocket
/// connection task, an in-process channel, or a test double.
pub trait ReloadClient: Send + Sync {
    /// Whether the connection was open at last check.
    fn is_open(&self) -> bool;

    /// Queue the signal for delivery without blocking.
    fn send(&self, signal: ReloadSignal) -> Result<(), SendError>;
}

/// Identity of a registered client, unique for the registry's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live set of reload clients, iterated in registration order.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<BTreeMap<ClientId, Arc<dyn ReloadClient>>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and return its identity.
    pub fn register(&self, client: Arc<dyn ReloadClient>) -> ClientId {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, client);
        id
    }

    /// Remove a client. Returns `false` if it was not registered.
    pub fn remove(&self, id: ClientId) -> bool {
        self.lock().remove(&id).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Current members in registration order.
    ///
    /// The lock is released before the caller touches any client.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn ReloadClient>> {
        self.lock().values().map(Arc::clone).collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<ClientId, Arc<dyn ReloadClient>>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
