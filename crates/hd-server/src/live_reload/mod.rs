//! Live reload: the reload channel, its notifier, and the change sources
//! that drive it.

mod build_hook;
mod debouncer;
mod notifier;
mod registry;
mod server;
mod watcher;
mod websocket;

pub use build_hook::{BUILD_COMPLETE_REASON, reload_on_build};
pub use notifier::{Notifier, Notify};
pub use registry::{ClientId, ClientRegistry, ReloadClient, ReloadSignal, SendError};
pub use server::ReloadServer;
pub use watcher::FileWatcher;
