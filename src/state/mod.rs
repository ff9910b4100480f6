pub mod game;
mod lobby;
pub mod registry;
pub mod session;
mod turns;

pub use lobby::{Disconnected, JoinedMatch};
pub use turns::{ClockStatus, ThrowApplied};

use crate::config::AppConfig;
use registry::MatchRegistry;
use session::SessionBinder;

/// Shared application state: every match plus the connection bindings.
///
/// Each match is guarded by its own mutex inside the registry, so commands
/// for unrelated matches never wait on each other.
pub struct AppState {
    pub config: AppConfig,
    pub registry: MatchRegistry,
    pub sessions: SessionBinder,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            config,
            registry: MatchRegistry::new(),
            sessions: SessionBinder::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
