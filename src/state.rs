// src/state.rs

use std::sync::Arc;

use crate::config::Config;
use crate::session::Sessions;
use crate::store::ProfileStore;
use crate::transport::Transport;

/// Shared handler context: the store is the single shared mutable state;
/// sessions are per-viewer scratch.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub transport: Arc<dyn Transport>,
    pub sessions: Sessions,
    pub config: Config,
}
