use std::sync::Arc;

use crate::node::{Playback, Registry, StatusReporter};

/// Everything the HTTP handlers need, behind the node's traits.
pub struct AppState {
    pub registry: Arc<dyn Registry>,
    pub playback: Arc<dyn Playback>,
    pub status: Arc<dyn StatusReporter>,
}

impl AppState {
    pub fn from_node<N>(node: Arc<N>) -> Self
    where
        N: Registry + Playback + StatusReporter + 'static,
    {
        Self {
            registry: node.clone(),
            playback: node.clone(),
            status: node,
        }
    }
}
