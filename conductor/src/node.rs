//! The conductor node: registry, playback and status behind narrow traits.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{SessionStatus, Worker, WorkerId};
use tracing::info;

use crate::baton::{PlaybackSession, WorkerRegistry};
use crate::error::ConductorError;
use crate::library::ScoreLibrary;

/// Worker registration.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn register_worker(&self, id: &str, address: &str) -> Result<(), ConductorError>;
    async fn unregister_worker(&self, id: &str) -> Result<(), ConductorError>;
    async fn workers(&self) -> Vec<Worker>;
}

/// Playback lifecycle.
#[async_trait]
pub trait Playback: Send + Sync {
    /// Returns the id of the started session.
    async fn play_score(&self, name: &str) -> Result<String, ConductorError>;
    fn pause(&self) -> Result<(), ConductorError>;
    fn resume(&self) -> Result<(), ConductorError>;
    fn stop(&self) -> Result<(), ConductorError>;
}

#[async_trait]
pub trait StatusReporter: Send + Sync {
    async fn status(&self) -> SessionStatus;
    fn healthy(&self) -> bool;
}

pub struct ConductorNode {
    registry: Arc<WorkerRegistry>,
    session: Arc<PlaybackSession>,
    library: ScoreLibrary,
}

impl ConductorNode {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        session: Arc<PlaybackSession>,
        library: ScoreLibrary,
    ) -> Self {
        Self {
            registry,
            session,
            library,
        }
    }

    pub fn session(&self) -> &Arc<PlaybackSession> {
        &self.session
    }
}

#[async_trait]
impl Registry for ConductorNode {
    async fn register_worker(&self, id: &str, address: &str) -> Result<(), ConductorError> {
        let id: WorkerId = id.parse()?;
        let address = address.trim();
        if address.is_empty() {
            return Err(ConductorError::InvalidArgument(
                "worker address must not be empty".to_string(),
            ));
        }
        self.registry
            .register(Worker {
                id,
                address: address.to_string(),
            })
            .await;
        Ok(())
    }

    async fn unregister_worker(&self, id: &str) -> Result<(), ConductorError> {
        let id: WorkerId = id.parse()?;
        if !self.registry.unregister(&id).await {
            info!(%id, "unregister for unknown worker ignored");
        }
        Ok(())
    }

    async fn workers(&self) -> Vec<Worker> {
        self.registry.snapshot().await
    }
}

#[async_trait]
impl Playback for ConductorNode {
    async fn play_score(&self, name: &str) -> Result<String, ConductorError> {
        // Fail fast without touching the disk while a session is running.
        if self.session.state() == shared_types::PlaybackState::Playing {
            return Err(crate::baton::BatonError::AlreadyPlaying.into());
        }
        let raw = self.library.read(name).await?;
        let session_id = self.session.play(&raw)?;
        info!(score = name, session = %session_id, "playback requested");
        Ok(session_id)
    }

    fn pause(&self) -> Result<(), ConductorError> {
        Ok(self.session.pause()?)
    }

    fn resume(&self) -> Result<(), ConductorError> {
        Ok(self.session.resume()?)
    }

    fn stop(&self) -> Result<(), ConductorError> {
        Ok(self.session.stop()?)
    }
}

#[async_trait]
impl StatusReporter for ConductorNode {
    async fn status(&self) -> SessionStatus {
        self.session.status().await
    }

    fn healthy(&self) -> bool {
        self.library.root().is_dir()
    }
}
