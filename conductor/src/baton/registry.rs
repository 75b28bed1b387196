use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{Worker, WorkerId};
use tokio::sync::RwLock;
use tracing::info;

/// Outcome of [`WorkerRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    /// The id was already known; its address was replaced in place.
    Updated,
}

#[derive(Default)]
struct Entries {
    /// Registration order. Tracks are addressed by position in this list.
    order: Vec<WorkerId>,
    addresses: HashMap<WorkerId, String>,
}

/// Known workers, keyed by id, with a positional view in registration order.
///
/// Shared by the HTTP registration path and every playback task; lookups
/// only take the read side of the lock.
#[derive(Default)]
pub struct WorkerRegistry {
    entries: RwLock<Entries>,
}

impl WorkerRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Upsert a worker. Re-registering keeps the original position.
    pub async fn register(&self, worker: Worker) -> Registration {
        let mut entries = self.entries.write().await;
        let outcome = match entries.addresses.insert(worker.id, worker.address.clone()) {
            Some(_) => Registration::Updated,
            None => {
                entries.order.push(worker.id);
                Registration::Inserted
            }
        };
        info!(id = %worker.id, address = %worker.address, ?outcome, "worker registered");
        outcome
    }

    /// Remove a worker. Unknown ids are a no-op; returns whether it was present.
    pub async fn unregister(&self, id: &WorkerId) -> bool {
        let mut entries = self.entries.write().await;
        if entries.addresses.remove(id).is_none() {
            return false;
        }
        entries.order.retain(|known| known != id);
        info!(%id, "worker unregistered");
        true
    }

    /// The worker at `position` in registration order.
    pub async fn worker_at(&self, position: usize) -> Option<Worker> {
        let entries = self.entries.read().await;
        let id = entries.order.get(position)?;
        entries.addresses.get(id).map(|address| Worker {
            id: *id,
            address: address.clone(),
        })
    }

    /// Current address of a worker, if it is still registered.
    pub async fn address_of(&self, id: &WorkerId) -> Option<String> {
        self.entries.read().await.addresses.get(id).cloned()
    }

    /// All workers in registration order, taken under a single lock.
    pub async fn snapshot(&self) -> Vec<Worker> {
        let entries = self.entries.read().await;
        entries
            .order
            .iter()
            .filter_map(|id| {
                entries.addresses.get(id).map(|address| Worker {
                    id: *id,
                    address: address.clone(),
                })
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
