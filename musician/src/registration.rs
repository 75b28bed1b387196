//! Registration with the conductor.

use std::time::Duration;

use conductor::client::{ClientError, ConductorClient};
use shared_types::WorkerId;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Registers `id` at `advertise_addr`, retrying every `retry` until the
/// conductor accepts it. Returns `false` if `cancel` fires first.
pub async fn register_until_accepted(
    client: &ConductorClient,
    id: WorkerId,
    advertise_addr: &str,
    retry: Duration,
    cancel: &CancellationToken,
) -> bool {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        info!(%id, address = advertise_addr, attempt, "attempting to register with conductor");
        match client.register(id, advertise_addr).await {
            Ok(()) => {
                info!(%id, "registered with conductor");
                return true;
            }
            // The conductor will never accept this registration.
            Err(ClientError::Api { status: 400, message, .. }) => {
                warn!(%id, error = %message, "registration rejected");
                return false;
            }
            Err(e) => warn!(error = %e, "registration failed, retrying"),
        }

        tokio::select! {
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}

/// Best effort; failures are logged.
pub async fn unregister(client: &ConductorClient, id: WorkerId) {
    match client.unregister(id).await {
        Ok(()) => info!(%id, "unregistered from conductor"),
        Err(e) => warn!(%id, error = %e, "failed to unregister from conductor"),
    }
}
