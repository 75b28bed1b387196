use std::ops::AddAssign;
use std::sync::Arc;
use std::time::Duration;

use shared_types::WorkerId;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::control::{wait_while_paused, PauseState};
use super::registry::WorkerRegistry;
use crate::client::WorkerClient;
use crate::score::Event;

/// Per-sender delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SenderReport {
    pub delivered: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl AddAssign for SenderReport {
    fn add_assign(&mut self, rhs: Self) {
        self.delivered += rhs.delivered;
        self.failed += rhs.failed;
        self.skipped += rhs.skipped;
    }
}

/// Drains one worker's event channel and delivers each event, best-effort.
pub struct WorkerSender {
    worker: WorkerId,
    track: usize,
    registry: Arc<WorkerRegistry>,
    client: Arc<dyn WorkerClient>,
    paused: watch::Receiver<PauseState>,
    delivery_timeout: Duration,
    cancel: CancellationToken,
}

impl WorkerSender {
    pub fn new(
        worker: WorkerId,
        track: usize,
        registry: Arc<WorkerRegistry>,
        client: Arc<dyn WorkerClient>,
        paused: watch::Receiver<PauseState>,
        delivery_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            worker,
            track,
            registry,
            client,
            paused,
            delivery_timeout,
            cancel,
        }
    }

    /// Run until the channel is closed and drained.
    ///
    /// After cancellation the remaining events are drained without delivery.
    pub async fn run(mut self, mut events: mpsc::Receiver<Event>) -> SenderReport {
        let mut report = SenderReport::default();

        while let Some(event) = events.recv().await {
            if self.cancel.is_cancelled() || !wait_while_paused(&mut self.paused, &self.cancel).await
            {
                report.skipped += 1;
                continue;
            }
            self.deliver(event, &mut report).await;
        }

        debug!(
            worker = %self.worker,
            track = self.track,
            delivered = report.delivered,
            failed = report.failed,
            skipped = report.skipped,
            "worker sender finished"
        );
        report
    }

    async fn deliver(&self, event: Event, report: &mut SenderReport) {
        if event.payload.is_empty() {
            report.skipped += 1;
            return;
        }

        // Resolved per event so address updates apply to not-yet-sent events.
        let Some(address) = self.registry.address_of(&self.worker).await else {
            warn!(
                worker = %self.worker,
                track = self.track,
                "worker no longer registered, dropping event"
            );
            report.skipped += 1;
            return;
        };

        let call = self.client.deliver_event(&address, &event.payload);
        match tokio::time::timeout(self.delivery_timeout, call).await {
            Ok(Ok(())) => {
                report.delivered += 1;
                debug!(
                    worker = %self.worker,
                    track = self.track,
                    address = %address,
                    offset_ms = event.offset.as_millis() as u64,
                    "event delivered"
                );
            }
            Ok(Err(e)) => {
                report.failed += 1;
                warn!(worker = %self.worker, track = self.track, address = %address, error = %e, "event delivery failed");
            }
            Err(_) => {
                report.failed += 1;
                warn!(
                    worker = %self.worker,
                    track = self.track,
                    address = %address,
                    timeout_ms = self.delivery_timeout.as_millis() as u64,
                    "event delivery timed out"
                );
            }
        }
    }
}
