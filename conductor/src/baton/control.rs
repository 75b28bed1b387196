//! Pause/resume control shared by the routers and senders of a session.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct PauseState {
    pub paused: bool,
    since: Option<Instant>,
    /// Accumulated paused time since the session started
    total: Duration,
}

/// In-process pause flag. Senders and pacing clocks observe it through
/// [`watch::Receiver`]s and block, never drop, while it is set.
pub struct PlaybackControl {
    state: watch::Sender<PauseState>,
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackControl {
    pub fn new() -> Self {
        let (state, _) = watch::channel(PauseState::default());
        Self { state }
    }

    /// Returns false if already paused.
    pub fn pause(&self) -> bool {
        self.state.send_if_modified(|s| {
            if s.paused {
                return false;
            }
            s.paused = true;
            s.since = Some(Instant::now());
            true
        })
    }

    /// Returns false if not paused.
    pub fn resume(&self) -> bool {
        self.state.send_if_modified(|s| {
            if !s.paused {
                return false;
            }
            if let Some(since) = s.since.take() {
                s.total += since.elapsed();
            }
            s.paused = false;
            true
        })
    }

    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    pub fn subscribe(&self) -> watch::Receiver<PauseState> {
        self.state.subscribe()
    }

    /// Clear the flag and the paused-time ledger, waking any blocked waiter.
    pub fn reset(&self) {
        self.state.send_replace(PauseState::default());
    }
}

/// Score clock for real-time pacing. Paused time does not advance it.
pub struct SessionClock {
    start: Instant,
    state: watch::Receiver<PauseState>,
}

impl SessionClock {
    pub fn new(start: Instant, state: watch::Receiver<PauseState>) -> Self {
        Self { start, state }
    }

    /// Wait until the score reaches `offset`.
    pub async fn wait_until(&mut self, offset: Duration) {
        loop {
            if self.state.wait_for(|s| !s.paused).await.is_err() {
                return;
            }
            let total = self.state.borrow().total;
            let Some(deadline) = offset
                .checked_add(total)
                .and_then(|shift| self.start.checked_add(shift))
            else {
                // Unreachable deadline; only a pause can wake this waiter.
                if self.state.changed().await.is_err() {
                    return;
                }
                continue;
            };
            if Instant::now() >= deadline {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                changed = self.state.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

/// Block while paused. Returns false if cancelled or the control is gone.
pub async fn wait_while_paused(
    state: &mut watch::Receiver<PauseState>,
    cancel: &tokio_util::sync::CancellationToken,
) -> bool {
    if !state.borrow().paused {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        resumed = async { state.wait_for(|s| !s.paused).await.is_ok() } => resumed,
    }
}
