//! Admission control: a fixed ceiling on simultaneously active sessions.
//!
//! A connection that finds every slot taken is not refused. It is told how
//! long it has been waiting, once per poll interval, until a slot frees up,
//! and then receives a single `START`.

use luc_core::{LucResult, ServerLine};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use crate::session::Outbound;

/// One of the N concurrency slots. Dropping it releases the slot.
pub type AdmissionPermit = OwnedSemaphorePermit;

/// Gate that admits at most `capacity` sessions at a time.
pub struct AdmissionController {
    permits: Arc<Semaphore>,
    capacity: usize,
    poll_interval: Duration,
}

impl AdmissionController {
    /// Create a controller with `capacity` slots, polling every `poll_interval`
    /// while a connection waits.
    pub fn new(capacity: usize, poll_interval: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
            poll_interval,
        }
    }

    /// Take a slot if one is free right now.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        self.permits.clone().try_acquire_owned().ok()
    }

    /// Wait for a slot, reporting progress to the client.
    ///
    /// Writes `WAIT:<seconds since accepted_at>` every poll interval while all
    /// slots are taken, then `START` once one is acquired. Fails only if the
    /// client connection cannot be written to, in which case no slot is held.
    pub async fn admit(
        &self,
        outbound: &Outbound,
        accepted_at: Instant,
    ) -> LucResult<AdmissionPermit> {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately

        loop {
            if let Some(permit) = self.try_admit() {
                // A failed write drops the permit on the way out.
                outbound.send_line(&ServerLine::Start.to_string()).await?;
                return Ok(permit);
            }

            let elapsed = accepted_at.elapsed().as_secs();
            debug!(elapsed, "at capacity, client waiting");
            outbound
                .send_line(&ServerLine::Wait(elapsed).to_string())
                .await?;
            ticker.tick().await;
        }
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
