//! Periodic removal of idle callers.
//!
//! # Responsibilities
//! - Call [`AdmissionController::sweep`] on a fixed interval
//! - Stop when the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::admission::AdmissionController;

pub struct Sweeper {
    controller: Arc<AdmissionController>,
    interval: Duration,
}

impl Sweeper {
    pub fn new(controller: Arc<AdmissionController>, interval: Duration) -> Self {
        Self {
            controller,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Admission sweeper starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be idle yet.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.controller.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Admission sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionLimits;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let clock = ManualClock::at_epoch_secs(1_700_000_000);
        let controller = Arc::new(AdmissionController::with_clock(
            AdmissionLimits::default(),
            Arc::new(clock.clone()),
        ));
        controller.check_limit("sleepy");
        clock.advance(Duration::from_secs(301));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(
            Sweeper::new(Arc::clone(&controller), Duration::from_millis(20)).run(rx),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(controller.tracked_clients(), 0);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
