use std::sync::Arc;
use std::time::Duration;

use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelData {
    Refresh,
    Shutdown,
}

/// Drives one poll cycle per tick, plus out-of-band refresh cycles
/// requested by the write path. All cycles run on this task, one at a
/// time; a slow cycle delays the next tick instead of overlapping it.
pub struct Scheduler {
    device: config::Device,
    channels: Channels,
    coordinator: Arc<Coordinator>,
}

impl Scheduler {
    pub fn new(device: config::Device, channels: Channels, coordinator: Arc<Coordinator>) -> Self {
        Self {
            device,
            channels,
            coordinator,
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.device.scan_interval()));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut receiver = self.channels.to_scheduler.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => self.run_cycle("scheduled").await,
                message = receiver.recv() => match message {
                    Ok(ChannelData::Refresh) => self.run_cycle("refresh").await,
                    Ok(ChannelData::Shutdown) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            "{}: scheduler lagged, {} refresh requests dropped",
                            self.device.identifier(),
                            skipped
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        info!("{}: scheduler stopped", self.device.identifier());
        Ok(())
    }

    /// Cycle errors are logged and swallowed; an unreachable device keeps
    /// the last-good snapshot and the loop keeps ticking until
    /// connectivity returns.
    async fn run_cycle(&self, reason: &str) {
        match self.coordinator.poll_once().await {
            Ok(outcome) => {
                if outcome.failed_reads > 0 {
                    info!(
                        "{}: {} poll published {} values, {} reads failed",
                        self.device.identifier(),
                        reason,
                        outcome.snapshot.len(),
                        outcome.failed_reads
                    );
                } else {
                    debug!(
                        "{}: {} poll published {} values",
                        self.device.identifier(),
                        reason,
                        outcome.snapshot.len()
                    );
                }
            }
            Err(err) => {
                warn!(
                    "{}: {} poll cycle abandoned: {}",
                    self.device.identifier(),
                    reason,
                    err
                );
            }
        }
    }
}
