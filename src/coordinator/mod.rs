use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::catalog::Catalog;
use crate::prelude::*;
use crate::profile::RegisterKind;
use crate::transport::Transport;

pub mod commands;

/// Latest consistent view of every successfully read register, keyed by
/// register key with scaling already applied. Booleans are 0/1 and
/// enumerated registers hold their raw option code; turning codes back
/// into labels is the consumer's job.
pub type Snapshot = HashMap<String, f64>;

pub struct PollOutcome {
    pub snapshot: Arc<Snapshot>,
    pub failed_reads: usize,
}

/// Owns the Modbus session for one device and publishes its snapshot.
///
/// Every transport operation - poll reads, the forced refresh after a
/// write, explicit writes - goes through the `session` mutex, so at most
/// one is on the wire at a time. The snapshot is replaced wholesale each
/// cycle; readers holding the previous `Arc` keep an unchanging view.
pub struct Coordinator {
    device: config::Device,
    catalog: Arc<Catalog>,
    channels: Channels,
    session: tokio::sync::Mutex<Box<dyn Transport>>,
    snapshot: Mutex<Arc<Snapshot>>,
}

impl Coordinator {
    pub fn new(
        device: config::Device,
        catalog: Arc<Catalog>,
        transport: Box<dyn Transport>,
        channels: Channels,
    ) -> Self {
        Self {
            device,
            catalog,
            channels,
            session: tokio::sync::Mutex::new(transport),
            snapshot: Mutex::new(Arc::new(Snapshot::new())),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Last-published snapshot; never blocks on the poll cycle.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    async fn ensure_connected(
        &self,
        session: &mut Box<dyn Transport>,
    ) -> Result<(), crate::error::Error> {
        if session.is_live() {
            return Ok(());
        }

        debug!("{}: opening modbus session", self.device.identifier());
        session
            .connect()
            .await
            .map_err(crate::error::Error::TransportUnavailable)
    }

    /// Run one poll cycle: read every catalogued register and publish a
    /// fresh snapshot.
    ///
    /// Connection failure abandons the cycle with no snapshot change.
    /// A failed register read is logged and its key omitted; the cycle
    /// carries on, and even zero successful reads still publish an
    /// (empty) snapshot rather than erroring.
    pub async fn poll_once(&self) -> Result<PollOutcome, crate::error::Error> {
        let mut session = self.session.lock().await;
        self.ensure_connected(&mut session).await?;

        let mut data = Snapshot::new();
        let mut failed_reads = 0;

        for register in self.catalog.poll_order() {
            let read = match register.kind {
                RegisterKind::Input => session.read_input(register.address).await,
                RegisterKind::Holding => session.read_holding(register.address).await,
            };

            match read {
                Ok(raw) => {
                    data.insert(register.key.clone(), register.scaled(raw));
                }
                Err(err) => {
                    failed_reads += 1;
                    debug!(
                        "{}: read of {}@{} failed: {}",
                        self.device.identifier(),
                        register.key,
                        register.address,
                        err
                    );
                }
            }
        }
        drop(session);

        if data.is_empty() && failed_reads > 0 && self.device.empty_poll_warning() {
            warn!(
                "{}: poll cycle read no registers ({} failures)",
                self.device.identifier(),
                failed_reads
            );
        }

        let snapshot = Arc::new(data);
        *self.snapshot.lock().unwrap() = snapshot.clone();

        Ok(PollOutcome {
            snapshot,
            failed_reads,
        })
    }

    /// Write one raw value, optimistically patch the snapshot for every
    /// register aliasing the address, then request an out-of-band refresh.
    ///
    /// The refresh exists because devices may clamp or round the written
    /// value silently; once it completes, the device's reported value
    /// overwrites the optimistic one. Returns as soon as the write and
    /// patch are done, without waiting for that refresh.
    pub async fn write_register(&self, address: u16, value: u16) -> Result<(), crate::error::Error> {
        let mut session = self.session.lock().await;
        self.ensure_connected(&mut session).await?;

        session
            .write_single(address, value)
            .await
            .map_err(|source| crate::error::Error::WriteRejected {
                address,
                value,
                source,
            })?;

        // Patch while still holding the session, so the refresh cycle
        // cannot start before the optimistic value is visible.
        let aliases = self.catalog.registers_at(address);
        if !aliases.is_empty() {
            let mut guard = self.snapshot.lock().unwrap();
            let mut patched: Snapshot = (**guard).clone();
            for register in aliases {
                patched.insert(register.key.clone(), register.scaled(value));
            }
            *guard = Arc::new(patched);
        }
        drop(session);

        if self
            .channels
            .to_scheduler
            .send(scheduler::ChannelData::Refresh)
            .is_err()
        {
            warn!(
                "{}: refresh request dropped - scheduler not running",
                self.device.identifier()
            );
        }

        Ok(())
    }

    /// Close the session if one is open. Safe to call repeatedly and from
    /// paths that never connected; close errors are logged, not surfaced.
    pub async fn close(&self) {
        let mut session = self.session.lock().await;
        if let Err(err) = session.close().await {
            warn!(
                "{}: error closing modbus session: {}",
                self.device.identifier(),
                err
            );
        }
    }
}
