use crate::error::{GridwatchError, Result};
use crate::grid::GridStatusSource;
use crate::logging::{StructuredLogger, get_logger};
use crate::monitor::events::EventSink;
use crate::monitor::{MonitorHandle, MonitorSnapshot, MonitoredEntity, Offset, spawn_monitor};
use crate::zip;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

#[derive(Default)]
struct Slots {
    running: BTreeMap<String, MonitorHandle>,
    /// Postal codes whose registration is waiting on remote validation
    pending: BTreeSet<String>,
}

/// All running monitors, keyed by postal code.
///
/// The inner lock is only held for bookkeeping, never across a network call
/// or while waiting for a monitor to stop.
pub struct MonitorRegistry {
    source: Arc<dyn GridStatusSource>,
    sink: Arc<dyn EventSink>,
    poll_interval: Duration,
    slots: Mutex<Slots>,
    logger: StructuredLogger,
}

impl MonitorRegistry {
    pub fn new(
        source: Arc<dyn GridStatusSource>,
        sink: Arc<dyn EventSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            sink,
            poll_interval,
            slots: Mutex::new(Slots::default()),
            logger: get_logger("registry"),
        }
    }

    /// Admit a postal code and start polling it.
    ///
    /// Rejects codes that are running or being registered, runs the format
    /// check and remote validation, and only then spawns the monitor. Offsets
    /// default to now, +6h and +24h.
    ///
    /// The code stays reserved while validation runs; a caller that may be
    /// cancelled mid-way should drive this on its own task.
    pub async fn register(
        &self,
        raw_zip: &str,
        name: Option<String>,
        offsets: Option<&[Offset]>,
    ) -> Result<Arc<MonitorSnapshot>> {
        {
            let mut slots = self.slots.lock().await;
            if slots.running.contains_key(raw_zip) || slots.pending.contains(raw_zip) {
                return Err(GridwatchError::validation(
                    "zip",
                    format!("Postal code {} is already monitored", raw_zip),
                ));
            }
            slots.pending.insert(raw_zip.to_string());
        }

        let admitted = self.admit(raw_zip, name, offsets).await;

        let mut slots = self.slots.lock().await;
        slots.pending.remove(raw_zip);
        let entity = admitted?;

        self.logger.info(&format!(
            "Registering '{}' tracking {}",
            entity.name(),
            entity
                .offsets()
                .iter()
                .map(|o| o.capability())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let handle = spawn_monitor(
            entity,
            self.source.clone(),
            self.sink.clone(),
            self.poll_interval,
        );
        let snapshot = handle.snapshot();
        slots.running.insert(raw_zip.to_string(), handle);
        Ok(snapshot)
    }

    async fn admit(
        &self,
        raw_zip: &str,
        name: Option<String>,
        offsets: Option<&[Offset]>,
    ) -> Result<MonitoredEntity> {
        let zip = zip::admit(self.source.as_ref(), raw_zip).await?;
        let mut entity = MonitoredEntity::new(zip);
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            entity = entity.with_name(name);
        }
        if let Some(offsets) = offsets {
            entity = entity.with_offsets(offsets)?;
        }
        Ok(entity)
    }

    /// Stop a monitor and wait for its in-flight cycle to finish
    pub async fn remove(&self, zip: &str) -> Result<()> {
        let handle = self
            .slots
            .lock()
            .await
            .running
            .remove(zip)
            .ok_or_else(|| GridwatchError::not_found(format!("No monitor for {}", zip)))?;
        self.logger.info(&format!("Removing monitor for {}", zip));
        handle.stop_and_wait().await;
        Ok(())
    }

    pub async fn get(&self, zip: &str) -> Option<Arc<MonitorSnapshot>> {
        self.slots
            .lock()
            .await
            .running
            .get(zip)
            .map(MonitorHandle::snapshot)
    }

    /// Snapshot updates of one monitor
    pub async fn subscribe(&self, zip: &str) -> Option<watch::Receiver<Arc<MonitorSnapshot>>> {
        self.slots
            .lock()
            .await
            .running
            .get(zip)
            .map(MonitorHandle::subscribe)
    }

    /// Snapshots ordered by postal code
    pub async fn list(&self) -> Vec<Arc<MonitorSnapshot>> {
        self.slots
            .lock()
            .await
            .running
            .values()
            .map(MonitorHandle::snapshot)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.running.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.running.is_empty()
    }

    /// Stop every monitor
    pub async fn shutdown(&self) {
        let running = std::mem::take(&mut self.slots.lock().await.running);
        self.logger
            .info(&format!("Stopping {} monitor(s)", running.len()));
        for handle in running.into_values() {
            handle.stop_and_wait().await;
        }
    }
}
