//! Per-monitor polling task
//!
//! Each monitor runs in its own tokio task: one eager cycle right away, then
//! one cycle per interval tick until stopped. A stop request is only looked
//! at between cycles, so an in-flight cycle always completes.

use crate::grid::GridStatusSource;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::monitor::events::EventSink;
use crate::monitor::{MonitorSnapshot, MonitoredEntity, derive_availability, reconcile};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Handle to a running monitor task
pub struct MonitorHandle {
    zip: String,
    snapshot_rx: watch::Receiver<Arc<MonitorSnapshot>>,
    shutdown_tx: mpsc::UnboundedSender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn zip(&self) -> &str {
        &self.zip
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<MonitorSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Receiver notified after every completed cycle
    pub fn subscribe(&self) -> watch::Receiver<Arc<MonitorSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Ask the task to stop; no further cycle is scheduled
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Stop and wait until the in-flight cycle, if any, has completed
    pub async fn stop_and_wait(self) {
        self.stop();
        let _ = self.task.await;
    }
}

struct MonitorTask {
    entity: MonitoredEntity,
    source: Arc<dyn GridStatusSource>,
    sink: Arc<dyn EventSink>,
    snapshot_tx: watch::Sender<Arc<MonitorSnapshot>>,
    logger: StructuredLogger,
    total_polls: u64,
}

impl MonitorTask {
    async fn poll_cycle(&mut self) {
        let outcome = reconcile(&mut self.entity, self.source.as_ref(), self.sink.as_ref()).await;
        let availability = derive_availability(&outcome);
        self.total_polls = self.total_polls.saturating_add(1);

        let errors = outcome.failure_lines();
        if !availability.available {
            self.logger.error(&format!(
                "Monitor unavailable: {}",
                availability.diagnostic.as_deref().unwrap_or_default()
            ));
        } else if !errors.is_empty() {
            self.logger.warn(&format!(
                "Some updates failed but monitor remains available. Errors: {}",
                errors.join("; ")
            ));
        }

        let snapshot = MonitorSnapshot::after_cycle(
            &self.entity,
            &outcome,
            &availability,
            self.total_polls,
        );
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    async fn run(mut self, period: Duration, mut shutdown_rx: mpsc::UnboundedReceiver<()>) {
        self.logger.info(&format!(
            "Starting monitor '{}' with poll interval {:?}",
            self.entity.name(),
            period
        ));
        self.poll_cycle().await;

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    self.logger.info("Monitor stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.poll_cycle().await;
                }
            }
        }
    }
}

/// Start polling `entity` every `period`, beginning with an immediate cycle
pub fn spawn_monitor(
    entity: MonitoredEntity,
    source: Arc<dyn GridStatusSource>,
    sink: Arc<dyn EventSink>,
    period: Duration,
) -> MonitorHandle {
    let zip = entity.zip().to_string();
    let logger = get_logger_with_context(LogContext::new("monitor").with_zip(&zip));
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(MonitorSnapshot::initial(&entity)));
    let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();

    let task = MonitorTask {
        entity,
        source,
        sink,
        snapshot_tx,
        logger,
        total_polls: 0,
    };
    let task = tokio::spawn(task.run(period, shutdown_rx));

    MonitorHandle {
        zip,
        snapshot_rx,
        shutdown_tx,
        task,
    }
}
