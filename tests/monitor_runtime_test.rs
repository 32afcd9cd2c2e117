use gridwatch::error::{GridwatchError, Result};
use gridwatch::grid::{GridState, GridStatusSource};
use gridwatch::monitor::{ChangeEvent, EventSink, MonitoredEntity, spawn_monitor};
use gridwatch::zip::PostalCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const PERIOD: Duration = Duration::from_secs(600);

/// Green on every call; switches `now` to red from the second round on
#[derive(Default)]
struct FlippingSource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl GridStatusSource for FlippingSource {
    async fn fetch_status(&self, _zip: &PostalCode, hours_in_future: u32) -> Result<GridState> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if hours_in_future == 0 && n >= 3 {
            Ok(GridState::Red)
        } else {
            Ok(GridState::Green)
        }
    }

    async fn validate_zip(&self, _zip: &PostalCode) -> Result<()> {
        Ok(())
    }
}

/// Every query takes five seconds before answering green
#[derive(Default)]
struct SlowSource {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl GridStatusSource for SlowSource {
    async fn fetch_status(&self, _zip: &PostalCode, _hours_in_future: u32) -> Result<GridState> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(GridState::Green)
    }

    async fn validate_zip(&self, _zip: &PostalCode) -> Result<()> {
        Ok(())
    }
}

struct FailingSource;

#[async_trait::async_trait]
impl GridStatusSource for FailingSource {
    async fn fetch_status(&self, _zip: &PostalCode, _hours_in_future: u32) -> Result<GridState> {
        Err(GridwatchError::http(503, "Service Unavailable"))
    }

    async fn validate_zip(&self, _zip: &PostalCode) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<ChangeEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ChangeEvent) -> Result<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

fn entity() -> MonitoredEntity {
    MonitoredEntity::new(PostalCode::parse("70173").unwrap())
}

#[tokio::test(start_paused = true)]
async fn first_cycle_is_immediate_then_every_period() {
    let source = Arc::new(FlippingSource::default());
    let sink = Arc::new(RecordingSink::default());
    let start = Instant::now();
    let handle = spawn_monitor(entity(), source.clone(), sink.clone(), PERIOD);
    let mut rx = handle.subscribe();

    rx.wait_for(|s| s.total_polls == 1).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(sink.events.lock().unwrap().len(), 3);

    rx.wait_for(|s| s.total_polls == 2).await.unwrap();
    assert!(start.elapsed() >= PERIOD);
    assert_eq!(source.calls.load(Ordering::SeqCst), 6);

    // only the current status changed on the second round
    let events = sink.events.lock().unwrap().clone();
    assert_eq!(events.len(), 4);
    assert_eq!(events[3].trigger, "current-grid-status-changed");
    assert_eq!(events[3].state, GridState::Red);

    handle.stop_and_wait().await;
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_further_cycles() {
    let source = Arc::new(FlippingSource::default());
    let sink = Arc::new(RecordingSink::default());
    let handle = spawn_monitor(entity(), source.clone(), sink, PERIOD);
    let mut rx = handle.subscribe();
    rx.wait_for(|s| s.total_polls == 1).await.unwrap();

    let polls_before = handle.snapshot().total_polls;
    handle.stop_and_wait().await;
    tokio::time::advance(PERIOD * 3).await;

    assert_eq!(polls_before, 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn total_failure_marks_monitor_unavailable() {
    let handle = spawn_monitor(
        entity(),
        Arc::new(FailingSource),
        Arc::new(RecordingSink::default()),
        PERIOD,
    );
    let mut rx = handle.subscribe();
    let snapshot = rx.wait_for(|s| s.total_polls == 1).await.unwrap().clone();

    assert!(!snapshot.available);
    assert_eq!(
        snapshot.diagnostic.as_deref(),
        Some(
            "status_power_grid_now: API Error: 503 Service Unavailable; \
             status_power_grid_6h_forecast: API Error: 503 Service Unavailable; \
             status_power_grid_24h_forecast: API Error: 503 Service Unavailable"
        )
    );
    assert_eq!(snapshot.last_errors.len(), 3);

    handle.stop_and_wait().await;
}

#[tokio::test(start_paused = true)]
async fn offsets_are_queried_concurrently() {
    let source = Arc::new(SlowSource::default());
    let start = Instant::now();
    let handle = spawn_monitor(
        entity(),
        source.clone(),
        Arc::new(RecordingSink::default()),
        PERIOD,
    );
    let mut rx = handle.subscribe();
    let snapshot = rx.wait_for(|s| s.total_polls == 1).await.unwrap().clone();

    // three five-second queries settle together, not one after another
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_secs(10));
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert!(snapshot.available);
    assert!(snapshot.states.iter().all(|s| s.state == Some(GridState::Green)));

    handle.stop_and_wait().await;
}

#[tokio::test(start_paused = true)]
async fn stop_during_cycle_lets_it_finish() {
    let source = Arc::new(SlowSource::default());
    let sink = Arc::new(RecordingSink::default());
    let handle = spawn_monitor(entity(), source.clone(), sink.clone(), PERIOD);
    let rx = handle.subscribe();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(rx.borrow().total_polls, 0);
    handle.stop_and_wait().await;

    assert_eq!(rx.borrow().total_polls, 1);
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(sink.events.lock().unwrap().len(), 3);

    tokio::time::advance(Duration::from_secs(3600)).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
}
