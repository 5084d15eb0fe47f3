use autopay::application::engine::{EngineConfig, LedgerEngine};
use autopay::domain::payee::Address;
use autopay::infrastructure::in_memory::{
    InMemoryStateStore, ManualClock, RecordingEventSink, RecordingTransfer,
};
use std::sync::Arc;

pub struct Harness {
    pub engine: LedgerEngine,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingEventSink>,
    pub transfers: Arc<RecordingTransfer>,
}

pub fn addr(s: &str) -> Address {
    Address::new(s).unwrap()
}

pub fn admin() -> Address {
    addr("admin")
}

/// Engine wired to in-memory fakes, initialized with `admin` at t=0.
pub async fn harness() -> Harness {
    harness_with_period(60_000).await
}

pub async fn harness_with_period(cycle_period_ms: u64) -> Harness {
    let clock = Arc::new(ManualClock::new(0));
    let sink = Arc::new(RecordingEventSink::new());
    let transfers = Arc::new(RecordingTransfer::new());
    let engine = LedgerEngine::new(
        Arc::new(InMemoryStateStore::new()),
        sink.clone(),
        clock.clone(),
        transfers.clone(),
        EngineConfig { cycle_period_ms },
    );
    engine.init(admin()).await.unwrap();
    Harness {
        engine,
        clock,
        sink,
        transfers,
    }
}
