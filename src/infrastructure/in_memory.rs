use crate::domain::event::LedgerEvent;
use crate::domain::payee::Address;
use crate::domain::ports::{Clock, CoinTransfer, EventSink, StateStore};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::info;

/// In-memory key-value store.
///
/// `Clone` shares the underlying map. This is the host store stand-in for
/// tests and the scripted CLI.
#[derive(Default, Clone)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries.contains_key(key))
    }
}

/// Event sink that keeps everything it is given, for assertions.
#[derive(Default)]
pub struct RecordingEventSink {
    events: RwLock<Vec<LedgerEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<LedgerEvent> {
        self.events.read().await.clone()
    }

    pub async fn count<F: Fn(&LedgerEvent) -> bool>(&self, predicate: F) -> usize {
        self.events.read().await.iter().filter(|e| predicate(e)).count()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn emit(&self, event: LedgerEvent) {
        self.events.write().await.push(event);
    }
}

/// Event sink that forwards to the tracing log, for the CLI.
#[derive(Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: LedgerEvent) {
        info!(?event, "ledger event");
    }
}

/// Clock that only moves when told to. Tests and scripted runs drive it.
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Wall clock, milliseconds since the Unix epoch.
#[derive(Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Transfer primitive that records outgoing payments instead of moving
/// real coins. One-shot failure injection covers the transfer-then-debit
/// ordering paths.
#[derive(Default)]
pub struct RecordingTransfer {
    transfers: RwLock<Vec<(Address, u64)>>,
    fail_next: AtomicBool,
}

impl RecordingTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next transfer fail, once.
    pub async fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub async fn transfers(&self) -> Vec<(Address, u64)> {
        self.transfers.read().await.clone()
    }

    pub async fn total_to(&self, address: &Address) -> u64 {
        self.transfers
            .read()
            .await
            .iter()
            .filter(|(to, _)| to == address)
            .map(|(_, amount)| amount)
            .sum()
    }
}

#[async_trait]
impl CoinTransfer for RecordingTransfer {
    async fn transfer(&self, to: &Address, amount: u64) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::Transfer(
                "injected transfer failure".to_string(),
            ));
        }
        self.transfers.write().await.push((to.clone(), amount));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_state_store_roundtrip() {
        let store = InMemoryStateStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        assert!(!store.has("k").await.unwrap());

        store.set("k", b"value".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"value".to_vec()));
        assert!(store.has("k").await.unwrap());

        store.set("k", b"updated".to_vec()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"updated".to_vec()));
    }

    #[tokio::test]
    async fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[tokio::test]
    async fn test_recording_transfer_failure_is_one_shot() {
        let transfers = RecordingTransfer::new();
        transfers.fail_next().await;

        let err = transfers.transfer(&addr("alice"), 10).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transfer(_)));
        assert!(transfers.transfers().await.is_empty());

        transfers.transfer(&addr("alice"), 10).await.unwrap();
        transfers.transfer(&addr("alice"), 5).await.unwrap();
        assert_eq!(transfers.total_to(&addr("alice")).await, 15);
    }
}
