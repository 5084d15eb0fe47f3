use crate::domain::event::LedgerEvent;
use crate::domain::payee::Address;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Persistent key-value store provided by the host.
///
/// Values are opaque byte strings; everything that passes through here is
/// framed by the versioned codec in [`crate::domain::codec`].
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
    async fn has(&self, key: &str) -> Result<bool>;
}

/// Append-only event/log sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: LedgerEvent);
}

/// The host clock, milliseconds since an epoch the host chooses.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// The host's native-currency transfer primitive.
///
/// A transfer that returns `Ok` is irrevocable; callers must order all
/// bookkeeping strictly after it.
#[async_trait]
pub trait CoinTransfer: Send + Sync {
    async fn transfer(&self, to: &Address, amount: u64) -> Result<()>;
}

pub type StateStoreRef = Arc<dyn StateStore>;
pub type EventSinkRef = Arc<dyn EventSink>;
pub type ClockRef = Arc<dyn Clock>;
pub type CoinTransferRef = Arc<dyn CoinTransfer>;
