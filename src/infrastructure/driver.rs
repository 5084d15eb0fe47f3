use crate::application::engine::LedgerEngine;
use crate::domain::ports::ClockRef;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Drives the autonomous settlement chain with a tokio timer.
///
/// The driver owns no ledger state. It sleeps toward the fire time the
/// engine handed out, delivers the trigger, and keeps going only while
/// the engine keeps arming. A cycle that fails stops the chain; the
/// administrator restarts it with `start`.
pub struct SettlementDriver {
    engine: Arc<LedgerEngine>,
    clock: ClockRef,
}

impl SettlementDriver {
    pub fn new(engine: Arc<LedgerEngine>, clock: ClockRef) -> Self {
        Self { engine, clock }
    }

    /// Runs the chain in the background, beginning with the fire time
    /// returned by `LedgerEngine::start`.
    pub fn spawn(self, first_fire_at: u64) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(first_fire_at).await })
    }

    async fn run(self, mut fire_at: u64) {
        loop {
            let now = self.clock.now_ms();
            if fire_at > now {
                tokio::time::sleep(Duration::from_millis(fire_at - now)).await;
            }

            match self.engine.on_self_trigger(self.clock.now_ms()).await {
                Ok(Some(next)) => fire_at = next,
                Ok(None) => {
                    info!("autonomous chain disarmed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "settlement cycle failed; chain stopped");
                    break;
                }
            }
        }
    }
}
