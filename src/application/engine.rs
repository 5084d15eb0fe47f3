use crate::application::registry::PayeeRegistry;
use crate::domain::codec;
use crate::domain::event::LedgerEvent;
use crate::domain::ledger::{AutonomousState, LedgerState, LedgerStats};
use crate::domain::payee::{Address, Payee};
use crate::domain::ports::{ClockRef, CoinTransferRef, EventSinkRef, StateStoreRef};
use crate::error::{LedgerError, Result};
use tracing::{debug, info};

const LEDGER_KEY: &str = "ledger";

/// Milliseconds in one caller-facing interval second.
const MS_PER_SECOND: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Fixed period between self-triggered settlement cycles, in ms.
    pub cycle_period_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: 60_000,
        }
    }
}

/// The command surface of the recurring-payment ledger.
///
/// Owns the injected host capabilities and performs each operation to
/// completion before the next; the host guarantees calls against one
/// instance are totally ordered, so no interior locking is needed.
///
/// Every mutating operation validates all preconditions before its first
/// write, and the one external side effect (the coin transfer) always
/// precedes the bookkeeping that records it.
pub struct LedgerEngine {
    registry: PayeeRegistry,
    store: StateStoreRef,
    events: EventSinkRef,
    clock: ClockRef,
    transfers: CoinTransferRef,
    config: EngineConfig,
}

impl LedgerEngine {
    pub fn new(
        store: StateStoreRef,
        events: EventSinkRef,
        clock: ClockRef,
        transfers: CoinTransferRef,
        config: EngineConfig,
    ) -> Self {
        Self {
            registry: PayeeRegistry::new(store.clone()),
            store,
            events,
            clock,
            transfers,
            config,
        }
    }

    /// Sets the administrator. Callable exactly once per instance.
    pub async fn init(&self, administrator: Address) -> Result<()> {
        if self.store.has(LEDGER_KEY).await? {
            return Err(LedgerError::InvalidArgument(
                "ledger is already initialized".to_string(),
            ));
        }
        let ledger = LedgerState::new(administrator.clone());
        self.store_ledger(&ledger).await?;
        self.events
            .emit(LedgerEvent::Initialized { administrator })
            .await;
        Ok(())
    }

    pub async fn administrator(&self) -> Result<Address> {
        Ok(self.load_ledger().await?.administrator)
    }

    /// Registers a new payee. `interval_secs` is converted to the clock's
    /// millisecond unit here, exactly once.
    pub async fn add_payee(
        &self,
        caller: &Address,
        address: Address,
        salary: u64,
        interval_secs: u64,
    ) -> Result<Payee> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        if salary == 0 {
            return Err(LedgerError::InvalidArgument(
                "salary must be greater than zero".to_string(),
            ));
        }
        if interval_secs == 0 {
            return Err(LedgerError::InvalidArgument(
                "interval must be greater than zero".to_string(),
            ));
        }
        let interval = interval_secs
            .checked_mul(MS_PER_SECOND)
            .ok_or_else(|| LedgerError::InvalidArgument("interval out of range".to_string()))?;

        let payee = Payee::new(address, salary, interval, self.clock.now_ms());
        self.registry.insert_new(&payee).await?;

        ledger.payee_count = ledger.payee_count.saturating_add(1);
        self.store_ledger(&ledger).await?;

        self.events
            .emit(LedgerEvent::PayeeAdded {
                address: payee.address.clone(),
                salary: payee.salary,
                interval: payee.interval,
            })
            .await;
        Ok(payee)
    }

    /// Soft-deactivates a payee, preserving its record for audit.
    pub async fn remove_payee(&self, caller: &Address, address: &Address) -> Result<()> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        self.registry.deactivate(address).await?;

        ledger.payee_count = ledger.payee_count.saturating_sub(1);
        self.store_ledger(&ledger).await?;

        self.events
            .emit(LedgerEvent::PayeeRemoved {
                address: address.clone(),
            })
            .await;
        Ok(())
    }

    /// Credits the shared balance with an attached transfer's amount.
    pub async fn fund_ledger(&self, caller: &Address, amount: u64) -> Result<()> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;
        ledger.credit(amount)?;
        self.store_ledger(&ledger).await?;

        self.events
            .emit(LedgerEvent::LedgerFunded {
                from: caller.clone(),
                amount,
                balance: ledger.balance,
            })
            .await;
        Ok(())
    }

    /// One-off payment outside the recurring cadence. Leaves the payee's
    /// due time alone.
    pub async fn issue_bonus(
        &self,
        caller: &Address,
        address: &Address,
        amount: u64,
    ) -> Result<()> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        if amount == 0 {
            return Err(LedgerError::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }
        let mut payee = self.registry.get(address).await?;
        if !ledger.can_cover(amount) {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: ledger.balance,
            });
        }

        // All checks passed; the irrevocable transfer happens before any
        // bookkeeping write.
        self.transfers.transfer(address, amount).await?;

        ledger.debit_for_payment(amount)?;
        payee.record_payment(amount);
        self.registry.save(&payee).await?;
        self.store_ledger(&ledger).await?;

        self.events
            .emit(LedgerEvent::BonusIssued {
                address: address.clone(),
                amount,
            })
            .await;
        Ok(())
    }

    /// Drains funds back to the administrator. Does not count as a
    /// payment, so the cumulative paid counters stay put.
    pub async fn withdraw(&self, caller: &Address, amount: u64) -> Result<()> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        if amount == 0 {
            return Err(LedgerError::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }
        if !ledger.can_cover(amount) {
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: ledger.balance,
            });
        }

        self.transfers
            .transfer(&ledger.administrator, amount)
            .await?;

        ledger.debit_for_withdrawal(amount)?;
        self.store_ledger(&ledger).await?;

        self.events
            .emit(LedgerEvent::Withdrawn {
                to: ledger.administrator.clone(),
                amount,
            })
            .await;
        Ok(())
    }

    pub async fn get_payee(&self, address: &Address) -> Result<Payee> {
        self.registry.get(address).await
    }

    pub async fn stats(&self) -> Result<LedgerStats> {
        Ok(self.load_ledger().await?.stats())
    }

    /// One settlement pass: every active payee is considered exactly
    /// once. Due and funded: transfer, debit, advance the due time by one
    /// interval. Due but underfunded: leave the due time so the
    /// obligation is retried next pass. Returns the number settled.
    pub async fn settle_due_payments(&self, now: u64) -> Result<u64> {
        let mut ledger = self.load_ledger().await?;
        let mut settled = 0u64;

        for address in self.registry.active_addresses().await? {
            let mut payee = self.registry.get(&address).await?;
            if !payee.is_due(now) {
                continue;
            }
            let salary = payee.salary;
            if !ledger.can_cover(salary) {
                self.events
                    .emit(LedgerEvent::InsufficientFunds {
                        address: address.clone(),
                        required: salary,
                        available: ledger.balance,
                    })
                    .await;
                continue;
            }

            // Transfer first; a failure here aborts the pass with no
            // bookkeeping written for this payee. Due-state is recomputed
            // from storage next invocation, so a retry cannot double-pay.
            self.transfers.transfer(&address, salary).await?;

            ledger.debit_for_payment(salary)?;
            payee.record_payment(salary);
            payee.advance_due_time();
            self.registry.save(&payee).await?;
            self.store_ledger(&ledger).await?;
            settled += 1;

            self.events
                .emit(LedgerEvent::SalaryPaid {
                    address: address.clone(),
                    amount: salary,
                })
                .await;
        }

        if settled > 0 {
            self.events
                .emit(LedgerEvent::SettlementCycle { settled })
                .await;
        }
        debug!(settled, now, "settlement pass complete");
        Ok(settled)
    }

    /// Arms the autonomous chain. Returns the time the first
    /// self-trigger is armed for, which the driver sleeps toward.
    pub async fn start(&self, caller: &Address) -> Result<u64> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        match ledger.autonomous_state {
            AutonomousState::Active => {
                return Err(LedgerError::InvalidArgument(
                    "autonomous execution is already active".to_string(),
                ));
            }
            AutonomousState::Stopped | AutonomousState::Paused => {}
        }

        let fire_at = self.clock.now_ms().saturating_add(self.config.cycle_period_ms);
        ledger.autonomous_state = AutonomousState::Active;
        ledger.next_fire_at = Some(fire_at);
        self.store_ledger(&ledger).await?;

        info!(fire_at, "autonomous execution started");
        self.events
            .emit(LedgerEvent::AutonomousStarted { fire_at })
            .await;
        Ok(fire_at)
    }

    /// Stops re-arming. Advisory: a self-trigger already armed for the
    /// current cycle still fires once.
    pub async fn pause(&self, caller: &Address) -> Result<()> {
        let mut ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;

        if ledger.autonomous_state != AutonomousState::Active {
            return Err(LedgerError::InvalidArgument(
                "autonomous execution is not active".to_string(),
            ));
        }
        ledger.autonomous_state = AutonomousState::Paused;
        self.store_ledger(&ledger).await?;

        info!("autonomous execution paused");
        self.events.emit(LedgerEvent::AutonomousPaused).await;
        Ok(())
    }

    /// Handler for a fired self-trigger. Settles, then decides whether to
    /// re-arm by reading the controller state as it is *now* — a pause
    /// issued while this cycle ran must terminate the chain.
    pub async fn on_self_trigger(&self, now: u64) -> Result<Option<u64>> {
        let settled = self.settle_due_payments(now).await?;
        debug!(settled, "self-triggered cycle settled");

        let mut ledger = self.load_ledger().await?;
        match ledger.autonomous_state {
            AutonomousState::Active => {
                let fire_at = now.saturating_add(self.config.cycle_period_ms);
                ledger.next_fire_at = Some(fire_at);
                self.store_ledger(&ledger).await?;
                Ok(Some(fire_at))
            }
            AutonomousState::Stopped | AutonomousState::Paused => {
                ledger.next_fire_at = None;
                self.store_ledger(&ledger).await?;
                Ok(None)
            }
        }
    }

    /// Administrator-triggered settlement. No effect on the controller
    /// state or the self-trigger chain.
    pub async fn manual_settle(&self, caller: &Address) -> Result<u64> {
        let ledger = self.load_ledger().await?;
        ledger.require_administrator(caller)?;
        self.settle_due_payments(self.clock.now_ms()).await
    }

    /// The armed fire time, if any. Exposed for drivers and tests.
    pub async fn next_fire_at(&self) -> Result<Option<u64>> {
        Ok(self.load_ledger().await?.next_fire_at)
    }

    async fn load_ledger(&self) -> Result<LedgerState> {
        let bytes = self.store.get(LEDGER_KEY).await?.ok_or_else(|| {
            LedgerError::InvalidArgument("ledger is not initialized".to_string())
        })?;
        codec::decode_ledger(&bytes)
    }

    async fn store_ledger(&self, ledger: &LedgerState) -> Result<()> {
        self.store.set(LEDGER_KEY, codec::encode_ledger(ledger)?).await
    }
}
