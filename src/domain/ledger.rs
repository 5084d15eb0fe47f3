use crate::domain::payee::Address;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// State of the autonomous execution controller.
///
/// Transitions: `Stopped -> Active` (start), `Active -> Paused` (pause),
/// `Paused -> Active` (start). Nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutonomousState {
    Stopped,
    Active,
    Paused,
}

impl fmt::Display for AutonomousState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AutonomousState::Stopped => "stopped",
            AutonomousState::Active => "active",
            AutonomousState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// The singleton ledger record: shared balance, cumulative counters, and
/// the controller's durable scheduled-task record.
///
/// `next_fire_at` only records when the next self-trigger is armed for.
/// Whether a fired trigger re-arms is decided by reading
/// `autonomous_state` at fire time, never from a value captured when the
/// cycle was scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub administrator: Address,
    /// Count of payees with `active = true`.
    pub payee_count: u64,
    /// Shared balance, smallest currency units.
    pub balance: u64,
    /// Sum of every payment ever settled, across all payees.
    pub total_paid: u64,
    pub autonomous_state: AutonomousState,
    pub next_fire_at: Option<u64>,
}

impl LedgerState {
    pub fn new(administrator: Address) -> Self {
        Self {
            administrator,
            payee_count: 0,
            balance: 0,
            total_paid: 0,
            autonomous_state: AutonomousState::Stopped,
            next_fire_at: None,
        }
    }

    /// Authorization guard: every mutating operation calls this first.
    pub fn require_administrator(&self, caller: &Address) -> Result<()> {
        if caller == &self.administrator {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized)
        }
    }

    /// Credits the shared balance (funding path).
    pub fn credit(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::InvalidArgument(
                "amount must be greater than zero".to_string(),
            ));
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidArgument("balance overflow".to_string()))?;
        Ok(())
    }

    pub fn can_cover(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    /// Debits a payment that the host has already transferred.
    ///
    /// Must only be called after the external transfer is confirmed;
    /// bookkeeping never runs ahead of the irrevocable effect.
    pub fn debit_for_payment(&mut self, amount: u64) -> Result<()> {
        self.balance =
            self.balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    required: amount,
                    available: self.balance,
                })?;
        self.total_paid = self.total_paid.saturating_add(amount);
        Ok(())
    }

    /// Debits an administrator withdrawal: balance only, the cumulative
    /// paid counter tracks payee payments and stays untouched.
    pub fn debit_for_withdrawal(&mut self, amount: u64) -> Result<()> {
        self.balance =
            self.balance
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientBalance {
                    required: amount,
                    available: self.balance,
                })?;
        Ok(())
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            payee_count: self.payee_count,
            balance: self.balance,
            total_paid: self.total_paid,
            autonomous_state: self.autonomous_state,
        }
    }
}

/// Read-only snapshot returned by the stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub payee_count: u64,
    pub balance: u64,
    pub total_paid: u64,
    pub autonomous_state: AutonomousState,
}
