use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identity for the administrator and payees.
///
/// The host decides what an address looks like; the ledger only requires
/// that it is non-empty and compares by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LedgerError::InvalidArgument(
                "address must not be empty".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered recipient of recurring payments.
///
/// Records are soft-deleted: `active` flips to false but salary, interval
/// and `total_paid` are retained for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payee {
    pub address: Address,
    /// Salary per pay period, in smallest currency units.
    pub salary: u64,
    /// Pay interval in milliseconds (the clock's unit).
    pub interval: u64,
    /// Timestamp (ms) at which the next payment falls due.
    pub next_due_time: u64,
    pub active: bool,
    /// Cumulative amount ever settled to this payee, salaries and bonuses.
    pub total_paid: u64,
}

impl Payee {
    pub fn new(address: Address, salary: u64, interval: u64, now: u64) -> Self {
        Self {
            address,
            salary,
            interval,
            next_due_time: now.saturating_add(interval),
            active: true,
            total_paid: 0,
        }
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.active && now >= self.next_due_time
    }

    /// Records one confirmed payment against this payee.
    pub fn record_payment(&mut self, amount: u64) {
        self.total_paid = self.total_paid.saturating_add(amount);
    }

    /// Advances the due time by exactly one interval.
    pub fn advance_due_time(&mut self) {
        self.next_due_time = self.next_due_time.saturating_add(self.interval);
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }
}
