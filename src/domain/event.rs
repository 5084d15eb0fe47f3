use crate::domain::payee::Address;
use serde::Serialize;

/// Events pushed to the host's append-only log sink.
///
/// Fire-and-forget: the ledger never reads these back, so sinks are free
/// to drop, buffer, or forward them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Initialized {
        administrator: Address,
    },
    PayeeAdded {
        address: Address,
        salary: u64,
        interval: u64,
    },
    PayeeRemoved {
        address: Address,
    },
    LedgerFunded {
        from: Address,
        amount: u64,
        balance: u64,
    },
    BonusIssued {
        address: Address,
        amount: u64,
    },
    Withdrawn {
        to: Address,
        amount: u64,
    },
    SalaryPaid {
        address: Address,
        amount: u64,
    },
    InsufficientFunds {
        address: Address,
        required: u64,
        available: u64,
    },
    SettlementCycle {
        settled: u64,
    },
    AutonomousStarted {
        fire_at: u64,
    },
    AutonomousPaused,
}
