use crate::domain::ledger::LedgerStats;
use crate::domain::payee::Payee;
use crate::error::Result;
use std::io::Write;

/// Minor units per major display unit.
const MINOR_PER_MAJOR: u64 = 1_000_000_000;

/// Renders a smallest-unit amount as a major-unit decimal string.
///
/// Display-only: the ledger itself never leaves integral minor units.
pub fn format_major_units(amount: u64) -> String {
    let whole = amount / MINOR_PER_MAJOR;
    let frac = amount % MINOR_PER_MAJOR;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac = format!("{frac:09}");
        format!("{whole}.{}", frac.trim_end_matches('0'))
    }
}

/// Writes the final payee roster and the ledger stats as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(target: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(target),
        }
    }

    pub fn write_report(&mut self, payees: &[Payee], stats: &LedgerStats) -> Result<()> {
        self.writer.write_record([
            "address",
            "salary",
            "interval",
            "next_due_time",
            "active",
            "total_paid",
            "salary_major",
        ])?;
        for payee in payees {
            self.writer.write_record([
                payee.address.to_string(),
                payee.salary.to_string(),
                payee.interval.to_string(),
                payee.next_due_time.to_string(),
                payee.active.to_string(),
                payee.total_paid.to_string(),
                format_major_units(payee.salary),
            ])?;
        }

        self.writer.write_record([
            "payee_count",
            "balance",
            "total_paid",
            "autonomous_state",
        ])?;
        self.writer.write_record([
            &stats.payee_count.to_string(),
            &stats.balance.to_string(),
            &stats.total_paid.to_string(),
            &stats.autonomous_state.to_string(),
        ])?;

        self.writer.flush()?;
        Ok(())
    }
}
