use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

/// One administrator command per CSV row: `op, address, amount, interval`.
///
/// Columns that an op does not use stay empty. `amount` doubles as the
/// millisecond delta for `advance`; `interval` is in seconds, as the
/// engine expects at its boundary.
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Add,
    Remove,
    Fund,
    Bonus,
    Withdraw,
    Advance,
    Settle,
    Start,
    Pause,
    Fire,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub op: CommandKind,
    pub address: Option<String>,
    pub amount: Option<u64>,
    pub interval: Option<u64>,
}

pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
