use autopay::application::engine::{EngineConfig, LedgerEngine};
use autopay::domain::payee::Address;
use autopay::domain::ports::{Clock, ClockRef, StateStoreRef};
use autopay::infrastructure::in_memory::{
    InMemoryStateStore, ManualClock, RecordingTransfer, TracingEventSink,
};
use autopay::interfaces::csv::command_reader::{Command, CommandKind, CommandReader};
use autopay::interfaces::csv::report_writer::ReportWriter;
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

/// Scripted runner for the recurring-payment ledger.
///
/// Replays an administrator command script against a manual clock and
/// prints the final payee roster and ledger stats as CSV.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script (CSV: op, address, amount, interval)
    input: PathBuf,

    /// Administrator identity for init and gated commands
    #[arg(long, default_value = "admin")]
    admin: String,

    /// Settlement cycle period in milliseconds
    #[arg(long, default_value_t = 60_000)]
    cycle_period_ms: u64,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store: StateStoreRef = build_store(&cli)?;
    let clock = Arc::new(ManualClock::new(0));
    let clock_ref: ClockRef = clock.clone();
    let engine = LedgerEngine::new(
        store,
        Arc::new(TracingEventSink),
        clock_ref,
        Arc::new(RecordingTransfer::new()),
        EngineConfig {
            cycle_period_ms: cli.cycle_period_ms,
        },
    );

    let admin = Address::new(cli.admin).into_diagnostic()?;
    engine.init(admin.clone()).await.into_diagnostic()?;

    // Roster of payees this run created, in script order, for the report.
    let mut roster: Vec<Address> = Vec::new();

    let file = File::open(&cli.input).into_diagnostic()?;
    for command in CommandReader::new(file).commands() {
        match command {
            Ok(command) => {
                if let Err(e) = apply(&engine, &clock, &admin, &mut roster, &command).await {
                    error!(op = ?command.op, error = %e, "command failed");
                }
            }
            Err(e) => error!(error = %e, "skipping unreadable command"),
        }
    }

    let mut payees = Vec::with_capacity(roster.len());
    for address in &roster {
        payees.push(engine.get_payee(address).await.into_diagnostic()?);
    }
    let stats = engine.stats().await.into_diagnostic()?;

    let stdout = io::stdout();
    ReportWriter::new(stdout.lock())
        .write_report(&payees, &stats)
        .into_diagnostic()?;

    Ok(())
}

fn build_store(cli: &Cli) -> Result<StateStoreRef> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = &cli.db_path {
        let store = autopay::infrastructure::rocksdb::RocksDbStore::open(db_path)
            .into_diagnostic()?;
        return Ok(Arc::new(store));
    }
    let _ = cli;
    Ok(Arc::new(InMemoryStateStore::new()))
}

async fn apply(
    engine: &LedgerEngine,
    clock: &ManualClock,
    admin: &Address,
    roster: &mut Vec<Address>,
    command: &Command,
) -> autopay::error::Result<()> {
    use autopay::error::LedgerError;

    let address = || -> autopay::error::Result<Address> {
        command
            .address
            .clone()
            .ok_or_else(|| LedgerError::InvalidArgument("missing address column".to_string()))
            .and_then(Address::new)
    };
    let amount = || -> autopay::error::Result<u64> {
        command
            .amount
            .ok_or_else(|| LedgerError::InvalidArgument("missing amount column".to_string()))
    };

    match command.op {
        CommandKind::Add => {
            let interval = command.interval.ok_or_else(|| {
                LedgerError::InvalidArgument("missing interval column".to_string())
            })?;
            let payee = engine
                .add_payee(admin, address()?, amount()?, interval)
                .await?;
            roster.push(payee.address);
        }
        CommandKind::Remove => engine.remove_payee(admin, &address()?).await?,
        CommandKind::Fund => engine.fund_ledger(admin, amount()?).await?,
        CommandKind::Bonus => engine.issue_bonus(admin, &address()?, amount()?).await?,
        CommandKind::Withdraw => engine.withdraw(admin, amount()?).await?,
        CommandKind::Advance => clock.advance(amount()?),
        CommandKind::Settle => {
            engine.manual_settle(admin).await?;
        }
        CommandKind::Start => {
            engine.start(admin).await?;
        }
        CommandKind::Pause => engine.pause(admin).await?,
        CommandKind::Fire => {
            // Deliver an armed self-trigger at the manual clock's now.
            if engine.next_fire_at().await?.is_none() {
                warn!("fire command with no armed trigger");
            }
            engine.on_self_trigger(clock.now_ms()).await?;
        }
    }
    Ok(())
}
