use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use trip_split::{
    category_breakdown, for_trip, load_expenses, load_trips, logging, net_settlement,
    newest_first, summary_lines, AppConfig, ExpenseDraft, ExpenseFeed, ExpenseRecord,
    SettlementEngine, SplitPolicy,
};

#[derive(Parser)]
#[command(name = "trip-split", version, about = "Who spent what, and who owes whom")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "TRIP_SPLIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Per-person spent/owed totals with category breakdown
    Summary {
        #[command(flatten)]
        source: Source,

        /// Abort on the first unreadable or invalid record instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List expenses, newest first
    Expenses {
        #[command(flatten)]
        source: Source,
    },

    /// List trips from a trips export, or from the expense service
    Trips {
        /// Trips export; without it the service is asked (feature `remote`)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print only who owes whom
    Settle {
        #[command(flatten)]
        source: Source,
    },

    /// Validate a new expense without submitting it
    Check {
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Fetch expenses from the expense service and summarise them
    #[cfg(feature = "remote")]
    Fetch {
        #[arg(short, long)]
        trip: Option<String>,
    },

    /// Validate and submit a new expense to the expense service
    #[cfg(feature = "remote")]
    Add {
        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Replace the fields of an existing expense on the expense service
    #[cfg(feature = "remote")]
    Update {
        id: String,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Delete an expense from the expense service
    #[cfg(feature = "remote")]
    Delete { id: String },
}

#[derive(Args)]
struct Source {
    /// JSON or CSV export of the expense service
    #[arg(short, long)]
    input: PathBuf,

    /// Only records of this trip
    #[arg(short, long)]
    trip: Option<String>,
}

#[derive(Args)]
struct DraftArgs {
    #[arg(long)]
    paid_by: String,

    #[arg(long, default_value = "SGD")]
    currency: String,

    #[arg(long, allow_negative_numbers = true)]
    amount: f64,

    #[arg(long)]
    description: String,

    /// "Split equally", "Owed full amount" or "Tracking"
    #[arg(long, default_value = "Split equally")]
    payment: String,

    #[arg(long, default_value = "General")]
    category: String,

    #[arg(long)]
    trip: Option<String>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<ExpenseDraft> {
        let payment: SplitPolicy = self.payment.parse()?;
        Ok(ExpenseDraft {
            paid_by: self.paid_by.as_str().into(),
            currency: self.currency.as_str().into(),
            amount: self.amount,
            description: self.description,
            payment,
            category: self.category.as_str().into(),
            trip_id: self.trip,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    logging::init(&config.log_level);
    let engine = config.engine()?;

    match cli.command {
        Command::Summary { source, strict, json } => {
            let feed = load_expenses(&source.input)?;
            if strict {
                ensure_readable(&feed)?;
            }
            let records = select(&feed, source.trip.as_deref());
            run_summary(&engine, &records, strict, json)
        }
        Command::Expenses { source } => {
            let feed = load_expenses(&source.input)?;
            let records: Vec<ExpenseRecord> = select(&feed, source.trip.as_deref()).into_iter().cloned().collect();
            print_expenses(&records);
            Ok(())
        }
        Command::Trips { input } => {
            let trips = match input {
                Some(path) => load_trips(&path)?,
                #[cfg(feature = "remote")]
                None => remote::trips(&config)?,
                #[cfg(not(feature = "remote"))]
                None => bail!("--input is required; fetching trips needs the `remote` feature"),
            };
            println!("🛫 {} trips", trips.len());
            for trip in trips {
                println!("  {:<16} {}", trip.trip_id, trip.name);
            }
            Ok(())
        }
        Command::Settle { source } => {
            let feed = load_expenses(&source.input)?;
            let records = select(&feed, source.trip.as_deref());
            let report = engine.compute_lenient(records.iter().copied());
            let reference = engine.rates().reference();
            match net_settlement(&report.summary, engine.roster())? {
                Some(s) => println!("{} owes {}: {:.2} {}", s.debtor, s.creditor, s.amount, reference),
                None => println!("All square"),
            }
            Ok(())
        }
        Command::Check { draft } => {
            let draft = draft.into_draft()?;
            match draft.validate(engine.roster()) {
                Ok(()) => {
                    println!("✓ Expense is valid");
                    Ok(())
                }
                Err(rejected) => {
                    for issue in &rejected.issues {
                        println!("✗ {}", issue);
                    }
                    Err(rejected.into())
                }
            }
        }
        #[cfg(feature = "remote")]
        Command::Fetch { trip } => remote::fetch(&config, &engine, trip.as_deref()),
        #[cfg(feature = "remote")]
        Command::Add { draft } => remote::add(&config, &engine, draft.into_draft()?),
        #[cfg(feature = "remote")]
        Command::Update { id, draft } => remote::update(&config, &engine, &id, draft.into_draft()?),
        #[cfg(feature = "remote")]
        Command::Delete { id } => remote::delete(&config, &id),
    }
}

/// Strict mode: a record the feed could not decode aborts like one the engine refuses.
fn ensure_readable(feed: &ExpenseFeed) -> Result<()> {
    match feed.rejected.first() {
        Some(rejected) => bail!(
            "record #{} ({}) could not be read: {}",
            rejected.index,
            rejected.id.as_deref().unwrap_or("no id"),
            rejected.reason
        ),
        None => Ok(()),
    }
}

// Warnings go to stderr so `--json` output stays parseable
fn select<'a>(feed: &'a ExpenseFeed, trip: Option<&'a str>) -> Vec<&'a ExpenseRecord> {
    if !feed.is_clean() {
        eprintln!("⚠️  {} records could not be read and were skipped", feed.rejected.len());
    }
    match trip {
        Some(trip) => for_trip(&feed.records, trip).collect(),
        None => feed.records.iter().collect(),
    }
}

fn run_summary(engine: &SettlementEngine, records: &[&ExpenseRecord], strict: bool, json: bool) -> Result<()> {
    let reference = engine.rates().reference();

    let summary = if strict {
        engine
            .compute(records.iter().copied())
            .context("Settlement aborted on invalid record")?
    } else {
        let report = engine.compute_lenient(records.iter().copied());
        for rejected in &report.rejected {
            eprintln!("⚠️  skipped record #{}: {}", rejected.index, rejected.reason);
        }
        report.summary
    };
    info!(records = records.len(), "summary ready");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Summary ({} expenses, {})", records.len(), reference);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in summary_lines(&summary, engine.roster(), reference) {
        println!("{}", line);
    }

    for (participant, person) in summary.iter() {
        let breakdown = category_breakdown(person);
        if breakdown.is_empty() {
            continue;
        }
        println!("\n{} by category:", participant);
        for share in breakdown {
            println!(
                "  {:<14} {:>10.2} {}  ({:.1}%)",
                share.category.as_str(),
                share.amount,
                reference,
                share.share * 100.0
            );
        }
    }

    Ok(())
}

fn print_expenses(records: &[ExpenseRecord]) {
    println!("🧾 {} expenses", records.len());
    for record in newest_first(records) {
        let when = record
            .created_at
            .to_datetime()
            .map(|dt| dt.format("%d/%m/%Y, %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown date".to_string());

        println!("{}: {} {}", record.description, record.currency, record.amount);
        println!(
            "  [{}] {} · Paid by: {} on {}",
            record.payment, record.category, record.paid_by, when
        );
    }
}

#[cfg(feature = "remote")]
mod remote {
    use super::*;
    use trip_split::{ExpenseService, Trip};

    fn runtime() -> Result<tokio::runtime::Runtime> {
        tokio::runtime::Runtime::new().context("Failed to start async runtime")
    }

    pub fn fetch(config: &AppConfig, engine: &SettlementEngine, trip: Option<&str>) -> Result<()> {
        let service = ExpenseService::new(config.api_url.as_str());
        let feed = runtime()?.block_on(service.list_expenses(trip))?;
        let records = select(&feed, trip);
        run_summary(engine, &records, false, false)
    }

    pub fn add(config: &AppConfig, engine: &SettlementEngine, draft: ExpenseDraft) -> Result<()> {
        draft.validate(engine.roster())?;
        let service = ExpenseService::new(config.api_url.as_str());
        runtime()?.block_on(service.add_expense(&draft))?;
        println!("✓ Expense submitted");
        Ok(())
    }

    pub fn trips(config: &AppConfig) -> Result<Vec<Trip>> {
        let service = ExpenseService::new(config.api_url.as_str());
        runtime()?.block_on(service.list_trips())
    }

    pub fn update(config: &AppConfig, engine: &SettlementEngine, id: &str, draft: ExpenseDraft) -> Result<()> {
        let service = ExpenseService::new(config.api_url.as_str());
        let runtime = runtime()?;

        let feed = runtime.block_on(service.list_expenses(None))?;
        let existing = feed
            .records
            .iter()
            .find(|record| record.id == id)
            .with_context(|| format!("No expense with id {}", id))?;

        let record = draft.apply_to(existing, engine.roster())?;
        runtime.block_on(service.update_expense(&record))?;
        println!("✓ Expense {} updated", id);
        Ok(())
    }

    pub fn delete(config: &AppConfig, id: &str) -> Result<()> {
        let service = ExpenseService::new(config.api_url.as_str());
        runtime()?.block_on(service.delete_expense(id))?;
        println!("✓ Expense {} deleted", id);
        Ok(())
    }
}
