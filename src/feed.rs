// 📥 Expense Feed - decode service exports into typed records
//
// JSON is the shape served by the expense service (`GET /payments`,
// `GET /trips`). CSV is the same data flattened by a spreadsheet export.
// A bad element never aborts the batch: it is reported and skipped.

use crate::error::RejectedRecord;
use crate::model::{Category, CurrencyCode, ExpenseRecord, ParticipantId, SplitPolicy, Timestamp, Trip};
use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

// ============================================================================
// DECODED BATCH
// ============================================================================

/// Records that decoded cleanly plus the ones that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ExpenseFeed {
    pub records: Vec<ExpenseRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl ExpenseFeed {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    fn log_outcome(&self, source: &str) {
        info!(source, loaded = self.records.len(), rejected = self.rejected.len(), "expense feed decoded");
        for rejected in &self.rejected {
            warn!(source, index = rejected.index, id = ?rejected.id, reason = %rejected.reason, "expense skipped");
        }
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Decode a JSON array of expense records.
///
/// Fails only when the document is not a JSON array.
pub fn decode_expenses(json: &str) -> Result<ExpenseFeed> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(json).context("Expense feed is not a JSON array")?;

    let mut feed = ExpenseFeed::default();

    for (index, value) in values.into_iter().enumerate() {
        let id = value.get("id").and_then(|v| v.as_str()).map(str::to_string);

        match serde_json::from_value::<ExpenseRecord>(value) {
            Ok(record) => feed.records.push(record),
            Err(e) => feed.rejected.push(RejectedRecord::new(index, id, e.to_string())),
        }
    }

    feed.log_outcome("json");
    Ok(feed)
}

pub fn decode_trips(json: &str) -> Result<Vec<Trip>> {
    serde_json::from_str(json).context("Failed to parse trips JSON")
}

pub fn load_trips<P: AsRef<Path>>(path: P) -> Result<Vec<Trip>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read trips file: {:?}", path.as_ref()))?;
    decode_trips(&content)
}

// ============================================================================
// CSV
// ============================================================================

/// Flat CSV row; `createdAt` is RFC 3339 or epoch seconds
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvExpenseRow {
    id: String,
    #[serde(default)]
    created_at: String,
    paid_by: String,
    currency: String,
    amount: f64,
    #[serde(default)]
    description: String,
    payment: String,
    #[serde(default)]
    category: String,
    #[serde(rename = "trip_id", default)]
    trip_id: String,
}

fn parse_created_at(raw: &str) -> Result<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Timestamp::default());
    }
    if let Ok(seconds) = raw.parse::<i64>() {
        return Ok(Timestamp::new(seconds, 0));
    }
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid createdAt '{}'", raw))?;
    Ok(Timestamp::from_datetime(parsed.with_timezone(&Utc)))
}

impl CsvExpenseRow {
    fn into_record(self) -> Result<ExpenseRecord> {
        // `f64` parsing accepts NaN and inf; JSON cannot carry them
        ensure!(self.amount.is_finite(), "amount {} is not a finite number", self.amount);
        let payment: SplitPolicy = self.payment.parse()?;
        let category = if self.category.trim().is_empty() {
            Category::default()
        } else {
            Category::new(self.category.trim())
        };
        let trip_id = Some(self.trip_id.trim().to_string()).filter(|t| !t.is_empty());

        Ok(ExpenseRecord {
            id: self.id,
            created_at: parse_created_at(&self.created_at)?,
            paid_by: ParticipantId::new(self.paid_by.trim()),
            currency: CurrencyCode::new(&self.currency),
            amount: self.amount,
            description: self.description,
            payment,
            category,
            trip_id,
        })
    }
}

/// Decode CSV text with a header row using the JSON field names.
pub fn decode_expenses_csv<R: std::io::Read>(reader: R) -> Result<ExpenseFeed> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut feed = ExpenseFeed::default();

    for (index, result) in rdr.deserialize::<CsvExpenseRow>().enumerate() {
        match result {
            Ok(row) => {
                let id = row.id.clone();
                match row.into_record() {
                    Ok(record) => feed.records.push(record),
                    Err(e) => feed.rejected.push(RejectedRecord::new(index, Some(id), format!("{:#}", e))),
                }
            }
            Err(e) => feed.rejected.push(RejectedRecord::new(index, None, e.to_string())),
        }
    }

    feed.log_outcome("csv");
    Ok(feed)
}

/// Load expenses from a `.csv` or JSON file, chosen by extension.
pub fn load_expenses<P: AsRef<Path>>(path: P) -> Result<ExpenseFeed> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let file = fs::File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
        decode_expenses_csv(file)
    } else {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read expense file: {:?}", path))?;
        decode_expenses(&content)
    }
}

// ============================================================================
// VIEWS
// ============================================================================

/// Records of one trip, in input order
pub fn for_trip<'a>(records: &'a [ExpenseRecord], trip_id: &'a str) -> impl Iterator<Item = &'a ExpenseRecord> + 'a {
    records.iter().filter(move |r| r.belongs_to_trip(trip_id))
}

/// Display order: newest first, ties keep input order
pub fn newest_first(records: &[ExpenseRecord]) -> Vec<&ExpenseRecord> {
    let mut sorted: Vec<&ExpenseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted
}
