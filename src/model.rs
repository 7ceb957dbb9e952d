// 🧾 Expense Model - records as served by the expense service
//
// Records are immutable values: the engine reads them, never edits them.
// Field names on the wire follow the service (camelCase, plus `trip_id`).

use crate::error::SettlementError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Participant identifier (e.g. "DS", "KT")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        ParticipantId::new(id)
    }
}

/// Spending category (e.g. "Dining", "Flights")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Category used when a record carries none
    pub const GENERAL: &'static str = "General";

    pub fn new(name: impl Into<String>) -> Self {
        Category(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::new(Self::GENERAL)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Category::new(name)
    }
}

/// Currency code, normalised to upper case ("sgd" == "SGD")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        CurrencyCode(code.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        CurrencyCode::new(code)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        CurrencyCode::new(code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TIMESTAMP
// ============================================================================

/// Wall-clock timestamp as stored by the service: seconds + nanoseconds.
///
/// Older exports use the `_seconds` / `_nanoseconds` spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,

    #[serde(alias = "_nanoseconds", default)]
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Timestamp {
            seconds,
            nanoseconds,
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Timestamp {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }

    /// None when the value is outside chrono's representable range
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.seconds, self.nanoseconds)
    }
}

// ============================================================================
// SPLIT POLICY
// ============================================================================

/// How an expense's cost is allocated between participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SplitPolicy {
    /// Both benefit equally; the other party owes half
    #[serde(rename = "Split equally")]
    SplitEqually,

    /// Paid entirely for the other party, who owes all of it
    #[serde(rename = "Owed full amount")]
    OwedFullAmount,

    /// Personal spending, no debt
    #[serde(rename = "Tracking")]
    Tracking,
}

impl SplitPolicy {
    pub const ALL: [SplitPolicy; 3] = [
        SplitPolicy::SplitEqually,
        SplitPolicy::OwedFullAmount,
        SplitPolicy::Tracking,
    ];

    /// Label stored by the expense service
    pub fn label(&self) -> &'static str {
        match self {
            SplitPolicy::SplitEqually => "Split equally",
            SplitPolicy::OwedFullAmount => "Owed full amount",
            SplitPolicy::Tracking => "Tracking",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SplitPolicy {
    type Err = SettlementError;

    /// Accepts the service labels and the variant names, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "splitequally" => Ok(SplitPolicy::SplitEqually),
            "owedfullamount" => Ok(SplitPolicy::OwedFullAmount),
            "tracking" => Ok(SplitPolicy::Tracking),
            _ => Err(SettlementError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for SplitPolicy {
    type Error = SettlementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// One logged expense, read-only once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    pub id: String,

    #[serde(default)]
    pub created_at: Timestamp,

    pub paid_by: ParticipantId,

    pub currency: CurrencyCode,

    /// Units of `currency`; sign is checked by the producer, not here
    pub amount: f64,

    #[serde(default)]
    pub description: String,

    pub payment: SplitPolicy,

    /// Records predating categories fall back to "General"
    #[serde(default)]
    pub category: Category,

    #[serde(rename = "trip_id", default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
}

impl ExpenseRecord {
    pub fn belongs_to_trip(&self, trip_id: &str) -> bool {
        self.trip_id.as_deref() == Some(trip_id)
    }
}

// ============================================================================
// TRIP
// ============================================================================

/// Trip grouping as listed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Document id
    pub id: String,

    /// Key referenced by `ExpenseRecord::trip_id`
    pub trip_id: String,

    pub name: String,
}
