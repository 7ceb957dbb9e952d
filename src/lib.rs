// Trip Split - Core Library
// Shared-expense settlement for the CLI, the API server, and tests

pub mod error;
pub mod model;
pub mod roster;
pub mod rates;
pub mod settlement;     // spent/owed engine
pub mod feed;           // JSON / CSV exports
pub mod validation;     // new-expense checks
pub mod report;         // settlement direction, category breakdown
pub mod config;
pub mod logging;

#[cfg(feature = "remote")]
pub mod client;         // hosted expense service

// Re-export commonly used types
pub use error::{RejectedRecord, RosterError, SettlementError};
pub use model::{
    Category, CurrencyCode, ExpenseRecord, ParticipantId, SplitPolicy, Timestamp, Trip,
};
pub use roster::Roster;
pub use rates::ConversionRateTable;
pub use settlement::{
    compute_summary, Allocation, PersonSummary, Posting, SettlementEngine, SettlementReport,
    Summary,
};
pub use feed::{
    decode_expenses, decode_expenses_csv, decode_trips, for_trip, load_expenses, load_trips,
    newest_first, ExpenseFeed,
};
pub use validation::{DraftIssue, DraftRejected, ExpenseDraft};
pub use report::{category_breakdown, net_settlement, summary_lines, CategoryShare, Settlement};
pub use config::{AppConfig, ConfigError};

#[cfg(feature = "remote")]
pub use client::ExpenseService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
