// ⚠️ Error types - typed failures at the library seams
//
// Application layers (CLI, server, file loading) wrap these in anyhow;
// the engine and roster return them directly so callers can match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// SETTLEMENT ERRORS
// ============================================================================

/// Data-integrity failures raised while settling expense records.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    /// `paidBy` is not a member of the roster
    #[error("record {record_id}: unknown participant '{participant}'")]
    UnknownParticipant {
        record_id: String,
        participant: String,
    },

    /// Payment label is not one of the three split policies
    #[error("unknown split policy '{0}'")]
    UnknownPolicy(String),

    /// `OwedFullAmount` needs exactly one other party
    #[error("record {record_id}: 'Owed full amount' needs a two-person roster, found {participants} participants")]
    AmbiguousCounterparty {
        record_id: String,
        participants: usize,
    },

    /// NaN or infinite amount, before or after conversion
    #[error("record {record_id}: amount {amount} is not a finite number")]
    NonFiniteAmount { record_id: String, amount: f64 },

    /// A running total overflowed; no settlement can be derived from it
    #[error("total owed by '{participant}' is not a finite number")]
    NonFiniteTotal { participant: String },

    /// Conversion factors must be finite and positive
    #[error("invalid conversion rate {rate} for {currency}")]
    InvalidRate { currency: String, rate: f64 },
}

// ============================================================================
// ROSTER ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("a roster needs at least 2 participants, got {0}")]
    TooFewParticipants(usize),

    #[error("participant '{0}' is listed more than once")]
    DuplicateParticipant(String),

    #[error("participant names cannot be blank")]
    BlankParticipant,

    #[error("at least one category is required")]
    NoCategories,
}

// ============================================================================
// REJECTED RECORDS (skip-and-report)
// ============================================================================

/// A record that was skipped instead of aborting the whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Position in the input sequence (0-based)
    pub index: usize,

    /// Record id, when one could be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Human-readable reason
    pub reason: String,
}

impl RejectedRecord {
    pub fn new(index: usize, id: Option<String>, reason: impl Into<String>) -> Self {
        RejectedRecord {
            index,
            id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_record() {
        let err = SettlementError::UnknownParticipant {
            record_id: "abc".to_string(),
            participant: "ZZ".to_string(),
        };
        assert_eq!(err.to_string(), "record abc: unknown participant 'ZZ'");

        let err = SettlementError::UnknownPolicy("Loan".to_string());
        assert_eq!(err.to_string(), "unknown split policy 'Loan'");
    }

    #[test]
    fn test_rejected_record_skips_missing_id() {
        let rejected = RejectedRecord::new(3, None, "bad amount");
        let json = serde_json::to_value(&rejected).unwrap();

        assert_eq!(json["index"], 3);
        assert!(json.get("id").is_none());
        assert_eq!(json["reason"], "bad amount");
    }
}
