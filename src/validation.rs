// ✅ Draft Validation - checks a new expense before it is submitted
//
// The engine trusts its input's sign; this is where negative amounts,
// blank descriptions and out-of-roster values are caught.

use crate::model::{Category, CurrencyCode, ExpenseRecord, ParticipantId, SplitPolicy, Timestamp};
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DraftIssue {
    #[error("amount must be a finite, non-negative number (got {0})")]
    Amount(f64),

    #[error("description is required")]
    Description,

    #[error("'{0}' is not a participant")]
    PaidBy(String),

    #[error("currency '{0}' is not supported")]
    Currency(String),

    #[error("category '{0}' is not known")]
    Category(String),
}

/// Every issue found on a draft
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expense draft rejected: {}", .issues.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("; "))]
pub struct DraftRejected {
    pub issues: Vec<DraftIssue>,
}

// ============================================================================
// EXPENSE DRAFT
// ============================================================================

/// A new expense as entered, before the service assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDraft {
    pub paid_by: ParticipantId,
    pub currency: CurrencyCode,
    pub amount: f64,
    pub description: String,
    pub payment: SplitPolicy,
    #[serde(default)]
    pub category: Category,
    #[serde(rename = "trip_id", default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
}

impl ExpenseDraft {
    /// All problems with this draft against `roster`; empty means valid.
    pub fn issues(&self, roster: &Roster) -> Vec<DraftIssue> {
        let mut issues = Vec::new();

        if !self.amount.is_finite() || self.amount < 0.0 {
            issues.push(DraftIssue::Amount(self.amount));
        }
        if self.description.trim().is_empty() {
            issues.push(DraftIssue::Description);
        }
        if !roster.contains(&self.paid_by) {
            issues.push(DraftIssue::PaidBy(self.paid_by.to_string()));
        }
        if !roster.supports_currency(&self.currency) {
            issues.push(DraftIssue::Currency(self.currency.to_string()));
        }
        if !roster.has_category(&self.category) {
            issues.push(DraftIssue::Category(self.category.to_string()));
        }

        issues
    }

    pub fn validate(&self, roster: &Roster) -> Result<(), DraftRejected> {
        let issues = self.issues(roster);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(DraftRejected { issues })
        }
    }

    /// Validate, then stamp a fresh id and the current time.
    pub fn into_record(self, roster: &Roster) -> Result<ExpenseRecord, DraftRejected> {
        self.validate(roster)?;

        Ok(ExpenseRecord {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Timestamp::now(),
            paid_by: self.paid_by,
            currency: self.currency,
            amount: self.amount,
            description: self.description.trim().to_string(),
            payment: self.payment,
            category: self.category,
            trip_id: self.trip_id,
        })
    }

    /// Validate, then overwrite the editable fields of `existing`.
    ///
    /// Id and creation time are kept. The trip stays unless the draft names one.
    pub fn apply_to(self, existing: &ExpenseRecord, roster: &Roster) -> Result<ExpenseRecord, DraftRejected> {
        self.validate(roster)?;

        Ok(ExpenseRecord {
            id: existing.id.clone(),
            created_at: existing.created_at,
            paid_by: self.paid_by,
            currency: self.currency,
            amount: self.amount,
            description: self.description.trim().to_string(),
            payment: self.payment,
            category: self.category,
            trip_id: self.trip_id.or_else(|| existing.trip_id.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            paid_by: "DS".into(),
            currency: "SGD".into(),
            amount: 42.0,
            description: "Chilli crab".to_string(),
            payment: SplitPolicy::SplitEqually,
            category: "Dining".into(),
            trip_id: Some("sg".to_string()),
        }
    }

    #[test]
    fn test_valid_draft_becomes_record() {
        let roster = Roster::with_defaults();
        let record = draft().into_record(&roster).unwrap();

        assert_eq!(record.id.len(), 36);
        assert!(record.created_at.seconds > 0);
        assert_eq!(record.amount, 42.0);
        assert_eq!(record.trip_id.as_deref(), Some("sg"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let roster = Roster::with_defaults();
        let mut d = draft();
        d.amount = -1.0;

        assert_eq!(d.issues(&roster), vec![DraftIssue::Amount(-1.0)]);
        assert!(d.into_record(&roster).is_err());
    }

    #[test]
    fn test_zero_amount_allowed() {
        let mut d = draft();
        d.amount = 0.0;
        assert!(d.validate(&Roster::with_defaults()).is_ok());
    }

    #[test]
    fn test_all_issues_reported() {
        let d = ExpenseDraft {
            paid_by: "ZZ".into(),
            currency: "USD".into(),
            amount: f64::NAN,
            description: "   ".to_string(),
            payment: SplitPolicy::Tracking,
            category: "Groceries".into(),
            trip_id: None,
        };

        let err = d.validate(&Roster::with_defaults()).unwrap_err();
        assert_eq!(err.issues.len(), 5);
        assert_eq!(err.issues[1], DraftIssue::Description);
        assert_eq!(err.issues[2], DraftIssue::PaidBy("ZZ".to_string()));
        assert_eq!(err.issues[3], DraftIssue::Currency("USD".to_string()));
        assert_eq!(err.issues[4], DraftIssue::Category("Groceries".to_string()));
        assert!(err.to_string().starts_with("expense draft rejected: amount must be"));
    }

    #[test]
    fn test_edit_keeps_identity() {
        let roster = Roster::with_defaults();
        let existing = draft().into_record(&roster).unwrap();

        let mut edit = draft();
        edit.amount = 55.5;
        edit.payment = SplitPolicy::OwedFullAmount;
        edit.trip_id = None;
        let updated = edit.apply_to(&existing, &roster).unwrap();

        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.created_at, existing.created_at);
        assert_eq!(updated.amount, 55.5);
        assert_eq!(updated.payment, SplitPolicy::OwedFullAmount);
        assert_eq!(updated.trip_id.as_deref(), Some("sg"));

        let mut bad = draft();
        bad.paid_by = "ZZ".into();
        assert!(bad.apply_to(&existing, &roster).is_err());
    }

    #[test]
    fn test_draft_wire_shape() {
        let json = serde_json::to_value(draft()).unwrap();

        assert_eq!(json["paidBy"], "DS");
        assert_eq!(json["payment"], "Split equally");
        assert_eq!(json["trip_id"], "sg");
    }
}
