// ⚖️ Settlement Engine - per-person spent/owed from expense records
//
// Each record becomes a list of postings (participant, spent, owed),
// then postings are folded into a fresh zero-valued summary in input order.
//
// Per record, with cost converted to the reference currency:
//   Tracking        payer.spent += cost
//   SplitEqually    everyone.spent += cost / n, every non-payer.owed += cost / n
//   OwedFullAmount  other.spent += cost, other.owed += cost
//
// `owed` accumulates what a person owes the others; the payer is never
// charged for their own expense.

use crate::error::{RejectedRecord, SettlementError};
use crate::model::{Category, ExpenseRecord, ParticipantId, SplitPolicy};
use crate::rates::ConversionRateTable;
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

// ============================================================================
// SUMMARY TYPES
// ============================================================================

/// Totals for one participant, in reference currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    /// Personal consumption
    pub spent: f64,

    /// Amount this person owes the payers
    pub owed: f64,

    /// Consumption per category (only categories that were touched)
    pub category_spent: BTreeMap<Category, f64>,
}

impl PersonSummary {
    pub fn category(&self, category: &Category) -> f64 {
        self.category_spent.get(category).copied().unwrap_or(0.0)
    }

    fn post(mut self, category: &Category, spent: f64, owed: f64) -> Self {
        self.spent += spent;
        self.owed += owed;
        *self.category_spent.entry(category.clone()).or_insert(0.0) += spent;
        self
    }
}

/// Per-participant summaries for a whole roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    people: BTreeMap<ParticipantId, PersonSummary>,
}

impl Summary {
    /// Zero-valued entry for every participant
    pub fn zeroed(roster: &Roster) -> Self {
        Summary {
            people: roster
                .participants()
                .iter()
                .map(|p| (p.clone(), PersonSummary::default()))
                .collect(),
        }
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&PersonSummary> {
        self.people.get(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &PersonSummary)> {
        self.people.iter()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Sum of everyone's `spent`
    pub fn total_spent(&self) -> f64 {
        self.people.values().map(|p| p.spent).sum()
    }

    fn apply(mut self, allocation: &Allocation) -> Self {
        for posting in &allocation.postings {
            if let Some(person) = self.people.get_mut(&posting.participant) {
                *person = std::mem::take(person).post(&allocation.category, posting.spent, posting.owed);
            }
        }
        self
    }
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// One participant's share of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Posting {
    pub participant: ParticipantId,
    pub spent: f64,
    pub owed: f64,
}

/// Explicit split of one record across participants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub record_id: String,
    pub category: Category,
    /// Amount in reference currency
    pub cost: f64,
    pub postings: Vec<Posting>,
}

// ============================================================================
// SETTLEMENT REPORT (lenient mode)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementReport {
    pub summary: Summary,
    pub rejected: Vec<RejectedRecord>,
}

impl SettlementReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ============================================================================
// SETTLEMENT ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct SettlementEngine {
    roster: Roster,
    rates: ConversionRateTable,
}

impl SettlementEngine {
    pub fn new(roster: Roster, rates: ConversionRateTable) -> Self {
        SettlementEngine { roster, rates }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn rates(&self) -> &ConversionRateTable {
        &self.rates
    }

    /// Split one record into postings without touching any summary.
    pub fn allocate(&self, record: &ExpenseRecord) -> Result<Allocation, SettlementError> {
        let payer = &record.paid_by;
        if !self.roster.contains(payer) {
            return Err(SettlementError::UnknownParticipant {
                record_id: record.id.clone(),
                participant: payer.to_string(),
            });
        }

        let cost = self.rates.to_reference(record.amount, &record.currency);
        if !cost.is_finite() {
            return Err(SettlementError::NonFiniteAmount {
                record_id: record.id.clone(),
                amount: record.amount,
            });
        }

        let postings = match record.payment {
            SplitPolicy::Tracking => vec![Posting {
                participant: payer.clone(),
                spent: cost,
                owed: 0.0,
            }],
            SplitPolicy::SplitEqually => {
                let share = cost / self.roster.len() as f64;
                self.roster
                    .participants()
                    .iter()
                    .map(|p| Posting {
                        participant: p.clone(),
                        spent: share,
                        owed: if p == payer { 0.0 } else { share },
                    })
                    .collect()
            }
            SplitPolicy::OwedFullAmount => {
                let other = self.roster.counterparty(payer).ok_or_else(|| {
                    SettlementError::AmbiguousCounterparty {
                        record_id: record.id.clone(),
                        participants: self.roster.len(),
                    }
                })?;
                vec![Posting {
                    participant: other.clone(),
                    spent: cost,
                    owed: cost,
                }]
            }
        };

        Ok(Allocation {
            record_id: record.id.clone(),
            category: record.category.clone(),
            cost,
            postings,
        })
    }

    /// Strict mode: the first offending record fails the whole computation.
    pub fn compute<'a, I>(&self, records: I) -> Result<Summary, SettlementError>
    where
        I: IntoIterator<Item = &'a ExpenseRecord>,
    {
        let mut count = 0usize;
        let summary = records
            .into_iter()
            .try_fold(Summary::zeroed(&self.roster), |summary, record| {
                count += 1;
                let allocation = self.allocate(record)?;
                Ok::<_, SettlementError>(summary.apply(&allocation))
            })?;

        debug!(records = count, "settlement computed");
        Ok(summary)
    }

    /// Lenient mode: offending records are skipped and reported, the rest
    /// are summarised exactly as `compute` would.
    pub fn compute_lenient<'a, I>(&self, records: I) -> SettlementReport
    where
        I: IntoIterator<Item = &'a ExpenseRecord>,
    {
        let (summary, rejected) = records.into_iter().enumerate().fold(
            (Summary::zeroed(&self.roster), Vec::new()),
            |(summary, mut rejected), (index, record)| match self.allocate(record) {
                Ok(allocation) => (summary.apply(&allocation), rejected),
                Err(err) => {
                    warn!(index, record_id = %record.id, error = %err, "skipping record");
                    rejected.push(RejectedRecord::new(index, Some(record.id.clone()), err.to_string()));
                    (summary, rejected)
                }
            },
        );

        SettlementReport { summary, rejected }
    }
}

/// Strict summary over `records` for `roster`, converting with `rates`.
pub fn compute_summary(
    records: &[ExpenseRecord],
    rates: &ConversionRateTable,
    roster: &Roster,
) -> Result<Summary, SettlementError> {
    SettlementEngine::new(roster.clone(), rates.clone()).compute(records)
}
