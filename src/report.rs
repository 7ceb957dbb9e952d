// 📊 Report - what the presentation layer derives from a Summary
//
// Net settlement (who owes whom), per-category breakdown for charts,
// and the plain-text summary lines shown under the expense form.

use crate::error::SettlementError;
use crate::model::{Category, CurrencyCode, ParticipantId};
use crate::roster::Roster;
use crate::settlement::{PersonSummary, Summary};
use serde::Serialize;
use std::cmp::Ordering;

// ============================================================================
// NET SETTLEMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub debtor: ParticipantId,
    pub creditor: ParticipantId,
    /// Positive, in reference currency
    pub amount: f64,
}

/// Who owes whom, as the signed difference of the two `owed` totals.
///
/// `Ok(None)` when the totals are equal, or when the roster has more than
/// two participants (pairwise netting is not defined there). A total that
/// overflowed to infinity cannot be ordered and is an error, not a tie.
pub fn net_settlement(summary: &Summary, roster: &Roster) -> Result<Option<Settlement>, SettlementError> {
    if !roster.is_pair() {
        return Ok(None);
    }

    let first = &roster.participants()[0];
    let second = &roster.participants()[1];
    let first_owed = owed_total(summary, first)?;
    let second_owed = owed_total(summary, second)?;

    let settlement = match first_owed.total_cmp(&second_owed) {
        Ordering::Greater => Some(Settlement {
            debtor: first.clone(),
            creditor: second.clone(),
            amount: first_owed - second_owed,
        }),
        Ordering::Less => Some(Settlement {
            debtor: second.clone(),
            creditor: first.clone(),
            amount: second_owed - first_owed,
        }),
        Ordering::Equal => None,
    };
    Ok(settlement)
}

fn owed_total(summary: &Summary, participant: &ParticipantId) -> Result<f64, SettlementError> {
    let owed = summary.get(participant).map(|p| p.owed).unwrap_or(0.0);
    if owed.is_finite() {
        Ok(owed)
    } else {
        Err(SettlementError::NonFiniteTotal {
            participant: participant.to_string(),
        })
    }
}

// ============================================================================
// CATEGORY BREAKDOWN
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: f64,
    /// Fraction of the person's categorised spend (0.0 - 1.0)
    pub share: f64,
}

/// Largest category first; ties broken by name.
pub fn category_breakdown(person: &PersonSummary) -> Vec<CategoryShare> {
    let total: f64 = person.category_spent.values().sum();

    let mut shares: Vec<CategoryShare> = person
        .category_spent
        .iter()
        .map(|(category, amount)| CategoryShare {
            category: category.clone(),
            amount: *amount,
            share: if total > 0.0 { amount / total } else { 0.0 },
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}

// ============================================================================
// TEXT SUMMARY
// ============================================================================

/// "DS spent: 50.00 SGD", "DS owes: 0.00 SGD", ... then the settlement line.
pub fn summary_lines(summary: &Summary, roster: &Roster, reference: &CurrencyCode) -> Vec<String> {
    let mut lines = Vec::with_capacity(roster.len() * 2 + 1);

    for participant in roster.participants() {
        let person = summary.get(participant).cloned().unwrap_or_default();
        lines.push(format!("{} spent: {:.2} {}", participant, person.spent, reference));
        lines.push(format!("{} owes: {:.2} {}", participant, person.owed, reference));
    }

    if roster.is_pair() {
        lines.push(match net_settlement(summary, roster) {
            Ok(Some(s)) => format!("{} owes {}: {:.2} {}", s.debtor, s.creditor, s.amount, reference),
            Ok(None) => "All square".to_string(),
            Err(e) => format!("Settlement unavailable: {}", e),
        });
    }

    lines
}
