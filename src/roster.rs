// 👥 Roster - who can pay, what they can spend on, in which currencies
//
// Participants, categories and currencies are configuration, not literals.
// The engine is parameterised over a Roster instead of closing over names.

use crate::error::RosterError;
use crate::model::{Category, CurrencyCode, ParticipantId};
use serde::Serialize;

/// Participants shipped with the default configuration
pub const DEFAULT_PARTICIPANTS: [&str; 2] = ["DS", "KT"];

/// Categories shipped with the default configuration
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "General",
    "Dining",
    "Transport",
    "Shopping",
    "Attractions",
    "Accommodation",
    "Flights",
];

/// Currencies offered when logging an expense
pub const DEFAULT_CURRENCIES: [&str; 3] = ["KRW", "MYR", "SGD"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    participants: Vec<ParticipantId>,
    categories: Vec<Category>,
    currencies: Vec<CurrencyCode>,
}

impl Roster {
    /// Build a roster; participants must be unique, non-blank and at least two
    pub fn new(
        participants: Vec<ParticipantId>,
        categories: Vec<Category>,
        currencies: Vec<CurrencyCode>,
    ) -> Result<Self, RosterError> {
        if participants.len() < 2 {
            return Err(RosterError::TooFewParticipants(participants.len()));
        }

        for (i, participant) in participants.iter().enumerate() {
            if participant.as_str().trim().is_empty() {
                return Err(RosterError::BlankParticipant);
            }
            if participants[..i].contains(participant) {
                return Err(RosterError::DuplicateParticipant(participant.to_string()));
            }
        }

        if categories.is_empty() {
            return Err(RosterError::NoCategories);
        }

        Ok(Roster {
            participants,
            categories,
            currencies,
        })
    }

    /// The two-person roster used by the original app
    pub fn with_defaults() -> Self {
        Roster {
            participants: DEFAULT_PARTICIPANTS.iter().map(|p| ParticipantId::from(*p)).collect(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| Category::from(*c)).collect(),
            currencies: DEFAULT_CURRENCIES.iter().map(|c| CurrencyCode::from(*c)).collect(),
        }
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn currencies(&self) -> &[CurrencyCode] {
        &self.currencies
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always false; a roster holds at least two participants
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Exactly two participants, so "the other party" is well defined
    pub fn is_pair(&self) -> bool {
        self.participants.len() == 2
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    pub fn has_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Empty currency list means "accept anything"
    pub fn supports_currency(&self, currency: &CurrencyCode) -> bool {
        self.currencies.is_empty() || self.currencies.contains(currency)
    }

    /// The complement of `participant` in a two-person roster.
    ///
    /// None when the roster is larger than two or `participant` is unknown.
    pub fn counterparty(&self, participant: &ParticipantId) -> Option<&ParticipantId> {
        if !self.is_pair() || !self.contains(participant) {
            return None;
        }
        self.participants.iter().find(|p| *p != participant)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().map(|n| ParticipantId::from(*n)).collect()
    }

    #[test]
    fn test_default_roster() {
        let roster = Roster::with_defaults();

        assert!(roster.is_pair());
        assert_eq!(roster.participants(), ids(&["DS", "KT"]).as_slice());
        assert_eq!(roster.categories().len(), 7);
        assert!(roster.has_category(&Category::from("Flights")));
        assert!(roster.supports_currency(&CurrencyCode::from("myr")));
        assert!(!roster.supports_currency(&CurrencyCode::from("USD")));
    }

    #[test]
    fn test_counterparty_is_the_complement() {
        let roster = Roster::with_defaults();

        assert_eq!(roster.counterparty(&"DS".into()), Some(&ParticipantId::from("KT")));
        assert_eq!(roster.counterparty(&"KT".into()), Some(&ParticipantId::from("DS")));
        assert_eq!(roster.counterparty(&"ZZ".into()), None);
    }

    #[test]
    fn test_no_counterparty_for_three_people() {
        let roster = Roster::new(ids(&["A", "B", "C"]), vec![Category::default()], vec![]).unwrap();

        assert!(!roster.is_pair());
        assert_eq!(roster.counterparty(&"A".into()), None);
        // Empty currency list accepts everything
        assert!(roster.supports_currency(&CurrencyCode::from("EUR")));
    }

    #[test]
    fn test_roster_validation() {
        let categories = vec![Category::default()];

        assert_eq!(
            Roster::new(ids(&["A"]), categories.clone(), vec![]),
            Err(RosterError::TooFewParticipants(1))
        );
        assert_eq!(
            Roster::new(ids(&["A", "B", "A"]), categories.clone(), vec![]),
            Err(RosterError::DuplicateParticipant("A".to_string()))
        );
        assert_eq!(
            Roster::new(ids(&["A", " "]), categories, vec![]),
            Err(RosterError::BlankParticipant)
        );
        assert_eq!(
            Roster::new(ids(&["A", "B"]), vec![], vec![]),
            Err(RosterError::NoCategories)
        );
    }
}
