use serde::{Deserialize, Serialize};

/// A business card as read off a results page, before it is tied to a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub name: String,
    /// Digits and separators from a `tel:` link; empty when the card has none.
    pub phone: String,
    pub address: String,
}

impl Listing {
    /// Attaches the search term that surfaced this card.
    #[must_use]
    pub fn tagged(self, term: &str) -> ListingRecord {
        ListingRecord {
            term: term.to_string(),
            name: self.name,
            phone: self.phone,
            address: self.address,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub term: String,
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// How the navigator reached (or failed to reach) a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A candidate URL loaded and showed a results heading.
    Direct(String),
    /// The home-page search form was submitted.
    Form,
    Exhausted,
}

impl NavigationOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }

    /// The resolved URL, or the `"form"` sentinel.
    #[must_use]
    pub fn resolved_url(&self) -> Option<&str> {
        match self {
            Self::Direct(url) => Some(url),
            Self::Form => Some("form"),
            Self::Exhausted => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_carries_fields() {
        let record = Listing {
            name: "Studio Rossi".to_string(),
            phone: "02 1234567".to_string(),
            address: "Via Roma 1".to_string(),
        }
        .tagged("avvocati");
        assert_eq!(record.term, "avvocati");
        assert_eq!(record.name, "Studio Rossi");
        assert_eq!(record.phone, "02 1234567");
    }

    #[test]
    fn listing_record_serializes_expected_keys() {
        let record = ListingRecord {
            term: "t".to_string(),
            name: "n".to_string(),
            phone: String::new(),
            address: String::new(),
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["term"], "t");
        assert_eq!(json["phone"], "");
        assert!(json.get("address").is_some());
    }

    #[test]
    fn navigation_outcome_sentinels() {
        assert_eq!(NavigationOutcome::Form.resolved_url(), Some("form"));
        assert_eq!(
            NavigationOutcome::Direct("https://x/y".to_string()).resolved_url(),
            Some("https://x/y")
        );
        assert!(!NavigationOutcome::Exhausted.is_ok());
        assert!(NavigationOutcome::Form.is_ok());
    }
}
