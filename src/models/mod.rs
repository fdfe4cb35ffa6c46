use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Absolute URL of one listing's detail page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingReference(String);

impl ListingReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated references collected during one run, kept in first-seen order
#[derive(Debug, Default, Clone)]
pub struct ReferenceSet {
    seen: HashSet<ListingReference>,
    order: Vec<ListingReference>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add references, returning how many were not already present
    pub fn merge<I>(&mut self, refs: I) -> usize
    where
        I: IntoIterator<Item = ListingReference>,
    {
        let mut added = 0;
        for reference in refs {
            if self.seen.insert(reference.clone()) {
                self.order.push(reference);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &ListingReference> {
        self.order.iter()
    }

    pub fn into_vec(self) -> Vec<ListingReference> {
        self.order
    }
}

/// Which layout's selectors a filter strategy targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiVariant {
    Compact,
    Full,
}

impl fmt::Display for UiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiVariant::Compact => f.write_str("compact"),
            UiVariant::Full => f.write_str("full"),
        }
    }
}

/// Contact details scraped from a by-owner listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDetail {
    pub address: Option<String>,
    pub source_url: Option<String>,
    pub phone_number: Option<String>,
    pub owner_name: Option<String>,
    pub publication_date: Option<String>,
    pub price: Option<String>,
}

impl ListingDetail {
    /// Column layout of the leads report. Blank columns are reserved
    /// positions that downstream sheets still index by offset.
    pub const CSV_HEADER: [&'static str; 12] = [
        "Adress",
        "",
        "",
        "url link",
        "phone number",
        "",
        "property owner name",
        "",
        "date",
        "",
        "",
        "price",
    ];

    pub fn to_row(&self) -> [&str; 12] {
        fn field(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("")
        }
        [
            field(&self.address),
            "",
            "",
            field(&self.source_url),
            field(&self.phone_number),
            "",
            field(&self.owner_name),
            "",
            field(&self.publication_date),
            "",
            "",
            field(&self.price),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LoadFailed,
    NotByOwner,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::LoadFailed => f.write_str("page failed to load"),
            SkipReason::NotByOwner => f.write_str("not listed by owner"),
        }
    }
}

/// Result of visiting one listing detail page
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Eligible(ListingDetail),
    Skipped(SkipReason),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(urls: &[&str]) -> Vec<ListingReference> {
        urls.iter().map(|u| ListingReference::new(*u)).collect()
    }

    #[test]
    fn merging_same_page_twice_adds_nothing_the_second_time() {
        let page = refs(&["https://example.com/a", "https://example.com/b"]);
        let mut set = ReferenceSet::new();

        assert_eq!(set.merge(page.clone()), 2);
        assert_eq!(set.merge(page), 0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn merge_keeps_first_seen_order_and_drops_duplicates_within_a_page() {
        let mut set = ReferenceSet::new();
        set.merge(refs(&[
            "https://example.com/b",
            "https://example.com/a",
            "https://example.com/b",
        ]));
        set.merge(refs(&["https://example.com/c", "https://example.com/a"]));

        let urls: Vec<&str> = set.iter().map(|r| r.as_str()).collect();
        assert_eq!(
            urls,
            ["https://example.com/b", "https://example.com/a", "https://example.com/c"]
        );
    }

    #[test]
    fn row_places_fields_at_fixed_offsets() {
        let detail = ListingDetail {
            address: Some("12 Elm St, Stamford, CT 06902".to_string()),
            source_url: Some("https://www.zillow.com/homedetails/1_zpid/".to_string()),
            phone_number: Some("(203) 555-0101".to_string()),
            owner_name: Some("Pat Owner".to_string()),
            publication_date: Some("5/2/2025".to_string()),
            price: Some("$3,399".to_string()),
        };

        let row = detail.to_row();
        assert_eq!(row.len(), ListingDetail::CSV_HEADER.len());
        assert_eq!(row[0], "12 Elm St, Stamford, CT 06902");
        assert_eq!(row[3], "https://www.zillow.com/homedetails/1_zpid/");
        assert_eq!(row[4], "(203) 555-0101");
        assert_eq!(row[6], "Pat Owner");
        assert_eq!(row[8], "5/2/2025");
        assert_eq!(row[11], "$3,399");
        for reserved in [1, 2, 5, 7, 9, 10] {
            assert_eq!(row[reserved], "");
        }
    }

    #[test]
    fn missing_fields_render_as_empty_cells() {
        let detail = ListingDetail::default();
        let row = detail.to_row();
        assert!(row.iter().all(|cell| cell.is_empty()));
    }
}
