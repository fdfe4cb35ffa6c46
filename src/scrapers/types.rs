use std::fmt;
use std::str::FromStr;

/// "Days on site" recency bounds the search UI offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysOnSite {
    One,
    Seven,
    Fourteen,
    Thirty,
    Ninety,
}

impl DaysOnSite {
    pub fn days(self) -> u32 {
        match self {
            DaysOnSite::One => 1,
            DaysOnSite::Seven => 7,
            DaysOnSite::Fourteen => 14,
            DaysOnSite::Thirty => 30,
            DaysOnSite::Ninety => 90,
        }
    }
}

impl fmt::Display for DaysOnSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days())
    }
}

impl FromStr for DaysOnSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(DaysOnSite::One),
            "7" => Ok(DaysOnSite::Seven),
            "14" => Ok(DaysOnSite::Fourteen),
            "30" => Ok(DaysOnSite::Thirty),
            "90" => Ok(DaysOnSite::Ninety),
            other => Err(format!("'{}' is not one of 1, 7, 14, 30, 90", other)),
        }
    }
}

/// Search parameters for one crawl
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// City and state, e.g. "Stamford, CT"
    pub location: String,
    /// Listing category path segment, e.g. "rentals"
    pub category: String,
    /// Sort results newest first
    pub sort_newest: bool,
    /// Minimum monthly price
    pub min_price: Option<u32>,
    /// Only listings posted within this many days
    pub days_on_site: Option<DaysOnSite>,
    /// Result pages to walk; absent means one
    pub page_count: Option<u32>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            location: "Stamford, CT".to_string(),
            category: "rentals".to_string(),
            sort_newest: false,
            min_price: None,
            days_on_site: None,
            page_count: None,
        }
    }
}

impl SearchQuery {
    pub fn page_limit(&self) -> u32 {
        self.page_count.unwrap_or(1).max(1)
    }

    /// "Stamford, CT" -> "stamford-ct"
    pub fn location_slug(&self) -> String {
        let mut parts = self.location.split(',');
        let city = parts
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase()
            .replace(' ', "-");
        let state = parts.next().map(|s| s.trim().to_lowercase()).unwrap_or_default();

        if !city.is_empty() && !state.is_empty() {
            format!("{}-{}", city, state)
        } else {
            city
        }
    }

    /// Search results URL for this query against the site root
    pub fn search_url(&self, base_url: &str) -> Option<String> {
        let slug = self.location_slug();
        if slug.is_empty() {
            return None;
        }
        Some(format!(
            "{}/{}/{}/",
            base_url.trim_end_matches('/'),
            slug,
            self.category.to_lowercase()
        ))
    }

    /// Default name of the links file, encoding location, category and active filters
    pub fn links_filename(&self) -> String {
        let mut name = format!(
            "zillow_links_{}_{}",
            self.location_slug(),
            self.category.to_lowercase()
        );
        if self.sort_newest {
            name.push_str("_newest");
        }
        if let Some(price) = self.min_price {
            name.push_str(&format!("_minprice{}", price));
        }
        if let Some(days) = self.days_on_site {
            name.push_str(&format!("_last{}days", days));
        }
        name.push_str(".json");
        name
    }
}
