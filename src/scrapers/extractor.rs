use crate::models::ListingReference;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("embedded data element `{0}` not found")]
    MissingMarker(String),
    #[error("embedded data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Pulls listing links out of the JSON blob a results page embeds in a script tag
pub struct ResultExtractor {
    marker: Selector,
    marker_css: String,
    path: Vec<String>,
    link_field: String,
    base: Url,
}

impl ResultExtractor {
    pub fn new(
        marker_css: &str,
        path: &[&str],
        link_field: &str,
        base: Url,
    ) -> anyhow::Result<Self> {
        let marker = Selector::parse(marker_css)
            .map_err(|e| anyhow::anyhow!("Invalid marker selector '{}': {}", marker_css, e))?;
        Ok(Self {
            marker,
            marker_css: marker_css.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
            link_field: link_field.to_string(),
            base,
        })
    }

    /// References found on the page. Unexpected data shapes yield an empty
    /// list; only a missing blob or unparseable JSON is an error.
    pub fn extract(&self, html: &str) -> Result<Vec<ListingReference>, ExtractError> {
        let document = Html::parse_document(html);
        let blob = document
            .select(&self.marker)
            .next()
            .ok_or_else(|| ExtractError::MissingMarker(self.marker_css.clone()))?
            .text()
            .collect::<String>();

        if blob.trim().is_empty() {
            debug!("Empty {} blob, no results", self.marker_css);
            return Ok(Vec::new());
        }

        let data: Value = serde_json::from_str(&blob)?;

        let Some(Value::Array(items)) = self.walk(&data) else {
            debug!("No result array at {}", self.path.join("."));
            return Ok(Vec::new());
        };
        debug!("Found {} results in {}", items.len(), self.path.join("."));

        Ok(items
            .iter()
            .filter_map(|item| item.get(&self.link_field)?.as_str())
            .filter_map(|link| self.absolute(link))
            .collect())
    }

    fn walk<'a>(&self, data: &'a Value) -> Option<&'a Value> {
        self.path.iter().try_fold(data, |node, key| node.get(key))
    }

    fn absolute(&self, link: &str) -> Option<ListingReference> {
        match self.base.join(link) {
            Ok(url) => Some(ListingReference::new(String::from(url))),
            Err(e) => {
                debug!("Skipping unusable link '{}': {}", link, e);
                None
            }
        }
    }
}
