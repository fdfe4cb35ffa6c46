use crate::error::{LeadsError, Result};
use crate::models::{ListingDetail, ListingReference};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// Save collected links as a pretty-printed JSON array
pub async fn write_links(path: &Path, links: &[ListingReference]) -> Result<()> {
    let json = serde_json::to_string_pretty(links)?;
    tokio::fs::write(path, json).await?;
    info!("💾 Saved {} links to {}", links.len(), path.display());
    Ok(())
}

/// Load a links file. Anything but a JSON array of strings is rejected.
pub async fn read_links(path: &Path) -> Result<Vec<ListingReference>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&raw)?;

    let Value::Array(items) = value else {
        return Err(LeadsError::NotAList(path.to_path_buf()));
    };

    let links = items
        .into_iter()
        .map(|item| match item {
            Value::String(url) => Ok(ListingReference::new(url)),
            _ => Err(LeadsError::NotAList(path.to_path_buf())),
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Loaded {} listing links from {}", links.len(), path.display());
    Ok(links)
}

/// Leads report writer. Each row is flushed as written so an interrupted
/// run still leaves every lead found so far on disk.
pub struct LeadsCsv {
    writer: csv::Writer<File>,
    rows: usize,
}

impl LeadsCsv {
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(ListingDetail::CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write(&mut self, detail: &ListingDetail) -> Result<()> {
        self.writer.write_record(detail.to_row())?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}
