use crate::models::SiteRecord;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse roster: {0}")]
    Csv(#[from] csv::Error),
}

/// Resolves a site key to the freezer's location and notification
/// recipient. Lookup failures are never fatal; the engine routes them to an
/// IT-only alert.
pub trait SiteDirectory {
    fn resolve(&self, site_key: &str) -> Result<Option<SiteRecord>, DirectoryError>;
}

/// Roster row as deployed: one line per board, keyed by its IP.
#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(rename = "IP")]
    ip: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Email")]
    email: String,
}

/// CSV-backed roster (`IP,Location,Email` headers). The file is re-read on
/// every resolve so roster edits take effect without a restart.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    path: PathBuf,
}

impl CsvDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SiteDirectory for CsvDirectory {
    fn resolve(&self, site_key: &str) -> Result<Option<SiteRecord>, DirectoryError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        for row in reader.deserialize::<RosterRow>() {
            let row = row?;
            if row.ip == site_key {
                return Ok(Some(SiteRecord {
                    location: row.location,
                    recipient: row.email,
                }));
            }
        }
        Ok(None)
    }
}
