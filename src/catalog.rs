use serde::Deserialize;
use std::{fs::File, io::BufReader, path::Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One catalog entry: which model artifact serves a plant and how its output
/// indices map to human-readable labels. The label order must match the
/// model's output order.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogEntry {
    pub id: u32,
    pub name: String,
    pub model: String,
    pub labels: Vec<String>,
}

/// Static plant-to-model mapping, loaded once at startup and read-only
/// afterwards.
#[derive(Debug)]
pub struct ModelCatalog {
    entries: Vec<CatalogEntry>,
}

impl ModelCatalog {
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        let entries = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Exact match on the trimmed plant name. Case-sensitive, no fuzzy
    /// matching.
    pub fn find(&self, plant: &str) -> Option<&CatalogEntry> {
        let plant = plant.trim();
        self.entries.iter().find(|entry| entry.name == plant)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
