// ============================================================
// Layer 4 — Dataset Loader
// ============================================================
// Loads one dataset split from a CSV file using the csv crate.
//
// Expected columns:
//   description              — the complaint text
//   label1 .. label8         — category names (may be empty)
//
// The label columns hold raw category STRINGS, not binary
// flags — encoding to a multi-hot vector happens later in
// the domain layer, where unknown names are dropped.
//
// A malformed row or a missing file aborts the run: there is
// no partial-failure handling at this level.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;

use crate::domain::complaint::Complaint;
use crate::domain::traits::ComplaintSource;

/// One raw CSV row. serde maps the header names to fields;
/// absent label cells deserialize to empty strings.
#[derive(Debug, Deserialize)]
struct ComplaintRow {
    description: String,
    #[serde(default)]
    label1: String,
    #[serde(default)]
    label2: String,
    #[serde(default)]
    label3: String,
    #[serde(default)]
    label4: String,
    #[serde(default)]
    label5: String,
    #[serde(default)]
    label6: String,
    #[serde(default)]
    label7: String,
    #[serde(default)]
    label8: String,
}

impl From<ComplaintRow> for Complaint {
    fn from(r: ComplaintRow) -> Self {
        Complaint::new(
            r.description,
            vec![
                r.label1, r.label2, r.label3, r.label4,
                r.label5, r.label6, r.label7, r.label8,
            ],
        )
    }
}

/// Loads labelled complaints from a single CSV file.
/// Implements the ComplaintSource trait from Layer 3.
pub struct CsvLoader {
    path: String,
}

impl CsvLoader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ComplaintSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<Complaint>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open dataset CSV '{}'", self.path))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(file);

        let mut complaints = Vec::new();
        for row in reader.deserialize::<ComplaintRow>() {
            let row = row
                .with_context(|| format!("Malformed row in '{}'", self.path))?;
            complaints.push(row.into());
        }

        tracing::info!("Loaded {} complaints from '{}'", complaints.len(), self.path);
        Ok(complaints)
    }
}
