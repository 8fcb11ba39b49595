// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them:
//   - CsvLoader implements ComplaintSource
//   - A future JsonlLoader could also implement ComplaintSource
//   - The application layer only sees ComplaintSource
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::complaint::Complaint;

// ─── ComplaintSource ──────────────────────────────────────────────────────────
/// Any component that can load labelled complaints from a source.
///
/// Implementations:
///   - CsvLoader → loads one dataset split from a CSV file
pub trait ComplaintSource {
    /// Load all available complaints from this source.
    fn load_all(&self) -> Result<Vec<Complaint>>;
}
