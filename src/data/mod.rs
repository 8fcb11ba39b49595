// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw CSV files
// all the way to GPU-ready tensor batches.
//
// The pipeline flows in this order:
//
//   trainset.csv / valset.csv / testset.csv
//       │
//       ▼
//   CsvLoader         → reads rows, extracts text + label names
//       │
//       ▼
//   SampleEncoder     → tokenises, pads, encodes multi-hot targets
//       │
//       ▼
//   ComplaintDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   ComplaintBatcher  → stacks samples into tensor batches
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads labelled complaints from CSV files using the csv crate
pub mod loader;

/// Tokenises, pads, and multi-hot encodes raw complaints
pub mod encoder;

/// Implements Burn's Dataset trait for classification samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
