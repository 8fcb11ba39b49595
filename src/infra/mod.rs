// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles all cross-cutting concerns that don't belong in
// any specific business layer:
//
//   checkpoint.rs      — Saving and loading model weights
//                        Uses Burn's CompactRecorder to
//                        serialise model parameters to disk.
//                        Keeps only the single best-macro-F1
//                        checkpoint per run, plus the resolved
//                        RunConfig as JSON so the test path can
//                        rebuild the exact architecture.
//
//   tokenizer_store.rs — Pretrained tokenizer loading
//                        The same vocabulary must be used for
//                        training and test-time reporting.
//
//   metrics.rs         — Multi-label metric computation
//                        (scikit-learn conventions) and the
//                        per-epoch metrics.csv logger.
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Pretrained tokenizer loading
pub mod tokenizer_store;

/// Metric computation and the training metrics CSV logger
pub mod metrics;
