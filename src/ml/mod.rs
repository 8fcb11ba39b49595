// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly — only this one
// and the thin tensor plumbing in data/infra.
//
// What's in this layer:
//
//   model.rs     — Encoder + convolutional pooling head
//                  • Token and positional embeddings
//                  • Multi-head self-attention with padding mask
//                  • Feed-forward networks (GELU activation)
//                  • Conv1d kernel-1/kernel-2 feature extractors
//                  • Max-over-time pooling + MLP logit head
//
//   loss.rs      — Class-balanced sigmoid focal loss
//                  Per-class reweighting from empirical
//                  class frequencies
//
//   schedule.rs  — Linear warm-up + linear decay learning rate
//
//   trainer.rs   — The training loop
//                  Forward, loss, backward, AdamW step,
//                  schedule step, per-epoch validation and
//                  best-macro-F1 checkpointing
//
//   evaluator.rs — The evaluation loop
//                  No-grad forward, sigmoid, thresholding,
//                  metric computation
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need
//            Kim (2014) Convolutional Neural Networks for
//            Sentence Classification

/// Transformer encoder + CNN pooling classification model
pub mod model;

/// Class-balanced resampling loss
pub mod loss;

/// Warm-up + linear-decay learning-rate schedule
pub mod schedule;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Shared no-grad evaluation loop (validation and test)
pub mod evaluator;
