// ============================================================
// Layer 4 — Complaint Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec of
// ComplaintSamples into GPU-ready tensors.
//
// How batching works here:
//   Input:  Vec of N samples, each with sequences of length S
//   Output: ComplaintBatch with tensors of shape [N, S]
//
//   We flatten all input_ids into one long Vec, then reshape:
//   [s1_t1, s1_t2, ..., s1_tS, s2_t1, ..., sN_tS] → [N, S]
//
// All sequences are already padded to the same length by the
// SampleEncoder, so no dynamic padding happens here.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ComplaintSample;
use crate::domain::complaint::NUM_CATEGORIES;

// ─── ComplaintBatch ───────────────────────────────────────────────────────────
/// A batch of samples ready for the model forward pass.
/// All tensors have batch_size as their first dimension.
///
/// B is the Burn Backend (e.g. Wgpu, NdArray) —
/// generic so the same batcher works on any device.
#[derive(Debug, Clone)]
pub struct ComplaintBatch<B: Backend> {
    /// Token ID sequences — shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Attention masks — shape: [batch_size, seq_len]
    /// 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// Multi-hot ground truth — shape: [batch_size, num_labels]
    /// Float so it can feed the sigmoid-based loss directly
    pub targets: Tensor<B, 2>,
}

// ─── ComplaintBatcher ─────────────────────────────────────────────────────────
/// The batcher struct — holds the target device so tensors
/// are created on the correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ComplaintBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ComplaintBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

// The DataLoader calls .batch(items) with each mini-batch of samples.
impl<B: Backend> Batcher<B, ComplaintSample, ComplaintBatch<B>> for ComplaintBatcher<B> {
    fn batch(&self, items: Vec<ComplaintSample>, _device: &B::Device) -> ComplaintBatch<B> {
        let batch_size = items.len();
        // All sequences have the same length (pre-padded)
        let seq_len    = items[0].input_ids.len();

        // Flatten Vec<Vec<u32>> to Vec<i32> (Burn uses i32 for Int tensors)
        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();

        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.targets.iter().copied())
            .collect();

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            input_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask_flat.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1>::from_floats(
            target_flat.as_slice(), &self.device
        ).reshape([batch_size, NUM_CATEGORIES]);

        ComplaintBatch {
            input_ids,
            attention_mask,
            targets,
        }
    }
}
