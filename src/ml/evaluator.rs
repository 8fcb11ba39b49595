// ============================================================
// Layer 5 — Evaluation Loop
// ============================================================
// Runs inference over a dataloader without gradient tracking:
//
//   forward → sigmoid → move scores to host memory
//   collect all batches → one flat list of score vectors
//   threshold at 0.5 → boolean predictions
//   ground truth → boolean via equality to 1
//   compute the six-metric summary + mean loss
//
// Used identically for per-epoch validation and for test-time
// reporting — the caller only swaps the dataloader.
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    prelude::*,
    tensor::activation::sigmoid,
};

use crate::data::batcher::ComplaintBatch;
use crate::infra::metrics::{compute_metrics, MultiLabelMetrics, RunningLoss};
use crate::ml::loss::ResampleLoss;
use crate::ml::model::ComplaintModel;

/// Decision threshold on sigmoid probabilities.
/// Strictly-greater, so a score of exactly 0.5 predicts negative.
pub const THRESHOLD: f32 = 0.5;

/// Everything the caller needs from one evaluation pass.
pub struct EvalOutput {
    /// Mean loss per evaluated sample
    pub loss: f64,

    /// The six-value metric summary
    pub metrics: MultiLabelMetrics,

    /// Thresholded predictions, one row per example
    pub predictions: Vec<Vec<bool>>,

    /// Boolean ground truth, one row per example
    pub truths: Vec<Vec<bool>>,
}

/// Threshold raw sigmoid scores into boolean predictions.
/// Monotonic in each score: raising a score can only flip 0 → 1.
pub fn threshold_scores(scores: &[Vec<f32>]) -> Vec<Vec<bool>> {
    scores.iter()
        .map(|row| row.iter().map(|&s| s > THRESHOLD).collect())
        .collect()
}

/// Evaluate a model over a stream of batches.
///
/// The caller is responsible for passing a model on a non-autodiff
/// backend (`model.valid()` during training) — this function never
/// calls backward.
pub fn evaluate<B: Backend>(
    model:   &ComplaintModel<B>,
    batches: impl Iterator<Item = ComplaintBatch<B>>,
    loss_fn: &ResampleLoss<B>,
) -> Result<EvalOutput> {
    let mut running_loss = RunningLoss::new();
    let mut scores: Vec<Vec<f32>> = Vec::new();
    let mut truth_rows: Vec<Vec<f32>> = Vec::new();

    for batch in batches {
        let [batch_size, num_labels] = batch.targets.dims();

        let logits = model.forward(batch.input_ids, batch.attention_mask);
        let loss: f64 = loss_fn
            .forward(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        running_loss.add(loss, batch_size);

        // sigmoid → host memory, then split the flat buffer back
        // into per-example score vectors
        let probs: Vec<f32> = sigmoid(logits)
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read scores from device: {e:?}"))?;
        let labels: Vec<f32> = batch.targets
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read targets from device: {e:?}"))?;

        for row in 0..batch_size {
            let start = row * num_labels;
            scores.push(probs[start..start + num_labels].to_vec());
            truth_rows.push(labels[start..start + num_labels].to_vec());
        }
    }

    let predictions = threshold_scores(&scores);
    let truths: Vec<Vec<bool>> = truth_rows.iter()
        .map(|row| row.iter().map(|&t| t == 1.0).collect())
        .collect();

    let metrics = compute_metrics(&truths, &predictions);

    Ok(EvalOutput {
        loss: running_loss.mean(),
        metrics,
        predictions,
        truths,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_strictly_greater() {
        let preds = threshold_scores(&[vec![0.5, 0.500001, 0.499999, 1.0, 0.0]]);
        assert_eq!(preds[0], vec![false, true, false, true, false]);
    }

    #[test]
    fn test_threshold_is_monotonic() {
        // Raising one score can flip a prediction 0 → 1, never 1 → 0
        let low  = threshold_scores(&[vec![0.3, 0.6, 0.5]]);
        let high = threshold_scores(&[vec![0.7, 0.9, 0.51]]);
        for (l, h) in low[0].iter().zip(&high[0]) {
            assert!(!l | h, "prediction flipped 1 → 0 when scores increased");
        }
    }
}
