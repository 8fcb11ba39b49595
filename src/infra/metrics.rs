// ============================================================
// Layer 6 — Multi-Label Metrics
// ============================================================
// Metric computation over flattened boolean prediction/truth
// arrays, plus the per-epoch CSV logger.
//
// All aggregate metrics follow scikit-learn's conventions so
// results line up with reports produced by the usual Python
// evaluation stack:
//   - per-class F1 = 2·TP / (2·TP + FP + FN), 0 when the
//     denominator is 0 (zero-division convention)
//   - micro aggregates TP/FP/FN across classes first
//   - macro is the unweighted mean of per-class F1
//   - weighted averages per-class scores by class support
//   - accuracy is ELEMENT-WISE over the flattened arrays, not
//     per-sample exact match; it always equals 1 − hamming_loss
//   - Jaccard per class = TP / (TP + FP + FN), same zero rule
//
// A sample with zero set bits (no matching category) is valid
// input everywhere in this module.
//
// Metrics recorded per epoch in metrics.csv:
//   epoch, train_loss, val_loss, micro_f1, macro_f1,
//   weighted_f1, accuracy, jaccard, hamming_loss
//
// Reference: scikit-learn model_evaluation docs
//            Rust Book §9 (Error Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

// ─── Per-class counts ─────────────────────────────────────────────────────────
/// Confusion counts for one class column.
#[derive(Debug, Clone, Copy, Default)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl ClassCounts {
    /// Number of true instances of this class
    fn support(&self) -> usize {
        self.tp + self.fn_
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        ratio(2 * self.tp, 2 * self.tp + self.fp + self.fn_)
    }

    fn jaccard(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp + self.fn_)
    }
}

/// 0-denominator → 0.0, matching scikit-learn's zero_division default.
fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn count_classes(truths: &[Vec<bool>], preds: &[Vec<bool>]) -> Vec<ClassCounts> {
    assert_eq!(truths.len(), preds.len(), "prediction/truth length mismatch");
    let num_labels = truths.first().map_or(0, Vec::len);
    let mut counts = vec![ClassCounts::default(); num_labels];

    for (t_row, p_row) in truths.iter().zip(preds) {
        assert_eq!(t_row.len(), num_labels, "ragged truth row");
        assert_eq!(p_row.len(), num_labels, "ragged prediction row");
        for c in 0..num_labels {
            match (t_row[c], p_row[c]) {
                (true, true)  => counts[c].tp += 1,
                (false, true) => counts[c].fp += 1,
                (true, false) => counts[c].fn_ += 1,
                (false, false) => {}
            }
        }
    }
    counts
}

// ─── Aggregate metrics ────────────────────────────────────────────────────────
/// The six-value evaluation summary of one epoch or test run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MultiLabelMetrics {
    pub micro_f1:         f64,
    pub macro_f1:         f64,
    pub weighted_f1:      f64,
    pub accuracy:         f64,
    pub weighted_jaccard: f64,
    pub hamming_loss:     f64,
}

/// Compute the full metric summary from boolean truth/prediction rows.
pub fn compute_metrics(truths: &[Vec<bool>], preds: &[Vec<bool>]) -> MultiLabelMetrics {
    let counts = count_classes(truths, preds);

    let tp: usize = counts.iter().map(|c| c.tp).sum();
    let fp: usize = counts.iter().map(|c| c.fp).sum();
    let fn_: usize = counts.iter().map(|c| c.fn_).sum();
    let micro_f1 = ratio(2 * tp, 2 * tp + fp + fn_);

    let macro_f1 = if counts.is_empty() {
        0.0
    } else {
        counts.iter().map(ClassCounts::f1).sum::<f64>() / counts.len() as f64
    };

    let total_support: usize = counts.iter().map(ClassCounts::support).sum();
    let weighted = |score: fn(&ClassCounts) -> f64| -> f64 {
        if total_support == 0 {
            return 0.0;
        }
        counts.iter()
            .map(|c| c.support() as f64 * score(c))
            .sum::<f64>() / total_support as f64
    };
    let weighted_f1      = weighted(ClassCounts::f1);
    let weighted_jaccard = weighted(ClassCounts::jaccard);

    // Element-wise counts over the flattened arrays
    let total_elems = truths.len() * truths.first().map_or(0, Vec::len);
    let wrong: usize = truths.iter().zip(preds)
        .map(|(t, p)| t.iter().zip(p).filter(|(a, b)| a != b).count())
        .sum();
    let hamming_loss = ratio(wrong, total_elems);
    let accuracy     = 1.0 - hamming_loss;

    MultiLabelMetrics {
        micro_f1,
        macro_f1,
        weighted_f1,
        accuracy,
        weighted_jaccard,
        hamming_loss,
    }
}

/// Support-weighted Jaccard index on its own, for subset diagnostics.
pub fn weighted_jaccard(truths: &[Vec<bool>], preds: &[Vec<bool>]) -> f64 {
    let counts = count_classes(truths, preds);
    let total_support: usize = counts.iter().map(ClassCounts::support).sum();
    if total_support == 0 {
        return 0.0;
    }
    counts.iter()
        .map(|c| c.support() as f64 * c.jaccard())
        .sum::<f64>() / total_support as f64
}

/// Samples-averaged Jaccard: per-sample |t ∩ p| / |t ∪ p|, averaged.
/// An empty union contributes 0 (zero-division convention).
pub fn samples_jaccard(truths: &[Vec<bool>], preds: &[Vec<bool>]) -> f64 {
    assert_eq!(truths.len(), preds.len(), "prediction/truth length mismatch");
    if truths.is_empty() {
        return 0.0;
    }
    let sum: f64 = truths.iter().zip(preds)
        .map(|(t, p)| {
            let inter = t.iter().zip(p).filter(|(a, b)| **a && **b).count();
            let union = t.iter().zip(p).filter(|(a, b)| **a || **b).count();
            ratio(inter, union)
        })
        .sum();
    sum / truths.len() as f64
}

// ─── Per-class report ─────────────────────────────────────────────────────────
/// One row of the diagnostic per-class table.
#[derive(Debug, Clone, Copy)]
pub struct ClassReport {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

/// Per-class precision/recall/F1/support, one entry per label column.
pub fn per_class_report(truths: &[Vec<bool>], preds: &[Vec<bool>]) -> Vec<ClassReport> {
    count_classes(truths, preds)
        .iter()
        .map(|c| ClassReport {
            precision: c.precision(),
            recall:    c.recall(),
            f1:        c.f1(),
            support:   c.support(),
        })
        .collect()
}

/// Split sample indices into (single-label, multi-label) by the number
/// of set bits in the ground truth. Zero-label samples count as single.
pub fn cardinality_split(truths: &[Vec<bool>]) -> (Vec<usize>, Vec<usize>) {
    let mut single = Vec::new();
    let mut multi = Vec::new();
    for (i, row) in truths.iter().enumerate() {
        if row.iter().filter(|&&b| b).count() > 1 {
            multi.push(i);
        } else {
            single.push(i);
        }
    }
    (single, multi)
}

// ─── Running loss ─────────────────────────────────────────────────────────────
/// Accumulates mean batch losses weighted by batch size, so the epoch
/// mean is invariant to how the samples were partitioned into batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunningLoss {
    sum:     f64,
    samples: usize,
}

impl RunningLoss {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch: `batch_mean` is the mean loss over the batch,
    /// `batch_size` its sample count.
    pub fn add(&mut self, batch_mean: f64, batch_size: usize) {
        self.sum += batch_mean * batch_size as f64;
        self.samples += batch_size;
    }

    /// Mean loss per sample over everything recorded so far.
    pub fn mean(&self) -> f64 {
        if self.samples == 0 {
            f64::NAN
        } else {
            self.sum / self.samples as f64
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }
}

// ─── Epoch metrics CSV logger ─────────────────────────────────────────────────
/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 0)
    pub epoch: usize,

    /// Mean resampling loss per training sample
    pub train_loss: f64,

    /// Mean resampling loss per validation sample
    pub val_loss: f64,

    /// The six-value validation summary
    pub metrics: MultiLabelMetrics,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, metrics: MultiLabelMetrics) -> Self {
        Self { epoch, train_loss, val_loss, metrics }
    }

    /// Returns true if this epoch improved over the previous best macro-F1
    pub fn is_improvement(&self, best_macro_f1: f64) -> bool {
        self.metrics.macro_f1 > best_macro_f1
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only for a fresh file — reruns append below it
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(
                f,
                "epoch,train_loss,val_loss,micro_f1,macro_f1,weighted_f1,accuracy,jaccard,hamming_loss"
            )?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.metrics.micro_f1,
            m.metrics.macro_f1,
            m.metrics.weighted_f1,
            m.metrics.accuracy,
            m.metrics.weighted_jaccard,
            m.metrics.hamming_loss,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: val_loss={:.4}, macro_f1={:.4}",
            m.epoch,
            m.val_loss,
            m.metrics.macro_f1,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    // The toy fixture used across the aggregate-metric tests.
    // Expected values were computed with scikit-learn's f1_score,
    // jaccard_score, hamming_loss on the same boolean arrays.
    fn toy() -> (Vec<Vec<bool>>, Vec<Vec<bool>>) {
        let t = [
            [1, 0, 1, 0, 0, 0, 0, 0],
            [0, 1, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0], // zero-label sample
            [1, 1, 0, 1, 0, 0, 0, 0],
        ];
        let p = [
            [1, 0, 0, 0, 0, 0, 0, 0],
            [0, 1, 1, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0],
            [1, 0, 0, 1, 0, 0, 0, 1],
        ];
        let to_bools = |rows: [[u8; 8]; 4]| {
            rows.iter()
                .map(|r| r.iter().map(|&x| x == 1).collect::<Vec<bool>>())
                .collect::<Vec<_>>()
        };
        (to_bools(t), to_bools(p))
    }

    #[test]
    fn test_matches_scikit_learn_values() {
        let (truths, preds) = toy();
        let m = compute_metrics(&truths, &preds);

        assert!((m.micro_f1 - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.macro_f1 - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.weighted_f1 - 13.0 / 18.0).abs() < 1e-12);
        assert!((m.weighted_jaccard - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.hamming_loss - 0.125).abs() < 1e-12);
        assert!((m.accuracy - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_hamming_is_one_minus_accuracy() {
        let (truths, preds) = toy();
        let m = compute_metrics(&truths, &preds);
        assert!((m.hamming_loss - (1.0 - m.accuracy)).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_predictions() {
        let (truths, _) = toy();
        let m = compute_metrics(&truths, &truths);
        assert_eq!(m.micro_f1, 1.0);
        assert_eq!(m.hamming_loss, 0.0);
        assert_eq!(m.accuracy, 1.0);
        // Classes with zero support score 0 under the zero-division
        // convention, so macro-F1 is 4/8, not 1.0
        assert!((m.macro_f1 - 0.5).abs() < 1e-12);
        assert_eq!(m.weighted_f1, 1.0);
    }

    #[test]
    fn test_all_zero_rows_are_valid() {
        let truths = vec![vec![false; 8]; 3];
        let preds  = vec![vec![false; 8]; 3];
        let m = compute_metrics(&truths, &preds);
        assert_eq!(m.micro_f1, 0.0);
        assert_eq!(m.hamming_loss, 0.0);
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.weighted_f1, 0.0);
    }

    #[test]
    fn test_samples_jaccard() {
        let (truths, preds) = toy();
        // Per sample: 1/2, 1/2, 0 (empty union), 2/4
        let expected = (0.5 + 0.5 + 0.0 + 0.5) / 4.0;
        assert!((samples_jaccard(&truths, &preds) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_per_class_report() {
        let (truths, preds) = toy();
        let report = per_class_report(&truths, &preds);
        assert_eq!(report.len(), 8);
        // Class 0: both positives hit exactly
        assert_eq!(report[0].precision, 1.0);
        assert_eq!(report[0].recall, 1.0);
        assert_eq!(report[0].support, 2);
        // Class 1: one of two positives found
        assert!((report[1].f1 - 2.0 / 3.0).abs() < 1e-12);
        // Class 7: false positive only
        assert_eq!(report[7].f1, 0.0);
        assert_eq!(report[7].support, 0);
    }

    #[test]
    fn test_cardinality_split() {
        let (truths, _) = toy();
        let (single, multi) = cardinality_split(&truths);
        // Samples 1 and 2 (incl. the zero-label one) are "single",
        // samples 0 and 3 carry more than one label
        assert_eq!(single, vec![1, 2]);
        assert_eq!(multi, vec![0, 3]);
    }

    #[test]
    fn test_running_loss_is_partition_invariant() {
        // One batch of 68 vs 32 + 32 + 4 with the same per-sample losses
        let mut whole = RunningLoss::new();
        whole.add(0.37, 68);

        let mut split = RunningLoss::new();
        split.add(0.25, 32);
        split.add(0.55, 32);
        // Mean of the remainder chosen so the totals agree:
        // 0.37*68 = 0.25*32 + 0.55*32 + x*4 → x = 0.89
        split.add(0.89, 4);

        assert!((whole.mean() - split.mean()).abs() < 1e-9);
        assert_eq!(whole.sample_count(), split.sample_count());
    }

    #[test]
    fn test_running_loss_empty_is_nan() {
        assert!(RunningLoss::new().mean().is_nan());
    }

    #[test]
    fn test_is_improvement() {
        let summary = MultiLabelMetrics {
            micro_f1: 0.5, macro_f1: 0.6, weighted_f1: 0.5,
            accuracy: 0.9, weighted_jaccard: 0.4, hamming_loss: 0.1,
        };
        let m = EpochMetrics::new(2, 2.5, 2.3, summary);
        assert!(m.is_improvement(0.55));
        assert!(!m.is_improvement(0.6));
    }
}
