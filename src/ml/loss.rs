// ============================================================
// Layer 5 — Class-Balanced Resampling Loss
// ============================================================
// Multi-label sigmoid focal loss with class-balanced (CB)
// reweighting from empirical class frequencies.
//
// Per logit/target pair:
//   bce     = BCE-with-logits(x, t)
//   pt      = exp(-bce)                 probability of the correct side
//   alpha_t = alpha for t=1, 1-alpha for t=0
//   focal   = alpha_t * (1 - pt)^gamma
//   w_c     = (1 - beta) / (1 - beta^n_c)
//
//   loss = loss_weight * mean(focal * w_c * bce)
//
// w_c is the reciprocal of the effective number of samples
// for class c. Class frequencies are floored at 1 before the
// exponentiation, so a class with zero observed positives gets
// the maximal finite weight 1.0 instead of a division by zero.
//
// Reference: Lin et al. (2017) Focal Loss for Dense Object Detection
//            Cui et al. (2019) Class-Balanced Loss Based on
//            Effective Number of Samples

use burn::{
    prelude::*,
    tensor::activation::log_sigmoid,
};

#[derive(Config, Debug)]
pub struct ResampleLossConfig {
    /// Empirical positive counts per class in the training set
    pub class_freq: Vec<usize>,

    /// Effective-number decay. Closer to 1 → stronger rebalancing
    #[config(default = 0.9)]
    pub cb_beta: f64,

    /// Focal balancing between positive and negative targets
    #[config(default = 0.5)]
    pub focal_alpha: f64,

    /// Focal focusing strength — down-weights easy pairs
    #[config(default = 2.0)]
    pub focal_gamma: f64,

    /// Global multiplier applied to the final scalar
    #[config(default = 10.0)]
    pub loss_weight: f64,
}

impl ResampleLossConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ResampleLoss<B> {
        let weights: Vec<f32> = self.class_freq
            .iter()
            .map(|&n| {
                // Floor at one observed instance — keeps the weight
                // finite and deterministic for empty classes
                let n = n.max(1) as f64;
                ((1.0 - self.cb_beta) / (1.0 - self.cb_beta.powf(n))) as f32
            })
            .collect();

        ResampleLoss {
            class_weights: Tensor::<B, 1>::from_floats(weights.as_slice(), device),
            focal_alpha:   self.focal_alpha,
            focal_gamma:   self.focal_gamma,
            loss_weight:   self.loss_weight,
        }
    }
}

/// The initialised loss. Holds the per-class weight vector on the
/// target device so the forward pass is a handful of tensor ops.
#[derive(Debug, Clone)]
pub struct ResampleLoss<B: Backend> {
    class_weights: Tensor<B, 1>,
    focal_alpha:   f64,
    focal_gamma:   f64,
    loss_weight:   f64,
}

impl<B: Backend> ResampleLoss<B> {
    /// logits: [batch, num_labels], targets: [batch, num_labels] multi-hot.
    /// Returns the scalar loss. A shape mismatch between the two is a
    /// programming-contract violation and panics inside the tensor ops.
    pub fn forward(&self, logits: Tensor<B, 2>, targets: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch_size, num_labels] = logits.dims();
        let ones = targets.ones_like();

        // Numerically stable BCE-with-logits:
        //   bce = -(t*log σ(x) + (1-t)*log σ(-x))
        let bce = (targets.clone() * log_sigmoid(logits.clone())
            + (ones.clone() - targets.clone()) * log_sigmoid(logits.neg()))
            .neg();

        // pt = σ(x) for positives, σ(-x) for negatives
        let pt = bce.clone().neg().exp();

        let alpha_t = targets.clone() * self.focal_alpha
            + (ones.clone() - targets) * (1.0 - self.focal_alpha);
        let focal = alpha_t * (ones - pt).powf_scalar(self.focal_gamma as f32);

        // Broadcast the per-class CB weights over the batch
        let weights = self.class_weights
            .clone()
            .unsqueeze::<2>()
            .expand([batch_size, num_labels]);

        (focal * weights * bce).mean().mul_scalar(self.loss_weight)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn scalar(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    #[test]
    fn test_loss_is_non_negative() {
        let device = Default::default();
        let loss_fn = ResampleLossConfig::new(vec![10, 200, 3, 50])
            .init::<TestBackend>(&device);

        let logits = Tensor::<TestBackend, 1>::from_floats(
            [1.5, -2.0, 0.0, 3.0, -0.5, 0.25, -4.0, 2.0].as_slice(), &device,
        ).reshape([2, 4]);
        let targets = Tensor::<TestBackend, 1>::from_floats(
            [1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0].as_slice(), &device,
        ).reshape([2, 4]);

        assert!(scalar(loss_fn.forward(logits, targets)) >= 0.0);
    }

    #[test]
    fn test_zero_frequency_class_is_floored() {
        // freq 0 must behave exactly like freq 1:
        // w = (1 - 0.9) / (1 - 0.9^1) = 1.0, no singularity
        let device = Default::default();
        let zero = ResampleLossConfig::new(vec![0]).init::<TestBackend>(&device);
        let one  = ResampleLossConfig::new(vec![1]).init::<TestBackend>(&device);

        let logits  = Tensor::<TestBackend, 1>::from_floats([0.7].as_slice(), &device)
            .reshape([1, 1]);
        let targets = Tensor::<TestBackend, 1>::from_floats([1.0].as_slice(), &device)
            .reshape([1, 1]);

        let a = scalar(zero.forward(logits.clone(), targets.clone()));
        let b = scalar(one.forward(logits, targets));
        assert!(a.is_finite());
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_known_value_at_zero_logit() {
        // x = 0, t = 1: bce = ln 2, pt = 0.5,
        // focal = 0.5 * 0.5^2 = 0.125, w = 1.0 (freq 1)
        // loss = loss_weight * 0.125 * ln 2
        let device = Default::default();
        let loss_fn = ResampleLossConfig::new(vec![1])
            .with_loss_weight(1.0)
            .init::<TestBackend>(&device);

        let logits  = Tensor::<TestBackend, 1>::from_floats([0.0].as_slice(), &device)
            .reshape([1, 1]);
        let targets = Tensor::<TestBackend, 1>::from_floats([1.0].as_slice(), &device)
            .reshape([1, 1]);

        let expected = 0.125 * std::f64::consts::LN_2;
        let got = scalar(loss_fn.forward(logits, targets));
        assert!((got - expected).abs() < 1e-5, "got {got}, expected {expected}");
    }

    #[test]
    fn test_rare_class_weighs_more_than_frequent() {
        // Same logits/targets, but the error sits in a rare class
        // in one call and a frequent class in the other.
        let device = Default::default();
        let loss_fn = ResampleLossConfig::new(vec![4, 13745])
            .with_loss_weight(1.0)
            .init::<TestBackend>(&device);

        let rare_miss = Tensor::<TestBackend, 1>::from_floats(
            [-2.0, 2.0].as_slice(), &device,
        ).reshape([1, 2]);
        let freq_miss = Tensor::<TestBackend, 1>::from_floats(
            [2.0, -2.0].as_slice(), &device,
        ).reshape([1, 2]);
        let targets = Tensor::<TestBackend, 1>::from_floats(
            [1.0, 1.0].as_slice(), &device,
        ).reshape([1, 2]);

        let rare = scalar(loss_fn.forward(rare_miss, targets.clone()));
        let freq = scalar(loss_fn.forward(freq_miss, targets));
        assert!(rare > freq);
    }
}
