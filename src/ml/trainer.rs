// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and AdamW.
//
// Key Burn 0.20 insight:
//   - Training uses MyBackend (Autodiff<Wgpu>) for gradients
//   - model.valid() returns model on MyInnerBackend (Wgpu)
//   - Validation batcher must also use MyInnerBackend
//   - AdamW takes the learning rate on every step, which is
//     where the warm-up/decay schedule plugs in
//
// Per epoch:
//   1. forward / loss / backward / AdamW step per batch,
//      learning rate from the LinearDecaySchedule
//   2. validation pass over the held-out set
//   3. append a metrics.csv row
//   4. persist the checkpoint when macro-F1 improves
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
};

use crate::application::config::RunConfig;
use crate::data::{batcher::ComplaintBatcher, dataset::ComplaintDataset};
use crate::infra::checkpoint::{load_pretrained_encoder, CheckpointManager};
use crate::infra::metrics::{EpochMetrics, MetricsLogger, RunningLoss};
use crate::ml::evaluator::evaluate;
use crate::ml::loss::ResampleLossConfig;
use crate::ml::model::ComplaintModel;
use crate::ml::schedule::LinearDecaySchedule;

type MyBackend      = burn::backend::Autodiff<burn::backend::Wgpu>;
type MyInnerBackend = burn::backend::Wgpu;

/// Dataloader shuffle seed, fixed so reruns see the same batch order.
const SHUFFLE_SEED: u64 = 10;

// ─── Best-macro-F1 tracker ────────────────────────────────────────────────────
/// Decides when the model is worth persisting: the first observed
/// epoch always is, later epochs only on strict improvement.
#[derive(Debug, Default)]
pub struct BestMacroTracker {
    best: Option<f64>,
}

impl BestMacroTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an epoch's macro-F1. Returns true when it should be saved.
    pub fn observe(&mut self, macro_f1: f64) -> bool {
        match self.best {
            Some(best) if macro_f1 <= best => false,
            _ => {
                self.best = Some(macro_f1);
                true
            }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

// ─── Training entry point ─────────────────────────────────────────────────────
pub fn run_training(
    cfg:           &RunConfig,
    train_dataset: ComplaintDataset,
    val_dataset:   ComplaintDataset,
    ckpt_manager:  CheckpointManager,
    logger:        MetricsLogger,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop(cfg, train_dataset, val_dataset, ckpt_manager, logger, device)
}

fn train_loop(
    cfg:           &RunConfig,
    train_dataset: ComplaintDataset,
    val_dataset:   ComplaintDataset,
    ckpt_manager:  CheckpointManager,
    logger:        MetricsLogger,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<()> {

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = cfg.model_config();
    let mut model: ComplaintModel<MyBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} layers, d_model={}, conv_channels={}",
        cfg.num_layers, cfg.d_model, cfg.conv_channels,
    );

    // ── Warm-start the encoder from the pretrained directory ──────────────────
    // The classification head always starts from random init; only the
    // encoder weights are transferable.
    match load_pretrained_encoder::<MyBackend>(&cfg.pretrained_dir, model.encoder.clone(), &device)? {
        Some(encoder) => {
            tracing::info!("Loaded pretrained encoder from '{}'", cfg.pretrained_dir);
            model.encoder = encoder;
        }
        None => {
            tracing::warn!(
                "No pretrained encoder record under '{}' — training from random init",
                cfg.pretrained_dir,
            );
        }
    }

    // ── AdamW optimiser + warm-up/decay schedule ──────────────────────────────
    let optim_cfg = AdamWConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // Total update count follows the fine-tuning recipe:
    // epochs × (samples / batch_size), partial final batches excluded
    let num_training_steps =
        cfg.num_epochs * (train_dataset.sample_count() / cfg.batch_size);
    let mut schedule = LinearDecaySchedule::new(
        cfg.learning_rate,
        cfg.warmup_steps,
        num_training_steps,
    );

    // ── Loss on both backends ─────────────────────────────────────────────────
    let loss_cfg = ResampleLossConfig::new(cfg.class_freq.clone());
    let train_loss_fn = loss_cfg.init::<MyBackend>(&device);
    let val_loss_fn   = loss_cfg.init::<MyInnerBackend>(&device);

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = ComplaintBatcher::<MyBackend>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(SHUFFLE_SEED)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let val_batcher = ComplaintBatcher::<MyInnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let mut tracker = BestMacroTracker::new();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.num_epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss = RunningLoss::new();

        for batch in train_loader.iter() {
            let batch_size = batch.targets.dims()[0];

            let logits = model.forward(batch.input_ids, batch.attention_mask);
            let loss = train_loss_fn.forward(logits, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss.add(loss_val, batch_size);

            // Backward pass + AdamW update at the scheduled rate
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(schedule.next_lr(), model, grads);
        }

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → ComplaintModel<MyInnerBackend>
        // dropout disabled for deterministic evaluation
        let model_valid = model.valid();
        let eval = evaluate(&model_valid, val_loader.iter(), &val_loss_fn)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | micro_f1={:.4} | macro_f1={:.4} | hamming={:.4}",
            epoch + 1, cfg.num_epochs,
            train_loss.mean(), eval.loss,
            eval.metrics.micro_f1, eval.metrics.macro_f1, eval.metrics.hamming_loss,
        );

        logger.log(&EpochMetrics::new(
            epoch,
            train_loss.mean(),
            eval.loss,
            eval.metrics,
        ))?;

        // ── Checkpoint on strict macro-F1 improvement ─────────────────────────
        if tracker.observe(eval.metrics.macro_f1) {
            ckpt_manager.save_best(&model, epoch, eval.metrics.macro_f1)?;
            tracing::info!(
                "New best macro_f1={:.4} at epoch {} — checkpoint saved",
                eval.metrics.macro_f1, epoch,
            );
        }
    }

    tracing::info!(
        "Training complete. Best macro_f1: {:?}",
        tracker.best(),
    );
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_epoch_always_saves() {
        let mut t = BestMacroTracker::new();
        assert!(t.observe(0.0));
    }

    #[test]
    fn test_saves_only_on_strict_improvement() {
        // Macro-F1 sequence [0.5, 0.6, 0.55, 0.7] → saves at epochs 0, 1, 3
        let mut t = BestMacroTracker::new();
        let decisions: Vec<bool> = [0.5, 0.6, 0.55, 0.7]
            .iter()
            .map(|&m| t.observe(m))
            .collect();
        assert_eq!(decisions, vec![true, true, false, true]);
        assert_eq!(t.best(), Some(0.7));
    }

    #[test]
    fn test_equal_score_does_not_save() {
        let mut t = BestMacroTracker::new();
        assert!(t.observe(0.42));
        assert!(!t.observe(0.42));
    }
}
