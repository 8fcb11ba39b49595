// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load pretrained tokenizer   (Layer 6 - infra)
//   Step 2: Load train/val CSVs         (Layer 4 - data)
//   Step 3: Encode samples              (Layer 4 - data)
//   Step 4: Build datasets              (Layer 4 - data)
//   Step 5: Save resolved config        (Layer 6 - infra)
//   Step 6: Run training loop           (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;

use crate::application::config::RunConfig;
use crate::data::{
    dataset::ComplaintDataset,
    encoder::SampleEncoder,
    loader::CsvLoader,
};
use crate::domain::traits::ComplaintSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::trainer::run_training;

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: RunConfig,
}

impl TrainUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: Load the pretrained tokenizer ─────────────────────────────
        let tok_store = TokenizerStore::new(&cfg.pretrained_dir);
        let tokenizer = tok_store.load()?;

        // ── Step 2: Load the labelled CSV splits ──────────────────────────────
        tracing::info!("Loading datasets for scale '{}'", cfg.scale);
        let train_complaints = CsvLoader::new(&cfg.train_csv).load_all()?;
        let val_complaints   = CsvLoader::new(&cfg.val_csv).load_all()?;

        // ── Step 3: Tokenise, pad, and multi-hot encode ───────────────────────
        let encoder = SampleEncoder::new(tokenizer, cfg.max_length);
        let train_samples = encoder.encode_all(&train_complaints)?;
        let val_samples   = encoder.encode_all(&val_complaints)?;
        tracing::info!(
            "Encoded {} train / {} validation samples",
            train_samples.len(),
            val_samples.len(),
        );

        // ── Step 4: Build Burn datasets ───────────────────────────────────────
        let train_dataset = ComplaintDataset::new(train_samples);
        let val_dataset   = ComplaintDataset::new(val_samples);

        // ── Step 5: Save the resolved config for the test path ────────────────
        let ckpt_dir     = self.config.checkpoint_dir();
        let ckpt_manager = CheckpointManager::new(&ckpt_dir, cfg.scale.dir_name());
        ckpt_manager.save_config(cfg)?;

        let logger = MetricsLogger::new(ckpt_dir.to_string_lossy().into_owned())?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, ckpt_manager, logger)?;

        Ok(())
    }
}
