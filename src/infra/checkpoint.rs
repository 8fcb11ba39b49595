// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder.
//
// What gets saved per run:
//   1. best_macro_model_{scale}.mpk.gz — weights of the best
//      epoch so far, overwritten in place on improvement
//   2. best_checkpoint.json            — {epoch, macro_f1} of
//      that checkpoint
//   3. train_config.json               — the resolved run config
//
// Why save the config separately?
//   When loading for test-time reporting, we need the exact
//   model architecture (d_model, num_layers, etc.) to rebuild
//   the model before loading the weights into it.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Compresses with gzip for smaller file size
//   - Type-safe: loading fails if architecture doesn't match
//
// Only the single best checkpoint is retained — earlier best
// epochs are lost by the overwrite.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};
use serde_json;

use crate::application::config::RunConfig;
use crate::ml::model::{ComplaintModel, TextEncoder};

/// Sidecar describing the persisted best checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestCheckpointInfo {
    pub epoch:    usize,
    pub macro_f1: f64,
}

/// Manages saving and loading of model checkpoints.
/// All files are stored in the configured directory; the tag
/// (the scale name) distinguishes large- and small-profile runs.
pub struct CheckpointManager {
    dir: PathBuf,
    tag: String,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        let dir = dir.into();
        fs::create_dir_all(&dir).ok();
        Self { dir, tag: tag.into() }
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("best_macro_model_{}", self.tag))
    }

    /// Persist the current best model together with its epoch index.
    /// Overwrites whatever best checkpoint came before it.
    pub fn save_best<B: AutodiffBackend>(
        &self,
        model:    &ComplaintModel<B>,
        epoch:    usize,
        macro_f1: f64,
    ) -> Result<()> {
        let path = self.weights_path();

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        let info = BestCheckpointInfo { epoch, macro_f1 };
        let info_path = self.dir.join("best_checkpoint.json");
        fs::write(&info_path, serde_json::to_string(&info)?)
            .with_context(|| "Failed to write best_checkpoint.json")?;

        tracing::debug!("Saved best checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the persisted best checkpoint into a freshly built model.
    ///
    /// The model parameter must have the architecture the checkpoint
    /// was trained with (see load_config) or loading will fail.
    pub fn load_best<B: Backend>(
        &self,
        model:  ComplaintModel<B>,
        device: &B::Device,
    ) -> Result<(ComplaintModel<B>, BestCheckpointInfo)> {
        let info = self.best_info()?;
        let path = self.weights_path();

        tracing::info!(
            "Loading best checkpoint (epoch {}, macro_f1={:.4})",
            info.epoch, info.macro_f1,
        );

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    path.display()
                )
            })?;

        Ok((model.load_record(record), info))
    }

    /// Save the resolved run configuration to JSON.
    ///
    /// This must be called before training starts so the test path
    /// can reconstruct the exact model architecture.
    pub fn save_config(&self, cfg: &RunConfig) -> Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| {
                format!("Cannot write config to '{}'", path.display())
            })?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// Load the training configuration from JSON.
    pub fn load_config(&self) -> Result<RunConfig> {
        let path = self.dir.join("train_config.json");

        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read config from '{}'. \
                     Make sure you have run 'train' before 'test'.",
                    path.display()
                )
            })?;

        Ok(serde_json::from_str(&json)?)
    }

    /// Read best_checkpoint.json. Errors if training hasn't run yet.
    fn best_info(&self) -> Result<BestCheckpointInfo> {
        let path = self.dir.join("best_checkpoint.json");

        let s = fs::read_to_string(&path)
            .with_context(|| {
                "Cannot find 'best_checkpoint.json'. Have you run 'train' first?"
            })?;

        Ok(serde_json::from_str(&s)?)
    }
}

// ─── Pretrained encoder warm-start ────────────────────────────────────────────
/// Load encoder weights from `{pretrained_dir}/encoder.mpk.gz` if the
/// record exists. Returns `Ok(None)` when it doesn't — the caller
/// decides whether random initialisation is acceptable.
pub fn load_pretrained_encoder<B: Backend>(
    pretrained_dir: &str,
    encoder:        TextEncoder<B>,
    device:         &B::Device,
) -> Result<Option<TextEncoder<B>>> {
    let path = Path::new(pretrained_dir).join("encoder");
    if !path.with_extension("mpk.gz").exists() {
        return Ok(None);
    }

    let record = CompactRecorder::new()
        .load(path.clone(), device)
        .with_context(|| {
            format!(
                "Pretrained encoder record '{}' exists but cannot be loaded \
                 (architecture mismatch?)",
                path.display()
            )
        })?;

    Ok(Some(encoder.load_record(record)))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pretrained_encoder_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let encoder = crate::ml::model::ComplaintModelConfig::new(
            16, 4, 8, 2, 1, 16, 0.0, 4, 8, 8,
        )
        .init_encoder::<burn::backend::NdArray>(&device);

        let loaded = load_pretrained_encoder(
            dir.path().to_str().unwrap(),
            encoder,
            &device,
        )
        .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_best_info_missing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = CheckpointManager::new(dir.path(), "small");
        assert!(mgr.load_config().is_err());
        assert!(mgr.best_info().is_err());
    }
}
