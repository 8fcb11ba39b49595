// ============================================================
// Layer 2 — Run Configuration
// ============================================================
// A training/test run is described by two inputs:
//
//   1. A YAML config file with the hyperparameters and paths
//      (parsed with serde_yaml)
//   2. A scale selector (`large` / `small`) choosing between
//      the two dataset profiles
//
// The scale profile fixes the class-frequency table — the
// empirical positive counts per category in each training set —
// the dataset subdirectory, and the checkpoint file name.
// Class frequencies feed the resampling loss and are immutable
// during training.
//
// Reference: Rust Book §12 (Reading configuration)

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::complaint::NUM_CATEGORIES;
use crate::ml::model::ComplaintModelConfig;

// ─── Scale profiles ───────────────────────────────────────────────────────────
/// Which dataset profile to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Large,
    Small,
}

impl Scale {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Scale::Large => "large",
            Scale::Small => "small",
        }
    }

    /// Empirical positive counts per category in the profile's
    /// training set, in label-index order.
    pub fn class_freq(&self) -> [usize; NUM_CATEGORIES] {
        match self {
            Scale::Large => [53262, 204846, 10478, 164656, 218, 5246, 230499, 188900],
            Scale::Small => [3839, 12747, 745, 9243, 4, 163, 13745, 12088],
        }
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

// ─── Run configuration ────────────────────────────────────────────────────────
// All hyperparameters for a run. Serialisable so the resolved
// config can be saved next to the checkpoint and reloaded for
// test-time reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Experiment name — becomes a path component under model_save_dir
    pub modelname: String,

    /// Number of output categories (= the fixed vocabulary size, 8)
    pub num_labels: usize,

    /// Hidden width of the classifier MLP between the pooled
    /// convolution features and the logits
    pub mlp_size: usize,

    /// Token sequence length after padding/truncation
    pub max_length: usize,

    pub batch_size: usize,
    pub num_epochs: usize,
    pub learning_rate: f64,

    /// Optimizer updates spent warming the learning rate up
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: usize,

    /// Root directory for checkpoints and the metrics CSV
    pub model_save_dir: String,

    /// Directory holding tokenizer.json and (optionally) a
    /// pretrained encoder record to warm-start from
    pub pretrained_dir: String,

    /// Root directory of the datasets; the scale profile picks
    /// the subdirectory
    pub data_dir: String,

    // ── Encoder architecture ──────────────────────────────────────────────────
    #[serde(default = "default_d_model")]
    pub d_model: usize,
    #[serde(default = "default_num_heads")]
    pub num_heads: usize,
    #[serde(default = "default_num_layers")]
    pub num_layers: usize,
    #[serde(default = "default_d_ff")]
    pub d_ff: usize,
    #[serde(default = "default_dropout")]
    pub dropout: f64,
    #[serde(default = "default_conv_channels")]
    pub conv_channels: usize,
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,

    // ── Filled in by the scale profile, not the YAML ──────────────────────────
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub class_freq: Vec<usize>,
    #[serde(default)]
    pub train_csv: String,
    #[serde(default)]
    pub val_csv: String,
    #[serde(default)]
    pub test_csv: String,
}

fn default_warmup_steps() -> usize { 100 }
fn default_d_model() -> usize { 512 }
fn default_num_heads() -> usize { 8 }
fn default_num_layers() -> usize { 6 }
fn default_d_ff() -> usize { 2048 }
fn default_dropout() -> f64 { 0.1 }
fn default_conv_channels() -> usize { 256 }
// bert-base-chinese vocabulary size
fn default_vocab_size() -> usize { 21128 }

impl RunConfig {
    /// Read the YAML file and resolve the scale profile into it.
    pub fn load(path: &str, scale: Scale) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file '{path}'"))?;

        let mut cfg: RunConfig = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Cannot parse config file '{path}'"))?;

        cfg.apply_scale(scale);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_scale(&mut self, scale: Scale) {
        self.scale = scale;
        self.class_freq = scale.class_freq().to_vec();

        let split_dir = Path::new(&self.data_dir).join(scale.dir_name());
        let fill = |slot: &mut String, file: &str| {
            if slot.is_empty() {
                *slot = split_dir.join(file).to_string_lossy().into_owned();
            }
        };
        fill(&mut self.train_csv, "trainset.csv");
        fill(&mut self.val_csv, "valset.csv");
        fill(&mut self.test_csv, "testset.csv");
    }

    fn validate(&self) -> Result<()> {
        if self.num_labels != NUM_CATEGORIES {
            bail!(
                "num_labels is {} but the category vocabulary has {} entries",
                self.num_labels, NUM_CATEGORIES,
            );
        }
        if self.class_freq.len() != self.num_labels {
            bail!(
                "class_freq has {} entries, expected {}",
                self.class_freq.len(), self.num_labels,
            );
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_length < 2 {
            // The bigram convolution needs at least two positions
            bail!("max_length must be at least 2");
        }
        Ok(())
    }

    /// Checkpoint directory for this run:
    /// {model_save_dir}/{modelname}/{batch_size}
    pub fn checkpoint_dir(&self) -> PathBuf {
        Path::new(&self.model_save_dir)
            .join(&self.modelname)
            .join(self.batch_size.to_string())
    }

    /// The model architecture this config describes.
    pub fn model_config(&self) -> ComplaintModelConfig {
        ComplaintModelConfig::new(
            self.vocab_size,
            self.max_length,
            self.d_model,
            self.num_heads,
            self.num_layers,
            self.d_ff,
            self.dropout,
            self.conv_channels,
            self.mlp_size,
            self.num_labels,
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "\
modelname: encoder_cnn_kernel_1_2
num_labels: 8
mlp_size: 256
max_length: 128
batch_size: 32
num_epochs: 10
learning_rate: 2.0e-5
model_save_dir: runs
pretrained_dir: pretrained/chinese-encoder
data_dir: data
";

    fn parse(scale: Scale) -> RunConfig {
        let mut cfg: RunConfig = serde_yaml::from_str(YAML).unwrap();
        cfg.apply_scale(scale);
        cfg.validate().unwrap();
        cfg
    }

    #[test]
    fn test_scale_fills_class_freq_and_paths() {
        let cfg = parse(Scale::Small);
        assert_eq!(cfg.class_freq, vec![3839, 12747, 745, 9243, 4, 163, 13745, 12088]);
        assert_eq!(cfg.train_csv, "data/small/trainset.csv");
        assert_eq!(cfg.test_csv, "data/small/testset.csv");
    }

    #[test]
    fn test_large_profile() {
        let cfg = parse(Scale::Large);
        assert_eq!(cfg.class_freq[4], 218);
        assert_eq!(cfg.val_csv, "data/large/valset.csv");
    }

    #[test]
    fn test_defaults_are_applied() {
        let cfg = parse(Scale::Large);
        assert_eq!(cfg.warmup_steps, 100);
        assert_eq!(cfg.d_model, 512);
        assert_eq!(cfg.conv_channels, 256);
        assert_eq!(cfg.vocab_size, 21128);
    }

    #[test]
    fn test_checkpoint_dir_layout() {
        let cfg = parse(Scale::Large);
        assert_eq!(
            cfg.checkpoint_dir(),
            PathBuf::from("runs/encoder_cnn_kernel_1_2/32"),
        );
    }

    #[test]
    fn test_wrong_num_labels_is_rejected() {
        let yaml = YAML.replace("num_labels: 8", "num_labels: 5");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).unwrap();
        cfg.apply_scale(Scale::Small);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_explicit_paths_are_kept() {
        let yaml = format!("{YAML}train_csv: elsewhere/train.csv\n");
        let mut cfg: RunConfig = serde_yaml::from_str(&yaml).unwrap();
        cfg.apply_scale(Scale::Large);
        assert_eq!(cfg.train_csv, "elsewhere/train.csv");
        assert_eq!(cfg.val_csv, "data/large/valset.csv");
    }
}
