// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `test`
// and their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - the value parser for the scale selector
//
// Most hyperparameters live in the YAML config file — the CLI
// only picks the config and the dataset scale profile.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::config::Scale;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the complaint classifier on the selected scale
    Train(RunArgs),

    /// Evaluate the best checkpoint on the held-out test set
    Test(RunArgs),
}

/// Shared arguments for both subcommands.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yml")]
    pub config: String,

    /// Dataset scale profile — fixes the class-frequency table
    /// and the dataset subdirectory
    #[arg(long, value_enum)]
    pub scale: Scale,
}
