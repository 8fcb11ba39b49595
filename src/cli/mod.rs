// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train` — fine-tunes the classifier and keeps the
//                best-macro-F1 checkpoint
//   2. `test`  — loads that checkpoint and reports metrics
//                on the held-out test set
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

// Declare the commands submodule
pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, RunArgs};

use crate::application::config::RunConfig;

/// The main CLI struct — clap reads the fields and generates
/// argument parsing code automatically via the Parser derive macro.
#[derive(Parser, Debug)]
#[command(
    name = "complaint-classifier",
    version = "0.1.0",
    about = "Fine-tune and evaluate a multi-label tourism-complaint classifier."
)]
pub struct Cli {
    /// The subcommand to run (train or test)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    /// This keeps the CLI layer thin — it only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => Self::run_train(args),
            Commands::Test(args)  => Self::run_test(args),
        }
    }

    /// Handles the `train` subcommand.
    fn run_train(args: RunArgs) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let config = RunConfig::load(&args.config, args.scale)?;
        tracing::info!(
            "Starting training: scale={}, train set '{}'",
            config.scale, config.train_csv,
        );

        let use_case = TrainUseCase::new(config);
        use_case.execute()?;

        println!("Training complete. Best checkpoint saved.");
        Ok(())
    }

    /// Handles the `test` subcommand.
    fn run_test(args: RunArgs) -> Result<()> {
        use crate::application::test_use_case::TestUseCase;

        let config = RunConfig::load(&args.config, args.scale)?;
        tracing::info!(
            "Evaluating best checkpoint on '{}'",
            config.test_csv,
        );

        let use_case = TestUseCase::new(config);
        use_case.execute()
    }
}
