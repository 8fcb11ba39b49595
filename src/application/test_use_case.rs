// ============================================================
// Layer 2 — TestUseCase
// ============================================================
// Test-time reporting against the held-out test set:
//
//   Step 1: Load the resolved train config  (Layer 6 - infra)
//   Step 2: Load pretrained tokenizer       (Layer 6 - infra)
//   Step 3: Load + encode the test CSV      (Layer 4 - data)
//   Step 4: Rebuild model, load best weights(Layer 5/6)
//   Step 5: Evaluate with the exact same
//           thresholding + metrics as
//           validation                      (Layer 5 - ml)
//   Step 6: Print aggregate and diagnostic
//           reports to stdout
//
// The diagnostic report splits samples by label cardinality:
// complaints with a single category (or none) behave very
// differently from multi-category ones under Jaccard, so both
// subsets are reported separately.

use anyhow::Result;
use burn::data::dataloader::DataLoaderBuilder;

use crate::application::config::RunConfig;
use crate::data::{
    batcher::ComplaintBatcher,
    dataset::ComplaintDataset,
    encoder::SampleEncoder,
    loader::CsvLoader,
};
use crate::domain::complaint::CATEGORIES;
use crate::domain::traits::ComplaintSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{self, per_class_report},
    tokenizer_store::TokenizerStore,
};
use crate::ml::evaluator::{evaluate, EvalOutput};
use crate::ml::loss::ResampleLossConfig;
use crate::ml::model::ComplaintModel;

type MyInnerBackend = burn::backend::Wgpu;

pub struct TestUseCase {
    config: RunConfig,
}

impl TestUseCase {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<()> {
        let cfg = &self.config;

        // ── Step 1: The architecture comes from the persisted train config ────
        // so the weights always load into the exact model they came from,
        // even if the YAML changed since the training run.
        let ckpt_manager = CheckpointManager::new(
            cfg.checkpoint_dir(),
            cfg.scale.dir_name(),
        );
        let train_cfg = ckpt_manager.load_config()?;

        // ── Step 2: Tokenizer — same vocabulary as the training run ───────────
        let tokenizer = TokenizerStore::new(&train_cfg.pretrained_dir).load()?;

        // ── Step 3: Load and encode the test split ────────────────────────────
        let complaints = CsvLoader::new(&cfg.test_csv).load_all()?;
        let encoder = SampleEncoder::new(tokenizer, train_cfg.max_length);
        let samples = encoder.encode_all(&complaints)?;
        let dataset = ComplaintDataset::new(samples);
        tracing::info!("Encoded {} test samples", dataset.sample_count());

        // ── Step 4: Rebuild the model and load the best checkpoint ────────────
        let device = burn::backend::wgpu::WgpuDevice::default();
        let model: ComplaintModel<MyInnerBackend> =
            train_cfg.model_config().init(&device);
        let (model, info) = ckpt_manager.load_best(model, &device)?;

        // ── Step 5: Evaluate — identical procedure to validation ──────────────
        let loss_fn = ResampleLossConfig::new(cfg.class_freq.clone())
            .init::<MyInnerBackend>(&device);
        let batcher = ComplaintBatcher::<MyInnerBackend>::new(device);
        let loader  = DataLoaderBuilder::new(batcher)
            .batch_size(cfg.batch_size)
            .num_workers(1)
            .build(dataset);

        let eval = evaluate(&model, loader.iter(), &loss_fn)?;

        // ── Step 6: Report ────────────────────────────────────────────────────
        println!(
            "TEST FOR {} (scale={}, batch_size={}, best epoch {})",
            train_cfg.modelname, cfg.scale, cfg.batch_size, info.epoch,
        );
        print_report(&eval);

        Ok(())
    }
}

/// Print the aggregate summary and the diagnostic breakdowns.
fn print_report(eval: &EvalOutput) {
    let m = &eval.metrics;
    println!(
        "Macro F1: {:.6}, Micro F1: {:.6}, weighted_f1: {:.6}, jaccard: {:.6}, \
         hamming loss: {:.6} and Accuracy: {:.6}",
        m.macro_f1, m.micro_f1, m.weighted_f1, m.weighted_jaccard,
        m.hamming_loss, m.accuracy,
    );
    println!("Test loss: {:.6}", eval.loss);
    println!();

    // Per-class table
    println!("{:<16} {:>9} {:>9} {:>9} {:>9}", "category", "precision", "recall", "f1", "support");
    let report = per_class_report(&eval.truths, &eval.predictions);
    for (name, row) in CATEGORIES.iter().zip(&report) {
        println!(
            "{:<16} {:>9.4} {:>9.4} {:>9.4} {:>9}",
            name, row.precision, row.recall, row.f1, row.support,
        );
    }
    println!();

    // Single-label vs multi-label subsets
    let (single_idx, multi_idx) = metrics::cardinality_split(&eval.truths);
    let select = |idx: &[usize], rows: &[Vec<bool>]| -> Vec<Vec<bool>> {
        idx.iter().map(|&i| rows[i].clone()).collect()
    };

    let single_true = select(&single_idx, &eval.truths);
    let single_pred = select(&single_idx, &eval.predictions);
    let multi_true  = select(&multi_idx, &eval.truths);
    let multi_pred  = select(&multi_idx, &eval.predictions);

    println!("Jacc Single label:          {:.6}", metrics::samples_jaccard(&single_true, &single_pred));
    println!("Jacc Multi label:           {:.6}", metrics::samples_jaccard(&multi_true, &multi_pred));
    println!("Jacc Weighted Single label: {:.6}", metrics::weighted_jaccard(&single_true, &single_pred));
    println!("Jacc Weighted Multi label:  {:.6}", metrics::weighted_jaccard(&multi_true, &multi_pred));
    println!("Jacc Samples Score:         {:.6}", metrics::samples_jaccard(&eval.truths, &eval.predictions));

    // How often the model predicted no category at all
    let none_count = eval.predictions.iter()
        .filter(|row| row.iter().all(|&b| !b))
        .count();
    println!();
    println!("Samples with no predicted label: {none_count}");
}
