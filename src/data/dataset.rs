use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::complaint::NUM_CATEGORIES;

/// One fully tokenised and padded classification sample.
/// Sequence format: [CLS] description tokens [SEP] [PAD]...
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplaintSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub targets:        [f32; NUM_CATEGORIES],
}

impl ComplaintSample {
    /// Number of non-padding tokens in the sequence.
    pub fn token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m == 1).count()
    }
}

pub struct ComplaintDataset {
    samples: Vec<ComplaintSample>,
}

impl ComplaintDataset {
    pub fn new(samples: Vec<ComplaintSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<ComplaintSample> for ComplaintDataset {
    fn get(&self, index: usize) -> Option<ComplaintSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
