// ============================================================
// Layer 4 — Sample Encoder
// ============================================================
// Turns raw complaints into fixed-length, model-ready samples:
//
//   1. Tokenise the description with the pretrained tokenizer
//      (the tokenizer's post-processor adds [CLS] and [SEP])
//   2. Truncate to max_length
//   3. Pad with 0 ([PAD]) up to max_length
//   4. Build the attention mask: 1 = real token, 0 = padding
//   5. Encode label strings into the multi-hot target vector
//
// All sequences leave this module with the same length, so
// the batcher never has to pad dynamically.
//
// Reference: Devlin et al. (2019) BERT

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::dataset::ComplaintSample;
use crate::domain::complaint::Complaint;

pub struct SampleEncoder {
    tokenizer:  Tokenizer,
    max_length: usize,
}

impl SampleEncoder {
    pub fn new(tokenizer: Tokenizer, max_length: usize) -> Self {
        Self { tokenizer, max_length }
    }

    /// Encode a batch of complaints into padded samples.
    pub fn encode_all(&self, complaints: &[Complaint]) -> Result<Vec<ComplaintSample>> {
        complaints.iter().map(|c| self.encode(c)).collect()
    }

    /// Encode a single complaint.
    pub fn encode(&self, complaint: &Complaint) -> Result<ComplaintSample> {
        // add_special_tokens = true → the pretrained post-processor
        // wraps the sequence as [CLS] ... [SEP]
        let encoding = self.tokenizer
            .encode(complaint.description.as_str(), true)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut input_ids: Vec<u32> = encoding.get_ids().to_vec();
        input_ids.truncate(self.max_length);

        // Attention mask covers the real tokens only
        let mut attention_mask = vec![1u32; input_ids.len()];

        // Pad both input_ids and attention_mask to max_length
        while input_ids.len() < self.max_length {
            input_ids.push(0);      // 0 = [PAD] token
            attention_mask.push(0); // 0 = ignore this position
        }

        Ok(ComplaintSample {
            input_ids,
            attention_mask,
            targets: complaint.multi_hot(),
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::{tests::write_test_tokenizer, TokenizerStore};

    fn test_encoder(max_length: usize) -> SampleEncoder {
        let dir = tempfile::tempdir().unwrap();
        write_test_tokenizer(dir.path());
        let tokenizer = TokenizerStore::new(dir.path().to_str().unwrap())
            .load()
            .unwrap();
        SampleEncoder::new(tokenizer, max_length)
    }

    #[test]
    fn test_pads_to_max_length() {
        let enc = test_encoder(16);
        let c = Complaint::new("hello world", vec!["游览".to_string()]);
        let s = enc.encode(&c).unwrap();
        assert_eq!(s.input_ids.len(), 16);
        assert_eq!(s.attention_mask.len(), 16);
        // [CLS] hello world [SEP] → 4 real tokens, rest padding
        assert_eq!(s.token_count(), 4);
        assert_eq!(s.input_ids[4..], [0u32; 12]);
    }

    #[test]
    fn test_truncates_to_max_length() {
        let enc = test_encoder(3);
        let c = Complaint::new("hello world hello world", vec![]);
        let s = enc.encode(&c).unwrap();
        assert_eq!(s.input_ids.len(), 3);
        assert_eq!(s.token_count(), 3);
    }

    #[test]
    fn test_targets_come_from_vocabulary_encoding() {
        let enc = test_encoder(8);
        let c = Complaint::new(
            "hello",
            vec!["旅游安全".to_string(), "未知类别".to_string()],
        );
        let s = enc.encode(&c).unwrap();
        assert_eq!(s.targets[2], 1.0);
        assert_eq!(s.targets.iter().sum::<f32>(), 1.0);
    }
}
