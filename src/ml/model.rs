use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        conv::{Conv1d, Conv1dConfig},
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, relu},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ComplaintModelConfig {
    pub vocab_size:    usize,
    pub max_seq_len:   usize,
    pub d_model:       usize,
    pub num_heads:     usize,
    pub num_layers:    usize,
    pub d_ff:          usize,
    pub dropout:       f64,
    pub conv_channels: usize,
    pub mlp_size:      usize,
    pub num_labels:    usize,
}

impl ComplaintModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ComplaintModel<B> {
        let encoder = self.init_encoder(device);

        // Unigram and bigram feature extractors over the token axis.
        // Conv1d input layout is [batch, channels, length], so the
        // encoder output gets its last two dims swapped before the convs.
        let conv_unigram = Conv1dConfig::new(self.d_model, self.conv_channels, 1).init(device);
        let conv_bigram  = Conv1dConfig::new(self.d_model, self.conv_channels, 2).init(device);

        let hidden     = LinearConfig::new(self.conv_channels * 2, self.mlp_size).init(device);
        let classifier = LinearConfig::new(self.mlp_size, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();

        ComplaintModel {
            encoder, conv_unigram, conv_bigram,
            hidden, classifier, dropout,
            conv_channels: self.conv_channels,
        }
    }

    pub fn init_encoder<B: Backend>(&self, device: &B::Device) -> TextEncoder<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TextEncoder {
            token_embedding, position_embedding, layers,
            final_norm, dropout,
            max_seq_len: self.max_seq_len,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// The transformer encoder on its own, so its weights can be
/// warm-started from a pretrained record independently of the
/// randomly initialised classification head.
#[derive(Module, Debug)]
pub struct TextEncoder<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
    pub max_seq_len:        usize,
}

impl<B: Backend> TextEncoder<B> {
    /// input_ids: [batch, seq_len] → hidden states: [batch, seq_len, d_model]
    pub fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        pad_mask:  Tensor<B, 2, Bool>,
    ) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        self.final_norm.forward(x)
    }
}

#[derive(Module, Debug)]
pub struct ComplaintModel<B: Backend> {
    pub encoder:      TextEncoder<B>,
    pub conv_unigram: Conv1d<B>,
    pub conv_bigram:  Conv1d<B>,
    pub hidden:       Linear<B>,
    pub classifier:   Linear<B>,
    pub dropout:      Dropout,
    pub conv_channels: usize,
}

impl<B: Backend> ComplaintModel<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    ///
    /// Raw logits out — sigmoid is applied by the loss and the evaluator,
    /// never inside the model.
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, _seq_len] = input_ids.dims();

        // mask_pad marks the positions attention must NOT look at
        let pad_mask = attention_mask.equal_elem(0);

        let hidden = self.encoder.forward(input_ids, pad_mask);

        // [batch, seq_len, d_model] → [batch, d_model, seq_len] for Conv1d
        let x = hidden.swap_dims(1, 2);

        // Max-over-time pooling per feature map, then concat both kernels
        let unigram = relu(self.conv_unigram.forward(x.clone()))
            .max_dim(2)
            .reshape([batch_size, self.conv_channels]);
        let bigram = relu(self.conv_bigram.forward(x))
            .max_dim(2)
            .reshape([batch_size, self.conv_channels]);
        let features = Tensor::cat(vec![unigram, bigram], 1);

        let h = relu(self.hidden.forward(features));
        self.classifier.forward(self.dropout.forward(h))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn::backend::NdArray;

    fn tiny_config() -> ComplaintModelConfig {
        ComplaintModelConfig::new(32, 8, 16, 2, 1, 32, 0.0, 4, 8, 8)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model: ComplaintModel<TestBackend> = tiny_config().init(&device);

        let ids: Vec<i32> = vec![2, 5, 6, 3, 0, 0, 0, 0, 2, 7, 3, 0, 0, 0, 0, 0];
        let mask: Vec<i32> = ids.iter().map(|&i| i32::from(i != 0)).collect();

        let input_ids = Tensor::<TestBackend, 1, Int>::from_ints(ids.as_slice(), &device)
            .reshape([2, 8]);
        let attention_mask = Tensor::<TestBackend, 1, Int>::from_ints(mask.as_slice(), &device)
            .reshape([2, 8]);

        let logits = model.forward(input_ids, attention_mask);
        assert_eq!(logits.dims(), [2, 8]);
    }
}
