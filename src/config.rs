// src/config.rs
use serde::{Deserialize, Serialize};

// Reserved token ids, dipakai bersama oleh tokenizer, model, dan trainer.
pub const PAD_ID: i64 = 0;
pub const GO_ID: i64 = 1;
pub const EOS_ID: i64 = 2;
pub const UNK_ID: i64 = 3;

pub const PAD_TOKEN: &str = "<PAD>";
pub const GO_TOKEN: &str = "<GO>";
pub const EOS_TOKEN: &str = "<EOS>";
pub const UNK_TOKEN: &str = "<UNK>";

/// Hyperparameters untuk model percakapan. Immutable setelah dibuat;
/// semua keputusan bentuk graph diturunkan dari sini.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    pub input_vocab_size: i64,
    pub target_vocab_size: i64,
    pub enc_hidden_size: i64,
    pub enc_num_layers: i64,
    pub dec_hidden_size: i64,
    pub dec_num_layers: i64,
    pub batch_size: i64,
    pub learning_rate: f64,
    pub learning_rate_decay_factor: f64,
    pub max_gradient_norm: f64,
    /// (encoder_len, decoder_len), terurut naik; entri terakhir = panjang maksimum
    pub buckets: Vec<(i64, i64)>,
}

impl ChatConfig {
    pub fn max_encoder_len(&self) -> Option<i64> {
        self.buckets.last().map(|&(e, _)| e)
    }

    pub fn max_decoder_len(&self) -> Option<i64> {
        self.buckets.last().map(|&(_, d)| d)
    }

    /// Bucket terkecil yang memuat (enc_len, dec_len)
    pub fn bucket_for(&self, enc_len: i64, dec_len: i64) -> Option<(i64, i64)> {
        self.buckets
            .iter()
            .copied()
            .find(|&(e, d)| enc_len <= e && dec_len <= d)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            input_vocab_size: 10_000,
            target_vocab_size: 10_000,
            enc_hidden_size: 512,
            enc_num_layers: 2,
            dec_hidden_size: 512,
            dec_num_layers: 2,
            batch_size: 8,
            learning_rate: 0.0001,
            learning_rate_decay_factor: 0.99,
            max_gradient_norm: 5.0,
            buckets: vec![(5, 10), (10, 15), (20, 25), (40, 50)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_for_picks_smallest_fit() {
        let config = ChatConfig::default();
        assert_eq!(config.bucket_for(3, 8), Some((5, 10)));
        assert_eq!(config.bucket_for(6, 8), Some((10, 15)));
        assert_eq!(config.bucket_for(30, 40), Some((40, 50)));
        assert_eq!(config.bucket_for(50, 10), None);
    }

    #[test]
    fn last_bucket_defines_max_lengths() {
        let config = ChatConfig::default();
        assert_eq!(config.max_encoder_len(), Some(40));
        assert_eq!(config.max_decoder_len(), Some(50));
    }
}
