// src/attention.rs
use tch::{nn, nn::Module, Kind, Tensor};

/// Bahdanau (Additive) Attention
///
/// Skor dihitung di ruang `num_units`; context dikembalikan di ruang key
/// (keluaran encoder), jadi query decoder dan keys encoder boleh beda dimensi.
pub struct BahdanauAttention {
    w_query: nn::Linear, // query [B,Hq] -> A
    w_key: nn::Linear,   // keys  [B,T,Hk] -> A
    v: nn::Linear,       // [B,T,A] -> [B,T,1]
}

impl BahdanauAttention {
    pub fn new(vs: &nn::Path, query_dim: i64, key_dim: i64, num_units: i64) -> Self {
        let w_query = nn::linear(vs / "w_query", query_dim, num_units, Default::default());
        let w_key = nn::linear(vs / "w_key", key_dim, num_units, Default::default());
        let v = nn::linear(vs / "v", num_units, 1, Default::default());
        Self { w_query, w_key, v }
    }

    /// query: [B,Hq], keys: [B,T,Hk], mask: [B,T] bool (true = valid)
    /// return: (context [B,Hk], attention_weights [B,T])
    pub fn forward(&self, query: &Tensor, keys: &Tensor, mask: Option<&Tensor>) -> (Tensor, Tensor) {
        let q_proj = self.w_query.forward(query).unsqueeze(1); // [B,1,A]
        let k_proj = self.w_key.forward(keys); // [B,T,A]

        // e = v^T tanh(Wq q + Wk k_i) -> [B,T]
        let mut scores = (q_proj + k_proj).tanh().apply(&self.v).squeeze_dim(-1);

        // Posisi PAD didorong ke -inf sebelum softmax
        if let Some(m) = mask {
            scores = scores.masked_fill(&m.logical_not(), -1e9);
        }

        let weights = scores.softmax(-1, Kind::Float); // [B,T]

        // Context: Σ α_i * h_i -> [B,Hk]
        let context = weights.unsqueeze(1).bmm(keys).squeeze_dim(1);

        (context, weights)
    }
}
