// src/model.rs - encoder-decoder percakapan di atas tch (LSTM/GRU + attention)
use anyhow::{bail, Result};
use tch::nn::{self, Module, OptimizerConfig, RNN};
use tch::{Kind, Tensor};

use crate::attention::BahdanauAttention;
use crate::config::{ChatConfig, EOS_ID, GO_ID, PAD_ID};

/// Jenis cell untuk kedua stack (encoder dan decoder memakai jenis yang sama).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellType {
    Lstm,
    Gru,
}

/// Stack layer recurrent identik: satu jenis cell, satu hidden size,
/// parameter independen per layer.
enum RnnStack {
    Lstm(nn::LSTM),
    Gru(nn::GRU),
}

impl RnnStack {
    fn new(
        vs: nn::Path,
        cell: CellType,
        in_dim: i64,
        hidden_size: i64,
        num_layers: i64,
        bidirectional: bool,
    ) -> Self {
        let mut cfg = nn::RNNConfig::default();
        cfg.num_layers = num_layers;
        cfg.bidirectional = bidirectional;
        cfg.batch_first = false; // time-major [T,B,E]

        match cell {
            CellType::Lstm => RnnStack::Lstm(nn::lstm(&vs, in_dim, hidden_size, cfg)),
            CellType::Gru => RnnStack::Gru(nn::gru(&vs, in_dim, hidden_size, cfg)),
        }
    }

    /// input [T,B,E] -> (output [T,B,H*dirs], state [layers*dirs,B,H])
    fn seq(&self, input: &Tensor) -> (Tensor, StackState) {
        match self {
            RnnStack::Lstm(lstm) => {
                let (out, state) = lstm.seq(input);
                (out, StackState::Lstm(state))
            }
            RnnStack::Gru(gru) => {
                let (out, state) = gru.seq(input);
                (out, StackState::Gru(state))
            }
        }
    }

    fn seq_init(&self, input: &Tensor, state: &StackState) -> Result<(Tensor, StackState)> {
        match (self, state) {
            (RnnStack::Lstm(lstm), StackState::Lstm(s)) => {
                let (out, new_state) = lstm.seq_init(input, s);
                Ok((out, StackState::Lstm(new_state)))
            }
            (RnnStack::Gru(gru), StackState::Gru(s)) => {
                let (out, new_state) = gru.seq_init(input, s);
                Ok((out, StackState::Gru(new_state)))
            }
            _ => bail!("recurrent state does not match the stack's cell type"),
        }
    }
}

/// State akhir sebuah stack; LSTM membawa pasangan (hidden, cell),
/// GRU hanya hidden.
pub enum StackState {
    Lstm(nn::LSTMState),
    Gru(nn::GRUState),
}

impl StackState {
    /// Tensor hidden [layers*dirs, B, H]
    pub fn hidden(&self) -> Tensor {
        match self {
            StackState::Lstm(s) => s.0 .0.shallow_clone(),
            StackState::Gru(s) => s.0.shallow_clone(),
        }
    }

    /// Hidden layer teratas [B, H]
    fn top_hidden(&self) -> Tensor {
        let h = self.hidden();
        let layers = h.size()[0];
        h.select(0, layers - 1)
    }

    /// Gabung state forward/backward jadi [layers, B, 2H]
    /// (layout masukan [layers*2, B, H], arah di dimensi tercepat).
    fn merge_directions(self, num_layers: i64) -> StackState {
        fn merge(t: &Tensor, num_layers: i64) -> Tensor {
            let size = t.size(); // [layers*2, B, H]
            let (b, h) = (size[1], size[2]);
            let t = t.view([num_layers, 2, b, h]);
            Tensor::cat(&[t.select(1, 0), t.select(1, 1)], -1).contiguous()
        }

        match self {
            StackState::Lstm(s) => StackState::Lstm(nn::LSTMState((
                merge(&s.0 .0, num_layers),
                merge(&s.0 .1, num_layers),
            ))),
            StackState::Gru(s) => StackState::Gru(nn::GRUState(merge(&s.0, num_layers))),
        }
    }
}

/// Hasil satu langkah eksekusi; varian training dan inference saling
/// eksklusif berdasarkan tipe.
pub enum StepOutput {
    Train {
        /// Norm global gradien sebelum clipping
        gradient_norm: f64,
        loss: f64,
        encoder_state: StackState,
        decoder_state: StackState,
    },
    Forward {
        /// Logits per langkah [T,B,V]
        logits: Tensor,
        /// Argmax id per langkah [T,B]
        prediction: Tensor,
        encoder_state: StackState,
        decoder_state: StackState,
    },
}

enum Mode {
    Training(TrainState),
    Inference,
}

struct TrainState {
    opt: nn::Optimizer,
    params: Vec<Tensor>,
    learning_rate: f64,
    decay_factor: f64,
    global_step: i64,
}

/// Encoder-decoder percakapan.
///
/// Semua modul dibuat sekali di `build` dan hidup selama proses; mode
/// (training atau inference) dipilih saat build dan tidak pernah berubah.
/// Input token-id selalu time-major [T,B].
pub struct ChatSeq2Seq {
    enc_embedding: nn::Embedding,
    dec_embedding: nn::Embedding,
    encoder: RnnStack,
    decoder: RnnStack,
    attention: Option<BahdanauAttention>,
    state_bridge: nn::Linear, // state encoder (D) -> state awal decoder (H)
    output_projection: nn::Linear, // H -> V target

    bidirectional: bool,
    enc_num_layers: i64,
    dec_num_layers: i64,
    max_encoder_len: i64,
    max_decoder_len: i64,
    max_gradient_norm: f64,
    mode: Mode,
}

impl ChatSeq2Seq {
    /// Bangun seluruh graph dari konfigurasi. `forward_only` memilih mode
    /// inference (tanpa optimizer); `bidirectional` menjalankan encoder dua
    /// arah dan menggandakan lebar state-nya; `attention` menambahkan
    /// Bahdanau attention di tiap langkah decoder.
    pub fn build(
        vs: &nn::VarStore,
        config: &ChatConfig,
        cell: CellType,
        forward_only: bool,
        bidirectional: bool,
        attention: bool,
    ) -> Result<Self> {
        let (max_encoder_len, max_decoder_len) = match config.buckets.last() {
            Some(&(e, d)) => (e, d),
            None => bail!("config.buckets must not be empty"),
        };

        let root = vs.root();

        // Embedding terpisah; lebar embedding = hidden size masing-masing sisi
        let enc_embedding = nn::embedding(
            &root / "enc_embedding",
            config.input_vocab_size,
            config.enc_hidden_size,
            Default::default(),
        );
        let dec_embedding = nn::embedding(
            &root / "dec_embedding",
            config.target_vocab_size,
            config.dec_hidden_size,
            Default::default(),
        );

        let encoder = RnnStack::new(
            &root / "encoder",
            cell,
            config.enc_hidden_size,
            config.enc_hidden_size,
            config.enc_num_layers,
            bidirectional,
        );

        let enc_out_dim = if bidirectional {
            config.enc_hidden_size * 2
        } else {
            config.enc_hidden_size
        };

        // Input decoder: [emb] saja, atau [emb, context] dengan attention
        let dec_in_dim = if attention {
            config.dec_hidden_size + enc_out_dim
        } else {
            config.dec_hidden_size
        };
        let decoder = RnnStack::new(
            &root / "decoder",
            cell,
            dec_in_dim,
            config.dec_hidden_size,
            config.dec_num_layers,
            false,
        );

        let attention = if attention {
            let attn_path = &root / "attention";
            Some(BahdanauAttention::new(
                &attn_path,
                config.dec_hidden_size,
                enc_out_dim,
                config.dec_hidden_size,
            ))
        } else {
            None
        };

        let state_bridge = nn::linear(
            &root / "state_bridge",
            enc_out_dim,
            config.dec_hidden_size,
            Default::default(),
        );
        let output_projection = nn::linear(
            &root / "output",
            config.dec_hidden_size,
            config.target_vocab_size,
            Default::default(),
        );

        let mode = if forward_only {
            Mode::Inference
        } else {
            let opt = nn::Adam::default().build(vs, config.learning_rate)?;
            Mode::Training(TrainState {
                opt,
                params: vs.trainable_variables(),
                learning_rate: config.learning_rate,
                decay_factor: config.learning_rate_decay_factor,
                global_step: 0,
            })
        };

        Ok(Self {
            enc_embedding,
            dec_embedding,
            encoder,
            decoder,
            attention,
            state_bridge,
            output_projection,
            bidirectional,
            enc_num_layers: config.enc_num_layers,
            dec_num_layers: config.dec_num_layers,
            max_encoder_len,
            max_decoder_len,
            max_gradient_norm: config.max_gradient_norm,
            mode,
        })
    }

    /// Dimensi vocab keluaran (bantu debug)
    pub fn out_vocab_dim(&self) -> i64 {
        self.output_projection.ws.size()[0]
    }

    pub fn is_forward_only(&self) -> bool {
        matches!(self.mode, Mode::Inference)
    }

    /// Step counter; naik satu tiap update training
    pub fn global_step(&self) -> Option<i64> {
        match &self.mode {
            Mode::Training(t) => Some(t.global_step),
            Mode::Inference => None,
        }
    }

    pub fn learning_rate(&self) -> Option<f64> {
        match &self.mode {
            Mode::Training(t) => Some(t.learning_rate),
            Mode::Inference => None,
        }
    }

    /// Kalikan learning rate dengan faktor decay dan dorong ke optimizer.
    /// Dipanggil oleh training loop, tidak pernah otomatis.
    pub fn decay_learning_rate(&mut self) -> Result<f64> {
        match &mut self.mode {
            Mode::Training(t) => {
                t.learning_rate *= t.decay_factor;
                t.opt.set_lr(t.learning_rate);
                Ok(t.learning_rate)
            }
            Mode::Inference => bail!("learning-rate decay requires a training build"),
        }
    }

    /// Encode prompt [T,B] (dipotong ke bucket terakhir) →
    /// (encoder_outputs [B,T,D], state per layer [L,B,D])
    pub fn encode(&self, encoder_inputs: &Tensor) -> (Tensor, StackState) {
        let t = encoder_inputs.size()[0].min(self.max_encoder_len);
        let inputs = encoder_inputs.narrow(0, 0, t);

        let embedded = self.enc_embedding.forward(&inputs); // [T,B,E]
        let (outputs_tbd, state) = self.encoder.seq(&embedded); // [T,B,D]

        // Attention bekerja batch-major
        let outputs = outputs_tbd.transpose(0, 1).contiguous(); // [B,T,D]

        let state = if self.bidirectional {
            state.merge_directions(self.enc_num_layers)
        } else {
            state
        };

        (outputs, state)
    }

    /// State awal decoder: state layer teratas encoder diproyeksikan ke H
    /// dan dipakai untuk semua layer decoder.
    fn initial_decoder_state(&self, encoder_state: &StackState) -> StackState {
        let bridge = |t: &Tensor| {
            let bridged = self.state_bridge.forward(t); // [B,H]
            let layers: Vec<Tensor> = (0..self.dec_num_layers)
                .map(|_| bridged.shallow_clone())
                .collect();
            Tensor::stack(&layers, 0) // [L,B,H]
        };

        match encoder_state {
            StackState::Lstm(s) => {
                let layers = s.0 .0.size()[0];
                let top_h = s.0 .0.select(0, layers - 1); // [B,D]
                let top_c = s.0 .1.select(0, layers - 1);
                StackState::Lstm(nn::LSTMState((bridge(&top_h), bridge(&top_c))))
            }
            StackState::Gru(s) => {
                let layers = s.0.size()[0];
                let top = s.0.select(0, layers - 1);
                StackState::Gru(nn::GRUState(bridge(&top)))
            }
        }
    }

    /// Satu langkah decoder. `input` [B,1] id token sebelumnya.
    /// Return (output pre-proyeksi [B,H], state baru).
    fn decode_step(
        &self,
        input: &Tensor,
        state: &StackState,
        encoder_outputs: &Tensor,
        encoder_mask: Option<&Tensor>,
    ) -> Result<(Tensor, StackState)> {
        let embedded = self.dec_embedding.forward(input); // [B,1,E]

        let step_input = match &self.attention {
            Some(attn) => {
                let query = state.top_hidden(); // [B,H]
                let (context, _weights) = attn.forward(&query, encoder_outputs, encoder_mask);
                Tensor::cat(&[embedded, context.unsqueeze(1)], 2) // [B,1,E+D]
            }
            None => embedded,
        };

        let step_input = step_input.transpose(0, 1); // [1,B,*] time-major
        let (out, new_state) = self.decoder.seq_init(&step_input, state)?;
        let output = out.squeeze_dim(0); // [1,B,H] -> [B,H]

        Ok((output, new_state))
    }

    /// Decoder teacher-forcing: T-1 langkah dengan token ground-truth,
    /// proyeksi ke vocab sekali di akhir. Return (logits [B,T-1,V], state).
    fn decode_train(
        &self,
        decoder_inputs: &Tensor, // [T,B], sudah dipotong ke bucket
        encoder_outputs: &Tensor,
        encoder_mask: Option<&Tensor>,
        init_state: StackState,
    ) -> Result<(Tensor, StackState)> {
        let t = decoder_inputs.size()[0];
        if t < 2 {
            bail!("decoder needs at least two time steps (input plus shifted target)");
        }

        let steps = t - 1;
        let mut state = init_state;
        let mut outputs = Vec::with_capacity(steps as usize);

        for i in 0..steps {
            let input = decoder_inputs.narrow(0, i, 1).transpose(0, 1); // [B,1]
            let (out, new_state) =
                self.decode_step(&input, &state, encoder_outputs, encoder_mask)?;
            outputs.push(out.unsqueeze(1)); // [B,1,H]
            state = new_state;
        }

        let hidden = Tensor::cat(&outputs, 1); // [B,T-1,H]
        let logits = self.output_projection.forward(&hidden); // [B,T-1,V]

        Ok((logits, state))
    }

    /// Decoder greedy: mulai dari GO, token berikutnya = argmax langkah
    /// sebelumnya, selalu `max_decoder_len` langkah; setelah EOS sebuah
    /// sampel mengeluarkan PAD. Return (logits [T,B,V], prediction [T,B], state).
    fn decode_greedy(
        &self,
        encoder_outputs: &Tensor,
        encoder_mask: Option<&Tensor>,
        init_state: StackState,
    ) -> Result<(Tensor, Tensor, StackState)> {
        let batch_size = encoder_outputs.size()[0];
        let device = encoder_outputs.device();

        let mut state = init_state;
        let mut current = Tensor::full(&[batch_size, 1], GO_ID, (Kind::Int64, device));
        let mut finished = Tensor::zeros(&[batch_size], (Kind::Bool, device));

        let mut all_logits = Vec::with_capacity(self.max_decoder_len as usize);
        let mut all_preds = Vec::with_capacity(self.max_decoder_len as usize);

        for _ in 0..self.max_decoder_len {
            let (out, new_state) =
                self.decode_step(&current, &state, encoder_outputs, encoder_mask)?;
            state = new_state;

            let logits = self.output_projection.forward(&out); // [B,V]
            let pred = logits.argmax(-1, false); // [B]
            let pred = pred.masked_fill(&finished, PAD_ID);

            finished = finished.logical_or(&pred.eq(EOS_ID));
            current = pred.unsqueeze(1);

            all_logits.push(logits);
            all_preds.push(pred);
        }

        let logits = Tensor::stack(&all_logits, 0); // [T,B,V]
        let prediction = Tensor::stack(&all_preds, 0); // [T,B]

        Ok((logits, prediction, state))
    }

    /// Forward teacher-forcing penuh: encode lalu decode dengan ground truth.
    /// Return logits [B, T_dec-1, V]; target untuk posisi t adalah
    /// decoder_inputs[t+1].
    pub fn forward(
        &self,
        encoder_inputs: &Tensor,
        encoder_inputs_length: &Tensor,
        decoder_inputs: &Tensor,
    ) -> Result<Tensor> {
        let (encoder_outputs, encoder_state) = self.encode(encoder_inputs);
        let enc_mask = length_mask(encoder_inputs_length, encoder_outputs.size()[1]);
        let init_state = self.initial_decoder_state(&encoder_state);

        let dec_t = decoder_inputs.size()[0].min(self.max_decoder_len);
        let dec_inputs = decoder_inputs.narrow(0, 0, dec_t);

        let (logits, _state) =
            self.decode_train(&dec_inputs, &encoder_outputs, Some(&enc_mask), init_state)?;
        Ok(logits)
    }

    /// Loss teacher-forcing tanpa update parameter (untuk validasi).
    pub fn evaluate_loss(
        &self,
        encoder_inputs: &Tensor,
        encoder_inputs_length: &Tensor,
        decoder_inputs: &Tensor,
        target_weights: &Tensor,
    ) -> Result<f64> {
        tch::no_grad(|| {
            let logits = self.forward(encoder_inputs, encoder_inputs_length, decoder_inputs)?;
            let steps = logits.size()[1];

            let dec_t = decoder_inputs.size()[0].min(self.max_decoder_len);
            let targets = decoder_inputs.narrow(0, 1, dec_t - 1).transpose(0, 1); // [B,T-1]
            let weights = target_weights
                .narrow(0, 0, target_weights.size()[0].min(steps))
                .transpose(0, 1); // [B,T-1]

            let loss = weighted_cross_entropy(&logits, &targets, &weights);
            Ok(f64::try_from(&loss).unwrap_or(f64::NAN))
        })
    }

    /// Jalankan satu step pada graph yang sudah dibangun.
    ///
    /// Semua tensor token-id time-major [T,B] (Int64), panjang [B],
    /// `target_weights` [T_dec-1, B] (Float). `forward_only` harus cocok
    /// dengan mode build; ketidakcocokan adalah error langsung. Bentuk feed
    /// yang salah gagal keras dari tch tanpa recovery.
    pub fn step(
        &mut self,
        encoder_inputs: &Tensor,
        encoder_inputs_length: &Tensor,
        decoder_inputs: &Tensor,
        decoder_inputs_length: &Tensor,
        target_weights: &Tensor,
        forward_only: bool,
    ) -> Result<StepOutput> {
        match (&self.mode, forward_only) {
            (Mode::Training(_), true) => {
                bail!("model was built for training; forward-only steps are not available")
            }
            (Mode::Inference, false) => {
                bail!("model was built forward-only; training steps are not available")
            }
            _ => {}
        }

        if cfg!(debug_assertions) {
            let longest = decoder_inputs_length.max();
            let longest = i64::try_from(&longest).unwrap_or(0);
            if longest > self.max_decoder_len {
                eprintln!(
                    "⚠️  decoder length {} exceeds bucket cap {}; extra steps are dropped",
                    longest, self.max_decoder_len
                );
            }
        }

        let (encoder_outputs, encoder_state) = self.encode(encoder_inputs);
        let enc_mask = length_mask(encoder_inputs_length, encoder_outputs.size()[1]);
        let init_state = self.initial_decoder_state(&encoder_state);

        if forward_only {
            let (logits, prediction, decoder_state) =
                self.decode_greedy(&encoder_outputs, Some(&enc_mask), init_state)?;
            return Ok(StepOutput::Forward {
                logits,
                prediction,
                encoder_state,
                decoder_state,
            });
        }

        let dec_t = decoder_inputs.size()[0].min(self.max_decoder_len);
        let dec_inputs = decoder_inputs.narrow(0, 0, dec_t);

        let (logits, decoder_state) =
            self.decode_train(&dec_inputs, &encoder_outputs, Some(&enc_mask), init_state)?;
        let steps = dec_t - 1;

        // Target = input decoder digeser satu langkah; loss dihitung batch-major
        let targets = dec_inputs.narrow(0, 1, steps).transpose(0, 1); // [B,T-1]
        let weights = target_weights
            .narrow(0, 0, target_weights.size()[0].min(steps))
            .transpose(0, 1); // [B,T-1]

        let loss = weighted_cross_entropy(&logits, &targets, &weights);

        match &mut self.mode {
            Mode::Training(train) => {
                train.opt.zero_grad();
                loss.backward();
                let gradient_norm = clip_global_norm(&train.params, self.max_gradient_norm);
                train.opt.step();
                train.global_step += 1;

                Ok(StepOutput::Train {
                    gradient_norm,
                    loss: f64::try_from(&loss).unwrap_or(f64::NAN),
                    encoder_state,
                    decoder_state,
                })
            }
            Mode::Inference => bail!("model was built forward-only; training steps are not available"),
        }
    }

    /// Balasan greedy untuk prompt yang sudah di-encode, tanpa gradien.
    /// Return prediction [T,B] Int64.
    pub fn respond(
        &self,
        encoder_inputs: &Tensor,
        encoder_inputs_length: &Tensor,
    ) -> Result<Tensor> {
        tch::no_grad(|| {
            let (encoder_outputs, encoder_state) = self.encode(encoder_inputs);
            let enc_mask = length_mask(encoder_inputs_length, encoder_outputs.size()[1]);
            let init_state = self.initial_decoder_state(&encoder_state);
            let (_logits, prediction, _state) =
                self.decode_greedy(&encoder_outputs, Some(&enc_mask), init_state)?;
            Ok(prediction)
        })
    }
}

/// Mask [B,T] bool: true untuk posisi sebelum panjang sampel
fn length_mask(lengths: &Tensor, t: i64) -> Tensor {
    let device = lengths.device();
    let steps = Tensor::arange(t, (Kind::Int64, device)).unsqueeze(0); // [1,T]
    steps.lt_tensor(&lengths.to_kind(Kind::Int64).unsqueeze(1)) // [B,T]
}

/// Cross-entropy berbobot untuk logits [B,T,V] vs target [B,T] dengan
/// bobot [B,T]; rata-rata atas total bobot. Aman saat semua bobot nol:
/// hasilnya nol yang tetap attach ke graph.
fn weighted_cross_entropy(logits: &Tensor, targets: &Tensor, weights: &Tensor) -> Tensor {
    let v = *logits.size().last().unwrap();

    let logits_flat = logits.view([-1, v]); // [N,V]
    let targets_flat = targets.flatten(0, 1).to_kind(Kind::Int64); // [N]
    let weights_flat = weights.flatten(0, 1).to_kind(Kind::Float); // [N]

    let log_probs = logits_flat.log_softmax(-1, Kind::Float);
    let nll = -log_probs
        .gather(1, &targets_flat.unsqueeze(1), false)
        .squeeze_dim(1); // [N]

    // Anchor nol yang tetap attach ke graph
    let zero_anchor = logits_flat.sum(Kind::Float) * 0.0;

    let denom = weights_flat.sum(Kind::Float).clamp_min(1e-12);
    (nll * weights_flat).sum(Kind::Float) / denom + zero_anchor
}

/// Clip gradien semua parameter ke norm global `max_norm`.
/// Return norm global sebelum clipping.
pub fn clip_global_norm(params: &[Tensor], max_norm: f64) -> f64 {
    let mut total = 0.0f64;
    for p in params {
        let g = p.grad();
        if g.defined() {
            let n = f64::try_from(&g.norm()).unwrap_or(0.0);
            total += n * n;
        }
    }

    let global_norm = total.sqrt();
    if global_norm > max_norm && global_norm > 0.0 {
        let scale = max_norm / global_norm;
        tch::no_grad(|| {
            for p in params {
                let mut g = p.grad();
                if g.defined() {
                    let scaled = &g * scale;
                    g.copy_(&scaled);
                }
            }
        });
    }

    global_norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Device;

    #[test]
    fn clip_leaves_small_gradients_alone() {
        let vs = nn::VarStore::new(Device::Cpu);
        let w = vs.root().var("w", &[4], nn::Init::Const(0.5));

        let loss = (&w * 0.01).sum(Kind::Float);
        loss.backward();

        let params = vs.trainable_variables();
        let norm = clip_global_norm(&params, 5.0);
        assert!(norm < 5.0);

        // Gradien tidak berubah
        let g = f64::try_from(&w.grad().sum(Kind::Float)).unwrap();
        assert!((g - 0.04).abs() < 1e-6);
    }

    #[test]
    fn clip_caps_global_norm() {
        let vs = nn::VarStore::new(Device::Cpu);
        let w = vs.root().var("w", &[16], nn::Init::Const(1.0));

        let loss = (&w * 1000.0).sum(Kind::Float);
        loss.backward();

        let params = vs.trainable_variables();
        let max_norm = 1.0;
        let pre_norm = clip_global_norm(&params, max_norm);
        assert!(pre_norm > max_norm);

        let post_norm = f64::try_from(&w.grad().norm()).unwrap();
        assert!(post_norm <= max_norm + 1e-6);
    }

    #[test]
    fn zero_weights_still_give_finite_loss() {
        let logits = Tensor::randn(&[2, 3, 5], (Kind::Float, Device::Cpu));
        let targets = Tensor::zeros(&[2, 3], (Kind::Int64, Device::Cpu));
        let weights = Tensor::zeros(&[2, 3], (Kind::Float, Device::Cpu));

        let loss = weighted_cross_entropy(&logits, &targets, &weights);
        let value = f64::try_from(&loss).unwrap();
        assert!(value.abs() < 1e-6);
    }

    #[test]
    fn length_mask_marks_padding() {
        let lengths = Tensor::from_slice(&[2i64, 4]);
        let mask = length_mask(&lengths, 4).to_kind(Kind::Int64);
        assert_eq!(mask.size(), vec![2, 4]);
        assert_eq!(i64::try_from(&mask.get(0).sum(Kind::Int64)).unwrap(), 2);
        assert_eq!(i64::try_from(&mask.get(0).get(1)).unwrap(), 1);
        assert_eq!(i64::try_from(&mask.get(0).get(2)).unwrap(), 0);
        assert_eq!(i64::try_from(&mask.get(1).sum(Kind::Int64)).unwrap(), 4);
    }
}
