// src/training.rs
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tch::{nn, Device, Tensor};

use crate::config::{ChatConfig, PAD_ID};
use crate::model::{ChatSeq2Seq, StepOutput};
use crate::tokenizer::DualTokenizer;

/// Training loop di atas `ChatSeq2Seq::step`: batching per bucket,
/// validasi per epoch, decay learning rate saat stagnan, simpan bobot
/// terbaik lewat VarStore.
pub struct Trainer {
    model: ChatSeq2Seq,
    vs: nn::VarStore,
    config: ChatConfig,
    device: Device,
}

/// Susun satu batch time-major di bucket terkecil yang memuat kalimat
/// terpanjang. Return (encoder [S,B], encoder_len [B], decoder [T,B],
/// decoder_len [B], target_weights [T-1,B]).
pub(crate) fn prepare_batch(
    batch: &[(String, String)],
    tokenizer: &DualTokenizer,
    config: &ChatConfig,
    device: Device,
) -> (Tensor, Tensor, Tensor, Tensor, Tensor) {
    // +1 untuk EOS prompt, +2 untuk GO dan EOS reply
    let longest_prompt = batch
        .iter()
        .map(|(p, _)| p.split_whitespace().count())
        .max()
        .unwrap_or(0) as i64
        + 1;
    let longest_reply = batch
        .iter()
        .map(|(_, r)| r.split_whitespace().count())
        .max()
        .unwrap_or(0) as i64
        + 2;

    let (sl, tl) = config
        .bucket_for(longest_prompt, longest_reply)
        .or_else(|| config.buckets.last().copied())
        .unwrap_or((longest_prompt, longest_reply));

    // Encode paralel
    let rows: Vec<(Vec<usize>, i64, Vec<usize>, i64)> = batch
        .par_iter()
        .map(|(prompt, reply)| {
            let enc = tokenizer.prompt.encode_row(prompt, sl as usize, false, true);
            let dec = tokenizer.reply.encode_row(reply, tl as usize, true, true);
            let pad = PAD_ID as usize;
            let enc_len = enc.iter().filter(|&&id| id != pad).count() as i64;
            let dec_len = dec.iter().filter(|&&id| id != pad).count() as i64;
            (enc, enc_len, dec, dec_len)
        })
        .collect();

    let b = batch.len() as i64;

    let enc_data: Vec<i64> = rows
        .iter()
        .flat_map(|(e, _, _, _)| e.iter().map(|&x| x as i64))
        .collect();
    let dec_data: Vec<i64> = rows
        .iter()
        .flat_map(|(_, _, d, _)| d.iter().map(|&x| x as i64))
        .collect();
    let enc_lens: Vec<i64> = rows.iter().map(|(_, l, _, _)| *l).collect();
    let dec_lens: Vec<i64> = rows.iter().map(|(_, _, _, l)| *l).collect();

    // Bobot target: posisi t menilai token dec[t+1]; PAD tidak dihitung
    let pad = PAD_ID as usize;
    let mut weight_data: Vec<f32> = Vec::with_capacity(((tl - 1) * b) as usize);
    for t in 1..tl as usize {
        for (_, _, dec, _) in &rows {
            weight_data.push(if dec[t] != pad { 1.0 } else { 0.0 });
        }
    }

    let encoder_inputs = Tensor::from_slice(&enc_data)
        .view([b, sl])
        .transpose(0, 1)
        .contiguous()
        .to(device);
    let decoder_inputs = Tensor::from_slice(&dec_data)
        .view([b, tl])
        .transpose(0, 1)
        .contiguous()
        .to(device);
    let encoder_inputs_length = Tensor::from_slice(&enc_lens).to(device);
    let decoder_inputs_length = Tensor::from_slice(&dec_lens).to(device);
    let target_weights = Tensor::from_slice(&weight_data).view([tl - 1, b]).to(device);

    (
        encoder_inputs,
        encoder_inputs_length,
        decoder_inputs,
        decoder_inputs_length,
        target_weights,
    )
}

impl Trainer {
    pub fn new(model: ChatSeq2Seq, vs: nn::VarStore, config: ChatConfig, device: Device) -> Self {
        Self { model, vs, config, device }
    }

    pub fn model(&self) -> &ChatSeq2Seq {
        &self.model
    }

    fn train_epoch(
        &mut self,
        data: &[(String, String)],
        tokenizer: &DualTokenizer,
    ) -> Result<f64> {
        let batch_size = self.config.batch_size as usize;
        let num_batches = (data.len() + batch_size - 1) / batch_size;

        let pb = ProgressBar::new(num_batches as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        let mut total_loss = 0.0f64;
        let mut num_batches_processed = 0usize;

        for batch in data.chunks(batch_size) {
            let (enc, enc_lens, dec, dec_lens, weights) =
                prepare_batch(batch, tokenizer, &self.config, self.device);

            let outcome = self.model.step(&enc, &enc_lens, &dec, &dec_lens, &weights, false)?;
            if let StepOutput::Train { loss, gradient_norm, .. } = outcome {
                total_loss += loss;
                num_batches_processed += 1;
                pb.set_message(format!("Loss: {:.4} | grad: {:.2}", loss, gradient_norm));
            }
            pb.inc(1);
        }

        pb.finish_with_message("Epoch complete");
        Ok(if num_batches_processed > 0 {
            total_loss / num_batches_processed as f64
        } else {
            0.0
        })
    }

    fn validate(&self, data: &[(String, String)], tokenizer: &DualTokenizer) -> Result<f64> {
        let batch_size = self.config.batch_size as usize;
        let mut total_loss = 0.0f64;
        let mut num_batches = 0usize;

        for batch in data.chunks(batch_size) {
            let (enc, enc_lens, dec, _dec_lens, weights) =
                prepare_batch(batch, tokenizer, &self.config, self.device);
            total_loss += self.model.evaluate_loss(&enc, &enc_lens, &dec, &weights)?;
            num_batches += 1;
        }

        Ok(if num_batches > 0 { total_loss / num_batches as f64 } else { 0.0 })
    }

    pub fn train(
        &mut self,
        train_data: &[(String, String)],
        val_data: &[(String, String)],
        tokenizer: &DualTokenizer,
        epochs: usize,
        checkpoint_path: &str,
    ) -> Result<()> {
        println!("Checking gradient setup...");
        let trainable_count = self.vs.trainable_variables().len();
        println!("✓ Found {} trainable variables", trainable_count);
        if trainable_count == 0 {
            bail!("No trainable variables found! Model initialization failed.");
        }

        let mut best_val_loss = f64::INFINITY;
        let mut stale_epochs = 0usize;

        for epoch in 1..=epochs {
            println!("Epoch {}/{}", epoch, epochs);
            println!("{}", "-".repeat(50));

            let train_loss = self.train_epoch(train_data, tokenizer)?;
            let val_loss = self.validate(val_data, tokenizer)?;

            println!(
                "Train Loss: {:.4} | Val Loss: {:.4} | step {}",
                train_loss,
                val_loss,
                self.model.global_step().unwrap_or(0)
            );

            if val_loss < best_val_loss {
                best_val_loss = val_loss;
                stale_epochs = 0;
                self.vs.save(checkpoint_path)?;
                println!("✓ Saved best model (val_loss: {:.4})", val_loss);
            } else {
                stale_epochs += 1;
                // Dua epoch tanpa perbaikan: kecilkan learning rate
                if stale_epochs >= 2 {
                    let lr = self.model.decay_learning_rate()?;
                    stale_epochs = 0;
                    println!("✓ Decayed learning rate to {:.6}", lr);
                }
            }
            println!();
        }

        println!("✓ Training complete. Best val loss: {:.4}", best_val_loss);
        Ok(())
    }

    pub fn save_model(&self, path: &str) -> Result<()> {
        self.vs.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EOS_ID, GO_ID};

    fn fixture() -> (Vec<(String, String)>, DualTokenizer, ChatConfig) {
        let pairs = vec![
            ("hi there".to_string(), "hello friend".to_string()),
            ("how are you".to_string(), "i am fine".to_string()),
        ];
        let mut tokenizer = DualTokenizer::new(100, 100);
        tokenizer.fit(&pairs).unwrap();
        let config = ChatConfig {
            input_vocab_size: tokenizer.prompt_vocab_size() as i64,
            target_vocab_size: tokenizer.reply_vocab_size() as i64,
            buckets: vec![(5, 10)],
            ..ChatConfig::default()
        };
        (pairs, tokenizer, config)
    }

    #[test]
    fn batch_tensors_are_time_major() {
        let (pairs, tokenizer, config) = fixture();
        let (enc, enc_lens, dec, dec_lens, weights) =
            prepare_batch(&pairs, &tokenizer, &config, Device::Cpu);

        assert_eq!(enc.size(), vec![5, 2]);
        assert_eq!(dec.size(), vec![10, 2]);
        assert_eq!(enc_lens.size(), vec![2]);
        assert_eq!(dec_lens.size(), vec![2]);
        assert_eq!(weights.size(), vec![9, 2]);
    }

    #[test]
    fn decoder_rows_start_with_go_and_mask_padding() {
        let (pairs, tokenizer, config) = fixture();
        let (_enc, _enc_lens, dec, _dec_lens, weights) =
            prepare_batch(&pairs, &tokenizer, &config, Device::Cpu);

        // Baris waktu pertama = GO untuk semua sampel
        for b in 0..2 {
            let first = i64::try_from(&dec.get(0).get(b)).unwrap();
            assert_eq!(first, GO_ID);
        }

        // "hello friend" -> GO w w EOS; target = w w EOS lalu PAD
        let col0: Vec<i64> = (0..10)
            .map(|t| i64::try_from(&dec.get(t).get(0)).unwrap())
            .collect();
        assert_eq!(col0[3], EOS_ID);

        let w_col0: Vec<f64> = (0..9)
            .map(|t| f64::try_from(&weights.get(t).get(0)).unwrap())
            .collect();
        assert_eq!(&w_col0[..3], &[1.0, 1.0, 1.0]);
        assert_eq!(w_col0[3], 0.0);
    }
}
