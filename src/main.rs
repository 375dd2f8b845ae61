// src/main.rs
use anyhow::Result;
use tch::{nn, Device, Tensor};

use chat_rnn::config::{ChatConfig, EOS_ID, PAD_ID};
use chat_rnn::data_loader::DialogCorpus;
use chat_rnn::metrics::{bleu_score, rouge_1};
use chat_rnn::model::{CellType, ChatSeq2Seq};
use chat_rnn::tokenizer::DualTokenizer;
use chat_rnn::training::Trainer;

// Hyperparameters
const PROMPT_VOCAB_LIMIT: usize = 10_000;
const REPLY_VOCAB_LIMIT: usize = 10_000;
const EPOCHS: usize = 10;
const MODEL_PATH: &str = "chat_model.pt";
const CONFIG_PATH: &str = "chat_config.json";

fn main() -> Result<()> {
    println!("========================================");
    println!("  Conversational RNN with Attention");
    println!("  Task: prompt → reply (chatbot)");
    println!("========================================\n");

    let device = if tch::Cuda::is_available() {
        println!("✓ CUDA device detected");
        Device::Cuda(0)
    } else {
        println!("✓ Using CPU");
        Device::Cpu
    };
    println!("✓ CPU cores: {}\n", num_cpus::get());

    // Load data (beberapa path)
    println!("Loading conversation data...");
    let csv_paths = ["conversations.csv", "../Dialogs.csv"];

    let mut corpus = None;
    for path in &csv_paths {
        println!("  Trying: {}", path);
        match DialogCorpus::from_csv(path, 60, 60) {
            Ok(loaded) => {
                corpus = Some(loaded);
                println!("  ✓ Successfully loaded from {}", path);
                break;
            }
            Err(e) => {
                println!("    ✗ Failed: {}", e);
            }
        }
    }

    let corpus = corpus.expect(
        "\n Could not find any valid CSV file!\n\
         Please create one of:\n  \
         - conversations.csv (in project root)\n  \
         - Dialogs.csv (one level up)\n\n\
         Format: CSV with 2 columns (prompt, reply)",
    );

    println!("✓ Loaded {} conversation pairs", corpus.len());
    println!("✓ Unique prompts: {}", corpus.unique_prompt_count());
    println!("✓ Unique replies: {}\n", corpus.unique_reply_count());

    // Dual tokenizer
    println!("Building dual tokenizer (prompt + reply)...");
    let mut tokenizer = DualTokenizer::new(PROMPT_VOCAB_LIMIT, REPLY_VOCAB_LIMIT);
    tokenizer.fit(corpus.pairs())?;

    println!("✓ Prompt vocabulary size: {}", tokenizer.prompt_vocab_size());
    println!("✓ Reply vocabulary size: {}\n", tokenizer.reply_vocab_size());

    let config = ChatConfig {
        input_vocab_size: tokenizer.prompt_vocab_size() as i64,
        target_vocab_size: tokenizer.reply_vocab_size() as i64,
        ..ChatConfig::default()
    };
    std::fs::write(CONFIG_PATH, serde_json::to_string_pretty(&config)?)?;
    println!("✓ Config written to {}\n", CONFIG_PATH);

    // Split data
    let (train_data, val_data) = corpus.train_val_split(0.9);
    println!("✓ Training pairs: {}", train_data.len());
    println!("✓ Validation pairs: {}\n", val_data.len());

    // Model (mode training)
    println!("Initializing seq2seq model with dual vocabularies...");
    let mut vs = nn::VarStore::new(device);
    vs.set_kind(tch::Kind::Float);

    let model = ChatSeq2Seq::build(&vs, &config, CellType::Lstm, false, true, true)?;
    println!("✓ Model out_vocab_dim (should match reply vocab): {}", model.out_vocab_dim());

    let total_params: i64 = vs
        .trainable_variables()
        .iter()
        .map(|t| t.size().iter().product::<i64>())
        .sum();
    println!("✓ Model initialized with {} trainable parameters\n", total_params);

    let mut trainer = Trainer::new(model, vs, config.clone(), device);

    // Train
    println!("Starting training...");
    println!("{}\n", "=".repeat(50));
    trainer.train(&train_data, &val_data, &tokenizer, EPOCHS, MODEL_PATH)?;

    println!("\nSaving final model...");
    trainer.save_model(MODEL_PATH)?;
    println!("✓ Model saved to {}", MODEL_PATH);

    // Model kedua (mode inference) dengan bobot hasil training
    println!("\n{}", "=".repeat(50));
    println!("Restoring weights into a forward-only model...");
    let mut infer_vs = nn::VarStore::new(device);
    infer_vs.set_kind(tch::Kind::Float);
    let infer_model = ChatSeq2Seq::build(&infer_vs, &config, CellType::Lstm, true, true, true)?;
    infer_vs.load(MODEL_PATH)?;
    println!("✓ Weights restored from {}", MODEL_PATH);

    println!("\nTesting replies on validation samples...");
    println!("{}\n", "=".repeat(50));
    sample_chat(&infer_model, &val_data, &tokenizer, &config, device)?;

    Ok(())
}

/// Balasan greedy untuk satu prompt: encode, decode sampai EOS, detokenisasi
fn generate_reply(
    model: &ChatSeq2Seq,
    tokenizer: &DualTokenizer,
    prompt: &str,
    config: &ChatConfig,
    device: Device,
) -> Result<String> {
    let sl = config.max_encoder_len().unwrap_or(40);

    let ids = tokenizer.prompt.encode_row(prompt, sl as usize, false, true);
    let length = ids.iter().filter(|&&id| id != PAD_ID as usize).count() as i64;

    let id_data: Vec<i64> = ids.iter().map(|&x| x as i64).collect();
    let encoder_inputs = Tensor::from_slice(&id_data).view([sl, 1]).to(device); // [T,1]
    let encoder_inputs_length = Tensor::from_slice(&[length]).to(device);

    let prediction = model.respond(&encoder_inputs, &encoder_inputs_length)?; // [T,1]

    let mut reply_ids = Vec::new();
    for t in 0..prediction.size()[0] {
        let id = i64::try_from(&prediction.get(t).get(0)).unwrap_or(EOS_ID);
        if id == EOS_ID {
            break;
        }
        reply_ids.push(id as usize);
    }

    Ok(tokenizer.reply.decode(&reply_ids))
}

fn sample_chat(
    model: &ChatSeq2Seq,
    val_data: &[(String, String)],
    tokenizer: &DualTokenizer,
    config: &ChatConfig,
    device: Device,
) -> Result<()> {
    use rand::seq::SliceRandom;
    let mut rng = rand::thread_rng();

    let samples: Vec<_> = val_data.choose_multiple(&mut rng, 5).collect();

    let mut total_bleu = 0.0;
    let mut total_rouge = 0.0;

    for (i, (prompt, reference)) in samples.iter().enumerate() {
        println!("\n--- Sample {} ---", i + 1);
        println!("Prompt:    {}", prompt);
        println!("Reference: {}", reference);

        let reply = generate_reply(model, tokenizer, prompt, config, device)?;
        println!("Generated: {}", reply);

        let bleu = bleu_score(reference, &reply);
        println!(
            "\nBLEU Scores:\n  BLEU-1: {:.4}  BLEU-2: {:.4}  BLEU-3: {:.4}  BLEU-4: {:.4}",
            bleu.bleu_1, bleu.bleu_2, bleu.bleu_3, bleu.bleu_4
        );
        println!("  Overall BLEU: {:.4}", bleu.bleu);

        let rouge = rouge_1(reference, &reply);
        println!(
            "  ROUGE-1: P={:.3} R={:.3} F1={:.3}",
            rouge.precision, rouge.recall, rouge.f1
        );
        println!("{}", "-".repeat(50));

        total_bleu += bleu.bleu;
        total_rouge += rouge.f1;
    }

    if !samples.is_empty() {
        println!("\n{}", "=".repeat(50));
        println!("Average BLEU:    {:.4}", total_bleu / samples.len() as f64);
        println!("Average ROUGE-1: {:.4}", total_rouge / samples.len() as f64);
        println!("{}", "=".repeat(50));
    }

    Ok(())
}
