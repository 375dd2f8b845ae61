// src/tokenizer.rs - vocab terpisah untuk prompt dan reply
use anyhow::Result;
use std::collections::HashMap;

use crate::config::{EOS_ID, EOS_TOKEN, GO_ID, GO_TOKEN, PAD_ID, PAD_TOKEN, UNK_ID, UNK_TOKEN};

/// Word-level tokenizer dengan vocabulary dibatasi frekuensi.
/// Id 0..=3 selalu token spesial (PAD/GO/EOS/UNK).
pub struct Tokenizer {
    word2idx: HashMap<String, usize>,
    idx2word: HashMap<usize, String>,
    max_vocab_size: usize,
}

impl Tokenizer {
    pub fn new(max_vocab_size: usize) -> Self {
        let specials = [
            (PAD_ID, PAD_TOKEN),
            (GO_ID, GO_TOKEN),
            (EOS_ID, EOS_TOKEN),
            (UNK_ID, UNK_TOKEN),
        ];

        let mut word2idx = HashMap::new();
        let mut idx2word = HashMap::new();
        for (id, token) in specials {
            word2idx.insert(token.to_string(), id as usize);
            idx2word.insert(id as usize, token.to_string());
        }

        Self { word2idx, idx2word, max_vocab_size }
    }

    /// Bangun vocabulary dari iterator teks; kata diurutkan per frekuensi
    pub fn fit_from_texts<'a, I>(&mut self, texts: I) -> Result<()>
    where
        I: Iterator<Item = &'a String>,
    {
        let word_counts: HashMap<String, usize> = texts
            .flat_map(|text| text.split_whitespace().map(String::from))
            .fold(HashMap::new(), |mut acc, word| {
                *acc.entry(word).or_insert(0) += 1;
                acc
            });

        let mut word_freq: Vec<_> = word_counts.into_iter().collect();
        word_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let max_words = self.max_vocab_size.saturating_sub(4);
        for (word, _) in word_freq.into_iter().take(max_words) {
            let idx = self.word2idx.len();
            self.word2idx.entry(word.clone()).or_insert(idx);
            self.idx2word.entry(idx).or_insert(word);
        }

        Ok(())
    }

    pub fn encode(&self, text: &str) -> Vec<usize> {
        text.split_whitespace()
            .map(|word| *self.word2idx.get(word).unwrap_or(&(UNK_ID as usize)))
            .collect()
    }

    pub fn decode(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .filter_map(|&idx| {
                let word = self.idx2word.get(&idx)?;
                if word == PAD_TOKEN || word == GO_TOKEN || word == EOS_TOKEN {
                    None
                } else {
                    Some(word.as_str())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn vocab_size(&self) -> usize {
        self.word2idx.len()
    }

    /// Encode jadi baris fixed-length: [GO?] kata... [EOS?] PAD...
    /// EOS selalu dipertahankan kalau diminta (kata dipotong lebih dulu).
    pub fn encode_row(&self, text: &str, max_len: usize, add_go: bool, add_eos: bool) -> Vec<usize> {
        let mut row = Vec::with_capacity(max_len);
        if add_go {
            row.push(GO_ID as usize);
        }
        row.extend(self.encode(text));

        if add_eos {
            row.truncate(max_len - 1);
            row.push(EOS_ID as usize);
        } else {
            row.truncate(max_len);
        }

        while row.len() < max_len {
            row.push(PAD_ID as usize);
        }
        row
    }
}

/// Pasangan tokenizer: satu untuk sisi prompt, satu untuk sisi reply
/// (ukuran vocab input dan target bisa beda).
pub struct DualTokenizer {
    pub prompt: Tokenizer,
    pub reply: Tokenizer,
}

impl DualTokenizer {
    pub fn new(prompt_vocab_size: usize, reply_vocab_size: usize) -> Self {
        Self {
            prompt: Tokenizer::new(prompt_vocab_size),
            reply: Tokenizer::new(reply_vocab_size),
        }
    }

    /// Bangun kedua vocabulary dari korpus paralel (prompt, reply)
    pub fn fit(&mut self, pairs: &[(String, String)]) -> Result<()> {
        println!("  Building prompt vocabulary...");
        self.prompt.fit_from_texts(pairs.iter().map(|(p, _)| p))?;

        println!("  Building reply vocabulary...");
        self.reply.fit_from_texts(pairs.iter().map(|(_, r)| r))?;

        Ok(())
    }

    pub fn prompt_vocab_size(&self) -> usize {
        self.prompt.vocab_size()
    }

    pub fn reply_vocab_size(&self) -> usize {
        self.reply.vocab_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> Tokenizer {
        let mut tok = Tokenizer::new(100);
        let texts = vec![
            "hello how are you".to_string(),
            "hello there".to_string(),
            "how are things".to_string(),
        ];
        tok.fit_from_texts(texts.iter()).unwrap();
        tok
    }

    #[test]
    fn special_ids_are_reserved() {
        let tok = Tokenizer::new(10);
        assert_eq!(tok.vocab_size(), 4);
        assert_eq!(tok.encode("neverseen"), vec![UNK_ID as usize]);
    }

    #[test]
    fn encode_decode_round_trip() {
        let tok = fitted();
        let ids = tok.encode("hello how are you");
        assert_eq!(tok.decode(&ids), "hello how are you");
    }

    #[test]
    fn encode_row_pads_and_keeps_eos() {
        let tok = fitted();
        let row = tok.encode_row("hello how are you", 8, true, true);
        assert_eq!(row.len(), 8);
        assert_eq!(row[0], GO_ID as usize);
        assert_eq!(row[5], EOS_ID as usize);
        assert_eq!(row[6], PAD_ID as usize);

        // Kalimat panjang: kata dipotong, EOS tetap di akhir
        let row = tok.encode_row("hello how are you hello how are you", 4, false, true);
        assert_eq!(row.len(), 4);
        assert_eq!(row[3], EOS_ID as usize);
    }

    #[test]
    fn vocab_size_is_capped() {
        let mut tok = Tokenizer::new(6);
        let texts = vec!["a b c d e f g h".to_string()];
        tok.fit_from_texts(texts.iter()).unwrap();
        assert_eq!(tok.vocab_size(), 6);
    }
}
