// src/data_loader.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::HashSet;

/// Korpus percakapan (prompt, reply) dari CSV dua kolom.
/// Expected CSV format: | prompt | reply |
pub struct DialogCorpus {
    pairs: Vec<(String, String)>,
}

impl DialogCorpus {
    pub fn from_csv(csv_path: &str, max_prompt_words: usize, max_reply_words: usize) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(csv_path)
            .context("Failed to open CSV file")?;

        let mut pairs = Vec::new();

        for result in reader.records() {
            let record = result.context("Failed to read CSV record")?;

            if record.len() < 2 {
                continue; // Skip malformed rows
            }

            let prompt = record[0].trim().to_string();
            let reply = record[1].trim().to_string();

            // Buang baris kosong atau terlalu panjang
            let prompt_words = prompt.split_whitespace().count();
            let reply_words = reply.split_whitespace().count();

            if prompt.is_empty()
                || reply.is_empty()
                || prompt_words > max_prompt_words
                || reply_words > max_reply_words
            {
                continue;
            }

            pairs.push((prompt, reply));
        }

        Ok(Self { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn unique_prompt_count(&self) -> usize {
        self.pairs.iter().map(|(p, _)| p).collect::<HashSet<_>>().len()
    }

    pub fn unique_reply_count(&self) -> usize {
        self.pairs.iter().map(|(_, r)| r).collect::<HashSet<_>>().len()
    }

    /// Split urutan korpus jadi train dan validation
    pub fn train_val_split(&self, train_ratio: f64) -> (Vec<(String, String)>, Vec<(String, String)>) {
        let split_idx = (self.pairs.len() as f64 * train_ratio) as usize;
        let train = self.pairs[..split_idx].to_vec();
        let val = self.pairs[split_idx..].to_vec();
        (train, val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(name: &str, rows: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "prompt,reply").unwrap();
        write!(file, "{}", rows).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn loads_and_filters_rows() {
        let path = write_corpus(
            "dialog_corpus_filter.csv",
            "hi there,hello\n,\nhow are you,fine thanks\none two three four five,ok\n",
        );
        let corpus = DialogCorpus::from_csv(&path, 4, 4).unwrap();
        // baris kosong dan prompt 5 kata dibuang
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.pairs()[0].0, "hi there");
    }

    #[test]
    fn split_keeps_all_pairs() {
        let path = write_corpus(
            "dialog_corpus_split.csv",
            "a,b\nc,d\ne,f\ng,h\ni,j\n",
        );
        let corpus = DialogCorpus::from_csv(&path, 10, 10).unwrap();
        let (train, val) = corpus.train_val_split(0.8);
        assert_eq!(train.len(), 4);
        assert_eq!(val.len(), 1);
    }
}
