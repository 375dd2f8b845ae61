// src/metrics.rs
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Default)]
pub struct BleuScore {
    pub bleu_1: f64,
    pub bleu_2: f64,
    pub bleu_3: f64,
    pub bleu_4: f64,
    pub bleu: f64, // Geometric mean of 1-4 grams
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Rouge {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(|t| t.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .filter(|t| !t.is_empty())
        .collect()
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut map = HashMap::new();
    if n == 0 || tokens.len() < n {
        return map;
    }
    for window in tokens.windows(n) {
        *map.entry(window).or_insert(0) += 1;
    }
    map
}

/// (overlap terklip, total n-gram kandidat, total n-gram referensi)
fn clipped_overlap(reference: &[String], candidate: &[String], n: usize) -> (usize, usize, usize) {
    let ref_ngrams = ngram_counts(reference, n);
    let cand_ngrams = ngram_counts(candidate, n);

    let cand_total: usize = cand_ngrams.values().sum();
    let ref_total: usize = ref_ngrams.values().sum();

    let mut overlap = 0;
    for (ngram, &cand_count) in cand_ngrams.iter() {
        let ref_count = ref_ngrams.get(ngram).copied().unwrap_or(0);
        overlap += cand_count.min(ref_count);
    }

    (overlap, cand_total, ref_total)
}

/// BLEU dengan brevity penalty; nol kalau salah satu presisi n-gram nol
pub fn bleu_score(reference: &str, candidate: &str) -> BleuScore {
    let ref_tok = tokenize(reference);
    let cand_tok = tokenize(candidate);

    if ref_tok.is_empty() || cand_tok.is_empty() {
        return BleuScore::default();
    }

    let mut precisions = [0.0f64; 4];
    for n in 1..=4 {
        let (overlap, cand_total, _) = clipped_overlap(&ref_tok, &cand_tok, n);
        precisions[n - 1] = if cand_total > 0 {
            overlap as f64 / cand_total as f64
        } else {
            0.0
        };
    }

    // Brevity penalty
    let c = cand_tok.len() as f64;
    let r = ref_tok.len() as f64;
    let bp = if c > r {
        1.0
    } else if c > 0.0 {
        (1.0 - r / c).exp()
    } else {
        0.0
    };

    let bleu = if precisions.iter().all(|&p| p > 0.0) {
        bp * precisions.iter().product::<f64>().powf(0.25)
    } else {
        0.0
    };

    BleuScore {
        bleu_1: precisions[0],
        bleu_2: precisions[1],
        bleu_3: precisions[2],
        bleu_4: precisions[3],
        bleu,
    }
}

/// ROUGE-1: overlap unigram antara referensi dan kandidat
pub fn rouge_1(reference: &str, candidate: &str) -> Rouge {
    let ref_tok = tokenize(reference);
    let cand_tok = tokenize(candidate);

    let (overlap, cand_total, ref_total) = clipped_overlap(&ref_tok, &cand_tok, 1);

    if ref_total == 0 || cand_total == 0 {
        return Rouge::default();
    }

    let precision = overlap as f64 / cand_total as f64;
    let recall = overlap as f64 / ref_total as f64;
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Rouge { precision, recall, f1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sentences_score_one() {
        let s = "the quick brown fox jumps over the lazy dog";
        let bleu = bleu_score(s, s);
        assert!((bleu.bleu - 1.0).abs() < 1e-9);
        assert!((bleu.bleu_4 - 1.0).abs() < 1e-9);

        let rouge = rouge_1(s, s);
        assert!((rouge.f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_sentences_score_zero() {
        let bleu = bleu_score("one two three four", "alpha beta gamma delta");
        assert_eq!(bleu.bleu, 0.0);

        let rouge = rouge_1("one two three four", "alpha beta gamma delta");
        assert_eq!(rouge.f1, 0.0);
    }

    #[test]
    fn empty_candidate_is_default() {
        let bleu = bleu_score("some reference text", "");
        assert_eq!(bleu.bleu, 0.0);
        assert_eq!(bleu.bleu_1, 0.0);
    }

    #[test]
    fn short_candidate_is_penalized() {
        // Kandidat benar tapi pendek: presisi 1, BLEU < 1 karena brevity
        let bleu = bleu_score("a b c d e f g h", "a b c d");
        assert!((bleu.bleu_1 - 1.0).abs() < 1e-9);
        assert!(bleu.bleu < 1.0);
        assert!(bleu.bleu > 0.0);
    }
}
