//! Term statistics: tokenizers, stop-words, per-file keywords, TF-IDF
//! cluster naming, and filename-token fallbacks.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]{3,}").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9]{2,}").unwrap());
static FILENAME_SEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_\-.]").unwrap());

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has",
        "had", "do", "does", "did", "will", "would", "shall", "should", "may", "might", "can",
        "could", "and", "but", "or", "nor", "for", "yet", "so", "in", "on", "at", "to", "from",
        "by", "with", "of", "about", "into", "through", "during", "before", "after", "above",
        "below", "between", "this", "that", "these", "those", "it", "its", "i", "we", "they",
        "he", "she", "you", "my", "your", "his", "her", "our", "their", "not", "no", "as",
        "if", "then", "than", "also", "just", "more", "most", "very", "much", "many", "some",
        "any", "each", "every", "all", "both", "such", "only", "same", "other", "new", "old",
        "one", "two", "three", "first", "last", "long", "great", "which", "what", "when",
        "where", "how", "who", "whom", "there", "here", "up", "out", "over",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Top-N alphabetic tokens (length ≥ 3) by frequency, stop-words excluded.
/// Used for the per-file keyword list in snapshots.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in WORD_RE.find_iter(&lower) {
        let word = m.as_str();
        if !is_stopword(word) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(w, _)| w.to_string())
        .collect()
}

/// Top terms of a document group by average TF-IDF, over 1- and 2-grams with
/// stop-words removed. Mirrors the usual smooth-idf + per-document L2
/// normalization, restricted to the ten most frequent corpus terms.
pub fn tfidf_top_terms(texts: &[&str], top_n: usize) -> Vec<String> {
    const MAX_FEATURES: usize = 10;

    let docs: Vec<Vec<String>> = texts.iter().map(|t| ngram_tokens(t)).collect();
    let n_docs = docs.len();
    if n_docs == 0 {
        return vec![];
    }

    // Corpus counts pick the candidate features.
    let mut corpus_counts: HashMap<&str, usize> = HashMap::new();
    for doc in &docs {
        for term in doc {
            *corpus_counts.entry(term.as_str()).or_insert(0) += 1;
        }
    }
    let mut candidates: Vec<(&str, usize)> = corpus_counts.iter().map(|(t, c)| (*t, *c)).collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let features: Vec<&str> = candidates
        .into_iter()
        .take(MAX_FEATURES)
        .map(|(t, _)| t)
        .collect();
    if features.is_empty() {
        return vec![];
    }
    let feature_index: HashMap<&str, usize> =
        features.iter().enumerate().map(|(i, t)| (*t, i)).collect();

    // Document frequency per feature.
    let mut df = vec![0usize; features.len()];
    for doc in &docs {
        let present: HashSet<&str> = doc.iter().map(String::as_str).collect();
        for (term, idx) in &feature_index {
            if present.contains(term) {
                df[*idx] += 1;
            }
        }
    }

    // Smooth idf, tf·idf per document, L2-normalized, then averaged.
    let idf: Vec<f64> = df
        .iter()
        .map(|d| ((1.0 + n_docs as f64) / (1.0 + *d as f64)).ln() + 1.0)
        .collect();

    let mut avg = vec![0.0f64; features.len()];
    for doc in &docs {
        let mut tf = vec![0.0f64; features.len()];
        for term in doc {
            if let Some(idx) = feature_index.get(term.as_str()) {
                tf[*idx] += 1.0;
            }
        }
        let mut weighted: Vec<f64> = tf.iter().zip(&idf).map(|(t, i)| t * i).collect();
        let norm: f64 = weighted.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in weighted.iter_mut() {
                *w /= norm;
            }
        }
        for (a, w) in avg.iter_mut().zip(&weighted) {
            *a += w / n_docs as f64;
        }
    }

    let mut ranked: Vec<(usize, f64)> = avg
        .iter()
        .enumerate()
        .filter(|(_, score)| **score > 0.0)
        .map(|(i, score)| (i, *score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| features[a.0].cmp(features[b.0]))
    });

    ranked
        .into_iter()
        .take(top_n)
        .map(|(i, _)| features[i].to_string())
        .collect()
}

fn ngram_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let unigrams: Vec<&str> = TOKEN_RE
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
        .collect();

    let mut tokens: Vec<String> = unigrams.iter().map(|t| t.to_string()).collect();
    for pair in unigrams.windows(2) {
        tokens.push(format!("{} {}", pair[0], pair[1]));
    }
    tokens
}

/// Name a group from filename token frequency (tokens longer than 3 chars,
/// separators normalized to spaces). `None` when nothing usable remains.
pub fn name_from_filenames(file_names: &[&str]) -> Option<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in file_names.iter().take(10) {
        let stem = std::path::Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());
        let cleaned = FILENAME_SEP_RE.replace_all(&stem, " ").to_lowercase();
        for word in cleaned.split_whitespace().filter(|w| w.len() > 3) {
            *counts.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    if counts.is_empty() {
        return None;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let name = ranked
        .into_iter()
        .take(2)
        .map(|(w, _)| title_case(&w))
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() { None } else { Some(name) }
}

pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Truncate at a word boundary, appending an ellipsis.
pub fn smart_truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let head: String = text.chars().take(max_len).collect();
    let cut = head.rfind(' ').unwrap_or(head.len());
    format!("{}...", &head[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_skip_stopwords_and_short_words() {
        let keywords = extract_keywords(
            "the cell cell cell membrane membrane protein is in the lab an ox",
            5,
        );
        assert_eq!(keywords[0], "cell");
        assert_eq!(keywords[1], "membrane");
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"ox".to_string()));
    }

    #[test]
    fn tfidf_surfaces_dominant_terms() {
        let texts = [
            "lorem ipsum dolor sit amet lorem ipsum",
            "lorem ipsum consectetur adipiscing elit",
            "lorem ipsum dolor magna aliqua",
        ];
        let terms = tfidf_top_terms(&texts, 2);
        assert_eq!(terms.len(), 2);
        assert!(terms.iter().any(|t| t.contains("lorem")));
    }

    #[test]
    fn tfidf_handles_empty_group() {
        assert!(tfidf_top_terms(&[], 2).is_empty());
        assert!(tfidf_top_terms(&["", ""], 2).is_empty());
    }

    #[test]
    fn filename_naming_prefers_common_tokens() {
        let name = name_from_filenames(&[
            "quarterly_report_2023.txt",
            "quarterly_report_2024.txt",
            "summary_notes.txt",
        ])
        .unwrap();
        assert!(name.contains("Quarterly") || name.contains("Report"));
    }

    #[test]
    fn filename_naming_returns_none_for_short_tokens() {
        assert!(name_from_filenames(&["a_b.txt", "c-d.txt"]).is_none());
        assert!(name_from_filenames(&[]).is_none());
    }

    #[test]
    fn smart_truncate_cuts_at_word_boundary() {
        let text = "alpha beta gamma delta epsilon";
        let cut = smart_truncate(text, 12);
        assert_eq!(cut, "alpha beta...");
        assert_eq!(smart_truncate("short", 12), "short");
    }
}
