//! Document embedding.
//!
//! The pipeline consumes embeddings through the [`Embedder`] trait. Long
//! documents are chunked at sentence boundaries, each chunk embedded, and the
//! chunk vectors combined with a front-weighted average (the opening of a
//! document carries more of its identity than the tail), then unit-normalized.
//!
//! The default implementation is a deterministic lexical feature-hashing
//! embedder: documents sharing vocabulary land close together, identical
//! bytes produce identical vectors, and no model download is involved. The
//! `onnx-embedder` feature swaps in `all-MiniLM-L6-v2` via fastembed at the
//! same dimensionality.

use crate::error::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Embedding dimension shared by the lexical and the MiniLM embedder.
pub const EMBEDDING_DIM: usize = 384;

/// Characters per chunk for long-document embedding.
const CHUNK_SIZE: usize = 500;

/// Maximum chunks per document (covers roughly the first 10k characters).
const MAX_CHUNKS: usize = 20;

/// Chunks shorter than this carry no signal and are discarded.
const MIN_CHUNK_LEN: usize = 20;

pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    /// Embed a batch of text chunks. One vector per input, in order.
    fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;
}

/// Embed a whole document per the chunk-average contract.
/// Empty or whitespace-only text yields an all-zero vector.
pub fn embed_document(embedder: &dyn Embedder, text: &str) -> AppResult<Vec<f32>> {
    let dim = embedder.dimension();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(vec![0.0; dim]);
    }

    if trimmed.len() <= CHUNK_SIZE {
        let mut vector = first_vector(embedder.embed_batch(&[trimmed.to_string()])?)?;
        normalize(&mut vector);
        return Ok(vector);
    }

    let chunks = split_into_chunks(trimmed);
    if chunks.is_empty() {
        return Ok(vec![0.0; dim]);
    }

    let chunk_vectors = embedder.embed_batch(&chunks)?;

    // Front-weighted average: weight 1/(1 + 0.1·i) for chunk i.
    let weights: Vec<f32> = (0..chunk_vectors.len())
        .map(|i| 1.0 / (1.0 + 0.1 * i as f32))
        .collect();
    let weight_sum: f32 = weights.iter().sum();

    let mut averaged = vec![0.0f32; dim];
    for (weight, vector) in weights.iter().zip(&chunk_vectors) {
        for (acc, component) in averaged.iter_mut().zip(vector) {
            *acc += (weight / weight_sum) * component;
        }
    }

    normalize(&mut averaged);
    Ok(averaged)
}

fn first_vector(mut batch: Vec<Vec<f32>>) -> AppResult<Vec<f32>> {
    if batch.is_empty() {
        return Err(AppError::Embedding("embedder returned no vectors".into()));
    }
    Ok(batch.swap_remove(0))
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for component in vector.iter_mut() {
            *component /= norm;
        }
    }
}

/// Split text into chunks of at most `CHUNK_SIZE` characters, preferring
/// sentence boundaries and falling back to word boundaries for run-on
/// sentences.
fn split_into_chunks(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        if chunks.len() >= MAX_CHUNKS {
            break;
        }

        if current.len() + sentence.len() < CHUNK_SIZE {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if sentence.len() > CHUNK_SIZE {
            // Run-on sentence: pack word by word.
            for word in sentence.split_whitespace() {
                if current.len() + word.len() + 1 > CHUNK_SIZE && !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    if chunks.len() >= MAX_CHUNKS {
                        break;
                    }
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        } else {
            current = sentence.to_string();
        }
    }

    if !current.is_empty() && chunks.len() < MAX_CHUNKS {
        chunks.push(current);
    }

    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| c.len() > MIN_CHUNK_LEN)
        .take(MAX_CHUNKS)
        .collect()
}

/// Split on sentence-ending punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();

    for (i, b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?')
            && bytes.get(i + 1).is_some_and(|n| n.is_ascii_whitespace())
        {
            let piece = text[start..=i].trim();
            if !piece.is_empty() {
                sentences.push(piece);
            }
            start = i + 1;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

/// Deterministic lexical embedder using the hashing trick: each token maps to
/// a signed bucket derived from its SHA-256 digest. Word-overlap between
/// documents translates into cosine similarity, which is all the clustering
/// stage needs.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self { dim: EMBEDDING_DIM }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; self.dim];
                let lower = text.to_lowercase();
                for token in lower
                    .split(|c: char| !c.is_ascii_alphanumeric())
                    .filter(|t| t.len() >= 2)
                {
                    let digest = Sha256::digest(token.as_bytes());
                    let mut head = [0u8; 8];
                    head.copy_from_slice(&digest[..8]);
                    let bucket = u64::from_le_bytes(head) as usize % self.dim;
                    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
                    vector[bucket] += sign;
                }
                normalize(&mut vector);
                vector
            })
            .collect())
    }
}

/// ONNX `all-MiniLM-L6-v2` embedder via fastembed. Same 384-dim space the
/// lexical embedder advertises, with actual semantics.
#[cfg(feature = "onnx-embedder")]
pub mod onnx {
    use super::{EMBEDDING_DIM, Embedder};
    use crate::error::{AppError, AppResult};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    pub struct OnnxEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl OnnxEmbedder {
        pub fn new() -> AppResult<Self> {
            let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(false);
            let model = TextEmbedding::try_new(options)
                .map_err(|e| AppError::Embedding(format!("model init failed: {e}")))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for OnnxEmbedder {
        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }

        fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let mut model = self
                .model
                .lock()
                .map_err(|e| AppError::Embedding(format!("model lock poisoned: {e}")))?;
            model
                .embed(texts.to_vec(), None)
                .map_err(|e| AppError::Embedding(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new();
        let v = embed_document(&embedder, "   \n\t ").unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn embedding_is_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embed_document(&embedder, "quantum mechanics and wave functions").unwrap();
        let b = embed_document(&embedder, "quantum mechanics and wave functions").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn embedding_is_unit_length() {
        let embedder = HashEmbedder::new();
        let v = embed_document(&embedder, "a modest amount of text about gardening").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn similar_texts_are_closer_than_dissimilar() {
        let embedder = HashEmbedder::new();
        let a = embed_document(&embedder, "quantum physics particle wave energy").unwrap();
        let b = embed_document(&embedder, "quantum physics particle momentum energy").unwrap();
        let c = embed_document(&embedder, "banana bread recipe flour sugar butter").unwrap();
        let sim_ab: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let sim_ac: f32 = a.iter().zip(&c).map(|(x, y)| x * y).sum();
        assert!(sim_ab > sim_ac);
    }

    #[test]
    fn long_text_is_chunked_and_normalized() {
        let embedder = HashEmbedder::new();
        let long = "The experiment measured particle momentum. ".repeat(60);
        let v = embed_document(&embedder, &long).unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn sentences_split_on_terminators() {
        let s = split_sentences("One sentence. Another one! A third? tail");
        assert_eq!(s, vec!["One sentence.", "Another one!", "A third?", "tail"]);
    }

    #[test]
    fn chunks_respect_size_and_count_limits() {
        let long = "word ".repeat(5000);
        let chunks = split_into_chunks(&long);
        assert!(chunks.len() <= MAX_CHUNKS);
        assert!(chunks.iter().all(|c| c.len() <= CHUNK_SIZE + 1));
        assert!(chunks.iter().all(|c| c.len() > MIN_CHUNK_LEN));
    }
}
