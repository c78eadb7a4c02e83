use crate::embedding::Embedding;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A word paired with its embedding. Immutable once constructed; the word is
/// the exact-match key in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordVector {
    pub word: String,
    pub embedding: Embedding,
}

impl WordVector {
    #[inline]
    #[must_use]
    pub fn new(word: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            word: word.into(),
            embedding,
        }
    }

    #[must_use]
    pub fn random<R: Rng>(word: impl Into<String>, dim: usize, rng: &mut R) -> Self {
        Self {
            word: word.into(),
            embedding: Embedding::random(dim, rng),
        }
    }

    #[inline]
    #[must_use]
    pub fn zeroed(word: impl Into<String>, dim: usize) -> Self {
        Self {
            word: word.into(),
            embedding: Embedding::zeros(dim),
        }
    }
}

/// A search hit with its score. Fuzzy search scores by string-edit ratio,
/// vector search by the embedding similarity formula.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub word: WordVector,
    pub similarity: f32,
}

impl SearchResult {
    #[inline]
    #[must_use]
    pub fn new(word: WordVector, similarity: f32) -> Self {
        Self { word, similarity }
    }
}
