use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Default embedding dimension.
pub const EMBEDDING_DIM: usize = 32;

/// A fixed-length vector of floats representing a word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    /// Random embedding with components uniform in [-1, 1].
    #[must_use]
    pub fn random<R: Rng>(dim: usize, rng: &mut R) -> Self {
        Self {
            data: (0..dim).map(|_| rng.random_range(-1.0f32..1.0f32)).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Squared Euclidean distance to another embedding of the same dimension.
    #[inline]
    pub fn squared_distance(&self, other: &Embedding) -> f32 {
        assert_eq!(self.dim(), other.dim());
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }

    /// Similarity score `1 - d²/(4·dim)`.
    ///
    /// Assumes components roughly in [-1, 1]; the score is not clamped and
    /// can leave [0, 1] for embeddings outside that range. Callers rank by
    /// the raw value.
    #[inline]
    pub fn similarity(&self, other: &Embedding) -> f32 {
        1.0 - self.squared_distance(other) / (4 * self.dim()) as f32
    }
}

impl Add for &Embedding {
    type Output = Embedding;

    fn add(self, other: &Embedding) -> Embedding {
        assert_eq!(self.dim(), other.dim());
        Embedding::new(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a + b)
                .collect(),
        )
    }
}

impl Sub for &Embedding {
    type Output = Embedding;

    fn sub(self, other: &Embedding) -> Embedding {
        assert_eq!(self.dim(), other.dim());
        Embedding::new(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a - b)
                .collect(),
        )
    }
}

impl Mul<f32> for &Embedding {
    type Output = Embedding;

    fn mul(self, scalar: f32) -> Embedding {
        Embedding::new(self.data.iter().map(|x| x * scalar).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_embeddings_have_similarity_one() {
        let a = Embedding::new(vec![0.5, -0.25, 1.0, 0.0]);
        let b = a.clone();
        assert!((a.similarity(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_formula() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![-1.0, 0.0]);
        // d² = 4, dim = 2 -> 1 - 4/8 = 0.5
        assert!((a.similarity(&b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_similarity_is_not_clamped() {
        let a = Embedding::new(vec![3.0, 0.0]);
        let b = Embedding::new(vec![-3.0, 0.0]);
        assert!(a.similarity(&b) < 0.0);
    }

    #[test]
    fn test_random_range() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let e = Embedding::random(16, &mut rng);
        assert_eq!(e.dim(), 16);
        assert!(e.as_slice().iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_ops() {
        let a = Embedding::new(vec![1.0, 2.0]);
        let b = Embedding::new(vec![0.5, 0.5]);
        assert_eq!((&a + &b).as_slice(), &[1.5, 2.5]);
        assert_eq!((&a - &b).as_slice(), &[0.5, 1.5]);
        assert_eq!((&a * 2.0).as_slice(), &[2.0, 4.0]);
    }
}
