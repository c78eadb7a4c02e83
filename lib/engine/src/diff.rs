use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// An additive perturbation to a network's weights and biases.
///
/// Shapes mirror the owning network layer for layer. Diffs form a vector
/// space: they add, subtract, scale and negate, which is all the local
/// search needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetDiff {
    pub(crate) weight_diffs: Vec<Array2<f32>>,
    pub(crate) bias_diffs: Vec<Array1<f32>>,
    pub(crate) layer_sizes: Vec<usize>,
}

impl NetDiff {
    /// All-zero diff for the given layer sizes.
    #[must_use]
    pub fn zeros(layer_sizes: &[usize]) -> Self {
        let mut weight_diffs = Vec::with_capacity(layer_sizes.len().saturating_sub(1));
        let mut bias_diffs = Vec::with_capacity(layer_sizes.len().saturating_sub(1));

        for window in layer_sizes.windows(2) {
            weight_diffs.push(Array2::zeros((window[1], window[0])));
            bias_diffs.push(Array1::zeros(window[1]));
        }

        Self {
            weight_diffs,
            bias_diffs,
            layer_sizes: layer_sizes.to_vec(),
        }
    }

    /// Random diff with every element uniform in [-1, 1].
    #[must_use]
    pub fn random<R: Rng>(layer_sizes: &[usize], rng: &mut R) -> Self {
        let mut weight_diffs = Vec::with_capacity(layer_sizes.len().saturating_sub(1));
        let mut bias_diffs = Vec::with_capacity(layer_sizes.len().saturating_sub(1));

        for window in layer_sizes.windows(2) {
            weight_diffs.push(Array2::from_shape_fn((window[1], window[0]), |_| {
                rng.random_range(-1.0f32..1.0f32)
            }));
            bias_diffs.push(Array1::from_shape_fn(window[1], |_| {
                rng.random_range(-1.0f32..1.0f32)
            }));
        }

        Self {
            weight_diffs,
            bias_diffs,
            layer_sizes: layer_sizes.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Negate every element in place.
    pub fn invert(&mut self) {
        for weights in &mut self.weight_diffs {
            weights.mapv_inplace(|v| -v);
        }
        for biases in &mut self.bias_diffs {
            biases.mapv_inplace(|v| -v);
        }
    }

    #[must_use]
    pub fn inverted(&self) -> Self {
        let mut inverted = self.clone();
        inverted.invert();
        inverted
    }

    /// Multiply every element by `factor` in place.
    pub fn scale(&mut self, factor: f32) {
        for weights in &mut self.weight_diffs {
            weights.mapv_inplace(|v| v * factor);
        }
        for biases in &mut self.bias_diffs {
            biases.mapv_inplace(|v| v * factor);
        }
    }
}

impl Add for &NetDiff {
    type Output = NetDiff;

    fn add(self, other: &NetDiff) -> NetDiff {
        assert_eq!(self.layer_sizes, other.layer_sizes);
        NetDiff {
            weight_diffs: self
                .weight_diffs
                .iter()
                .zip(&other.weight_diffs)
                .map(|(a, b)| a + b)
                .collect(),
            bias_diffs: self
                .bias_diffs
                .iter()
                .zip(&other.bias_diffs)
                .map(|(a, b)| a + b)
                .collect(),
            layer_sizes: self.layer_sizes.clone(),
        }
    }
}

impl Sub for &NetDiff {
    type Output = NetDiff;

    fn sub(self, other: &NetDiff) -> NetDiff {
        assert_eq!(self.layer_sizes, other.layer_sizes);
        NetDiff {
            weight_diffs: self
                .weight_diffs
                .iter()
                .zip(&other.weight_diffs)
                .map(|(a, b)| a - b)
                .collect(),
            bias_diffs: self
                .bias_diffs
                .iter()
                .zip(&other.bias_diffs)
                .map(|(a, b)| a - b)
                .collect(),
            layer_sizes: self.layer_sizes.clone(),
        }
    }
}

impl Mul<f32> for &NetDiff {
    type Output = NetDiff;

    fn mul(self, factor: f32) -> NetDiff {
        let mut scaled = self.clone();
        scaled.scale(factor);
        scaled
    }
}
