use crate::diff::NetDiff;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Costs below this are treated as good enough to bank the pending diff.
pub const GOOD_COST: f32 = 0.1;

/// Which branch of the training state machine a call took.
///
/// Note the inversion: the pending diff is negated and banked when cost
/// *improves*, the opposite of a conventional hill climb. The transition
/// enum keeps that branch observable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainTransition {
    /// First call: a fresh random pending diff was assigned, weights
    /// untouched.
    Seeded,
    /// Cost was good enough or beat the best seen: the pending diff was
    /// inverted and applied, the streak reset, and a new pending diff drawn.
    Reverted,
    /// Cost did not improve: the streak grew and the pending diff was
    /// rescaled by `1 + streak/10` without being applied.
    Rescaled,
}

/// A feed-forward network trained by diff-based local search. No gradients
/// anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralNet {
    iterations: u64,
    layer_sizes: Vec<usize>,
    weights: Vec<Array2<f32>>,
    biases: Vec<Array1<f32>>,
    pending_diff: NetDiff,
    best_cost_seen: f32,
    improvement_streak: u64,
}

impl NeuralNet {
    /// Build a network; weights and biases are uniform in [-1, 1] when
    /// `randomize` is set and zero otherwise.
    pub fn new(layer_sizes: Vec<usize>, randomize: bool) -> Result<Self> {
        if randomize {
            Self::random(layer_sizes, &mut rand::rng())
        } else {
            Self::build(layer_sizes, None::<&mut rand::rngs::ThreadRng>)
        }
    }

    /// Build a randomized network from a caller-supplied generator.
    pub fn random<R: Rng>(layer_sizes: Vec<usize>, rng: &mut R) -> Result<Self> {
        Self::build(layer_sizes, Some(rng))
    }

    fn build<R: Rng>(layer_sizes: Vec<usize>, rng: Option<&mut R>) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidLayerSizes(layer_sizes.len()));
        }

        let mut weights = Vec::with_capacity(layer_sizes.len() - 1);
        let mut biases = Vec::with_capacity(layer_sizes.len() - 1);

        if let Some(rng) = rng {
            for window in layer_sizes.windows(2) {
                let (rows, cols) = (window[1], window[0]);
                weights.push(Array2::from_shape_fn((rows, cols), |_| {
                    rng.random_range(-1.0f32..1.0f32)
                }));
                biases.push(Array1::from_shape_fn(rows, |_| {
                    rng.random_range(-1.0f32..1.0f32)
                }));
            }
        } else {
            for window in layer_sizes.windows(2) {
                weights.push(Array2::zeros((window[1], window[0])));
                biases.push(Array1::zeros(window[1]));
            }
        }

        let pending_diff = NetDiff::zeros(&layer_sizes);

        Ok(Self {
            iterations: 0,
            layer_sizes,
            weights,
            biases,
            pending_diff,
            best_cost_seen: 0.0,
            improvement_streak: 0,
        })
    }

    #[inline]
    #[must_use]
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    #[inline]
    #[must_use]
    pub fn input_len(&self) -> usize {
        self.layer_sizes.first().copied().unwrap_or(0)
    }

    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    #[inline]
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    #[inline]
    #[must_use]
    pub fn best_cost_seen(&self) -> f32 {
        self.best_cost_seen
    }

    #[inline]
    #[must_use]
    pub fn improvement_streak(&self) -> u64 {
        self.improvement_streak
    }

    #[inline]
    #[must_use]
    pub fn pending_diff(&self) -> &NetDiff {
        &self.pending_diff
    }

    /// Bounded, cheap sigmoid-like activation in (0, 1).
    #[inline]
    #[must_use]
    pub fn sigmoid_abs(value: f32) -> f32 {
        0.5 + value / (2.0 * (1.0 + value.abs()))
    }

    /// Feed `input` through every layer transition.
    pub fn compute(&self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.input_len() {
            return Err(Error::LayoutMismatch {
                expected: self.input_len(),
                actual: input.len(),
            });
        }

        let mut activations = Array1::from_vec(input.to_vec());
        for (weights, biases) in self.weights.iter().zip(&self.biases) {
            activations = (weights.dot(&activations) + biases).mapv(Self::sigmoid_abs);
        }

        Ok(activations.to_vec())
    }

    /// Elementwise add of the diff's matching components; biases and weights
    /// can each be suppressed independently.
    pub fn modify(&mut self, diff: &NetDiff, apply_biases: bool, apply_weights: bool) -> Result<()> {
        if diff.layer_sizes != self.layer_sizes {
            return Err(Error::DiffShapeMismatch {
                expected: self.layer_sizes.clone(),
                actual: diff.layer_sizes.clone(),
            });
        }

        self.apply_unchecked(diff, apply_biases, apply_weights);
        Ok(())
    }

    fn apply_unchecked(&mut self, diff: &NetDiff, apply_biases: bool, apply_weights: bool) {
        if apply_biases {
            for (biases, diff_biases) in self.biases.iter_mut().zip(&diff.bias_diffs) {
                *biases += diff_biases;
            }
        }

        if apply_weights {
            for (weights, diff_weights) in self.weights.iter_mut().zip(&diff.weight_diffs) {
                *weights += diff_weights;
            }
        }
    }

    /// One step of the diff-based local search.
    ///
    /// The first call only seeds a random pending diff. Afterwards: a cost
    /// under [`GOOD_COST`] or under the best seen banks the pending diff -
    /// inverted - into the weights, resets the streak and draws a fresh
    /// diff; any other cost grows the streak and rescales the pending diff
    /// by `1 + streak/10` without applying it.
    pub fn train<R: Rng>(&mut self, cost: f32, rng: &mut R) -> TrainTransition {
        if self.iterations == 0 {
            self.pending_diff = NetDiff::random(&self.layer_sizes, rng);
            self.iterations = 1;
            return TrainTransition::Seeded;
        }

        self.iterations += 1;

        if cost < GOOD_COST || cost < self.best_cost_seen {
            self.improvement_streak = 0;
            self.pending_diff.invert();
            let banked = std::mem::replace(
                &mut self.pending_diff,
                NetDiff::random(&self.layer_sizes, rng),
            );
            self.apply_unchecked(&banked, true, true);
            self.best_cost_seen = cost;
            TrainTransition::Reverted
        } else {
            self.improvement_streak += 1;
            self.pending_diff
                .scale(1.0 + self.improvement_streak as f32 / 10.0);
            TrainTransition::Rescaled
        }
    }

    /// Fresh random diff shaped like this network, for the perturbation
    /// trainer.
    #[must_use]
    pub fn random_diff<R: Rng>(&self, rng: &mut R) -> NetDiff {
        NetDiff::random(&self.layer_sizes, rng)
    }
}
