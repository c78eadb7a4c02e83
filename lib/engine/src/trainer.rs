use crate::completer::Completer;
use crate::diff::NetDiff;
use crate::error::{Error, Result};
use crate::stats::SectionStats;
use predx_core::TokenKind;
use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Scale applied to the per-network random diffs of every training step.
pub const DIFF_SCALE: f32 = 0.02;

/// Relative weights of the three cost terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostWeights {
    pub kind_mismatch: f32,
    pub section_end: f32,
    pub embedding_distance: f32,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            kind_mismatch: 1.0,
            section_end: 1.0,
            embedding_distance: 1.0,
        }
    }
}

/// The outcome of one training step: the diff subset that scored best,
/// together with the baseline and winning costs. Applying it to the live
/// completer is a separate, explicit commit via [`apply`].
#[derive(Debug, Clone)]
pub struct TrainingModification {
    pub predictor_diff: Option<NetDiff>,
    pub context_diff: Option<NetDiff>,
    pub improviser_diff: Option<NetDiff>,
    pub cost_before: f32,
    pub cost_after: f32,
}

impl TrainingModification {
    /// Whether committing this modification would lower the cost.
    #[inline]
    #[must_use]
    pub fn improves(&self) -> bool {
        self.cost_after < self.cost_before
    }
}

/// One-hot kind vector in the predictor's score order: alphanumeric, digit,
/// homogeneous, symbol. Acronyms share the alphanumeric slot.
#[must_use]
fn kind_one_hot(kind: TokenKind) -> [f32; 4] {
    match kind {
        TokenKind::Alphanumeric | TokenKind::Acronym => [1.0, 0.0, 0.0, 0.0],
        TokenKind::Digit => [0.0, 1.0, 0.0, 0.0],
        TokenKind::Homogeneous => [0.0, 0.0, 1.0, 0.0],
        TokenKind::Symbol => [0.0, 0.0, 0.0, 1.0],
    }
}

/// Mean prediction cost over one section.
///
/// Tokenizes once, computes the section statistics once, zeroes the
/// ephemeral memory (section start), then accumulates per token: the
/// distance between the one-hot kind and the predicted kind scores, the
/// end-score error against "is last token", and the distance between the
/// resolved and predicted embeddings.
pub fn prediction_cost(
    completer: &mut Completer,
    section: &str,
    weights: &CostWeights,
) -> Result<f32> {
    let tokens = completer.tokenize(section);
    let stats = SectionStats::from_section(section, &tokens);
    completer.reset_ephemeral_memory();

    let mut cost_sum = 0.0f32;
    for (index, token) in tokens.iter().enumerate() {
        let prediction = completer.predict_next_token(token, &stats)?;

        let is_last = if index + 1 == tokens.len() { 1.0 } else { 0.0 };
        let actual_kind = kind_one_hot(token.kind);

        let kind_cost = actual_kind
            .iter()
            .zip(&prediction.kind_scores)
            .map(|(a, p)| (a - p) * (a - p))
            .sum::<f32>()
            .sqrt();
        let end_cost = (is_last - prediction.is_end).abs();
        let embedding_cost = prediction
            .resolved
            .word_vector
            .embedding
            .squared_distance(&prediction.predicted_embedding)
            .sqrt();

        cost_sum += weights.kind_mismatch * kind_cost
            + weights.section_end * end_cost
            + weights.embedding_distance * embedding_cost;
    }

    Ok(cost_sum / tokens.len().max(1) as f32)
}

/// Mean prediction cost over a whole corpus of sections.
pub fn corpus_cost(
    completer: &mut Completer,
    sections: &[String],
    weights: &CostWeights,
) -> Result<f32> {
    let mut cost_sum = 0.0f32;
    for section in sections {
        cost_sum += prediction_cost(completer, section, weights)?;
    }
    Ok(cost_sum / sections.len().max(1) as f32)
}

/// One perturbation-search step.
///
/// Draws one random diff per network, scaled by [`DIFF_SCALE`], then
/// evaluates all eight subsets of {predictor, context builder, improviser} -
/// the empty subset first, as the baseline - concurrently on a worker pool
/// of the given size. Every worker runs on its own completer clone; the
/// store catalog is shared read-only. After the join, the lowest cost wins
/// and ties keep the earliest combination, so a dead heat returns the
/// baseline. The caller's completer is never mutated; commit the returned
/// modification with [`apply`].
pub fn train_step<R: Rng>(
    completer: &Completer,
    sections: &[String],
    weights: &CostWeights,
    workers: usize,
    rng: &mut R,
) -> Result<TrainingModification> {
    let predictor_diff = &completer.predictor().random_diff(rng) * DIFF_SCALE;
    let context_diff = &completer.context_builder().random_diff(rng) * DIFF_SCALE;
    let improviser_diff = &completer.improviser().random_diff(rng) * DIFF_SCALE;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))?;

    let combinations: Vec<u8> = (0..8).collect();
    let costs = pool.install(|| {
        combinations
            .par_iter()
            .map(|&mask| {
                let mut candidate = completer.clone();
                if mask & 0b001 != 0 {
                    candidate
                        .predictor_mut()
                        .modify(&predictor_diff, true, true)?;
                }
                if mask & 0b010 != 0 {
                    candidate
                        .context_builder_mut()
                        .modify(&context_diff, true, true)?;
                }
                if mask & 0b100 != 0 {
                    candidate
                        .improviser_mut()
                        .modify(&improviser_diff, true, true)?;
                }
                corpus_cost(&mut candidate, sections, weights)
            })
            .collect::<Result<Vec<f32>>>()
    })?;

    let mut best = 0usize;
    for (index, &cost) in costs.iter().enumerate() {
        if cost < costs[best] {
            best = index;
        }
    }

    debug!(?costs, chosen = best, "training step evaluated");

    Ok(TrainingModification {
        predictor_diff: (best & 0b001 != 0).then(|| predictor_diff.clone()),
        context_diff: (best & 0b010 != 0).then(|| context_diff.clone()),
        improviser_diff: (best & 0b100 != 0).then(|| improviser_diff.clone()),
        cost_before: costs[0],
        cost_after: costs[best],
    })
}

/// Commit a training modification to the live completer.
pub fn apply(completer: &mut Completer, modification: &TrainingModification) -> Result<()> {
    if let Some(diff) = &modification.predictor_diff {
        completer.predictor_mut().modify(diff, true, true)?;
    }
    if let Some(diff) = &modification.context_diff {
        completer.context_builder_mut().modify(diff, true, true)?;
    }
    if let Some(diff) = &modification.improviser_diff {
        completer.improviser_mut().modify(diff, true, true)?;
    }

    info!(
        cost_before = modification.cost_before,
        cost_after = modification.cost_after,
        "training modification applied"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predx_core::VectorStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn training_completer() -> Completer {
        let mut rng = StdRng::seed_from_u64(77);
        let mut store = VectorStore::new(4);
        for word in ["the", "cat", "sat", "on", "mat", "."] {
            store.add_random(word, &mut rng).unwrap();
        }
        Completer::new(store, 4, 4).unwrap()
    }

    #[test]
    fn test_empty_corpus_returns_baseline_with_equal_costs() {
        let completer = training_completer();
        let mut rng = StdRng::seed_from_u64(1);

        let modification =
            train_step(&completer, &[], &CostWeights::default(), 4, &mut rng).unwrap();

        assert!(modification.predictor_diff.is_none());
        assert!(modification.context_diff.is_none());
        assert!(modification.improviser_diff.is_none());
        assert_eq!(modification.cost_before, modification.cost_after);
    }

    #[test]
    fn test_prediction_cost_is_finite_and_nonnegative() {
        let mut completer = training_completer();
        let cost = prediction_cost(
            &mut completer,
            "the cat sat on the mat.",
            &CostWeights::default(),
        )
        .unwrap();
        assert!(cost.is_finite());
        assert!(cost >= 0.0);
    }

    #[test]
    fn test_prediction_cost_of_empty_section_is_zero() {
        let mut completer = training_completer();
        let cost = prediction_cost(&mut completer, "", &CostWeights::default()).unwrap();
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_train_step_leaves_caller_untouched() {
        let completer = training_completer();
        let before = completer.clone();
        let sections = vec!["the cat sat.".to_string()];
        let mut rng = StdRng::seed_from_u64(2);

        let modification =
            train_step(&completer, &sections, &CostWeights::default(), 2, &mut rng).unwrap();

        // Weights only move on the explicit commit.
        let probe = vec![0.25; completer.predictor().input_len()];
        assert_eq!(
            completer.predictor().compute(&probe).unwrap(),
            before.predictor().compute(&probe).unwrap()
        );

        let mut committed = completer.clone();
        apply(&mut committed, &modification).unwrap();
        if modification.predictor_diff.is_some() {
            assert_ne!(
                committed.predictor().compute(&probe).unwrap(),
                completer.predictor().compute(&probe).unwrap()
            );
        }
    }

    #[test]
    fn test_train_step_cost_after_never_exceeds_baseline() {
        let completer = training_completer();
        let sections = vec![
            "the cat sat on the mat.".to_string(),
            "the mat sat.".to_string(),
        ];
        let mut rng = StdRng::seed_from_u64(3);

        let modification =
            train_step(&completer, &sections, &CostWeights::default(), 4, &mut rng).unwrap();
        assert!(modification.cost_after <= modification.cost_before);
    }

    #[test]
    fn test_corpus_cost_averages_sections() {
        let mut completer = training_completer();
        let sections = vec!["the cat.".to_string(), "the mat.".to_string()];
        let cost = corpus_cost(&mut completer, &sections, &CostWeights::default()).unwrap();
        assert!(cost.is_finite());
        assert!(cost >= 0.0);
    }
}
