use crate::error::{Error, Result};
use predx_core::Embedding;
use serde::{Deserialize, Serialize};

/// Field-size contract for the next-token predictor network.
///
/// Input: sentence-length mean, sentence-length stddev, readability grade,
/// sentence count, improvised flag, word embedding, ephemeral memory,
/// context memory. Output: four kind scores, end-of-section score, updated
/// ephemeral memory, predicted next-word embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictorLayout {
    pub embedding_dim: usize,
    pub ephemeral_len: usize,
    pub context_len: usize,
}

impl PredictorLayout {
    pub const STAT_FIELDS: usize = 5;
    pub const SCORE_FIELDS: usize = 5;

    #[inline]
    #[must_use]
    pub fn input_len(&self) -> usize {
        Self::STAT_FIELDS + self.embedding_dim + self.ephemeral_len + self.context_len
    }

    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        Self::SCORE_FIELDS + self.ephemeral_len + self.embedding_dim
    }
}

/// Assembled predictor input. `to_vec` validates every field length against
/// the layout before producing the network input.
#[derive(Debug, Clone)]
pub struct PredictorInput<'a> {
    pub sentence_length_mean: f32,
    pub sentence_length_stddev: f32,
    pub flesch_kincaid_grade: f32,
    pub sentence_count: f32,
    pub improvised: bool,
    pub word_embedding: &'a Embedding,
    pub ephemeral_memory: &'a [f32],
    pub context_memory: &'a [f32],
}

impl PredictorInput<'_> {
    pub fn to_vec(&self, layout: &PredictorLayout) -> Result<Vec<f32>> {
        check_len(layout.embedding_dim, self.word_embedding.dim())?;
        check_len(layout.ephemeral_len, self.ephemeral_memory.len())?;
        check_len(layout.context_len, self.context_memory.len())?;

        let mut input = Vec::with_capacity(layout.input_len());
        input.push(self.sentence_length_mean);
        input.push(self.sentence_length_stddev);
        input.push(self.flesch_kincaid_grade);
        input.push(self.sentence_count);
        input.push(if self.improvised { 1.0 } else { 0.0 });
        input.extend_from_slice(self.word_embedding.as_slice());
        input.extend_from_slice(self.ephemeral_memory);
        input.extend_from_slice(self.context_memory);
        Ok(input)
    }
}

/// Parsed predictor output.
///
/// Kind scores are ordered alphanumeric, digit, homogeneous, symbol;
/// acronyms fold into the alphanumeric slot.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorOutput {
    pub kind_scores: [f32; 4],
    pub is_end: f32,
    pub ephemeral_memory: Vec<f32>,
    pub predicted_embedding: Embedding,
}

impl PredictorOutput {
    pub fn parse(layout: &PredictorLayout, output: &[f32]) -> Result<Self> {
        check_len(layout.output_len(), output.len())?;

        let ephemeral_end = PredictorLayout::SCORE_FIELDS + layout.ephemeral_len;
        Ok(Self {
            kind_scores: [output[0], output[1], output[2], output[3]],
            is_end: output[4],
            ephemeral_memory: output[PredictorLayout::SCORE_FIELDS..ephemeral_end].to_vec(),
            predicted_embedding: Embedding::from_slice(&output[ephemeral_end..]),
        })
    }
}

/// Field-size contract for the context builder network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLayout {
    pub ephemeral_len: usize,
    pub context_len: usize,
}

impl ContextLayout {
    pub const STAT_FIELDS: usize = 3;

    #[inline]
    #[must_use]
    pub fn input_len(&self) -> usize {
        Self::STAT_FIELDS + self.ephemeral_len + self.context_len
    }

    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.context_len
    }
}

#[derive(Debug, Clone)]
pub struct ContextInput<'a> {
    pub sentence_length_mean: f32,
    pub sentence_length_stddev: f32,
    pub flesch_kincaid_grade: f32,
    pub ephemeral_memory: &'a [f32],
    pub context_memory: &'a [f32],
}

impl ContextInput<'_> {
    pub fn to_vec(&self, layout: &ContextLayout) -> Result<Vec<f32>> {
        check_len(layout.ephemeral_len, self.ephemeral_memory.len())?;
        check_len(layout.context_len, self.context_memory.len())?;

        let mut input = Vec::with_capacity(layout.input_len());
        input.push(self.sentence_length_mean);
        input.push(self.sentence_length_stddev);
        input.push(self.flesch_kincaid_grade);
        input.extend_from_slice(self.ephemeral_memory);
        input.extend_from_slice(self.context_memory);
        Ok(input)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextOutput {
    pub context_memory: Vec<f32>,
}

impl ContextOutput {
    pub fn parse(layout: &ContextLayout, output: &[f32]) -> Result<Self> {
        check_len(layout.output_len(), output.len())?;
        Ok(Self {
            context_memory: output.to_vec(),
        })
    }
}

/// Field-size contract for the word-vector improviser network.
///
/// Input: candidate similarity, candidate embedding, ephemeral memory,
/// running word vector. Output: the new running word vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImproviserLayout {
    pub embedding_dim: usize,
    pub ephemeral_len: usize,
}

impl ImproviserLayout {
    #[inline]
    #[must_use]
    pub fn input_len(&self) -> usize {
        1 + 2 * self.embedding_dim + self.ephemeral_len
    }

    #[inline]
    #[must_use]
    pub fn output_len(&self) -> usize {
        self.embedding_dim
    }
}

#[derive(Debug, Clone)]
pub struct ImproviserInput<'a> {
    pub similarity: f32,
    pub candidate_embedding: &'a Embedding,
    pub ephemeral_memory: &'a [f32],
    pub running_embedding: &'a Embedding,
}

impl ImproviserInput<'_> {
    pub fn to_vec(&self, layout: &ImproviserLayout) -> Result<Vec<f32>> {
        check_len(layout.embedding_dim, self.candidate_embedding.dim())?;
        check_len(layout.ephemeral_len, self.ephemeral_memory.len())?;
        check_len(layout.embedding_dim, self.running_embedding.dim())?;

        let mut input = Vec::with_capacity(layout.input_len());
        input.push(self.similarity);
        input.extend_from_slice(self.candidate_embedding.as_slice());
        input.extend_from_slice(self.ephemeral_memory);
        input.extend_from_slice(self.running_embedding.as_slice());
        Ok(input)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImproviserOutput {
    pub word_vector_value: Embedding,
}

impl ImproviserOutput {
    pub fn parse(layout: &ImproviserLayout, output: &[f32]) -> Result<Self> {
        check_len(layout.output_len(), output.len())?;
        Ok(Self {
            word_vector_value: Embedding::from_slice(output),
        })
    }
}

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::LayoutMismatch { expected, actual });
    }
    Ok(())
}
