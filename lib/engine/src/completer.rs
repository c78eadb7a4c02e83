use crate::error::{Error, Result};
use crate::layout::{
    ContextInput, ContextLayout, ContextOutput, ImproviserInput, ImproviserLayout,
    ImproviserOutput, PredictorInput, PredictorLayout, PredictorOutput,
};
use crate::net::NeuralNet;
use crate::stats::SectionStats;
use parking_lot::RwLock;
use predx_core::{
    tokenize, Embedding, SearchResult, Token, TokenKind, TopK, VectorStore, WordVector,
};
use std::sync::Arc;

/// Results fetched per rung of the fuzzy threshold ladder.
pub const FUZZY_LADDER_TOP_N: usize = 10;

/// Token-kind buckets of the main store, plus lowercase-normalized buckets
/// for the two word-bearing kinds. Each main-store word lands in exactly one
/// kind bucket.
#[derive(Debug, Clone)]
pub struct SubStores {
    alphanumeric: VectorStore,
    digit: VectorStore,
    homogeneous: VectorStore,
    symbol: VectorStore,
    alphanumeric_lower: VectorStore,
    homogeneous_lower: VectorStore,
}

impl SubStores {
    fn empty(dim: usize) -> Self {
        Self {
            alphanumeric: VectorStore::new(dim),
            digit: VectorStore::new(dim),
            homogeneous: VectorStore::new(dim),
            symbol: VectorStore::new(dim),
            alphanumeric_lower: VectorStore::new(dim),
            homogeneous_lower: VectorStore::new(dim),
        }
    }

    /// The kind bucket a word of `kind` belongs to. Acronyms are word-like
    /// and share the alphanumeric bucket.
    #[must_use]
    pub fn by_kind(&self, kind: TokenKind) -> &VectorStore {
        match kind {
            TokenKind::Alphanumeric | TokenKind::Acronym => &self.alphanumeric,
            TokenKind::Digit => &self.digit,
            TokenKind::Homogeneous => &self.homogeneous,
            TokenKind::Symbol => &self.symbol,
        }
    }

    /// The lowercase-normalized companion bucket, for word-bearing kinds
    /// only.
    #[must_use]
    pub fn lowercase_by_kind(&self, kind: TokenKind) -> Option<&VectorStore> {
        match kind {
            TokenKind::Alphanumeric | TokenKind::Acronym => Some(&self.alphanumeric_lower),
            TokenKind::Homogeneous => Some(&self.homogeneous_lower),
            TokenKind::Digit | TokenKind::Symbol => None,
        }
    }

    #[must_use]
    pub fn total_words(&self) -> usize {
        self.alphanumeric.len() + self.digit.len() + self.homogeneous.len() + self.symbol.len()
    }
}

/// The main store together with its token-kind partition. Completer clones
/// share one catalog: searches take the read lock, partitioning and index
/// builds take the write lock.
#[derive(Debug)]
pub struct StoreCatalog {
    pub main: VectorStore,
    subs: Option<SubStores>,
}

impl StoreCatalog {
    fn new(main: VectorStore) -> Self {
        Self { main, subs: None }
    }

    #[inline]
    #[must_use]
    pub fn is_partitioned(&self) -> bool {
        self.subs.is_some()
    }

    #[inline]
    #[must_use]
    pub fn sub_stores(&self) -> Option<&SubStores> {
        self.subs.as_ref()
    }

    /// Rebuild the partition from scratch. Idempotent; safe to re-run after
    /// any bulk insert.
    fn partition(&mut self) -> Result<()> {
        let mut subs = SubStores::empty(self.main.dim());

        for entry in self.main.entries() {
            let kind = TokenKind::classify(&entry.word);
            match kind {
                TokenKind::Alphanumeric | TokenKind::Acronym => {
                    subs.alphanumeric.add(entry.clone(), true)?;
                }
                TokenKind::Digit => {
                    subs.digit.add(entry.clone(), true)?;
                }
                TokenKind::Homogeneous => {
                    subs.homogeneous.add(entry.clone(), true)?;
                }
                TokenKind::Symbol => {
                    subs.symbol.add(entry.clone(), true)?;
                }
            }

            match kind {
                TokenKind::Alphanumeric | TokenKind::Acronym => {
                    subs.alphanumeric_lower.add(
                        WordVector::new(entry.word.to_lowercase(), entry.embedding.clone()),
                        true,
                    )?;
                }
                TokenKind::Homogeneous => {
                    subs.homogeneous_lower.add(
                        WordVector::new(entry.word.to_lowercase(), entry.embedding.clone()),
                        true,
                    )?;
                }
                TokenKind::Digit | TokenKind::Symbol => {}
            }
        }

        self.subs = Some(subs);
        Ok(())
    }
}

/// A resolved word vector together with how it was obtained. An improvised
/// result was synthesized from fuzzy neighbors (or from nothing) and is
/// never auto-inserted into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchedWordVector {
    pub word_vector: WordVector,
    pub improvised: bool,
}

/// Output of one prediction step. Kind scores are ordered alphanumeric,
/// digit, homogeneous, symbol.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub kind_scores: [f32; 4],
    pub is_end: f32,
    pub predicted_embedding: Embedding,
    pub resolved: SearchedWordVector,
}

/// The orchestration pipeline: tokenizer + store catalog + three networks
/// and two pieces of recurrent state.
///
/// Cloning deep-copies the networks and the recurrent memories but shares
/// the store catalog read-only - the shape the trainer needs. Prediction
/// and context accumulation mutate the memories in place, so a single
/// completer instance takes one writer at a time.
#[derive(Debug, Clone)]
pub struct Completer {
    catalog: Arc<RwLock<StoreCatalog>>,
    ephemeral_memory: Vec<f32>,
    context_memory: Vec<f32>,
    predictor: NeuralNet,
    context_builder: NeuralNet,
    improviser: NeuralNet,
    predictor_layout: PredictorLayout,
    context_layout: ContextLayout,
    improviser_layout: ImproviserLayout,
}

impl Completer {
    /// Wrap a store and build minimal randomized networks for the given
    /// memory sizes. Callers typically install deeper networks through the
    /// `set_*` builders afterwards.
    pub fn new(store: VectorStore, ephemeral_len: usize, context_len: usize) -> Result<Self> {
        let embedding_dim = store.dim();

        let predictor_layout = PredictorLayout {
            embedding_dim,
            ephemeral_len,
            context_len,
        };
        let context_layout = ContextLayout {
            ephemeral_len,
            context_len,
        };
        let improviser_layout = ImproviserLayout {
            embedding_dim,
            ephemeral_len,
        };

        let predictor = NeuralNet::new(
            vec![predictor_layout.input_len(), predictor_layout.output_len()],
            true,
        )?;
        let context_builder = NeuralNet::new(
            vec![context_layout.input_len(), context_layout.output_len()],
            true,
        )?;
        let improviser = NeuralNet::new(
            vec![
                improviser_layout.input_len(),
                improviser_layout.output_len(),
            ],
            true,
        )?;

        Ok(Self {
            catalog: Arc::new(RwLock::new(StoreCatalog::new(store))),
            ephemeral_memory: vec![0.0; ephemeral_len],
            context_memory: vec![0.0; context_len],
            predictor,
            context_builder,
            improviser,
            predictor_layout,
            context_layout,
            improviser_layout,
        })
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &Arc<RwLock<StoreCatalog>> {
        &self.catalog
    }

    #[inline]
    #[must_use]
    pub fn ephemeral_memory(&self) -> &[f32] {
        &self.ephemeral_memory
    }

    #[inline]
    #[must_use]
    pub fn context_memory(&self) -> &[f32] {
        &self.context_memory
    }

    #[inline]
    #[must_use]
    pub fn predictor(&self) -> &NeuralNet {
        &self.predictor
    }

    #[inline]
    #[must_use]
    pub fn context_builder(&self) -> &NeuralNet {
        &self.context_builder
    }

    #[inline]
    #[must_use]
    pub fn improviser(&self) -> &NeuralNet {
        &self.improviser
    }

    #[inline]
    pub fn predictor_mut(&mut self) -> &mut NeuralNet {
        &mut self.predictor
    }

    #[inline]
    pub fn context_builder_mut(&mut self) -> &mut NeuralNet {
        &mut self.context_builder
    }

    #[inline]
    pub fn improviser_mut(&mut self) -> &mut NeuralNet {
        &mut self.improviser
    }

    #[inline]
    #[must_use]
    pub fn predictor_layout(&self) -> &PredictorLayout {
        &self.predictor_layout
    }

    #[inline]
    #[must_use]
    pub fn context_layout(&self) -> &ContextLayout {
        &self.context_layout
    }

    #[inline]
    #[must_use]
    pub fn improviser_layout(&self) -> &ImproviserLayout {
        &self.improviser_layout
    }

    /// Install a predictor network, validating its boundary layers against
    /// the field-size contract.
    pub fn set_predictor_net(&mut self, net: NeuralNet) -> Result<&mut Self> {
        check_boundary(
            &net,
            self.predictor_layout.input_len(),
            self.predictor_layout.output_len(),
        )?;
        self.predictor = net;
        Ok(self)
    }

    pub fn set_context_builder_net(&mut self, net: NeuralNet) -> Result<&mut Self> {
        check_boundary(
            &net,
            self.context_layout.input_len(),
            self.context_layout.output_len(),
        )?;
        self.context_builder = net;
        Ok(self)
    }

    pub fn set_improviser_net(&mut self, net: NeuralNet) -> Result<&mut Self> {
        check_boundary(
            &net,
            self.improviser_layout.input_len(),
            self.improviser_layout.output_len(),
        )?;
        self.improviser = net;
        Ok(self)
    }

    /// Build and install a predictor with the given hidden layers.
    pub fn predictor_net_with_hidden(&mut self, hidden: &[usize]) -> Result<&mut Self> {
        let sizes = boundary_sizes(
            self.predictor_layout.input_len(),
            hidden,
            self.predictor_layout.output_len(),
        );
        self.set_predictor_net(NeuralNet::new(sizes, true)?)
    }

    pub fn context_builder_net_with_hidden(&mut self, hidden: &[usize]) -> Result<&mut Self> {
        let sizes = boundary_sizes(
            self.context_layout.input_len(),
            hidden,
            self.context_layout.output_len(),
        );
        self.set_context_builder_net(NeuralNet::new(sizes, true)?)
    }

    pub fn improviser_net_with_hidden(&mut self, hidden: &[usize]) -> Result<&mut Self> {
        let sizes = boundary_sizes(
            self.improviser_layout.input_len(),
            hidden,
            self.improviser_layout.output_len(),
        );
        self.set_improviser_net(NeuralNet::new(sizes, true)?)
    }

    pub fn reset_ephemeral_memory(&mut self) -> &mut Self {
        self.ephemeral_memory.iter_mut().for_each(|v| *v = 0.0);
        self
    }

    pub fn reset_context_memory(&mut self) -> &mut Self {
        self.context_memory.iter_mut().for_each(|v| *v = 0.0);
        self
    }

    /// Restore persisted recurrent memories, validating lengths against the
    /// layouts.
    pub fn set_memories(&mut self, ephemeral: Vec<f32>, context: Vec<f32>) -> Result<&mut Self> {
        if ephemeral.len() != self.predictor_layout.ephemeral_len {
            return Err(Error::LayoutMismatch {
                expected: self.predictor_layout.ephemeral_len,
                actual: ephemeral.len(),
            });
        }
        if context.len() != self.predictor_layout.context_len {
            return Err(Error::LayoutMismatch {
                expected: self.predictor_layout.context_len,
                actual: context.len(),
            });
        }
        self.ephemeral_memory = ephemeral;
        self.context_memory = context;
        Ok(self)
    }

    /// Classify every stored word and rebuild the kind buckets. Idempotent.
    pub fn partition_into_subdatabases(&mut self) -> Result<&mut Self> {
        self.catalog.write().partition()?;
        Ok(self)
    }

    /// Insert a word vector into the main store, refreshing the partition
    /// when one exists.
    pub fn add_word_vector(&mut self, word: WordVector) -> Result<&mut Self> {
        let mut catalog = self.catalog.write();
        catalog.main.add(word, true)?;
        if catalog.is_partitioned() {
            catalog.partition()?;
        }
        drop(catalog);
        Ok(self)
    }

    /// Bulk insert; the partition is refreshed once at the end.
    pub fn add_word_vectors(&mut self, words: Vec<WordVector>) -> Result<&mut Self> {
        let mut catalog = self.catalog.write();
        for word in words {
            catalog.main.add(word, true)?;
        }
        if catalog.is_partitioned() {
            catalog.partition()?;
        }
        drop(catalog);
        Ok(self)
    }

    /// Tokenize against the main store's vocabulary.
    #[must_use]
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let catalog = self.catalog.read();
        tokenize(text, &catalog.main)
    }

    /// Resolve a word to an embedding.
    ///
    /// Tier 1 is the exact store hit. Tier 2 walks a fuzzy threshold ladder
    /// from 0.9 down to -0.1 and stops at the first rung with any result,
    /// so the strictest available match wins. Tier 3 improvises from an
    /// empty candidate list when every rung is dry.
    pub fn find_word_vector(&self, word: &str) -> Result<SearchedWordVector> {
        let candidates = {
            let catalog = self.catalog.read();

            if let Some(hit) = catalog.main.exact(word) {
                return Ok(SearchedWordVector {
                    word_vector: hit.clone(),
                    improvised: false,
                });
            }

            fuzzy_ladder(&catalog, word)
        };

        let embedding = self.improvise(&candidates)?;
        Ok(SearchedWordVector {
            word_vector: WordVector::new(word, embedding),
            improvised: true,
        })
    }

    /// Synthesize an embedding by folding fuzzy candidates, in order,
    /// through the improviser network. The fold starts from a zero running
    /// vector and a zero ephemeral input; the final running vector is the
    /// result. Never inserts into the store.
    pub fn improvise(&self, candidates: &[SearchResult]) -> Result<Embedding> {
        let mut running = Embedding::zeros(self.improviser_layout.embedding_dim);
        let ephemeral = vec![0.0; self.improviser_layout.ephemeral_len];

        for candidate in candidates {
            let input = ImproviserInput {
                similarity: candidate.similarity,
                candidate_embedding: &candidate.word.embedding,
                ephemeral_memory: &ephemeral,
                running_embedding: &running,
            }
            .to_vec(&self.improviser_layout)?;

            let raw = self.improviser.compute(&input)?;
            let output = ImproviserOutput::parse(&self.improviser_layout, &raw)?;
            running = output.word_vector_value;
        }

        Ok(running)
    }

    /// Predict the next token from the current recurrent state.
    ///
    /// Commits the updated ephemeral memory before returning; fails without
    /// touching state when any vector length disagrees with the field-size
    /// contract.
    pub fn predict_next_token(&mut self, token: &Token, stats: &SectionStats) -> Result<Prediction> {
        let resolved = self.find_word_vector(&token.value)?;

        let input = PredictorInput {
            sentence_length_mean: stats.sentence_length_mean,
            sentence_length_stddev: stats.sentence_length_stddev,
            flesch_kincaid_grade: stats.flesch_kincaid_grade,
            sentence_count: stats.sentence_count,
            improvised: resolved.improvised,
            word_embedding: &resolved.word_vector.embedding,
            ephemeral_memory: &self.ephemeral_memory,
            context_memory: &self.context_memory,
        }
        .to_vec(&self.predictor_layout)?;

        let raw = self.predictor.compute(&input)?;
        let output = PredictorOutput::parse(&self.predictor_layout, &raw)?;

        self.ephemeral_memory = output.ephemeral_memory;

        Ok(Prediction {
            kind_scores: output.kind_scores,
            is_end: output.is_end,
            predicted_embedding: output.predicted_embedding,
            resolved,
        })
    }

    /// Fold the ephemeral memory into the context memory at a section
    /// boundary. The ephemeral memory is zeroed afterwards; the new context
    /// memory is returned.
    pub fn accumulate_context(
        &mut self,
        sentence_length_mean: f32,
        sentence_length_stddev: f32,
        flesch_kincaid_grade: f32,
    ) -> Result<Vec<f32>> {
        let input = ContextInput {
            sentence_length_mean,
            sentence_length_stddev,
            flesch_kincaid_grade,
            ephemeral_memory: &self.ephemeral_memory,
            context_memory: &self.context_memory,
        }
        .to_vec(&self.context_layout)?;

        let raw = self.context_builder.compute(&input)?;
        let output = ContextOutput::parse(&self.context_layout, &raw)?;

        self.context_memory = output.context_memory;
        self.reset_ephemeral_memory();

        Ok(self.context_memory.clone())
    }
}

/// Walk the descending threshold ladder. Each rung searches the kind bucket
/// for the word (merging the lowercase bucket for word-bearing kinds) when a
/// partition exists, and the main store otherwise.
fn fuzzy_ladder(catalog: &StoreCatalog, word: &str) -> Vec<SearchResult> {
    let kind = TokenKind::classify(word);
    let lowered = word.to_lowercase();

    for tenths in (-1..=9).rev() {
        let threshold = tenths as f32 / 10.0;

        let results = match catalog.sub_stores() {
            Some(subs) => {
                let mut top = TopK::new(FUZZY_LADDER_TOP_N);
                for result in subs
                    .by_kind(kind)
                    .fuzzy(word, FUZZY_LADDER_TOP_N, threshold, true)
                {
                    top.offer(result);
                }
                if let Some(lower) = subs.lowercase_by_kind(kind) {
                    for result in lower.fuzzy(&lowered, FUZZY_LADDER_TOP_N, threshold, true) {
                        top.offer(result);
                    }
                }
                top.into_vec()
            }
            None => catalog.main.fuzzy(word, FUZZY_LADDER_TOP_N, threshold, true),
        };

        if !results.is_empty() {
            return results;
        }
    }

    Vec::new()
}

fn check_boundary(net: &NeuralNet, input_len: usize, output_len: usize) -> Result<()> {
    if net.input_len() != input_len {
        return Err(Error::LayoutMismatch {
            expected: input_len,
            actual: net.input_len(),
        });
    }
    if net.output_len() != output_len {
        return Err(Error::LayoutMismatch {
            expected: output_len,
            actual: net.output_len(),
        });
    }
    Ok(())
}

fn boundary_sizes(input_len: usize, hidden: &[usize], output_len: usize) -> Vec<usize> {
    let mut sizes = Vec::with_capacity(hidden.len() + 2);
    sizes.push(input_len);
    sizes.extend_from_slice(hidden);
    sizes.push(output_len);
    sizes
}
