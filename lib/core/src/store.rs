use crate::ann::AnnForest;
use crate::embedding::Embedding;
use crate::error::{Error, Result};
use crate::tokenizer::Lexicon;
use crate::topk::TopK;
use crate::word::{SearchResult, WordVector};
use ahash::AHashMap;
use rand::Rng;

/// Growable collection of `(word, embedding)` pairs with exact, fuzzy and
/// approximate nearest-neighbor search.
///
/// The exact-match index always mirrors the entry list. The approximate
/// forest reflects the entries only as of its last build: any mutation
/// clears the built flag, and approximate search refuses to run until the
/// forest is rebuilt.
#[derive(Debug, Clone)]
pub struct VectorStore {
    dim: usize,
    entries: Vec<WordVector>,
    exact: AHashMap<String, usize>,
    ann: Option<AnnForest>,
    ann_built: bool,
}

impl VectorStore {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
            exact: AHashMap::new(),
            ann: None,
            ann_built: false,
        }
    }

    pub fn from_words(dim: usize, words: Vec<WordVector>) -> Result<Self> {
        let mut store = Self::new(dim);
        for word in words {
            store.add(word, true)?;
        }
        Ok(store)
    }

    /// Rebuild a store from persisted parts. The exact-match index is always
    /// reconstructed from the word list; a missing forest loads as "not
    /// built" and forces a rebuild before approximate search.
    pub fn from_parts(
        dim: usize,
        words: Vec<WordVector>,
        ann: Option<AnnForest>,
    ) -> Result<Self> {
        let ann_built = ann.is_some();
        let mut store = Self::from_words(dim, words)?;
        store.ann = ann;
        store.ann_built = ann_built;
        Ok(store)
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[WordVector] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn is_ann_built(&self) -> bool {
        self.ann_built
    }

    #[inline]
    #[must_use]
    pub fn ann_forest(&self) -> Option<&AnnForest> {
        self.ann.as_ref()
    }

    /// Insert a word vector. An existing word is left untouched unless
    /// `replace_existing` is set; a replacement keeps the entry's position.
    /// Returns whether the store changed. Never rebuilds the forest.
    pub fn add(&mut self, word: WordVector, replace_existing: bool) -> Result<bool> {
        if word.embedding.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: word.embedding.dim(),
            });
        }

        match self.exact.get(&word.word) {
            Some(_) if !replace_existing => Ok(false),
            Some(&index) => {
                self.entries[index] = word;
                self.ann_built = false;
                Ok(true)
            }
            None => {
                self.exact.insert(word.word.clone(), self.entries.len());
                self.entries.push(word);
                self.ann_built = false;
                Ok(true)
            }
        }
    }

    /// Insert a word with a fresh random embedding, replacing any existing
    /// entry.
    pub fn add_random<R: Rng>(&mut self, word: &str, rng: &mut R) -> Result<bool> {
        self.add(WordVector::random(word, self.dim, rng), true)
    }

    /// O(1) exact lookup.
    #[inline]
    #[must_use]
    pub fn exact(&self, word: &str) -> Option<&WordVector> {
        self.exact.get(word).map(|&index| &self.entries[index])
    }

    /// Score every stored word against `word` with a normalized string-edit
    /// ratio in [0, 1], keep the best `top_n` at or above `threshold`.
    ///
    /// With `stop_early` the scan stops the moment the list is full - an
    /// explicit approximation: better-scoring words past the stop point are
    /// never seen.
    #[must_use]
    pub fn fuzzy(
        &self,
        word: &str,
        top_n: usize,
        threshold: f32,
        stop_early: bool,
    ) -> Vec<SearchResult> {
        let mut top = TopK::new(top_n);

        for entry in &self.entries {
            let similarity = strsim::normalized_levenshtein(word, &entry.word) as f32;
            if similarity < threshold {
                continue;
            }

            top.offer(SearchResult::new(entry.clone(), similarity));

            if stop_early && top.is_full() {
                break;
            }
        }

        top.into_vec()
    }

    /// Exhaustive nearest-neighbor scan over every stored embedding, ranked
    /// by the similarity formula.
    pub fn nearest(
        &self,
        query: &Embedding,
        top_n: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        self.check_dim(query)?;

        let mut top = TopK::new(top_n);
        for entry in &self.entries {
            let similarity = entry.embedding.similarity(query);
            if threshold.is_some_and(|t| similarity < t) {
                continue;
            }
            top.offer(SearchResult::new(entry.clone(), similarity));
        }

        Ok(top.into_vec())
    }

    /// Approximate nearest-neighbor search through the forest. Fails with
    /// [`Error::IndexNotBuilt`] when the forest is missing or stale; callers
    /// can check [`VectorStore::is_ann_built`] first.
    pub fn nearest_approx(
        &self,
        query: &Embedding,
        top_n: usize,
        search_budget: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.check_dim(query)?;

        if !self.ann_built {
            return Err(Error::IndexNotBuilt);
        }
        let forest = self.ann.as_ref().ok_or(Error::IndexNotBuilt)?;

        let vectors: Vec<&[f32]> = self
            .entries
            .iter()
            .map(|entry| entry.embedding.as_slice())
            .collect();

        let mut top = TopK::new(top_n);
        for (position, _) in forest.query(&vectors, query.as_slice(), top_n, search_budget) {
            let entry = &self.entries[position as usize];
            top.offer(SearchResult::new(
                entry.clone(),
                entry.embedding.similarity(query),
            ));
        }

        Ok(top.into_vec())
    }

    /// Build a forest of `trees` random-partition trees over the current
    /// entries, keyed by entry position.
    pub fn build_ann_index<R: Rng>(&mut self, trees: usize, rng: &mut R) -> Result<&mut Self> {
        if self.entries.is_empty() {
            return Err(Error::EmptyStore);
        }

        let vectors: Vec<&[f32]> = self
            .entries
            .iter()
            .map(|entry| entry.embedding.as_slice())
            .collect();

        self.ann = Some(AnnForest::build(self.dim, &vectors, trees, rng));
        self.ann_built = true;
        Ok(self)
    }

    pub fn unbuild_ann_index(&mut self) -> &mut Self {
        self.ann = None;
        self.ann_built = false;
        self
    }

    /// Length in characters of the longest stored word.
    #[must_use]
    pub fn longest_word_len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.word.chars().count())
            .max()
            .unwrap_or(0)
    }

    fn check_dim(&self, query: &Embedding) -> Result<()> {
        if query.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.dim(),
            });
        }
        Ok(())
    }
}

impl Lexicon for VectorStore {
    fn contains_word(&self, candidate: &str) -> bool {
        self.exact.contains_key(candidate)
    }

    fn longest_word_len(&self) -> usize {
        VectorStore::longest_word_len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_store() -> VectorStore {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = VectorStore::new(4);
        for word in ["cat", "cats", "bat", "dog"] {
            store.add_random(word, &mut rng).unwrap();
        }
        store
    }

    #[test]
    fn test_exact_returns_inserted_embedding_bit_for_bit() {
        let mut store = VectorStore::new(4);
        let embedding = Embedding::new(vec![0.1, -0.2, 0.3, -0.4]);
        store
            .add(WordVector::new("word", embedding.clone()), true)
            .unwrap();

        let retrieved = store.exact("word").unwrap();
        assert_eq!(retrieved.embedding.as_slice(), embedding.as_slice());
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let mut store = VectorStore::new(4);
        let result = store.add(WordVector::zeroed("bad", 3), true);
        assert!(matches!(
            result,
            Err(Error::InvalidDimension {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_add_without_replace_is_a_no_op() {
        let mut store = VectorStore::new(2);
        let original = Embedding::new(vec![1.0, 1.0]);
        store
            .add(WordVector::new("word", original.clone()), true)
            .unwrap();

        let changed = store
            .add(WordVector::new("word", Embedding::zeros(2)), false)
            .unwrap();
        assert!(!changed);
        assert_eq!(store.exact("word").unwrap().embedding, original);
    }

    #[test]
    fn test_fuzzy_exact_word_scores_one() {
        let store = small_store();
        let results = store.fuzzy("cat", 3, 0.0, false);

        assert_eq!(results[0].word.word, "cat");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        // "cats" and "bat" follow in descending order.
        assert_eq!(results.len(), 3);
        assert!(results[1].similarity >= results[2].similarity);
        assert!(["cats", "bat"].contains(&results[1].word.word.as_str()));
    }

    #[test]
    fn test_fuzzy_threshold_discards() {
        let store = small_store();
        let results = store.fuzzy("cat", 10, 0.99, false);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].word.word, "cat");
    }

    #[test]
    fn test_nearest_ranks_by_similarity_formula() {
        let mut store = VectorStore::new(2);
        store
            .add(WordVector::new("near", Embedding::new(vec![0.1, 0.1])), true)
            .unwrap();
        store
            .add(WordVector::new("far", Embedding::new(vec![1.0, -1.0])), true)
            .unwrap();

        let results = store
            .nearest(&Embedding::new(vec![0.0, 0.0]), 2, None)
            .unwrap();
        assert_eq!(results[0].word.word, "near");
        assert_eq!(results[1].word.word, "far");
    }

    #[test]
    fn test_nearest_approx_requires_built_index() {
        let store = small_store();
        let query = Embedding::zeros(4);
        assert!(matches!(
            store.nearest_approx(&query, 3, None),
            Err(Error::IndexNotBuilt)
        ));
    }

    #[test]
    fn test_mutation_invalidates_ann_index() {
        let mut store = small_store();
        let mut rng = StdRng::seed_from_u64(2);
        store.build_ann_index(4, &mut rng).unwrap();
        assert!(store.is_ann_built());

        store.add_random("newcomer", &mut rng).unwrap();
        assert!(!store.is_ann_built());

        let query = Embedding::zeros(4);
        assert!(matches!(
            store.nearest_approx(&query, 3, None),
            Err(Error::IndexNotBuilt)
        ));
    }

    #[test]
    fn test_nearest_approx_agrees_with_exhaustive_on_small_store() {
        let mut store = small_store();
        let mut rng = StdRng::seed_from_u64(9);
        store.build_ann_index(8, &mut rng).unwrap();

        let query = store.exact("dog").unwrap().embedding.clone();
        let approx = store.nearest_approx(&query, 1, None).unwrap();
        assert_eq!(approx[0].word.word, "dog");
        assert!((approx[0].similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unbuild_clears_the_index() {
        let mut store = small_store();
        let mut rng = StdRng::seed_from_u64(4);
        store.build_ann_index(4, &mut rng).unwrap();
        store.unbuild_ann_index();
        assert!(!store.is_ann_built());
        assert!(store.ann_forest().is_none());
    }

    #[test]
    fn test_build_on_empty_store_fails() {
        let mut store = VectorStore::new(4);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            store.build_ann_index(4, &mut rng),
            Err(Error::EmptyStore)
        ));
    }

    #[test]
    fn test_longest_word_len() {
        let store = small_store();
        assert_eq!(store.longest_word_len(), 4);
        assert_eq!(VectorStore::new(2).longest_word_len(), 0);
    }
}
