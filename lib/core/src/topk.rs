use crate::word::SearchResult;

/// Online bounded top-K selection over a stream of scored candidates.
///
/// Keeps at most `capacity` results in descending score order. A candidate
/// that cannot make the cut is rejected in O(1) before any scan; accepted
/// candidates are inserted at the first position with a strictly lower
/// score, so ties keep their arrival order.
#[derive(Debug, Clone)]
pub struct TopK {
    capacity: usize,
    results: Vec<SearchResult>,
}

impl TopK {
    #[inline]
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            results: Vec::with_capacity(capacity),
        }
    }

    /// Offer a candidate. Returns whether it was kept.
    pub fn offer(&mut self, candidate: SearchResult) -> bool {
        if self.capacity == 0 {
            return false;
        }

        // Fast path: a full list rejects anything below the worst kept score
        // without scanning.
        if self.results.len() >= self.capacity {
            if let Some(worst) = self.results.last() {
                if candidate.similarity < worst.similarity {
                    return false;
                }
            }
        }

        let position = self
            .results
            .iter()
            .position(|kept| kept.similarity < candidate.similarity)
            .unwrap_or(self.results.len());

        if position >= self.capacity {
            return false;
        }

        self.results.insert(position, candidate);

        if self.results.len() > self.capacity {
            self.results.truncate(self.capacity);
        }

        true
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.results.len() >= self.capacity
    }

    /// The kept results, best first.
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<SearchResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::WordVector;

    fn result(label: &str, similarity: f32) -> SearchResult {
        SearchResult::new(WordVector::zeroed(label, 2), similarity)
    }

    fn offer_all(capacity: usize, scores: &[f32]) -> Vec<f32> {
        let mut top = TopK::new(capacity);
        for (index, &score) in scores.iter().enumerate() {
            top.offer(result(&format!("w{index}"), score));
        }
        top.into_vec().iter().map(|r| r.similarity).collect()
    }

    #[test]
    fn test_matches_brute_force_oracle() {
        let scores = [0.3, 0.9, 0.1, 0.7, 0.5, 0.95, 0.2, 0.6];
        for top_n in 1..=scores.len() {
            let kept = offer_all(top_n, &scores);

            let mut expected = scores.to_vec();
            expected.sort_by(|a, b| b.partial_cmp(a).unwrap());
            expected.truncate(top_n);

            assert_eq!(kept, expected, "top_n = {top_n}");
        }
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        let kept = offer_all(3, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept, vec![0.6, 0.5, 0.4]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let mut top = TopK::new(4);
        top.offer(result("first", 0.5));
        top.offer(result("second", 0.5));
        top.offer(result("third", 0.5));
        let kept = top.into_vec();
        let words: Vec<&str> = kept.iter().map(|r| r.word.word.as_str()).collect();
        assert_eq!(words, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_full_list_rejects_below_worst() {
        let mut top = TopK::new(2);
        assert!(top.offer(result("a", 0.9)));
        assert!(top.offer(result("b", 0.8)));
        assert!(!top.offer(result("c", 0.1)));
        assert!(top.offer(result("d", 0.85)));
        let kept: Vec<f32> = top.into_vec().iter().map(|r| r.similarity).collect();
        assert_eq!(kept, vec![0.9, 0.85]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut top = TopK::new(0);
        assert!(!top.offer(result("a", 1.0)));
        assert!(top.is_empty());
    }
}
