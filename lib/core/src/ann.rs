use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Items per leaf before a node stops splitting.
const LEAF_SIZE: usize = 16;

/// Split recursion bound; degenerate data (many identical vectors) bottoms
/// out into a leaf instead of recursing forever.
const MAX_DEPTH: usize = 48;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Split {
        normal: Vec<f32>,
        offset: f32,
        left: usize,
        right: usize,
    },
    Leaf(Vec<u32>),
}

/// Frontier entry for best-first traversal. Max-heap on the margin bound.
#[derive(Clone, Copy)]
struct Frontier {
    bound: f32,
    node: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.bound == other.bound && self.node == other.node
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bound
            .partial_cmp(&other.bound)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Approximate nearest-neighbor index: a forest of random-partition trees.
///
/// Each tree recursively splits the indexed vectors by a hyperplane between
/// two randomly sampled members. Queries run a best-first traversal across
/// all trees under a candidate budget, then exact-score the candidates.
/// Items are keyed by their position in the backing collection, so the
/// forest must be rebuilt after any mutation of that collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnForest {
    dim: usize,
    roots: Vec<usize>,
    nodes: Vec<Node>,
    tree_count: usize,
}

impl AnnForest {
    /// Build a forest of `tree_count` trees over `vectors`, keyed by slice
    /// position.
    pub fn build<R: Rng>(
        dim: usize,
        vectors: &[&[f32]],
        tree_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut forest = Self {
            dim,
            roots: Vec::with_capacity(tree_count),
            nodes: Vec::new(),
            tree_count,
        };

        let all_ids: Vec<u32> = (0..vectors.len() as u32).collect();
        for _ in 0..tree_count {
            let root = forest.build_node(all_ids.clone(), vectors, rng, 0);
            forest.roots.push(root);
        }

        forest
    }

    fn build_node<R: Rng>(
        &mut self,
        ids: Vec<u32>,
        vectors: &[&[f32]],
        rng: &mut R,
        depth: usize,
    ) -> usize {
        if ids.len() <= LEAF_SIZE || depth >= MAX_DEPTH {
            self.nodes.push(Node::Leaf(ids));
            return self.nodes.len() - 1;
        }

        let a = vectors[ids[rng.random_range(0..ids.len())] as usize];
        let b = vectors[ids[rng.random_range(0..ids.len())] as usize];

        let normal: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
        let midpoint: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| (x + y) / 2.0).collect();
        let offset = dot(&normal, &midpoint);

        let mut left_ids = Vec::new();
        let mut right_ids = Vec::new();
        for id in ids {
            if dot(&normal, vectors[id as usize]) - offset >= 0.0 {
                right_ids.push(id);
            } else {
                left_ids.push(id);
            }
        }

        // Degenerate split (sampled points coincide): stop here.
        if left_ids.is_empty() || right_ids.is_empty() {
            let mut all = left_ids;
            all.extend(right_ids);
            self.nodes.push(Node::Leaf(all));
            return self.nodes.len() - 1;
        }

        let left = self.build_node(left_ids, vectors, rng, depth + 1);
        let right = self.build_node(right_ids, vectors, rng, depth + 1);

        self.nodes.push(Node::Split {
            normal,
            offset,
            left,
            right,
        });
        self.nodes.len() - 1
    }

    /// Collect the approximate `k` nearest item positions for `query`,
    /// returned as `(position, squared_distance)` pairs, nearest first.
    ///
    /// `vectors` is the backing collection the forest was built over, in the
    /// same order; the forest stores only the partition structure.
    /// `search_budget` bounds how many candidate items the traversal gathers
    /// before exact scoring; larger budgets trade speed for recall. Defaults
    /// to `tree_count * k * 2`.
    pub fn query(
        &self,
        vectors: &[&[f32]],
        query: &[f32],
        k: usize,
        search_budget: Option<usize>,
    ) -> Vec<(u32, f32)> {
        if self.roots.is_empty() || k == 0 {
            return Vec::new();
        }

        let budget = search_budget.unwrap_or(self.tree_count * k * 2).max(k);

        let mut frontier: BinaryHeap<Frontier> = self
            .roots
            .iter()
            .map(|&root| Frontier {
                bound: f32::INFINITY,
                node: root,
            })
            .collect();

        let mut candidates: Vec<u32> = Vec::with_capacity(budget);
        while candidates.len() < budget {
            let Some(Frontier { bound, node }) = frontier.pop() else {
                break;
            };
            match &self.nodes[node] {
                Node::Leaf(ids) => candidates.extend_from_slice(ids),
                Node::Split {
                    normal,
                    offset,
                    left,
                    right,
                } => {
                    let margin = dot(normal, query) - offset;
                    frontier.push(Frontier {
                        bound: bound.min(margin),
                        node: *right,
                    });
                    frontier.push(Frontier {
                        bound: bound.min(-margin),
                        node: *left,
                    });
                }
            }
        }

        candidates.sort_unstable();
        candidates.dedup();

        let mut scored: Vec<(u32, f32)> = candidates
            .into_iter()
            .filter(|&id| (id as usize) < vectors.len())
            .map(|id| (id, squared_distance(query, vectors[id as usize])))
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clustered_vectors(rng: &mut StdRng) -> Vec<Vec<f32>> {
        let mut vectors = Vec::new();
        for cluster in 0..4 {
            let center = cluster as f32 * 10.0;
            for _ in 0..50 {
                vectors.push(vec![
                    center + rng.random_range(-0.5f32..0.5),
                    center + rng.random_range(-0.5f32..0.5),
                    center + rng.random_range(-0.5f32..0.5),
                ]);
            }
        }
        vectors
    }

    #[test]
    fn test_finds_true_nearest_on_clustered_data() {
        let mut rng = StdRng::seed_from_u64(42);
        let vectors = clustered_vectors(&mut rng);
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let forest = AnnForest::build(3, &refs, 8, &mut rng);

        let query = vec![10.1, 9.9, 10.0];
        let results = forest.query(&refs, &query, 5, None);

        assert_eq!(results.len(), 5);
        // Every hit should come from the cluster around 10.0.
        for (id, dist) in &results {
            assert!(vectors[*id as usize][0] > 8.0 && vectors[*id as usize][0] < 12.0);
            assert!(*dist < 4.0);
        }
        // Nearest first.
        for pair in results.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn test_budget_caps_candidates() {
        let mut rng = StdRng::seed_from_u64(1);
        let vectors = clustered_vectors(&mut rng);
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let forest = AnnForest::build(3, &refs, 4, &mut rng);

        let query = vec![0.0, 0.0, 0.0];
        let results = forest.query(&refs, &query, 3, Some(8));
        assert!(results.len() <= 3);
        assert!(!results.is_empty());
    }

    #[test]
    fn test_identical_vectors_build_without_recursing_forever() {
        let vectors: Vec<Vec<f32>> = (0..100).map(|_| vec![1.0, 1.0]).collect();
        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let mut rng = StdRng::seed_from_u64(5);
        let forest = AnnForest::build(2, &refs, 2, &mut rng);
        let results = forest.query(&refs, &[1.0, 1.0], 4, None);
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn test_empty_forest_returns_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let forest = AnnForest::build(4, &[], 4, &mut rng);
        assert!(forest.query(&[], &[0.0; 4], 3, None).is_empty());
    }
}

