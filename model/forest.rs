//! # Random-Forest Regression
//!
//! A bagged ensemble of CART regression trees over a fully numeric design
//! matrix (categories are one-hot encoded upstream). Trees grow without a
//! depth cap, split on the variance criterion with midpoint thresholds, and
//! scan every feature at every split, so a tree is deterministic given its
//! bootstrap sample. Each tree draws that sample from its own ChaCha stream
//! seeded by `base_seed + tree_index`; rayon only changes the order trees are
//! built in, never their content.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

const DEFAULT_TREES: usize = 100;
const MIN_SAMPLES_SPLIT: usize = 2;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// One CART regression tree. Leaves predict the mean of their samples.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: TreeNode,
}

impl RegressionTree {
    /// Fits a tree on the rows of `x` selected by `indices`.
    fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, indices: &[usize]) -> Self {
        Self {
            root: build_node(x, y, indices),
        }
    }

    fn predict_sample(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

fn mean(y: ArrayView1<'_, f64>, indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(y: ArrayView1<'_, f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
}

fn build_node(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, indices: &[usize]) -> TreeNode {
    if indices.len() < MIN_SAMPLES_SPLIT || is_constant(y, indices) {
        return TreeNode::Leaf {
            value: mean(y, indices),
        };
    }

    let Some((feature, threshold)) = find_best_split(x, y, indices) else {
        return TreeNode::Leaf {
            value: mean(y, indices),
        };
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[[i, feature]] <= threshold);

    if left_indices.is_empty() || right_indices.is_empty() {
        return TreeNode::Leaf {
            value: mean(y, indices),
        };
    }

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_node(x, y, &left_indices)),
        right: Box::new(build_node(x, y, &right_indices)),
    }
}

/// Scans every feature for the threshold that most reduces the weighted
/// variance of the target. Candidate thresholds are midpoints between
/// consecutive distinct sorted values. Returns `None` when no split improves
/// on the parent.
fn find_best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    indices: &[usize],
) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let parent_impurity = {
        let m = mean(y, indices);
        indices.iter().map(|&i| (y[i] - m).powi(2)).sum::<f64>() / n
    };

    let mut best: Option<(usize, f64, f64)> = None;
    for feature in 0..x.ncols() {
        let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature]]).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();

        for window in values.windows(2) {
            let threshold = (window[0] + window[1]) / 2.0;

            // Incremental impurity: Var = E[y²] − E[y]² per side.
            let mut left = (0usize, 0.0f64, 0.0f64);
            let mut right = (0usize, 0.0f64, 0.0f64);
            for &i in indices {
                let yi = y[i];
                let side = if x[[i, feature]] <= threshold {
                    &mut left
                } else {
                    &mut right
                };
                side.0 += 1;
                side.1 += yi;
                side.2 += yi * yi;
            }
            if left.0 == 0 || right.0 == 0 {
                continue;
            }

            let impurity_of = |(count, sum, sq_sum): (usize, f64, f64)| {
                let c = count as f64;
                (sq_sum / c - (sum / c).powi(2)).max(0.0)
            };
            let weighted = (left.0 as f64 * impurity_of(left)
                + right.0 as f64 * impurity_of(right))
                / n;
            let gain = parent_impurity - weighted;
            if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature, threshold, gain));
            }
        }
    }
    best.map(|(feature, threshold, _)| (feature, threshold))
}

/// The bagged regression forest.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
    n_trees: usize,
    seed: u64,
}

impl RandomForestRegressor {
    pub fn new(seed: u64) -> Self {
        Self {
            trees: Vec::new(),
            n_trees: DEFAULT_TREES,
            seed,
        }
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees.max(1);
        self
    }

    /// Fits the forest. Trees build in parallel; each draws a bootstrap
    /// sample of the full training size from its own seeded stream.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) {
        debug_assert_eq!(x.nrows(), y.len());
        let n_samples = x.nrows();
        let base_seed = self.seed;

        self.trees = (0..self.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed + tree_idx as u64);
                let sample: Vec<usize> = (0..n_samples)
                    .map(|_| rng.gen_range(0..n_samples))
                    .collect();
                RegressionTree::fit(x.view(), y.view(), &sample)
            })
            .collect();
    }

    /// Mean prediction across trees for every row of `x`.
    pub fn predict(&self, x: &Array2<f64>) -> Array1<f64> {
        let n_trees = self.trees.len() as f64;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                self.trees
                    .iter()
                    .map(|tree| tree.predict_sample(row))
                    .sum::<f64>()
                    / n_trees
            })
            .collect();
        Array1::from_vec(predictions)
    }

    /// Prediction for a single preprocessed row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.trees
            .iter()
            .map(|tree| tree.predict_sample(row))
            .sum::<f64>()
            / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
