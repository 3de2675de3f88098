//! CART regression tree.
//!
//! Splits are chosen by variance reduction (equivalently, the largest drop in
//! the sum of squared errors). For each feature the candidate rows are sorted
//! once and swept left to right with running sums, so evaluating every
//! threshold costs `O(n log n)` per feature and node.
//!
//! Thresholds sit halfway between consecutive distinct feature values, and a
//! row goes left when `x <= threshold`. Ties between equally good splits keep
//! the first one found (lowest feature index, then lowest threshold), which
//! keeps fitting deterministic.

use nalgebra::{DMatrix, DVector};

/// Gains below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    root: Node,
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Grow a tree on the given row indices (duplicates allowed, which is how
    /// bootstrap samples are expressed).
    ///
    /// `indices` must be non-empty and within `x`'s row range.
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>, indices: &[usize], params: &TreeParams) -> Self {
        let root = build(x, y, indices.to_vec(), 0, params);
        Self { root }
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if v <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Depth of the deepest leaf (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

fn build(x: &DMatrix<f64>, y: &DVector<f64>, indices: Vec<usize>, depth: usize, params: &TreeParams) -> Node {
    let value = mean_of(y, &indices);

    let stop = indices.len() < params.min_samples_split
        || indices.len() < 2 * params.min_samples_leaf
        || depth >= params.max_depth
        || is_constant(y, &indices);
    if stop {
        return Node::Leaf { value };
    }

    let Some(choice) = best_split(x, y, &indices, params.min_samples_leaf) else {
        return Node::Leaf { value };
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| x[(i, choice.feature)] <= choice.threshold);

    Node::Split {
        feature: choice.feature,
        threshold: choice.threshold,
        left: Box::new(build(x, y, left, depth + 1, params)),
        right: Box::new(build(x, y, right, depth + 1, params)),
    }
}

fn best_split(x: &DMatrix<f64>, y: &DVector<f64>, indices: &[usize], min_leaf: usize) -> Option<SplitChoice> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let parent_sse = sse(total_sum, total_sq, n);

    let mut best: Option<SplitChoice> = None;
    let mut order = indices.to_vec();

    for feature in 0..x.ncols() {
        order.sort_by(|&a, &b| {
            x[(a, feature)]
                .partial_cmp(&x[(b, feature)])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for pos in 0..n - 1 {
            let i = order[pos];
            left_sum += y[i];
            left_sq += y[i] * y[i];

            let left_n = pos + 1;
            let right_n = n - left_n;
            let here = x[(i, feature)];
            let next = x[(order[pos + 1], feature)];
            if here >= next || left_n < min_leaf || right_n < min_leaf {
                continue;
            }

            let child_sse = sse(left_sum, left_sq, left_n) + sse(total_sum - left_sum, total_sq - left_sq, right_n);
            let gain = parent_sse - child_sse;
            if gain > MIN_GAIN && best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(SplitChoice {
                    feature,
                    threshold: (here + next) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}

fn sse(sum: f64, sq_sum: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    (sq_sum - sum * sum / n as f64).max(0.0)
}

fn mean_of(y: &DVector<f64>, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(y: &DVector<f64>, indices: &[usize]) -> bool {
    let Some(&first) = indices.first() else { return true };
    indices.iter().all(|&i| y[i] == y[first])
}
