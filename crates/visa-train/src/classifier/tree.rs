//! CART decision tree stored as flat node arrays.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rkyv::Archive;
use serde::{Deserialize, Serialize};
use visa_model::Matrix;

use super::{Criterion, MaxFeatures, Predictor, n_classes};

type NodeId = u32;

/// Structure-of-arrays tree. Node 0 is the root.
///
/// A row goes left when its split feature is `<=` the node threshold.
#[derive(Debug, Clone, PartialEq, Default, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct Tree {
    split_indices: Vec<u32>,
    split_thresholds: Vec<f64>,
    left_children: Vec<NodeId>,
    right_children: Vec<NodeId>,
    is_leaf: Vec<bool>,
    leaf_values: Vec<u8>,
}

impl Tree {
    pub fn n_nodes(&self) -> usize {
        self.is_leaf.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.is_leaf.iter().filter(|&&leaf| leaf).count()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        if self.n_nodes() == 0 {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0 as NodeId, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let n = node as usize;
            if self.is_leaf[n] {
                deepest = deepest.max(depth);
            } else {
                stack.push((self.left_children[n], depth + 1));
                stack.push((self.right_children[n], depth + 1));
            }
        }
        deepest
    }

    pub fn predict_row(&self, row: &[f64]) -> u8 {
        if self.n_nodes() == 0 {
            return 0;
        }
        let mut node = 0usize;
        while !self.is_leaf[node] {
            let feature = self.split_indices[node] as usize;
            node = if row[feature] <= self.split_thresholds[node] {
                self.left_children[node] as usize
            } else {
                self.right_children[node] as usize
            };
        }
        self.leaf_values[node]
    }

    fn push_leaf(&mut self, value: u8) -> NodeId {
        let id = self.n_nodes() as NodeId;
        self.split_indices.push(0);
        self.split_thresholds.push(0.0);
        self.left_children.push(0);
        self.right_children.push(0);
        self.is_leaf.push(true);
        self.leaf_values.push(value);
        id
    }

    fn set_split(&mut self, node: NodeId, feature: usize, threshold: f64, left: NodeId, right: NodeId) {
        let n = node as usize;
        self.split_indices[n] = feature as u32;
        self.split_thresholds[n] = threshold;
        self.left_children[n] = left;
        self.right_children[n] = right;
        self.is_leaf[n] = false;
    }
}

/// Settings used while growing one tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GrowSettings {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeGrower<'a, R> {
    x: &'a Matrix,
    y: &'a [u8],
    n_classes: usize,
    settings: GrowSettings,
    rng: &'a mut R,
    tree: Tree,
}

impl<R: Rng> TreeGrower<'_, R> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[usize::from(self.y[i])] += 1;
        }
        counts
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize) -> NodeId {
        let counts = self.class_counts(samples);
        let majority = majority_class(&counts);
        let node = self.tree.push_leaf(majority);

        let n = samples.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure
            || self.settings.max_depth.is_some_and(|max| depth >= max)
            || n < self.settings.min_samples_split
            || n < 2 * self.settings.min_samples_leaf
        {
            return node;
        }

        let Some(split) = self.best_split(samples) else {
            return node;
        };
        let mid = partition(samples, |&i| self.x.get(i, split.feature) <= split.threshold);
        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.tree.set_split(node, split.feature, split.threshold, left, right);
        node
    }

    /// Feature visiting order. Shuffled when subsampling.
    fn feature_order(&mut self) -> (Vec<usize>, usize) {
        let n_features = self.x.cols();
        let m = self.settings.max_features.count(n_features);
        let mut order: Vec<usize> = (0..n_features).collect();
        if m < n_features {
            order.shuffle(self.rng);
        }
        (order, m)
    }

    /// Lowest weighted child impurity.
    ///
    /// Features are visited until `max_features` of them offered a valid
    /// split, so constant features do not use up the budget.
    fn best_split(&mut self, samples: &[usize]) -> Option<Split> {
        let n = samples.len();
        let min_leaf = self.settings.min_samples_leaf;
        let criterion = self.settings.criterion;
        let total = self.class_counts(samples);
        let mut best: Option<Split> = None;
        let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(n);
        let (order, budget) = self.feature_order();
        let mut visited = 0;

        for feature in order {
            if visited == budget {
                break;
            }
            let mut splittable = false;
            pairs.clear();
            pairs.extend(samples.iter().map(|&i| (self.x.get(i, feature), self.y[i])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left = vec![0usize; self.n_classes];
            for i in 0..n - 1 {
                left[usize::from(pairs[i].1)] += 1;
                let n_left = i + 1;
                let n_right = n - n_left;
                if pairs[i].0 >= pairs[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                splittable = true;
                let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let impurity = (n_left as f64 * criterion.impurity(&left, n_left)
                    + n_right as f64 * criterion.impurity(&right, n_right))
                    / n as f64;
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(Split {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
            if splittable {
                visited += 1;
            }
        }
        best
    }
}

fn majority_class(counts: &[usize]) -> u8 {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best as u8
}

/// Move elements matching `pred` to the front. Returns how many matched.
fn partition<F: Fn(&usize) -> bool>(samples: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..samples.len() {
        if pred(&samples[i]) {
            samples.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

/// Grow a tree over `samples`, which may repeat rows.
pub(crate) fn grow_tree<R: Rng>(
    x: &Matrix,
    y: &[u8],
    mut samples: Vec<usize>,
    settings: GrowSettings,
    rng: &mut R,
) -> Tree {
    let mut grower = TreeGrower {
        x,
        y,
        n_classes: n_classes(y),
        settings,
        rng,
        tree: Tree::default(),
    };
    grower.grow(&mut samples, 0);
    grower.tree
}

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Archive, rkyv::Serialize, rkyv::Deserialize,
)]
#[serde(default, deny_unknown_fields)]
pub struct TreeParams {
    pub criterion: Criterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub random_state: Option<u64>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: None,
        }
    }
}

impl TreeParams {
    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_growth(self.min_samples_split, self.min_samples_leaf)
    }

    pub(crate) fn settings(&self) -> GrowSettings {
        GrowSettings {
            criterion: self.criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

pub(crate) fn validate_growth(min_samples_split: usize, min_samples_leaf: usize) -> Result<(), String> {
    if min_samples_split < 2 {
        return Err("min_samples_split must be at least 2".to_string());
    }
    if min_samples_leaf < 1 {
        return Err("min_samples_leaf must be at least 1".to_string());
    }
    Ok(())
}

pub(crate) fn seeded_rng(random_state: Option<u64>) -> StdRng {
    match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Fitted decision tree.
#[derive(Debug, Clone, PartialEq, Archive, rkyv::Serialize, rkyv::Deserialize)]
pub struct DecisionTreeClassifier {
    params: TreeParams,
    tree: Tree,
}

impl DecisionTreeClassifier {
    pub fn fit(params: &TreeParams, x: &Matrix, y: &[u8]) -> Self {
        let mut rng = seeded_rng(params.random_state);
        let tree = grow_tree(x, y, (0..x.rows()).collect(), params.settings(), &mut rng);
        tracing::debug!(
            nodes = tree.n_nodes(),
            leaves = tree.n_leaves(),
            depth = tree.depth(),
            "grew decision tree"
        );
        Self {
            params: params.clone(),
            tree,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }
}

impl Predictor for DecisionTreeClassifier {
    fn predict_row(&self, row: &[f64]) -> u8 {
        self.tree.predict_row(row)
    }
}
