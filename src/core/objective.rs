//! Marginal-gain objective for representative-set selection.
//!
//! The objective mixes two set functions over the selection S:
//!
//! - coverage (facility location): `sum_i max_{j in S} sim(i, j)`, monotone and
//!   submodular, which alone gives the classical (1 - 1/e) greedy guarantee;
//! - redundancy: `-sum_{j < k in S} sim(j, k)`, whose marginal value
//!   `-sum_{j in S} sim(c, j)` only shrinks as S grows.
//!
//! Both marginals are non-increasing in S, so a gain cached against an earlier state
//! is an upper bound on the current one and lazy evaluation returns exactly what a
//! full greedy re-scan would. The redundancy term is not monotone, though, so for a
//! mixture weight below 1 the combined objective carries no approximation guarantee:
//! the greedy result is a principled heuristic, not a certified bound.
//!
//! With [`RedundancyScale::Mean`] the penalty is averaged over |S|. That average can
//! rise as S grows, cached gains stop being upper bounds, and
//! [`Objective::is_diminishing`] reports `false` so the selector re-scans every
//! candidate instead of trusting the cache.

use crate::core::config::{check_unit_interval, RedundancyScale, SelectionConfig};
use crate::core::matrix::SimilarityMatrix;
use crate::error::Result;

/// Per-universe best similarity to the current selection
#[derive(Debug, Clone)]
pub struct CoverageState {
    best: Vec<f64>,
    selected: Vec<usize>,
    in_selection: Vec<bool>,
    coverage: f64,
}

impl CoverageState {
    pub fn new(n: usize) -> Self {
        Self {
            best: vec![0.0; n],
            selected: Vec::new(),
            in_selection: vec![false; n],
            coverage: 0.0,
        }
    }

    pub fn best(&self) -> &[f64] {
        &self.best
    }

    /// Committed indices in selection order
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn contains(&self, index: usize) -> bool {
        self.in_selection[index]
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// `sum_i best[i]`
    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// Add `candidate` to the selection and raise `best` where it covers better
    pub fn commit(&mut self, matrix: &SimilarityMatrix, candidate: usize) {
        debug_assert!(!self.in_selection[candidate], "candidate committed twice");
        // sim(i, c) read through row c; the matrix is symmetric
        for (best, &sim) in self.best.iter_mut().zip(matrix.row(candidate)) {
            if sim > *best {
                *best = sim;
            }
        }
        self.coverage = self.best.iter().sum();
        self.in_selection[candidate] = true;
        self.selected.push(candidate);
    }
}

/// A set objective that can price one more candidate against a coverage state
pub trait Objective: Send + Sync {
    fn name(&self) -> String;

    /// Coverage improvement from adding `candidate`
    fn coverage_gain(
        &self,
        matrix: &SimilarityMatrix,
        state: &CoverageState,
        candidate: usize,
    ) -> f64;

    /// Redundancy penalty for adding `candidate` (<= 0)
    fn redundancy_gain(
        &self,
        matrix: &SimilarityMatrix,
        state: &CoverageState,
        candidate: usize,
    ) -> f64;

    /// Marginal value of adding `candidate` to the state's selection. Must not mutate.
    fn gain(&self, matrix: &SimilarityMatrix, state: &CoverageState, candidate: usize) -> f64;

    /// True when marginal gains never increase as the selection grows
    fn is_diminishing(&self) -> bool {
        true
    }
}

/// `a * coverage_gain + (1 - a) * redundancy_gain`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixtureObjective {
    mixture_weight: f64,
    redundancy: RedundancyScale,
}

impl MixtureObjective {
    pub fn new(mixture_weight: f64) -> Result<Self> {
        check_unit_interval("mixture weight", mixture_weight)?;
        Ok(Self {
            mixture_weight,
            redundancy: RedundancyScale::Sum,
        })
    }

    pub fn from_config(config: &SelectionConfig) -> Result<Self> {
        Ok(Self::new(config.mixture_weight)?.with_redundancy(config.redundancy))
    }

    pub fn with_redundancy(mut self, redundancy: RedundancyScale) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn mixture_weight(&self) -> f64 {
        self.mixture_weight
    }

    /// Objective value of committing `order` one element at a time
    pub fn evaluate(&self, matrix: &SimilarityMatrix, order: &[usize]) -> f64 {
        let mut state = CoverageState::new(matrix.len());
        let mut value = 0.0;
        for &c in order {
            value += self.gain(matrix, &state, c);
            state.commit(matrix, c);
        }
        value
    }
}

impl Objective for MixtureObjective {
    fn name(&self) -> String {
        let scale = match self.redundancy {
            RedundancyScale::Sum => "sum",
            RedundancyScale::Mean => "mean",
        };
        format!(
            "mix-coverage({})-redundancy-{}({})",
            self.mixture_weight,
            scale,
            1.0 - self.mixture_weight
        )
    }

    /// `sum_i max(0, sim(i, c) - best[i])`
    fn coverage_gain(
        &self,
        matrix: &SimilarityMatrix,
        state: &CoverageState,
        candidate: usize,
    ) -> f64 {
        matrix
            .row(candidate)
            .iter()
            .zip(state.best())
            .map(|(&sim, &best)| (sim - best).max(0.0))
            .sum()
    }

    /// `-sum_{j in S} sim(c, j)`, divided by |S| under the mean scale
    fn redundancy_gain(
        &self,
        matrix: &SimilarityMatrix,
        state: &CoverageState,
        candidate: usize,
    ) -> f64 {
        let row = matrix.row(candidate);
        let total: f64 = state.selected().iter().map(|&j| row[j]).sum();
        match self.redundancy {
            RedundancyScale::Sum => -total,
            RedundancyScale::Mean if state.is_empty() => 0.0,
            RedundancyScale::Mean => -total / state.len() as f64,
        }
    }

    fn gain(&self, matrix: &SimilarityMatrix, state: &CoverageState, candidate: usize) -> f64 {
        let alpha = self.mixture_weight;
        let mut gain = 0.0;
        if alpha > 0.0 {
            gain += alpha * self.coverage_gain(matrix, state, candidate);
        }
        if alpha < 1.0 {
            gain += (1.0 - alpha) * self.redundancy_gain(matrix, state, candidate);
        }
        gain
    }

    fn is_diminishing(&self) -> bool {
        self.redundancy == RedundancyScale::Sum || self.mixture_weight == 1.0
    }
}
