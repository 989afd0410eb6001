//! Lazy greedy representative selection
//!
//! Candidates live in a max-heap keyed by their cached marginal gain. An entry carries
//! the round (number of commits) it was computed in; when the top entry is fresh it
//! dominates every other cached upper bound and is committed, otherwise its gain is
//! recomputed and it goes back into the heap. Ties on gain resolve to the lowest index
//! through the heap ordering itself.
//!
//! With an approximation ratio above 1 a recomputed candidate is also accepted when
//! `(gain - next_bound) / (|gain| + offset)` reaches `1 / ratio - 1`, where
//! `next_bound` is the best cached gain left in the heap. This saves evaluations at
//! the cost of exactness; the exhaustive path ignores the ratio.

use crate::core::config::{Convergence, SelectionConfig};
use crate::core::matrix::SimilarityMatrix;
use crate::core::objective::{CoverageState, MixtureObjective, Objective};
use crate::error::{Result, SeqpickError};
use crate::utils::progress::progress_bar;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// One commit of the greedy loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionStep {
    pub index: usize,
    pub gain: f64,
    /// `sum_i best[i]` after this commit
    pub coverage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected matrix indices in selection order
    pub order: Vec<usize>,
    /// Sum of committed gains
    pub objective: f64,
    pub iterations: usize,
    /// Marginal gain evaluations, including the first full round
    pub evaluations: usize,
    pub steps: Vec<SelectionStep>,
}

impl SelectionResult {
    fn empty() -> Self {
        Self {
            order: Vec::new(),
            objective: 0.0,
            iterations: 0,
            evaluations: 0,
            steps: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids of the selected sequences, in selection order
    pub fn ids(&self, matrix: &SimilarityMatrix) -> Vec<String> {
        self.order.iter().map(|&i| matrix.id(i).to_string()).collect()
    }

    fn record(&mut self, index: usize, gain: f64, state: &CoverageState) {
        self.order.push(index);
        self.objective += gain;
        self.iterations += 1;
        self.steps.push(SelectionStep {
            index,
            gain,
            coverage: state.coverage(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    gain: OrderedFloat<f64>,
    index: Reverse<usize>,
    stamp: usize,
}

impl HeapEntry {
    fn new(gain: f64, index: usize, stamp: usize) -> Self {
        Self {
            gain: OrderedFloat(gain),
            index: Reverse(index),
            stamp,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LazyGreedySelector {
    progress: bool,
}

impl LazyGreedySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a progress bar over commits
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Select with the mixture objective described by `config`
    pub fn select(
        &self,
        matrix: &SimilarityMatrix,
        config: &SelectionConfig,
    ) -> Result<SelectionResult> {
        config.validate()?;
        let objective = MixtureObjective::from_config(config)?;
        self.select_with(matrix, config, &objective)
    }

    /// Select with any objective. Objectives whose gains can grow between rounds are
    /// handed to [`exhaustive_select`].
    pub fn select_with<O: Objective + ?Sized>(
        &self,
        matrix: &SimilarityMatrix,
        config: &SelectionConfig,
        objective: &O,
    ) -> Result<SelectionResult> {
        check_inputs(matrix, config)?;

        if !objective.is_diminishing() {
            tracing::debug!(
                "Objective {} is not diminishing, using exhaustive greedy",
                objective.name()
            );
            return Ok(run_exhaustive(matrix, config, objective, self.progress));
        }

        Ok(self.run_lazy(matrix, config, objective))
    }

    fn run_lazy<O: Objective + ?Sized>(
        &self,
        matrix: &SimilarityMatrix,
        config: &SelectionConfig,
        objective: &O,
    ) -> SelectionResult {
        let n = matrix.len();
        let target = config.maxsize.min(n);
        let mut state = CoverageState::new(n);
        let mut result = SelectionResult::empty();
        let pb = progress_bar(target as u64, "Selecting representatives", self.progress);

        // Every cached bound starts at +inf, so the first round always evaluates
        // each candidate against the empty selection
        let initial: Vec<HeapEntry> = (0..n)
            .into_par_iter()
            .map(|i| HeapEntry::new(objective.gain(matrix, &state, i), i, 0))
            .collect();
        result.evaluations += n;
        let mut heap = BinaryHeap::from(initial);

        let mut round = 0;
        while state.len() < target {
            let Some(top) = heap.pop() else {
                break;
            };
            let index = top.index.0;

            let gain = if top.stamp == round {
                top.gain.into_inner()
            } else {
                let gain = objective.gain(matrix, &state, index);
                result.evaluations += 1;
                let next_bound = heap.peek().map(|entry| entry.gain.into_inner());
                if !(config.is_approximate() && close_enough(config, gain, next_bound)) {
                    heap.push(HeapEntry::new(gain, index, round));
                    continue;
                }
                gain
            };
            if config.convergence == Convergence::PositiveGain && gain <= 0.0 {
                tracing::debug!("Best remaining gain {:.6} <= 0, stopping", gain);
                break;
            }

            state.commit(matrix, index);
            result.record(index, gain, &state);
            tracing::trace!(
                "Selected {} ({}) gain={:.6} coverage={:.6}",
                index,
                matrix.id(index),
                gain,
                state.coverage()
            );
            round += 1;
            pb.inc(1);
        }

        pb.finish_and_clear();
        tracing::debug!(
            "Lazy greedy selected {} of {} with {} evaluations",
            result.len(),
            n,
            result.evaluations
        );
        result
    }
}

/// Plain greedy: rescan every remaining candidate in parallel at each step.
///
/// Same tie-break and termination rules as the lazy selector; quadratic in the
/// number of evaluations.
pub fn exhaustive_select<O: Objective + ?Sized>(
    matrix: &SimilarityMatrix,
    config: &SelectionConfig,
    objective: &O,
) -> Result<SelectionResult> {
    check_inputs(matrix, config)?;
    Ok(run_exhaustive(matrix, config, objective, false))
}

fn check_inputs(matrix: &SimilarityMatrix, config: &SelectionConfig) -> Result<()> {
    config.validate()?;
    if matrix.is_empty() {
        return Err(SeqpickError::EmptyInput(
            "no candidates to select from".to_string(),
        ));
    }
    matrix.validate(config.symmetry_tolerance)
}

fn run_exhaustive<O: Objective + ?Sized>(
    matrix: &SimilarityMatrix,
    config: &SelectionConfig,
    objective: &O,
    progress: bool,
) -> SelectionResult {
    let n = matrix.len();
    let target = config.maxsize.min(n);
    let mut state = CoverageState::new(n);
    let mut result = SelectionResult::empty();
    let pb = progress_bar(target as u64, "Selecting representatives", progress);

    while state.len() < target {
        let remaining = n - state.len();
        let state_ref = &state;
        let best = (0..n)
            .into_par_iter()
            .filter(|&c| !state_ref.contains(c))
            .map(|c| (objective.gain(matrix, state_ref, c), c))
            .reduce_with(better);
        result.evaluations += remaining;

        let Some((gain, index)) = best else {
            break;
        };
        if config.convergence == Convergence::PositiveGain && gain <= 0.0 {
            tracing::debug!("Best remaining gain {:.6} <= 0, stopping", gain);
            break;
        }

        state.commit(matrix, index);
        result.record(index, gain, &state);
        pb.inc(1);
    }

    pb.finish_and_clear();
    result
}

/// Relative-gain acceptance test against the best remaining cached bound
fn close_enough(config: &SelectionConfig, gain: f64, next_bound: Option<f64>) -> bool {
    match next_bound {
        None => true,
        Some(bound) => {
            let relative = (gain - bound) / (gain.abs() + config.gain_denominator_offset);
            relative >= config.min_relative_gain()
        }
    }
}

/// Higher gain wins; equal gains go to the lower index
fn better(a: (f64, usize), b: (f64, usize)) -> (f64, usize) {
    match OrderedFloat(a.0).cmp(&OrderedFloat(b.0)) {
        Ordering::Greater => a,
        Ordering::Less => b,
        Ordering::Equal if a.1 <= b.1 => a,
        Ordering::Equal => b,
    }
}
