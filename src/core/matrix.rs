/// Dense pairwise similarity matrix over the candidate pool

use crate::core::config::DEFAULT_SYMMETRY_TOLERANCE;
use crate::error::{Result, SeqpickError};
use rayon::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    ids: Vec<String>,
    values: Vec<f64>,
    n: usize,
}

impl SimilarityMatrix {
    /// Build from rows already normalized to [0, 1], labelling positions "0".."n-1"
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let ids = (0..rows.len()).map(|i| i.to_string()).collect();
        Self::from_rows(ids, rows, DEFAULT_SYMMETRY_TOLERANCE)
    }

    /// Build from labelled rows normalized to [0, 1].
    ///
    /// Pairs that differ by at most `tolerance` are averaged so the stored matrix is
    /// exactly symmetric.
    pub fn from_rows(ids: Vec<String>, rows: Vec<Vec<f64>>, tolerance: f64) -> Result<Self> {
        let n = rows.len();
        if ids.len() != n {
            return Err(SeqpickError::MatrixValidation(format!(
                "{} ids for a matrix with {} rows",
                ids.len(),
                n
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(SeqpickError::MatrixValidation(format!(
                "matrix is not square: row {} has {} columns, expected {}",
                i,
                row.len(),
                n
            )));
        }

        let mut matrix = Self {
            ids,
            values: rows.into_iter().flatten().collect(),
            n,
        };
        matrix.validate(tolerance)?;
        matrix.symmetrize();
        check_unique_ids(&matrix.ids)?;
        Ok(matrix)
    }

    /// Build from rows of percent identity (0-100)
    pub fn from_percent_rows(ids: Vec<String>, rows: Vec<Vec<f64>>, tolerance: f64) -> Result<Self> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| v / 100.0).collect())
            .collect();
        Self::from_rows(ids, rows, tolerance)
    }

    /// Build from sparse `(i, j, similarity)` pairs in [0, 1].
    ///
    /// The diagonal is 1.0, missing pairs are 0.0 and each pair is mirrored. A pair
    /// reported more than once keeps its highest value.
    pub fn from_pairs<I>(ids: Vec<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let n = ids.len();
        let mut values = vec![0.0f64; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
        }

        for (i, j, sim) in pairs {
            if i >= n || j >= n {
                return Err(SeqpickError::MatrixValidation(format!(
                    "pair ({}, {}) out of bounds for {} sequences",
                    i, j, n
                )));
            }
            if !sim.is_finite() || !(0.0..=1.0).contains(&sim) {
                return Err(SeqpickError::MatrixValidation(format!(
                    "similarity {} for pair ({}, {}) is outside [0, 1]",
                    sim, ids[i], ids[j]
                )));
            }
            if i == j {
                continue;
            }
            let merged = values[i * n + j].max(sim);
            values[i * n + j] = merged;
            values[j * n + i] = merged;
        }

        check_unique_ids(&ids)?;
        Ok(Self { ids, values, n })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n..(i + 1) * self.n]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn id(&self, i: usize) -> &str {
        &self.ids[i]
    }

    pub fn index_map(&self) -> HashMap<&str, usize> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }

    /// Bytes held by the value buffer
    pub fn memory_bytes(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
    }

    /// Check range and symmetry. Rows are checked in parallel.
    pub fn validate(&self, tolerance: f64) -> Result<()> {
        if self.values.len() != self.n * self.n {
            return Err(SeqpickError::MatrixValidation(format!(
                "matrix holds {} values, expected {}x{}",
                self.values.len(),
                self.n,
                self.n
            )));
        }

        (0..self.n).into_par_iter().try_for_each(|i| {
            let row = self.row(i);
            for (j, &v) in row.iter().enumerate() {
                if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                    return Err(SeqpickError::MatrixValidation(format!(
                        "value {} at ({}, {}) is outside [0, 1]",
                        v, i, j
                    )));
                }
                if j > i {
                    let mirror = self.get(j, i);
                    if (v - mirror).abs() > tolerance {
                        return Err(SeqpickError::MatrixValidation(format!(
                            "matrix is not symmetric: sim({i},{j}) = {v} but sim({j},{i}) = {mirror}"
                        )));
                    }
                }
            }
            Ok(())
        })
    }

    fn symmetrize(&mut self) {
        let n = self.n;
        for i in 0..n {
            for j in (i + 1)..n {
                let mean = (self.values[i * n + j] + self.values[j * n + i]) / 2.0;
                self.values[i * n + j] = mean;
                self.values[j * n + i] = mean;
            }
        }
    }
}

fn check_unique_ids(ids: &[String]) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(SeqpickError::MatrixValidation(format!(
                "duplicate id '{}' in matrix labels",
                id
            )));
        }
    }
    Ok(())
}
