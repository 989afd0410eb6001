pub mod bio;
pub mod cli;
pub mod core;
pub mod error;
pub mod tools;
pub mod utils;

pub use crate::core::{
    matrix::SimilarityMatrix,
    objective::{CoverageState, MixtureObjective, Objective},
    pipeline::{RunMode, SelectionPipeline},
    reducer::{reduce_database_redundancy, Reducer},
    selector::{LazyGreedySelector, SelectionResult},
    config::SelectionConfig,
};
pub use crate::error::{Result, SeqpickError};
