/// Prefilter and selection stages, run according to the requested mode

use crate::bio::fasta::{self, parse_fasta, select_by_ids, write_fasta, write_fasta_with_width};
use crate::bio::sequence::SequenceRecord;
use crate::core::config::{SelectionConfig, DEFAULT_SIMILARITY};
use crate::core::objective::{MixtureObjective, Objective};
use crate::core::selector::LazyGreedySelector;
use crate::error::{Result, SeqpickError};
use crate::tools::cdhit::build_cdhit_args;
use crate::tools::traits::{Prefilter, SimilarityProvider};
use crate::utils::progress::spinner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// CD-HIT representatives only; no selection
    CdHitOnly,
    /// Selection over the full input; CD-HIT is never run
    RepsetOnly,
    /// CD-HIT first, then selection over its representatives
    #[default]
    Combined,
}

impl RunMode {
    pub fn from_flags(cdhit_only: bool, repset_only: bool) -> Result<Self> {
        match (cdhit_only, repset_only) {
            (true, true) => Err(SeqpickError::Configuration(
                "CD-HIT-only and representative-set-only modes are mutually exclusive"
                    .to_string(),
            )),
            (true, false) => Ok(RunMode::CdHitOnly),
            (false, true) => Ok(RunMode::RepsetOnly),
            (false, false) => Ok(RunMode::Combined),
        }
    }

    pub fn uses_prefilter(&self) -> bool {
        matches!(self, RunMode::CdHitOnly | RunMode::Combined)
    }

    pub fn uses_selector(&self) -> bool {
        matches!(self, RunMode::RepsetOnly | RunMode::Combined)
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunMode::CdHitOnly => "cdhit-only",
            RunMode::RepsetOnly => "repset-only",
            RunMode::Combined => "combined",
        };
        write!(f, "{}", name)
    }
}

/// Summary of one pipeline run, written as JSON on request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub mode: RunMode,
    pub input: PathBuf,
    pub output: PathBuf,
    pub input_sequences: usize,
    /// Pool size after CD-HIT, when it ran
    pub prefiltered_sequences: Option<usize>,
    pub selected_sequences: usize,
    pub objective: Option<String>,
    pub objective_value: Option<f64>,
    pub iterations: usize,
    pub evaluations: usize,
    pub selected_ids: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

impl PipelineReport {
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

pub struct SelectionPipeline {
    mode: RunMode,
    config: SelectionConfig,
    cdhit_args: String,
    prefilter: Box<dyn Prefilter>,
    similarity: Box<dyn SimilarityProvider>,
    line_width: usize,
    progress: bool,
}

impl SelectionPipeline {
    pub fn new(
        mode: RunMode,
        config: SelectionConfig,
        prefilter: Box<dyn Prefilter>,
        similarity: Box<dyn SimilarityProvider>,
    ) -> Self {
        Self {
            mode,
            config,
            cdhit_args: String::new(),
            prefilter,
            similarity,
            line_width: fasta::DEFAULT_LINE_WIDTH,
            progress: false,
        }
    }

    /// Raw CD-HIT arguments, completed by [`build_cdhit_args`]
    pub fn with_cdhit_args(mut self, args: impl Into<String>) -> Self {
        self.cdhit_args = args.into();
        self
    }

    pub fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn run(&self, input: &Path, output: &Path) -> Result<PipelineReport> {
        let started_at = Utc::now();
        let start = Instant::now();

        // Reject bad parameters before touching the input
        self.config.validate()?;
        let cdhit_args = if self.mode.uses_prefilter() {
            let threshold = self.config.similarity_threshold.unwrap_or(DEFAULT_SIMILARITY);
            Some(build_cdhit_args(&self.cdhit_args, threshold)?)
        } else {
            None
        };

        let records = parse_fasta(input)?;
        if records.is_empty() {
            return Err(SeqpickError::EmptyInput(format!(
                "no sequences in {}",
                input.display()
            )));
        }
        tracing::info!("Loaded {} sequences from {}", records.len(), input.display());

        let mut report = PipelineReport {
            mode: self.mode,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            input_sequences: records.len(),
            prefiltered_sequences: None,
            selected_sequences: 0,
            objective: None,
            objective_value: None,
            iterations: 0,
            evaluations: 0,
            selected_ids: Vec::new(),
            started_at,
            elapsed_secs: 0.0,
        };

        let pool = match cdhit_args {
            Some(args) => {
                let pool = self.run_prefilter(input, &records, &args)?;
                report.prefiltered_sequences = Some(pool.len());
                pool
            }
            None => records,
        };

        let selected = if self.mode.uses_selector() {
            self.select(pool, &mut report)?
        } else {
            pool
        };

        write_fasta_with_width(output, &selected, self.line_width)?;
        tracing::info!(
            "Wrote {} sequences to {}",
            selected.len(),
            output.display()
        );

        report.selected_sequences = selected.len();
        report.selected_ids = selected.into_iter().map(|r| r.id).collect();
        report.elapsed_secs = start.elapsed().as_secs_f64();
        Ok(report)
    }

    fn run_prefilter(
        &self,
        input: &Path,
        records: &[SequenceRecord],
        args: &[String],
    ) -> Result<Vec<SequenceRecord>> {
        let workdir = tempfile::Builder::new().prefix("seqpick-cdhit").tempdir()?;

        // CD-HIT gets plain FASTA
        let cdhit_input = if fasta::is_gzip(input) {
            let plain = workdir.path().join("input.fasta");
            write_fasta(&plain, records)?;
            plain
        } else {
            input.to_path_buf()
        };
        let cdhit_output = workdir.path().join("representatives.fasta");

        tracing::info!("Running {} prefilter ({})", self.prefilter.name(), args.join(" "));
        let pb = spinner("Clustering with CD-HIT", self.progress);
        let outcome = self.prefilter.prefilter(&cdhit_input, &cdhit_output, args);
        pb.finish_and_clear();
        outcome?;

        let representatives = parse_fasta(&cdhit_output)?;
        let ids: Vec<String> = representatives.into_iter().map(|r| r.id).collect();
        // Keep the input records so headers and residues are reproduced exactly
        let pool = select_by_ids(records, &ids)?;
        tracing::info!(
            "{} kept {} of {} sequences",
            self.prefilter.name(),
            pool.len(),
            records.len()
        );
        Ok(pool)
    }

    fn select(
        &self,
        pool: Vec<SequenceRecord>,
        report: &mut PipelineReport,
    ) -> Result<Vec<SequenceRecord>> {
        if pool.is_empty() {
            return Err(SeqpickError::EmptyInput(
                "candidate pool is empty".to_string(),
            ));
        }

        tracing::info!(
            "Computing similarities for {} candidates with {}",
            pool.len(),
            self.similarity.name()
        );
        let matrix = self.similarity.similarity_matrix(&pool)?;
        if matrix.len() != pool.len() {
            return Err(SeqpickError::MatrixValidation(format!(
                "similarity matrix has {} rows for {} candidates",
                matrix.len(),
                pool.len()
            )));
        }
        if let Some((record, id)) = pool
            .iter()
            .zip(matrix.ids())
            .find(|(record, id)| record.id != **id)
        {
            return Err(SeqpickError::MatrixValidation(format!(
                "similarity matrix row '{}' does not match candidate '{}'",
                id, record.id
            )));
        }
        tracing::debug!(
            "Similarity matrix uses {} bytes",
            matrix.memory_bytes()
        );

        let objective = MixtureObjective::from_config(&self.config)?;
        let result = LazyGreedySelector::new()
            .with_progress(self.progress)
            .select(&matrix, &self.config)?;
        tracing::info!(
            "Selected {} representatives ({} evaluations, objective {:.4})",
            result.len(),
            result.evaluations,
            result.objective
        );

        report.objective = Some(objective.name());
        report.objective_value = Some(result.objective);
        report.iterations = result.iterations;
        report.evaluations = result.evaluations;

        let selected: Vec<SequenceRecord> = result.order.iter().map(|&i| pool[i].clone()).collect();
        for record in &selected {
            tracing::trace!("Representative: {}", record.header_str());
        }
        Ok(selected)
    }
}
