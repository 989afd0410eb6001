/// Library entry point: wire configuration and collaborators into a pipeline run

use crate::core::config::{Config, Convergence, RedundancyScale, SelectionConfig};
use crate::core::pipeline::{PipelineReport, RunMode, SelectionPipeline};
use crate::error::{Result, SeqpickError};
use crate::tools::alipid::{AlignmentSimilarity, EslAlipid, IdentityTableSimilarity};
use crate::tools::cdhit::CdHit;
use crate::tools::mafft::Mafft;
use crate::tools::traits::{Prefilter, SimilarityProvider};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Reducer {
    config: Config,
    mode: RunMode,
    identities: Option<PathBuf>,
    report_path: Option<PathBuf>,
    silent: bool,
    prefilter: Option<Box<dyn Prefilter>>,
    similarity: Option<Box<dyn SimilarityProvider>>,
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Reducer {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mode: RunMode::default(),
            identities: None,
            report_path: None,
            silent: false,
            prefilter: None,
            similarity: None,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// `None` keeps every candidate the objective will take
    pub fn with_maxsize(mut self, maxsize: Option<usize>) -> Self {
        self.config.selection.maxsize = maxsize;
        self
    }

    pub fn with_mixture_weight(mut self, weight: f64) -> Self {
        self.config.selection.mixture_weight = weight;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.cdhit.similarity = threshold;
        self
    }

    pub fn with_cdhit_args(mut self, args: impl Into<String>) -> Self {
        self.config.cdhit.extra_args = args.into();
        self
    }

    pub fn with_redundancy(mut self, redundancy: RedundancyScale) -> Self {
        self.config.selection.redundancy = redundancy;
        self
    }

    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.config.selection.convergence = convergence;
        self
    }

    /// 1.0 keeps lazy greedy exact; larger ratios accept near-best candidates early
    pub fn with_approx_ratio(mut self, ratio: f64) -> Self {
        self.config.selection.approx_ratio = ratio;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.tools.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Read similarities from an `esl-alipid` table instead of aligning
    pub fn with_identities(mut self, path: Option<PathBuf>) -> Self {
        self.identities = path;
        self
    }

    pub fn with_report(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_prefilter(mut self, prefilter: Box<dyn Prefilter>) -> Self {
        self.prefilter = Some(prefilter);
        self
    }

    pub fn with_similarity_provider(mut self, provider: Box<dyn SimilarityProvider>) -> Self {
        self.similarity = Some(provider);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parameters handed to the selector. An unset maxsize is unbounded.
    pub fn selection_config(&self) -> SelectionConfig {
        self.config.selection_config(usize::MAX)
    }

    /// Run the pipeline. Without `output` the result goes to `<stem>_reduced.<ext>`
    /// next to the input.
    pub fn reduce(self, input: &Path, output: Option<&Path>) -> Result<PipelineReport> {
        self.config.validate()?;
        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input),
        };
        if output == input {
            return Err(SeqpickError::Configuration(format!(
                "output {} would overwrite the input",
                output.display()
            )));
        }

        let selection = self.selection_config();
        let timeout = Duration::from_secs(self.config.tools.timeout_secs);

        let prefilter: Box<dyn Prefilter> = match self.prefilter {
            Some(prefilter) => prefilter,
            None => Box::new(CdHit::new(self.config.cdhit.binary.clone()).with_timeout(timeout)),
        };
        let similarity: Box<dyn SimilarityProvider> = match (self.similarity, &self.identities) {
            (Some(provider), _) => provider,
            (None, Some(path)) => Box::new(IdentityTableSimilarity::new(path.clone())),
            (None, None) => {
                let tools = &self.config.tools;
                Box::new(AlignmentSimilarity::new(
                    Mafft::new(tools.mafft_binary.clone())
                        .with_extra_args(tools.mafft_args.clone())
                        .with_threads(self.config.performance.threads)
                        .with_timeout(timeout),
                    EslAlipid::new(tools.alipid_binary.clone()).with_timeout(timeout),
                ))
            }
        };

        tracing::info!(
            "Reducing {} ({} mode, mixture weight {})",
            input.display(),
            self.mode,
            selection.mixture_weight
        );

        let pipeline = SelectionPipeline::new(self.mode, selection, prefilter, similarity)
            .with_cdhit_args(self.config.cdhit.extra_args.clone())
            .with_line_width(self.config.output.line_width)
            .with_progress(self.config.output.progress && !self.silent);
        let report = pipeline.run(input, &output)?;

        if let Some(path) = &self.report_path {
            report.write_json(path)?;
            tracing::info!("Report written to {}", path.display());
        }
        Ok(report)
    }
}

/// `<stem>_reduced.<ext>` beside `input`; a `.gz` suffix is kept outermost
pub fn default_output_path(input: &Path) -> PathBuf {
    let (base, gz) = match input.extension() {
        Some(ext) if ext == "gz" => (input.with_extension(""), true),
        _ => (input.to_path_buf(), false),
    };

    let stem = base
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    let mut name = stem;
    name.push("_reduced");
    if let Some(ext) = base.extension() {
        name.push(".");
        name.push(ext);
    }
    if gz {
        name.push(".gz");
    }
    input.with_file_name(name)
}

/// Reduce `input_fasta` to a representative subset and return the output path.
///
/// With `cdhit` the input is first clustered by CD-HIT at `similarity_threshold`
/// (`cdhit_args` are passed through), then the representative set is chosen with
/// `mixture_weight` trading coverage against redundancy. `maxsize` of `None` keeps
/// all candidates.
pub fn reduce_database_redundancy(
    input_fasta: &Path,
    output_fasta: Option<&Path>,
    maxsize: Option<usize>,
    mixture_weight: f64,
    cdhit: bool,
    cdhit_args: Option<&str>,
    similarity_threshold: f64,
) -> Result<PathBuf> {
    let mode = if cdhit {
        RunMode::Combined
    } else {
        RunMode::RepsetOnly
    };
    let report = Reducer::default()
        .with_mode(mode)
        .with_maxsize(maxsize)
        .with_mixture_weight(mixture_weight)
        .with_similarity_threshold(similarity_threshold)
        .with_cdhit_args(cdhit_args.unwrap_or_default())
        .with_silent(true)
        .reduce(input_fasta, output_fasta)?;
    Ok(report.output)
}
