//! Configuration types for seqpick

use crate::error::{Result, SeqpickError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the redundancy penalty is scaled against the coverage term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RedundancyScale {
    /// `-sum_{j in S} sim(c, j)`
    #[default]
    Sum,
    /// The sum divided by |S|
    Mean,
}

/// When the greedy loop may stop before reaching `maxsize`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Convergence {
    /// Keep selecting until `maxsize` or the pool runs out, whatever the gain sign
    #[default]
    Exhaustive,
    /// Stop as soon as the best recomputed gain is <= 0
    PositiveGain,
}

/// Parameters of one selection run. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub maxsize: usize,
    pub mixture_weight: f64,
    /// CD-HIT identity threshold; only the prefilter stage reads it
    pub similarity_threshold: Option<f64>,
    pub redundancy: RedundancyScale,
    pub convergence: Convergence,
    pub symmetry_tolerance: f64,
    /// Accelerated acceptance: 1.0 is exact lazy greedy, larger values accept a
    /// recomputed candidate that is close enough to the next cached bound
    #[serde(default = "default_approx_ratio")]
    pub approx_ratio: f64,
    /// Added to `|gain|` in the relative-gain denominator
    #[serde(default = "default_gain_denominator_offset")]
    pub gain_denominator_offset: f64,
}

pub const DEFAULT_MIXTURE_WEIGHT: f64 = 0.5;
pub const DEFAULT_SIMILARITY: f64 = 0.9;
pub const DEFAULT_SYMMETRY_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_APPROX_RATIO: f64 = 1.0;
pub const DEFAULT_GAIN_DENOMINATOR_OFFSET: f64 = 0.01;

impl SelectionConfig {
    pub fn new(maxsize: usize, mixture_weight: f64) -> Self {
        Self {
            maxsize,
            mixture_weight,
            similarity_threshold: None,
            redundancy: RedundancyScale::default(),
            convergence: Convergence::default(),
            symmetry_tolerance: DEFAULT_SYMMETRY_TOLERANCE,
            approx_ratio: DEFAULT_APPROX_RATIO,
            gain_denominator_offset: DEFAULT_GAIN_DENOMINATOR_OFFSET,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_redundancy(mut self, redundancy: RedundancyScale) -> Self {
        self.redundancy = redundancy;
        self
    }

    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    pub fn with_symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }

    pub fn with_approx_ratio(mut self, ratio: f64) -> Self {
        self.approx_ratio = ratio;
        self
    }

    pub fn with_gain_denominator_offset(mut self, offset: f64) -> Self {
        self.gain_denominator_offset = offset;
        self
    }

    /// Whether the lazy loop may accept a candidate before its bound is fresh
    pub fn is_approximate(&self) -> bool {
        self.approx_ratio > 1.0
    }

    /// Lowest `(gain - next_bound) / (|gain| + offset)` that is still accepted.
    /// Zero at ratio 1, approaching -1 as the ratio grows.
    pub fn min_relative_gain(&self) -> f64 {
        1.0 / self.approx_ratio - 1.0
    }

    /// Reject invalid parameters before any expensive work starts
    pub fn validate(&self) -> Result<()> {
        if self.maxsize == 0 {
            return Err(SeqpickError::Configuration(
                "maxsize must be greater than 0".to_string(),
            ));
        }
        check_unit_interval("mixture weight", self.mixture_weight)?;
        if let Some(threshold) = self.similarity_threshold {
            check_unit_interval("similarity threshold", threshold)?;
        }
        if !self.symmetry_tolerance.is_finite() || self.symmetry_tolerance < 0.0 {
            return Err(SeqpickError::Configuration(format!(
                "symmetry tolerance must be a non-negative number, got {}",
                self.symmetry_tolerance
            )));
        }
        check_approximation(self.approx_ratio, self.gain_denominator_offset)?;
        Ok(())
    }
}

fn check_approximation(ratio: f64, offset: f64) -> Result<()> {
    if !ratio.is_finite() || ratio < 1.0 {
        return Err(SeqpickError::Configuration(format!(
            "approximation ratio must be at least 1.0, got {}",
            ratio
        )));
    }
    if !offset.is_finite() || offset <= 0.0 {
        return Err(SeqpickError::Configuration(format!(
            "gain denominator offset must be positive, got {}",
            offset
        )));
    }
    Ok(())
}

pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SeqpickError::Configuration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

/// On-disk configuration (`seqpick.toml`)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default)]
    pub cdhit: CdHitSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub performance: PerformanceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionSection {
    /// Unset means "no limit": every candidate may be selected
    #[serde(default)]
    pub maxsize: Option<usize>,
    #[serde(default = "default_mixture_weight")]
    pub mixture_weight: f64,
    #[serde(default)]
    pub redundancy: RedundancyScale,
    #[serde(default)]
    pub convergence: Convergence,
    #[serde(default = "default_symmetry_tolerance")]
    pub symmetry_tolerance: f64,
    #[serde(default = "default_approx_ratio")]
    pub approx_ratio: f64,
    #[serde(default = "default_gain_denominator_offset")]
    pub gain_denominator_offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CdHitSection {
    #[serde(default = "default_similarity")]
    pub similarity: f64,
    /// Raw arguments appended to the cd-hit command line
    #[serde(default)]
    pub extra_args: String,
    #[serde(default = "default_cdhit_binary")]
    pub binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsSection {
    /// Per-invocation timeout for external tools
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_mafft_binary")]
    pub mafft_binary: String,
    #[serde(default)]
    pub mafft_args: String,
    #[serde(default = "default_alipid_binary")]
    pub alipid_binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSection {
    #[serde(default = "default_line_width")]
    pub line_width: usize,
    #[serde(default = "default_progress")]
    pub progress: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSection {
    /// Worker threads (0 = all available cores)
    #[serde(default)]
    pub threads: usize,
}

fn default_mixture_weight() -> f64 { DEFAULT_MIXTURE_WEIGHT }
fn default_symmetry_tolerance() -> f64 { DEFAULT_SYMMETRY_TOLERANCE }
fn default_similarity() -> f64 { DEFAULT_SIMILARITY }
fn default_approx_ratio() -> f64 { DEFAULT_APPROX_RATIO }
fn default_gain_denominator_offset() -> f64 { DEFAULT_GAIN_DENOMINATOR_OFFSET }
fn default_cdhit_binary() -> String { "cd-hit".to_string() }
fn default_timeout_secs() -> u64 { 3600 }
fn default_mafft_binary() -> String { "mafft".to_string() }
fn default_alipid_binary() -> String { "esl-alipid".to_string() }
fn default_line_width() -> usize { crate::bio::fasta::DEFAULT_LINE_WIDTH }
fn default_progress() -> bool { true }

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            maxsize: None,
            mixture_weight: default_mixture_weight(),
            redundancy: RedundancyScale::default(),
            convergence: Convergence::default(),
            symmetry_tolerance: default_symmetry_tolerance(),
            approx_ratio: default_approx_ratio(),
            gain_denominator_offset: default_gain_denominator_offset(),
        }
    }
}

impl Default for CdHitSection {
    fn default() -> Self {
        Self {
            similarity: default_similarity(),
            extra_args: String::new(),
            binary: default_cdhit_binary(),
        }
    }
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            mafft_binary: default_mafft_binary(),
            mafft_args: String::new(),
            alipid_binary: default_alipid_binary(),
        }
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            line_width: default_line_width(),
            progress: default_progress(),
        }
    }
}

impl Default for PerformanceSection {
    fn default() -> Self {
        Self { threads: 0 }
    }
}

impl Config {
    /// Check every value that has a bounded domain
    pub fn validate(&self) -> Result<()> {
        if self.selection.maxsize == Some(0) {
            return Err(SeqpickError::Configuration(
                "selection.maxsize must be greater than 0".to_string(),
            ));
        }
        check_unit_interval("selection.mixture_weight", self.selection.mixture_weight)?;
        check_unit_interval("cdhit.similarity", self.cdhit.similarity)?;
        check_approximation(
            self.selection.approx_ratio,
            self.selection.gain_denominator_offset,
        )?;
        if self.tools.timeout_secs == 0 {
            return Err(SeqpickError::Configuration(
                "tools.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Run parameters for a candidate pool of `pool_size` sequences
    pub fn selection_config(&self, pool_size: usize) -> SelectionConfig {
        SelectionConfig::new(
            self.selection.maxsize.unwrap_or(pool_size),
            self.selection.mixture_weight,
        )
        .with_similarity_threshold(self.cdhit.similarity)
        .with_redundancy(self.selection.redundancy)
        .with_convergence(self.selection.convergence)
        .with_symmetry_tolerance(self.selection.symmetry_tolerance)
        .with_approx_ratio(self.selection.approx_ratio)
        .with_gain_denominator_offset(self.selection.gain_denominator_offset)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SeqpickError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read config {}: {}", path.display(), e),
        ))
    })?;
    let config: Config = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Locate the config file: explicit path, then `$SEQPICK_CONFIG`, then the user config dir
pub fn discover_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("SEQPICK_CONFIG") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir()
        .map(|dir| dir.join("seqpick").join("config.toml"))
        .filter(|p| p.exists())
}

/// Load the discovered config, or the defaults when there is none
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config> {
    match discover_config_path(explicit) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            load_config(&path)
        }
        None => Ok(Config::default()),
    }
}
