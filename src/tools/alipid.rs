//! Pairwise identities from `esl-alipid`, and the similarity providers built on them.
//!
//! The table is whitespace separated with a `#` comment header:
//!
//! ```text
//! # seqname1 seqname2 %id nid denomid %match nmatch denommatch
//! seq1/1-120 seq2/1-118 87.50 105 120 98.33 118 120
//! ```
//!
//! Only the two names and `%id` are used. Names may carry a `/start-end` suffix.

use crate::bio::fasta::write_fasta;
use crate::bio::sequence::SequenceRecord;
use crate::core::matrix::SimilarityMatrix;
use crate::error::{Result, SeqpickError};
use crate::tools::mafft::Mafft;
use crate::tools::runner::{resolve_binary, ToolCommand, DEFAULT_TIMEOUT};
use crate::tools::traits::SimilarityProvider;
use crate::tools::Tool;
use crate::utils::parallel::chunk_size_for_parallelism;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityPair {
    pub first: String,
    pub second: String,
    /// Percent identity, 0-100
    pub percent_identity: f64,
}

/// Drop an alignment range suffix such as `/12-240`
pub fn strip_range_suffix(name: &str) -> &str {
    match name.rsplit_once('/') {
        Some((base, range)) if !base.is_empty() && is_range(range) => base,
        _ => name,
    }
}

fn is_range(s: &str) -> bool {
    match s.split_once('-') {
        Some((start, end)) => {
            !start.is_empty()
                && !end.is_empty()
                && start.bytes().all(|b| b.is_ascii_digit())
                && end.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<Option<IdentityPair>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(SeqpickError::Parse(format!(
            "identity table line {}: expected at least 3 columns, found {}",
            line_no,
            fields.len()
        )));
    }

    let percent_identity: f64 = fields[2].parse().map_err(|_| {
        SeqpickError::Parse(format!(
            "identity table line {}: invalid %id '{}'",
            line_no, fields[2]
        ))
    })?;
    if !(0.0..=100.0).contains(&percent_identity) {
        return Err(SeqpickError::Parse(format!(
            "identity table line {}: %id {} outside 0-100",
            line_no, percent_identity
        )));
    }

    Ok(Some(IdentityPair {
        first: strip_range_suffix(fields[0]).to_string(),
        second: strip_range_suffix(fields[1]).to_string(),
        percent_identity,
    }))
}

/// Parse `esl-alipid` output. Lines are parsed in parallel chunks.
pub fn parse_alipid_table(text: &str) -> Result<Vec<IdentityPair>> {
    let lines: Vec<&str> = text.lines().collect();
    let chunk = chunk_size_for_parallelism(lines.len(), 0);

    let chunks = lines
        .par_chunks(chunk)
        .enumerate()
        .map(|(c, block)| {
            block
                .iter()
                .enumerate()
                .filter_map(|(k, line)| parse_line(c * chunk + k + 1, line).transpose())
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(chunks.into_iter().flatten().collect())
}

pub fn read_identity_table<P: AsRef<Path>>(path: P) -> Result<Vec<IdentityPair>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SeqpickError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Identity file not found: {}", path.display()),
        )));
    }
    let text = std::fs::read_to_string(path)?;
    let pairs = parse_alipid_table(&text)?;
    tracing::debug!("Read {} identity pairs from {}", pairs.len(), path.display());
    Ok(pairs)
}

/// Build a matrix over `ids` from identity pairs. Pairs naming sequences outside
/// `ids` are ignored.
pub fn matrix_from_identities(ids: Vec<String>, pairs: &[IdentityPair]) -> Result<SimilarityMatrix> {
    let triples: Vec<(usize, usize, f64)> = {
        let index: std::collections::HashMap<&str, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();

        let mut covered = HashSet::new();
        let triples: Vec<_> = pairs
            .iter()
            .filter_map(|p| {
                let i = *index.get(p.first.as_str())?;
                let j = *index.get(p.second.as_str())?;
                covered.insert(i);
                covered.insert(j);
                Some((i, j, p.percent_identity / 100.0))
            })
            .collect();

        let skipped = pairs.len() - triples.len();
        if skipped > 0 {
            tracing::debug!("Ignored {} identity pairs outside the candidate pool", skipped);
        }
        if ids.len() > 1 && covered.len() < ids.len() {
            tracing::warn!(
                "{} of {} sequences have no pairwise identities; treating them as unrelated",
                ids.len() - covered.len(),
                ids.len()
            );
        }
        triples
    };

    SimilarityMatrix::from_pairs(ids, triples)
}

/// `esl-alipid` from HMMER's Easel tools
#[derive(Debug, Clone)]
pub struct EslAlipid {
    binary: String,
    timeout: Duration,
}

impl Default for EslAlipid {
    fn default() -> Self {
        Self::new(Tool::EslAlipid.binary_name())
    }
}

impl EslAlipid {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Write the pairwise identity table of an aligned FASTA to `output`
    pub fn run(&self, alignment: &Path, output: &Path) -> Result<()> {
        let program = resolve_binary(Tool::EslAlipid, &self.binary)?;
        ToolCommand::new(Tool::EslAlipid, program)
            .args(["--amino", "--informat", "afa"])
            .path_arg(alignment)
            .stdout_to(output)
            .timeout(self.timeout)
            .run()?;
        Ok(())
    }
}

/// Similarities read from a precomputed identity table
#[derive(Debug, Clone)]
pub struct IdentityTableSimilarity {
    path: PathBuf,
}

impl IdentityTableSimilarity {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SimilarityProvider for IdentityTableSimilarity {
    fn similarity_matrix(&self, records: &[SequenceRecord]) -> Result<SimilarityMatrix> {
        let pairs = read_identity_table(&self.path)?;
        matrix_from_identities(record_ids(records), &pairs)
    }

    fn name(&self) -> &'static str {
        "identity-table"
    }
}

/// Similarities from a MAFFT alignment scored by `esl-alipid`
#[derive(Debug, Clone, Default)]
pub struct AlignmentSimilarity {
    mafft: Mafft,
    alipid: EslAlipid,
}

impl AlignmentSimilarity {
    pub fn new(mafft: Mafft, alipid: EslAlipid) -> Self {
        Self { mafft, alipid }
    }
}

impl SimilarityProvider for AlignmentSimilarity {
    fn similarity_matrix(&self, records: &[SequenceRecord]) -> Result<SimilarityMatrix> {
        let ids = record_ids(records);
        if records.len() < 2 {
            return SimilarityMatrix::from_pairs(ids, Vec::new());
        }

        let workdir = tempfile::Builder::new().prefix("seqpick-align").tempdir()?;
        let input = workdir.path().join("candidates.fasta");
        let aligned = workdir.path().join("aligned.fasta");
        let table = workdir.path().join("identities.txt");

        write_fasta(&input, records)?;
        tracing::info!("Aligning {} sequences with MAFFT", records.len());
        self.mafft.align(&input, &aligned)?;
        tracing::info!("Computing pairwise identities with esl-alipid");
        self.alipid.run(&aligned, &table)?;

        let pairs = read_identity_table(&table)?;
        matrix_from_identities(ids, &pairs)
    }

    fn name(&self) -> &'static str {
        "mafft+esl-alipid"
    }
}

fn record_ids(records: &[SequenceRecord]) -> Vec<String> {
    records.iter().map(|r| r.id.clone()).collect()
}
