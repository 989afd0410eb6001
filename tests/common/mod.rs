//! Shared fixtures for seqpick integration tests
#![allow(dead_code)]

use seqpick::SimilarityMatrix;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Ten proteins in three families
pub const SAMPLE_FASTA: &str = "\
>seq1
MSLLPTPTVLPTLAPPLTFQPTLAEVLPKPVTVLTTLPVHLMKRVDQPVAPTLTPALAPK
>seq2
MSLLPTPTVLPTLAPPLTFQPTLAEVLPKPVTVLTTLPVHLMKRVDQPVAPTLTPALAPK
>seq3
MPLLPTPTVLPTLAPPLTFQPTLAEVLPKPVTVLTTLPVHLMKRVDQPVAPTLTPALAPK
>seq4
MKSINRTILLSLLSCFVLSQVIFQGQNLGFKQSSPLAFMFNKQPQNVIFSASFTTKTKSP
>seq5
MKSINRTILLSLLSCFVLSQVIFQGENLGFKQSSPLAFMFNKQPQNVIFSASFTTKTKSP
>seq6
MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGNSSSGGKNGQGEPARVRCSHLL
>seq7
MADEEKLPPGWEKRMSRSSGRVYYFNHITNASQWERPSGNSSSGGKNGQGEPARVRCSHLL
>seq8
MALLPTPTVLPTLAPPLTFQPTLAEVLPKPVTVLTTLPVHLMKRVDQPVAPTLTPALAPK
>seq9
MALLPTPTVLPTLAPALTFQPTLAEVLPKPVTVLTTLPVHLMKRVDQPVAPTLTPALAPK
>seq10
MKSINRTILLSLLSCFVLSQVVFQGQNLGFKQSSPLAFMFNKQPQNVIFSASFTTKTKSP
";

/// `esl-alipid` table for [`SAMPLE_FASTA`]
pub const SAMPLE_IDENTITIES: &str = "\
# p1              p2              %id     nid   denomid  %match  nmatch  denommatch
seq1             seq2             100.0   62    62       100.0   62      62
seq1             seq3             98.4    61    62       98.4    61      62
seq1             seq8             96.8    60    62       96.8    60      62
seq2             seq3             98.4    61    62       98.4    61      62
seq3             seq8             95.2    59    62       95.2    59      62
seq4             seq5             98.4    61    62       98.4    61      62
seq4             seq10            96.8    60    62       96.8    60      62
seq6             seq7             100.0   62    62       100.0   62      62
seq8             seq9             98.4    61    62       98.4    61      62
";

/// Temporary directory holding the sample inputs
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        TestEnvironment {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::write(&path, contents).expect("Failed to write fixture");
        path
    }

    pub fn sample_fasta(&self) -> PathBuf {
        self.write("sample.fasta", SAMPLE_FASTA)
    }

    pub fn sample_identities(&self) -> PathBuf {
        self.write("identities.txt", SAMPLE_IDENTITIES)
    }
}

/// Ids of the records in a FASTA file, in file order
pub fn fasta_ids(path: &Path) -> Vec<String> {
    seqpick::bio::fasta::parse_fasta(path)
        .expect("Failed to read FASTA")
        .into_iter()
        .map(|r| r.id)
        .collect()
}

/// Two tight pairs: {0, 1} and {2, 3}
pub fn two_clusters() -> SimilarityMatrix {
    SimilarityMatrix::new(vec![
        vec![1.0, 0.9, 0.1, 0.1],
        vec![0.9, 1.0, 0.1, 0.1],
        vec![0.1, 0.1, 1.0, 0.8],
        vec![0.1, 0.1, 0.8, 1.0],
    ])
    .expect("valid matrix")
}

/// Symmetric matrix from the strict upper triangle, unit diagonal
pub fn from_upper_triangle(n: usize, upper: &[f64]) -> SimilarityMatrix {
    let mut rows = vec![vec![1.0; n]; n];
    let mut k = 0;
    for i in 0..n {
        for j in (i + 1)..n {
            rows[i][j] = upper[k];
            rows[j][i] = upper[k];
            k += 1;
        }
    }
    SimilarityMatrix::new(rows).expect("valid matrix")
}

/// The `seqpick` binary with a clean environment
pub fn seqpick_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("seqpick").expect("seqpick binary");
    cmd.env_remove("SEQPICK_CONFIG")
        .env_remove("SEQPICK_LOG")
        .env("NO_COLOR", "1");
    cmd
}
