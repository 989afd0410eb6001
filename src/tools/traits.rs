/// Seams between the selection pipeline and the programs it drives
use crate::bio::sequence::SequenceRecord;
use crate::core::matrix::SimilarityMatrix;
use crate::error::Result;
use std::path::Path;

/// Coarse clustering that writes one representative per cluster
#[cfg_attr(test, mockall::automock)]
pub trait Prefilter: Send + Sync {
    /// Cluster `input` and write the representatives FASTA to `output`.
    /// `args` is the full argument list after the input/output options.
    fn prefilter(&self, input: &Path, output: &Path, args: &[String]) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Produces the pairwise similarity matrix for a candidate pool
#[cfg_attr(test, mockall::automock)]
pub trait SimilarityProvider: Send + Sync {
    /// Matrix rows follow the order of `records`; ids are the record ids
    fn similarity_matrix(&self, records: &[SequenceRecord]) -> Result<SimilarityMatrix>;

    fn name(&self) -> &'static str;
}
