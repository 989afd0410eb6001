//! Adapters for the external programs seqpick drives

pub mod alipid;
pub mod cdhit;
pub mod mafft;
pub mod runner;
pub mod traits;

pub use alipid::{AlignmentSimilarity, EslAlipid, IdentityTableSimilarity};
pub use cdhit::CdHit;
pub use mafft::Mafft;
pub use traits::{Prefilter, SimilarityProvider};

use serde::{Deserialize, Serialize};

/// External programs seqpick knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    CdHit,
    Mafft,
    EslAlipid,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::CdHit => "CD-HIT",
            Tool::Mafft => "MAFFT",
            Tool::EslAlipid => "esl-alipid",
        }
    }

    /// Default executable looked up on PATH
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::CdHit => "cd-hit",
            Tool::Mafft => "mafft",
            Tool::EslAlipid => "esl-alipid",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
