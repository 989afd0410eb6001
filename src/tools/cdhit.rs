//! CD-HIT prefilter

use crate::core::config::check_unit_interval;
use crate::error::{Result, SeqpickError};
use crate::tools::runner::{resolve_binary, ToolCommand, DEFAULT_TIMEOUT};
use crate::tools::traits::Prefilter;
use crate::tools::Tool;
use std::path::Path;
use std::time::Duration;

/// CD-HIT refuses protein identity thresholds below this
pub const MIN_PROTEIN_THRESHOLD: f64 = 0.4;

/// Protein word length CD-HIT accepts for an identity threshold
pub fn word_length_for(threshold: f64) -> u32 {
    if threshold >= 0.7 {
        5
    } else if threshold >= 0.6 {
        4
    } else if threshold >= 0.5 {
        3
    } else {
        2
    }
}

/// Turn the user's raw CD-HIT argument string into a full argument list.
///
/// `-c <similarity>` is prepended when no `-c` is given, and `-n` is derived from the
/// effective threshold when absent.
pub fn build_cdhit_args(extra_args: &str, similarity: f64) -> Result<Vec<String>> {
    let mut tokens: Vec<String> = extra_args.split_whitespace().map(String::from).collect();

    let explicit_c = option_value(&tokens, "-c").map(str::to_string);
    let threshold = match &explicit_c {
        Some(value) => value.parse::<f64>().map_err(|_| {
            SeqpickError::Configuration(format!("invalid CD-HIT -c value '{}'", value))
        })?,
        None => similarity,
    };
    check_unit_interval("similarity threshold", threshold)?;
    if threshold < MIN_PROTEIN_THRESHOLD {
        return Err(SeqpickError::Configuration(format!(
            "CD-HIT similarity threshold must be at least {}, got {}",
            MIN_PROTEIN_THRESHOLD, threshold
        )));
    }

    if explicit_c.is_none() {
        tokens.splice(0..0, ["-c".to_string(), threshold.to_string()]);
    }
    if !tokens.iter().any(|t| t == "-n") {
        tokens.push("-n".to_string());
        tokens.push(word_length_for(threshold).to_string());
    }
    Ok(tokens)
}

fn option_value<'a>(tokens: &'a [String], flag: &str) -> Option<&'a str> {
    tokens
        .iter()
        .position(|t| t == flag)
        .map(|i| tokens.get(i + 1).map(String::as_str).unwrap_or(""))
}

#[derive(Debug, Clone)]
pub struct CdHit {
    binary: String,
    timeout: Duration,
}

impl Default for CdHit {
    fn default() -> Self {
        Self::new(Tool::CdHit.binary_name())
    }
}

impl CdHit {
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
}

impl Prefilter for CdHit {
    fn prefilter(&self, input: &Path, output: &Path, args: &[String]) -> Result<()> {
        let program = resolve_binary(Tool::CdHit, &self.binary)?;
        ToolCommand::new(Tool::CdHit, program)
            .arg("-i")
            .path_arg(input)
            .arg("-o")
            .path_arg(output)
            .args(args.iter().cloned())
            .timeout(self.timeout)
            .run()?;

        if !output.exists() {
            return Err(SeqpickError::external_tool(
                Tool::CdHit.display_name(),
                format!("no representatives written to {}", output.display()),
                "",
            ));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        Tool::CdHit.display_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0.95, 5)]
    #[case(0.7, 5)]
    #[case(0.65, 4)]
    #[case(0.5, 3)]
    #[case(0.45, 2)]
    fn test_word_length(#[case] threshold: f64, #[case] expected: u32) {
        assert_eq!(word_length_for(threshold), expected);
    }

    #[test]
    fn test_prepends_threshold_and_word_length() {
        let args = build_cdhit_args("-M 2000 -T 4", 0.9).unwrap();
        assert_eq!(args, vec!["-c", "0.9", "-M", "2000", "-T", "4", "-n", "5"]);
    }

    #[test]
    fn test_keeps_explicit_threshold() {
        let args = build_cdhit_args("-c 0.55", 0.9).unwrap();
        assert_eq!(args, vec!["-c", "0.55", "-n", "3"]);

        let args = build_cdhit_args("-c 0.8 -n 4", 0.9).unwrap();
        assert_eq!(args, vec!["-c", "0.8", "-n", "4"]);
    }

    #[test]
    fn test_rejects_low_threshold() {
        assert!(matches!(
            build_cdhit_args("", 0.3),
            Err(SeqpickError::Configuration(_))
        ));
        assert!(build_cdhit_args("-c abc", 0.9).is_err());
    }
}
