use crate::error::Result;
use crate::tools::runner::{resolve_binary, ToolCommand, DEFAULT_TIMEOUT};
use crate::tools::Tool;
use std::path::Path;
use std::time::Duration;

/// MAFFT multiple sequence alignment
#[derive(Debug, Clone)]
pub struct Mafft {
    binary: String,
    extra_args: String,
    threads: usize,
    timeout: Duration,
}

impl Default for Mafft {
    fn default() -> Self {
        Self::new(Tool::Mafft.binary_name())
    }
}

impl Mafft {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            extra_args: String::new(),
            threads: 0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_extra_args(mut self, args: impl Into<String>) -> Self {
        self.extra_args = args.into();
        self
    }

    /// 0 lets MAFFT use every core
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn arguments(&self) -> Vec<String> {
        let thread = if self.threads == 0 {
            "-1".to_string()
        } else {
            self.threads.to_string()
        };
        let mut args = vec!["--thread".to_string(), thread];
        args.extend(self.extra_args.split_whitespace().map(String::from));
        args
    }

    /// Align `input` and write the aligned FASTA to `output`
    pub fn align(&self, input: &Path, output: &Path) -> Result<()> {
        let program = resolve_binary(Tool::Mafft, &self.binary)?;
        ToolCommand::new(Tool::Mafft, program)
            .args(self.arguments())
            .path_arg(input)
            .stdout_to(output)
            .timeout(self.timeout)
            .run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments() {
        assert_eq!(Mafft::default().arguments(), vec!["--thread", "-1"]);
        let mafft = Mafft::default().with_threads(4).with_extra_args("--auto --quiet");
        assert_eq!(mafft.arguments(), vec!["--thread", "4", "--auto", "--quiet"]);
    }
}
