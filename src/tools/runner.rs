//! Blocking subprocess execution with a timeout.
//!
//! stdout and stderr are drained on their own threads so a chatty tool can never
//! fill a pipe and stall while we poll it.

use crate::error::{Result, SeqpickError};
use crate::tools::Tool;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Locate an executable by name or path
pub fn resolve_binary(tool: Tool, binary: &str) -> Result<PathBuf> {
    which::which(binary).map_err(|e| {
        SeqpickError::external_tool(
            tool.display_name(),
            format!("executable '{}' not found", binary),
            e.to_string(),
        )
    })
}

#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Captured stdout; empty when stdout was redirected to a file
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ToolCommand {
    tool: Tool,
    program: PathBuf,
    args: Vec<String>,
    stdout_path: Option<PathBuf>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(tool: Tool, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            stdout_path: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Send stdout to a file instead of capturing it
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run to completion. Timeout, a non-zero exit or a failed spawn is an
    /// `ExternalTool` error carrying the tool's stderr.
    pub fn run(&self) -> Result<ToolOutput> {
        let tool = self.tool.display_name();
        tracing::debug!("Running: {}", self.command_line());

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| {
            SeqpickError::external_tool(
                tool,
                format!("failed to start {}", self.program.display()),
                e.to_string(),
            )
        })?;

        let stdout_handle = child
            .stdout
            .take()
            .map(|out| drain_stdout(out, self.stdout_path.clone()));
        let stderr_handle = child.stderr.take().map(drain_stderr);

        let start = Instant::now();
        let waited = wait_with_timeout(&mut child, self.timeout);

        let stderr = stderr_handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default();
        let stdout = stdout_handle.and_then(|h| h.join().ok());
        let elapsed = start.elapsed();

        let status = match waited {
            Ok(Some(status)) => status,
            Ok(None) => {
                tracing::warn!("{} timed out after {:?}", tool, self.timeout);
                return Err(SeqpickError::external_tool(
                    tool,
                    format!("timed out after {} seconds", self.timeout.as_secs_f64()),
                    stderr,
                ));
            }
            Err(e) => {
                return Err(SeqpickError::external_tool(
                    tool,
                    "failed to check process status",
                    e.to_string(),
                ))
            }
        };

        if !status.success() {
            let message = match status.code() {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by a signal".to_string(),
            };
            return Err(SeqpickError::external_tool(tool, message, stderr));
        }

        let stdout = match stdout {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                return Err(SeqpickError::external_tool(
                    tool,
                    "failed to collect output",
                    e.to_string(),
                ))
            }
            None => String::new(),
        };

        tracing::debug!("{} finished in {:.2?}", tool, elapsed);
        Ok(ToolOutput {
            stdout,
            stderr,
            elapsed,
        })
    }
}

/// `Ok(None)` means the child was killed on timeout
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> io::Result<Option<std::process::ExitStatus>> {
    let start = Instant::now();
    loop {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None if start.elapsed() > timeout => {
                child.kill().ok();
                let _ = child.wait();
                return Ok(None);
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}

fn drain_stdout(
    stdout: ChildStdout,
    path: Option<PathBuf>,
) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        match path {
            Some(path) => {
                let mut writer = BufWriter::new(File::create(&path)?);
                io::copy(&mut reader, &mut writer)?;
                writer.flush()?;
                Ok(String::new())
            }
            None => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer)?;
                Ok(String::from_utf8_lossy(&buffer).into_owned())
            }
        }
    })
}

fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = BufReader::new(stderr).read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_captures_stdout() {
        let out = ToolCommand::new(Tool::Mafft, "sh")
            .args(["-c", "echo aligned"])
            .run()
            .unwrap();
        assert_eq!(out.stdout.trim(), "aligned");
    }

    #[test]
    fn test_stdout_redirected_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let out = ToolCommand::new(Tool::Mafft, "sh")
            .args(["-c", "echo '>a'; echo MK"])
            .stdout_to(&path)
            .run()
            .unwrap();
        assert!(out.stdout.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ">a\nMK\n");
    }

    #[test]
    fn test_nonzero_exit_carries_stderr() {
        let err = ToolCommand::new(Tool::CdHit, "sh")
            .args(["-c", "echo 'bad word length' >&2; exit 3"])
            .run()
            .unwrap_err();
        match err {
            SeqpickError::ExternalTool {
                tool,
                message,
                diagnostics,
            } => {
                assert_eq!(tool, "CD-HIT");
                assert!(message.contains("code 3"));
                assert!(diagnostics.contains("bad word length"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = ToolCommand::new(Tool::EslAlipid, "sleep")
            .arg("5")
            .timeout(Duration::from_millis(200))
            .run()
            .unwrap_err();
        assert!(matches!(err, SeqpickError::ExternalTool { ref message, .. } if message.contains("timed out")));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_missing_binary() {
        let err = resolve_binary(Tool::CdHit, "seqpick-no-such-binary").unwrap_err();
        assert_eq!(err.exit_code(), 5);

        let err = ToolCommand::new(Tool::CdHit, "/nonexistent/cd-hit").run().unwrap_err();
        assert!(matches!(err, SeqpickError::ExternalTool { .. }));
    }
}
