//! Spawning the external analysis tool.

use std::ffi::OsString;
use std::io;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Captured output of a finished tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn from_stdout(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }
}

/// Runs a program to completion and collects both output streams.
///
/// Deadlines are not the runner's concern: callers wrap [`ToolRunner::run`]
/// in a timeout and drop the future when it expires.
#[async_trait]
pub trait ToolRunner: Send + Sync + 'static {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolOutput>;
}

#[async_trait]
impl<T: ToolRunner + ?Sized> ToolRunner for Arc<T> {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolOutput> {
        (**self).run(program, args).await
    }
}

/// [`ToolRunner`] backed by `tokio::process`.
///
/// The child is killed if the returned future is dropped before it exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioToolRunner;

#[async_trait]
impl ToolRunner for TokioToolRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolOutput> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        debug!(program, pid = ?child.id(), "analysis tool started");

        let output = child.wait_with_output().await?;
        Ok(ToolOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
