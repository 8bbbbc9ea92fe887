//! Test doubles for processors and tool runners.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{JobProcessor, ToolOutput, ToolRunner};
use crate::types::{AnalysisResult, SharedJob};

/// One scripted reaction of [`ScriptedRunner`].
#[derive(Debug)]
pub enum Step {
    Output(ToolOutput),
    SpawnError(io::ErrorKind, &'static str),
    /// Never finishes; only a deadline gets the caller out.
    Hang,
    Panic(&'static str),
}

impl Step {
    pub fn stdout(stdout: &str) -> Self {
        Step::Output(ToolOutput::from_stdout(stdout))
    }

    pub fn stderr(stderr: &str) -> Self {
        Step::Output(ToolOutput {
            exit_code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        })
    }
}

/// Plays back a fixed sequence of steps and records every invocation.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(String, Vec<OsString>)>>,
}

impl ScriptedRunner {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<OsString>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Scratch file paths handed to the tool, one per attempt.
    pub fn analysed_paths(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|(_, args)| args.last().map(PathBuf::from))
            .collect()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<ToolOutput> {
        if let Some(path) = args.last() {
            assert!(
                std::path::Path::new(path).exists(),
                "scratch file must exist while the tool runs"
            );
        }
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Output(output)) => Ok(output),
            Some(Step::SpawnError(kind, msg)) => Err(io::Error::new(kind, msg)),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Panic(msg)) => panic!("{msg}"),
            None => panic!("scripted runner ran out of steps"),
        }
    }
}

/// Processor that completes every job with an empty result.
#[derive(Debug, Default)]
pub struct CompletingProcessor;

#[async_trait]
impl JobProcessor for CompletingProcessor {
    async fn process(&self, job: SharedJob) {
        job.update(|j| {
            j.mark_running().unwrap();
            let result = AnalysisResult::empty(j.severity, j.top_n);
            j.mark_completed(result).unwrap();
        });
    }
}

/// Processor that never touches its job.
#[derive(Debug, Default)]
pub struct IdleProcessor;

#[async_trait]
impl JobProcessor for IdleProcessor {
    async fn process(&self, _job: SharedJob) {}
}

/// Processor that panics before touching its job.
#[derive(Debug, Default)]
pub struct PanickingProcessor;

#[async_trait]
impl JobProcessor for PanickingProcessor {
    async fn process(&self, _job: SharedJob) {
        panic!("processor gave up");
    }
}
