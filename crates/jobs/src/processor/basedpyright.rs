//! Static type analysis through basedpyright.

use std::ffi::OsString;
use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use quack_core::{DiagnosticReport, JobId, JobType, SeverityFilter, TopN};

use super::runner::{TokioToolRunner, ToolOutput, ToolRunner};
use super::scratch::ScratchArtifact;
use super::{JobProcessor, ToolConfig, ToolError};
use crate::types::{AnalysisResult, SharedJob};

const TOOL_NAME: &str = "BasedPyright";

/// What the processor needs from a job, copied out so no lock is held while
/// the tool runs.
struct Request {
    id: JobId,
    job_type: JobType,
    code: String,
    severity: SeverityFilter,
    top_n: TopN,
}

/// Runs `basedpyright --outputjson <file>` over a job's code.
///
/// Spawn failures and timeouts are retried with backoff according to the
/// configured [`crate::RetryPolicy`]; anything on stderr fails the job at once.
/// Output that is not a diagnostic report still completes the job, with the
/// raw text as a single issue.
#[derive(Debug)]
pub struct BasedPyrightProcessor<R = TokioToolRunner> {
    runner: R,
    config: ToolConfig,
}

impl BasedPyrightProcessor<TokioToolRunner> {
    pub fn new(config: ToolConfig) -> Self {
        Self::with_runner(TokioToolRunner, config)
    }
}

impl Default for BasedPyrightProcessor<TokioToolRunner> {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}

impl<R: ToolRunner> BasedPyrightProcessor<R> {
    pub fn with_runner(runner: R, config: ToolConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    async fn analyze(&self, req: &Request) -> Result<AnalysisResult, ToolError> {
        let artifact = ScratchArtifact::write(&req.code).map_err(ToolError::Artifact)?;
        debug!(
            job_id = %req.id,
            job_type = %req.job_type,
            path = %artifact.path().display(),
            "created scratch file"
        );

        let outcome = match self.invoke(req, artifact.path()).await {
            Ok(output) => self.interpret(req, output),
            Err(e) => Err(e),
        };

        let path = artifact.path().to_path_buf();
        match artifact.remove() {
            Ok(()) => debug!(
                job_id = %req.id,
                job_type = %req.job_type,
                path = %path.display(),
                "removed scratch file"
            ),
            Err(e) => error!(
                job_id = %req.id,
                job_type = %req.job_type,
                path = %path.display(),
                error = %e,
                "failed to remove scratch file"
            ),
        }

        outcome
    }

    /// Run the tool, retrying transient failures.
    async fn invoke(&self, req: &Request, path: &Path) -> Result<ToolOutput, ToolError> {
        let args = [OsString::from("--outputjson"), path.as_os_str().to_owned()];
        let policy = &self.config.retry_policy;
        let mut attempt: u32 = 1;

        loop {
            if attempt > 1 {
                let delay = policy.delay_for_attempt(attempt - 1);
                info!(
                    job_id = %req.id,
                    job_type = %req.job_type,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying analysis tool"
                );
                tokio::time::sleep(delay).await;
            }

            match self.invoke_once(&args).await {
                Ok(output) => return Ok(output),
                Err(e) if e.is_transient() && policy.should_retry(attempt) => {
                    warn!(
                        job_id = %req.id,
                        job_type = %req.job_type,
                        attempt,
                        error = %e,
                        "analysis attempt failed"
                    );
                }
                Err(e) => return Err(e),
            }

            attempt += 1;
        }
    }

    async fn invoke_once(&self, args: &[OsString]) -> Result<ToolOutput, ToolError> {
        let run = self.runner.run(&self.config.program, args);
        match tokio::time::timeout(self.config.timeout, run).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(source)) => Err(ToolError::Spawn {
                program: self.config.program.clone(),
                source,
            }),
            Err(_) => Err(ToolError::Timeout(self.config.timeout)),
        }
    }

    fn interpret(&self, req: &Request, output: ToolOutput) -> Result<AnalysisResult, ToolError> {
        // 0 = clean, 1 = diagnostics reported.
        if let Some(code) = output.exit_code.filter(|c| *c != 0 && *c != 1) {
            debug!(job_id = %req.id, job_type = %req.job_type, exit_code = code, "unexpected exit code");
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !stderr.is_empty() {
            return Err(ToolError::Reported {
                tool: TOOL_NAME,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(AnalysisResult::empty(req.severity, req.top_n));
        }

        match DiagnosticReport::parse(stdout) {
            Ok(report) => Ok(AnalysisResult::from_report(
                report,
                &req.code,
                req.severity,
                req.top_n,
            )),
            Err(e) => {
                warn!(
                    job_id = %req.id,
                    job_type = %req.job_type,
                    error = %e,
                    "failed to parse tool output, keeping it as raw text"
                );
                Ok(AnalysisResult::raw_output(stdout, req.severity, req.top_n))
            }
        }
    }
}

#[async_trait]
impl<R: ToolRunner> JobProcessor for BasedPyrightProcessor<R> {
    async fn process(&self, job: SharedJob) {
        let started = job.update(|j| {
            j.mark_running().map(|()| Request {
                id: j.id,
                job_type: j.job_type,
                code: j.code().to_string(),
                severity: j.severity,
                top_n: j.top_n,
            })
        });
        let req = match started {
            Ok(req) => req,
            Err(e) => {
                warn!(job_id = %job.id(), error = %e, "job is not pending, skipping");
                return;
            }
        };

        info!(job_id = %req.id, job_type = %req.job_type, "starting basedpyright analysis");

        let finished = match self.analyze(&req).await {
            Ok(result) => {
                info!(
                    job_id = %req.id,
                    job_type = %req.job_type,
                    issues = result.summary.filtered_issue_count,
                    total = result.summary.total_issue_count,
                    "analysis complete"
                );
                job.update(|j| j.mark_completed(result))
            }
            Err(e) => {
                error!(job_id = %req.id, job_type = %req.job_type, error = %e, "analysis failed");
                let message = e.job_message();
                job.update(|j| j.mark_failed(message))
            }
        };

        if let Err(e) = finished {
            error!(job_id = %req.id, job_type = %req.job_type, error = %e, "could not record job outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;
    use crate::processor::testing::{ScriptedRunner, Step};
    use crate::types::{Job, JobStatus, RetryPolicy};

    const CODE: &str = "def greet(name: str) -> str:\n    return f\"Hello, {name}!\"\n\n# This should cause a type error\nresult = greet(123)\n";

    const ONE_ERROR: &str = r#"{
        "generalDiagnostics": [
            {
                "message": "Argument of type 'Literal[123]' cannot be assigned to parameter 'name' of type 'str'",
                "severity": "error",
                "range": {
                    "start": {"line": 4, "character": 14},
                    "end": {"line": 4, "character": 17}
                },
                "code": "reportArgumentType"
            }
        ]
    }"#;

    fn job_with(severity: SeverityFilter, top_n: TopN) -> SharedJob {
        SharedJob::new(Job::new(JobType::BasedPyright, CODE, severity, top_n))
    }

    fn job() -> SharedJob {
        job_with(SeverityFilter::All, TopN::unbounded())
    }

    fn processor(steps: impl IntoIterator<Item = Step>) -> BasedPyrightProcessor<ScriptedRunner> {
        BasedPyrightProcessor::with_runner(ScriptedRunner::new(steps), ToolConfig::default())
    }

    fn assert_scratch_removed(p: &BasedPyrightProcessor<ScriptedRunner>) {
        let paths = p.runner.analysed_paths();
        assert!(!paths.is_empty());
        for path in paths {
            assert!(!path.exists(), "scratch file {} left behind", path.display());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_normalizes_diagnostics() {
        let p = processor([Step::stdout(ONE_ERROR)]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
        assert!(job.started_at().is_some());
        assert!(job.completed_at().is_some());

        let result = job.result().unwrap();
        assert_eq!(result.summary.total_issue_count, 1);
        assert_eq!(result.summary.filtered_issue_count, 1);

        let issue = &result.issues[0];
        assert_eq!(issue.line, 5);
        assert_eq!(issue.column, 15);
        assert!(issue.message.contains("cannot be assigned"));
        assert_eq!(issue.severity.as_str(), "error");
        assert_eq!(issue.rule.as_deref(), Some("reportArgumentType"));
        assert_eq!(issue.line_content.as_deref(), Some("result = greet(123)"));

        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn invokes_tool_with_outputjson_and_py_file() {
        let p = processor([Step::stdout(r#"{"generalDiagnostics": []}"#)]);
        p.process(job()).await;

        let calls = p.runner.calls();
        assert_eq!(calls.len(), 1);
        let (program, args) = &calls[0];
        assert_eq!(program, "basedpyright");
        assert_eq!(args[0], "--outputjson");
        assert_eq!(Path::new(&args[1]).extension().and_then(|e| e.to_str()), Some("py"));
    }

    #[tokio::test(start_paused = true)]
    async fn applies_job_filter_and_cap() {
        let report = r#"{"generalDiagnostics": [
            {"message": "w1", "severity": "warning", "range": {"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 1}}},
            {"message": "e1", "severity": "error", "range": {"start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 1}}},
            {"message": "w2", "severity": "warning", "range": {"start": {"line": 2, "character": 0}, "end": {"line": 2, "character": 1}}},
            {"message": "w3", "severity": "warning", "range": {"start": {"line": 3, "character": 0}, "end": {"line": 3, "character": 1}}}
        ]}"#;
        let p = processor([Step::stdout(report)]);
        let job = job_with(SeverityFilter::Warning, TopN::from_raw(2).unwrap());

        p.process(job.clone()).await;

        let job = job.snapshot();
        let result = job.result().unwrap();
        assert_eq!(result.summary.total_issue_count, 4);
        assert_eq!(result.summary.filtered_issue_count, 2);
        assert_eq!(result.summary.severity_filter, SeverityFilter::Warning);
        assert_eq!(result.summary.top_n_limit.get(), Some(2));
        let messages: Vec<_> = result.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(messages, vec!["w1", "w2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn no_issues() {
        let p = processor([Step::stdout(r#"{"generalDiagnostics": []}"#)]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
        let result = job.result().unwrap();
        assert_eq!(result.summary.filtered_issue_count, 0);
        assert!(result.issues.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_stdout_is_an_empty_success() {
        let p = processor([Step::stdout("  \n")]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        let result = job.result().unwrap();
        assert_eq!(result.summary.total_issue_count, 0);
        assert_eq!(result.summary.filtered_issue_count, 0);
        assert!(result.issues.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stderr_fails_the_job_without_retry() {
        let p = processor([Step::stderr("basedpyright: command not found")]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().unwrap().contains("basedpyright: command not found"));
        assert!(job.error().unwrap().starts_with("BasedPyright error: "));
        assert!(job.result().is_none());
        assert!(job.completed_at().is_some());
        assert_eq!(p.runner.calls().len(), 1);
        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_json_degrades_to_raw_output() {
        let p = processor([Step::stdout("invalid json output")]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
        let result = job.result().unwrap();
        assert_eq!(result.summary.total_issue_count, 1);
        assert_eq!(result.summary.filtered_issue_count, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].message, "Raw output: invalid json output");
        assert_eq!((result.issues[0].line, result.issues[0].column), (1, 1));
        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_spawn_failures_with_backoff() {
        let p = processor([
            Step::SpawnError(io::ErrorKind::Other, "Temporary failure"),
            Step::SpawnError(io::ErrorKind::Other, "Temporary failure"),
            Step::stdout(r#"{"generalDiagnostics": []}"#),
        ]);
        let job = job();

        let started = tokio::time::Instant::now();
        p.process(job.clone()).await;
        let elapsed = started.elapsed();

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.error().is_none());
        assert!(job.result().unwrap().issues.is_empty());
        assert_eq!(p.runner.calls().len(), 3);
        // 2s before the second attempt, 4s before the third.
        assert!(elapsed >= Duration::from_secs(6), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "elapsed {elapsed:?}");
        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_spawn_attempts_fail_the_job() {
        let p = processor([
            Step::SpawnError(io::ErrorKind::Other, "Persistent failure"),
            Step::SpawnError(io::ErrorKind::Other, "Persistent failure"),
            Step::SpawnError(io::ErrorKind::Other, "Persistent failure"),
        ]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Failed);
        let error = job.error().unwrap();
        assert!(error.starts_with("Error: "), "{error}");
        assert!(error.contains("Persistent failure"), "{error}");
        assert!(job.result().is_none());
        assert_eq!(p.runner.calls().len(), 3);
        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn every_attempt_timing_out_fails_the_job() {
        let p = processor([Step::Hang, Step::Hang, Step::Hang]);
        let job = job();

        let started = tokio::time::Instant::now();
        p.process(job.clone()).await;
        let elapsed = started.elapsed();

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.error().unwrap().contains("timed out"));
        assert_eq!(job.error(), Some("Process timed out after 30 seconds"));
        assert!(job.result().is_none());
        assert_eq!(p.runner.calls().len(), 3);
        // Three 30s deadlines plus 2s and 4s of backoff.
        assert!(elapsed >= Duration::from_secs(96), "elapsed {elapsed:?}");
        assert_scratch_removed(&p);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_success_recovers() {
        let p = processor([Step::Hang, Step::stdout(ONE_ERROR)]);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result().unwrap().issues.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_comes_from_config() {
        let runner = ScriptedRunner::new([Step::SpawnError(io::ErrorKind::NotFound, "missing")]);
        let config = ToolConfig::default()
            .with_program("/opt/basedpyright")
            .with_retry_policy(RetryPolicy::default().with_max_attempts(1));
        let p = BasedPyrightProcessor::with_runner(runner, config);
        let job = job();

        p.process(job.clone()).await;

        let job = job.snapshot();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(
            job.error(),
            Some("Error: failed to run /opt/basedpyright: missing")
        );
        assert_eq!(p.runner.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unexpected_exit_code_still_parses_output() {
        let output = ToolOutput {
            exit_code: Some(3),
            stdout: br#"{"generalDiagnostics": []}"#.to_vec(),
            stderr: Vec::new(),
        };
        let p = processor([Step::Output(output)]);
        let job = job();

        p.process(job.clone()).await;

        assert_eq!(job.read(|j| j.status()), JobStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn non_pending_job_is_left_alone() {
        let p = processor(Vec::new());
        let job = job();
        job.update(|j| j.mark_running()).unwrap();

        p.process(job.clone()).await;

        assert_eq!(job.read(|j| j.status()), JobStatus::Running);
        assert!(p.runner.calls().is_empty());
    }
}
