use crate::command::{CommandLine, ExitCode, Pipeline};
use crate::error::{ShellError, ShellResult};
use crate::external::LaunchedStage;
use std::io::{self, Write};
use tracing::{debug, warn};

/// Command name that stops the interpreter unless configured otherwise.
pub const DEFAULT_TERMINATE_KEYWORD: &str = "quit";

/// What the caller should do after a line has been executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Prompt for the next line.
    Continue,
    /// The terminate keyword was reached; stop reading lines.
    Terminate,
}

impl Control {
    pub fn should_terminate(self) -> bool {
        self == Control::Terminate
    }
}

/// Outcome of one reaped stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStatus {
    pub program: String,
    /// `None` when the stage never started or could not be waited for.
    pub exit_code: Option<ExitCode>,
}

/// Everything that happened while executing one line, in launch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineReport {
    pub control: Control,
    pub stages: Vec<StageStatus>,
}

impl LineReport {
    /// Exit code of the last stage that produced one.
    pub fn last_exit_code(&self) -> Option<ExitCode> {
        self.stages.iter().rev().find_map(|stage| stage.exit_code)
    }
}

/// Launches the stages of a [`CommandLine`] as child processes and reaps them.
///
/// Every stage of every pipeline is launched first, left to right; only then are they
/// waited for, in the same order. Pipelines on one line therefore run concurrently.
/// Recoverable problems (launch failures, wait failures, non-zero exits) are written to
/// the diagnostics sink and do not stop the line.
///
/// Example
/// ```no_run
/// use simple_shell::{parse, Control, Executor};
/// let mut executor = Executor::new("quit");
/// let control = executor.execute(&parse("echo hello | tr a-z A-Z")).unwrap();
/// assert_eq!(control, Control::Continue);
/// ```
pub struct Executor<W: Write = io::Stderr> {
    terminate_keyword: String,
    diagnostics: W,
}

impl Executor {
    /// An executor reporting diagnostics on the process's standard error.
    pub fn new(terminate_keyword: impl Into<String>) -> Self {
        Self::with_diagnostics(terminate_keyword, io::stderr())
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINATE_KEYWORD)
    }
}

impl<W: Write> Executor<W> {
    /// An executor writing diagnostics to `diagnostics` instead of standard error.
    pub fn with_diagnostics(terminate_keyword: impl Into<String>, diagnostics: W) -> Self {
        Self {
            terminate_keyword: terminate_keyword.into(),
            diagnostics,
        }
    }

    pub fn terminate_keyword(&self) -> &str {
        &self.terminate_keyword
    }

    pub fn diagnostics(&self) -> &W {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> W {
        self.diagnostics
    }

    /// Write `err` to the diagnostics sink.
    pub fn report(&mut self, err: &ShellError) {
        report(&mut self.diagnostics, err);
    }

    /// Run a line and tell the caller whether to keep going.
    pub fn execute(&mut self, line: &CommandLine) -> ShellResult<Control> {
        self.run(line).map(|report| report.control)
    }

    /// Run a line and return the status of every stage.
    ///
    /// Fails only with [`ShellError::PipeCreation`]. In that case no further stage is
    /// launched, but everything launched before the failure is still reaped and its
    /// pipes closed before the error is returned.
    pub fn run(&mut self, line: &CommandLine) -> ShellResult<LineReport> {
        let mut launched = Vec::new();
        let mut outcome = Ok(Control::Continue);

        for pipeline in &line.pipelines {
            outcome = self.launch_pipeline(pipeline, &mut launched);
            if !matches!(outcome, Ok(Control::Continue)) {
                break;
            }
        }

        let stages = self.reap(launched);
        let control = outcome?;
        if control.should_terminate() {
            debug!(keyword = %self.terminate_keyword, "termination requested");
        }
        Ok(LineReport { control, stages })
    }

    fn launch_pipeline(
        &mut self,
        pipeline: &Pipeline,
        launched: &mut Vec<LaunchedStage>,
    ) -> ShellResult<Control> {
        let first = launched.len();
        let mut outcome = Ok(Control::Continue);

        for stage in &pipeline.stages {
            if stage.program == self.terminate_keyword {
                outcome = Ok(Control::Terminate);
                break;
            }

            let diagnostics = &mut self.diagnostics;
            let previous = launched[first..].last();
            let current = match LaunchedStage::spawn(stage, previous, &mut |err: ShellError| {
                report(&mut *diagnostics, &err)
            }) {
                Ok(current) => current,
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            };

            // The consumer has its own duplicate of the read end now (or failed to start).
            if let Some(previous) = launched[first..].last_mut() {
                previous.release_read_end();
            }
            launched.push(current);
        }

        // Nothing after this point can borrow the last read end of the pipeline.
        if let Some(last) = launched[first..].last_mut() {
            last.release_read_end();
        }
        outcome
    }

    fn reap(&mut self, launched: Vec<LaunchedStage>) -> Vec<StageStatus> {
        let diagnostics = &mut self.diagnostics;
        launched
            .into_iter()
            .map(|mut stage| {
                let exit_code = stage.reap(&mut |err: ShellError| report(&mut *diagnostics, &err));
                StageStatus {
                    program: stage.program,
                    exit_code,
                }
            })
            .collect()
    }
}

fn report<W: Write>(diagnostics: &mut W, err: &ShellError) {
    debug!(%err, "stage diagnostic");
    if let Err(write_err) = writeln!(diagnostics, "{err}") {
        warn!(%err, %write_err, "could not write diagnostic");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn executor() -> Executor<Vec<u8>> {
        Executor::with_diagnostics(DEFAULT_TERMINATE_KEYWORD, Vec::new())
    }

    fn diagnostics(executor: Executor<Vec<u8>>) -> String {
        String::from_utf8(executor.into_diagnostics()).expect("utf8")
    }

    fn codes(report: &LineReport) -> Vec<Option<ExitCode>> {
        report.stages.iter().map(|s| s.exit_code).collect()
    }

    #[test]
    fn test_empty_line_is_noop() {
        let mut exec = executor();
        let report = exec.run(&parse("   ")).unwrap();

        assert_eq!(report.control, Control::Continue);
        assert!(report.stages.is_empty());
        assert_eq!(report.last_exit_code(), None);
        assert!(diagnostics(exec).is_empty());
    }

    #[test]
    fn test_quit_terminates_without_launching() {
        let mut exec = executor();
        let report = exec.run(&parse("quit")).unwrap();

        assert_eq!(report.control, Control::Terminate);
        assert!(report.stages.is_empty());
    }

    #[test]
    fn test_quit_stops_later_pipelines() {
        let dir = tempfile::tempdir().unwrap();
        let never = dir.path().join("never");
        let line = format!("true ; quit ; touch {}", never.display());

        let mut exec = executor();
        let report = exec.run(&parse(&line)).unwrap();

        assert!(report.control.should_terminate());
        assert_eq!(codes(&report), vec![Some(0)]);
        assert!(!never.exists());
    }

    #[test]
    fn test_quit_inside_pipeline_still_reaps_producer() {
        let mut exec = executor();
        // `yes` would block forever if its read end stayed open in the parent.
        let report = exec.run(&parse("yes | quit")).unwrap();

        assert_eq!(report.control, Control::Terminate);
        assert_eq!(report.stages.len(), 1);
        assert_eq!(report.stages[0].program, "yes");
    }

    #[test]
    fn test_failing_pipeline_does_not_stop_the_next() {
        let mut exec = executor();
        let report = exec.run(&parse("false ; true")).unwrap();

        assert_eq!(codes(&report), vec![Some(1), Some(0)]);
        assert_eq!(report.last_exit_code(), Some(0));
        assert_eq!(diagnostics(exec), "command `false` exited with status 1\n");
    }

    #[test]
    fn test_launch_failure_in_pipeline_is_reported() {
        let mut exec = executor();
        let report = exec
            .run(&parse("no-such-program-here-0815 | true ; true"))
            .unwrap();

        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.stages[0].exit_code, None);
        assert_eq!(report.stages[1].exit_code, Some(0));
        assert_eq!(report.stages[2].exit_code, Some(0));
        assert!(diagnostics(exec).contains("starting process `no-such-program-here-0815` failed"));
    }

    #[test]
    fn test_consumer_exit_releases_producer() {
        let mut exec = executor();
        let report = exec.run(&parse("yes | head -c 0")).unwrap();

        assert_eq!(report.control, Control::Continue);
        assert_eq!(report.stages[1].exit_code, Some(0));
        // Killed by SIGPIPE, or exited on EPIPE; either way it was reaped.
        assert_ne!(report.stages[0].exit_code, Some(0));
    }

    #[test]
    fn test_dangling_producer_is_reaped() {
        let mut exec = executor();
        // The empty segment drops `true`; `yes` has nobody reading its pipe.
        let report = exec.run(&parse("yes | | true")).unwrap();

        assert_eq!(report.stages.len(), 1);
        assert!(report.stages[0].exit_code.is_some());
    }

    #[test]
    fn test_custom_terminate_keyword() {
        let mut exec = Executor::with_diagnostics("bye", Vec::new());

        // With a different keyword `quit` is just a program name.
        assert_eq!(
            exec.execute(&parse("true ; quit")).unwrap(),
            Control::Continue
        );
        assert_eq!(exec.execute(&parse("bye")).unwrap(), Control::Terminate);
        assert_eq!(exec.terminate_keyword(), "bye");
    }
}
