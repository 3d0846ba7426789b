use crate::command::{ExitCode, Stage};
use crate::error::ShellError;
use crate::pipe::StagePipe;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// Per-line state of one stage: its child process (if it started) and the pipe it
/// created (if it writes to one).
///
/// A stage that failed to launch is still kept: its pipe has to be closed, and a
/// consumer bound to that pipe simply reads end-of-file.
#[derive(Debug)]
pub(crate) struct LaunchedStage {
    pub(crate) program: String,
    child: Option<Child>,
    pipe: Option<StagePipe>,
}

impl LaunchedStage {
    /// Spawn `stage` without waiting for it.
    ///
    /// `upstream` is the previous stage of the same pipeline, whose read end becomes
    /// this stage's stdin when `stage.reads_from_pipe` is set. Only a failure to create
    /// the stage's own pipe is returned as an error; launch failures are reported through
    /// `report` and yield a stage without a child.
    pub(crate) fn spawn(
        stage: &Stage,
        upstream: Option<&LaunchedStage>,
        report: &mut dyn FnMut(ShellError),
    ) -> Result<Self, ShellError> {
        let pipe = if stage.writes_to_pipe {
            let pipe = StagePipe::open().map_err(|cause| ShellError::PipeCreation {
                program: stage.program.clone(),
                cause,
            })?;
            Some(pipe)
        } else {
            None
        };

        let upstream = upstream
            .filter(|_| stage.reads_from_pipe)
            .and_then(|previous| previous.pipe.as_ref());

        // The Command keeps its stdio duplicates until dropped; it must not outlive this
        // call or the consumer would never see end-of-file.
        let child = build_command(stage, pipe.as_ref(), upstream).and_then(|mut cmd| cmd.spawn());

        let child = match child {
            Ok(child) => {
                debug!(pid = child.id(), program = %stage.program, "launched stage");
                Some(child)
            }
            Err(cause) => {
                report(ShellError::Launch {
                    program: stage.program.clone(),
                    cause,
                });
                None
            }
        };

        let mut launched = Self {
            program: stage.program.clone(),
            child,
            pipe,
        };
        // The child now holds its own copy of the write end.
        launched.release_write_end();
        Ok(launched)
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub(crate) fn release_write_end(&mut self) {
        if let Some(pipe) = self.pipe.as_mut() {
            pipe.release_write_end();
        }
    }

    /// Stop lending the read end; called once the consumer is bound or will never be.
    pub(crate) fn release_read_end(&mut self) {
        if let Some(pipe) = self.pipe.as_mut() {
            pipe.release_read_end();
        }
    }

    /// Wait for the child (if any), then close both pipe ends.
    ///
    /// Returns `None` when there was no process or waiting failed.
    pub(crate) fn reap(&mut self, report: &mut dyn FnMut(ShellError)) -> Option<ExitCode> {
        let code = self.child.take().and_then(|mut child| match child.wait() {
            Ok(status) => {
                let code = exit_code(status);
                debug!(program = %self.program, code, "reaped stage");
                if code != 0 {
                    report(ShellError::Status {
                        program: self.program.clone(),
                        code,
                    });
                }
                Some(code)
            }
            Err(cause) => {
                report(ShellError::Wait {
                    program: self.program.clone(),
                    cause,
                });
                None
            }
        });

        if let Some(pipe) = self.pipe.as_mut() {
            pipe.close();
        }
        code
    }

    #[cfg(test)]
    pub(crate) fn holds_descriptors(&self) -> bool {
        self.pipe.as_ref().is_some_and(StagePipe::is_open)
    }
}

fn build_command(
    stage: &Stage,
    pipe: Option<&StagePipe>,
    upstream: Option<&StagePipe>,
) -> io::Result<Command> {
    let mut cmd = Command::new(&stage.program);
    cmd.args(&stage.arguments).stderr(Stdio::inherit());

    match pipe {
        Some(pipe) => cmd.stdout(pipe.stdout()?),
        None => cmd.stdout(Stdio::inherit()),
    };
    match upstream {
        Some(upstream) => cmd.stdin(upstream.stdin()?),
        None => cmd.stdin(Stdio::inherit()),
    };
    Ok(cmd)
}

/// Exit code of a finished child, with signal deaths mapped the way shells do.
pub(crate) fn exit_code(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(x) => x,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_exit_code_plain() {
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
    }

    #[test]
    fn test_exit_code_signal() {
        // SIGKILL
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }

    #[test]
    fn test_missing_program_is_reported_not_fatal() {
        let mut reported = Vec::new();
        let stage = Stage::new("definitely-not-a-real-program-4711", Vec::<String>::new())
            .writing_pipe(true);

        let mut record = |e: ShellError| reported.push(e.to_string());
        let mut launched = LaunchedStage::spawn(&stage, None, &mut record).unwrap();

        assert!(!launched.is_running());
        // Write end is released right away; read end stays lent until a consumer is bound.
        assert!(launched.holds_descriptors());

        assert_eq!(launched.reap(&mut record), None);
        assert!(!launched.holds_descriptors());

        assert_eq!(reported.len(), 1);
        assert!(reported[0].contains("definitely-not-a-real-program-4711"));
    }

    #[test]
    fn test_reap_reports_non_zero_exit() {
        let mut reported = Vec::new();
        let stage = Stage::new("false", Vec::<String>::new());

        let mut record = |e: ShellError| reported.push(e);
        let mut launched = LaunchedStage::spawn(&stage, None, &mut record).unwrap();
        assert!(launched.is_running());

        assert_eq!(launched.reap(&mut record), Some(1));
        assert!(matches!(
            reported.as_slice(),
            [ShellError::Status { code: 1, .. }]
        ));
    }
}
