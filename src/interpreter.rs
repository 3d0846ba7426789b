use crate::command::ExitCode;
use crate::config::ShellConfig;
use crate::error::ShellResult;
use crate::executor::{Control, Executor};
use crate::io_adapters::LineSource;
use crate::parser;
use std::io::{self, Write};
use tracing::debug;

/// The read-parse-execute loop.
///
/// The interpreter owns an [`Executor`] and the prompt. Between lines it remembers only
/// whether the terminate keyword has been seen (and, for the caller's benefit, the exit
/// code of the last stage that ran). Every process and pipe of a line is gone by the
/// time the next prompt is printed.
///
/// Example
/// ```no_run
/// use simple_shell::{Interpreter, ReaderSource, ShellConfig};
/// let mut sh = Interpreter::new(&ShellConfig::default());
/// let mut source = ReaderSource::new(std::io::stdin().lock(), std::io::stdout());
/// sh.repl(&mut source).unwrap();
/// ```
pub struct Interpreter<W: Write = io::Stderr> {
    executor: Executor<W>,
    prompt: String,
    terminated: bool,
    last_exit_code: ExitCode,
}

impl Interpreter {
    /// Create an interpreter reporting diagnostics on standard error.
    pub fn new(config: &ShellConfig) -> Self {
        Self::with_executor(config, Executor::new(config.terminate_keyword.clone()))
    }
}

impl<W: Write> Interpreter<W> {
    /// Create an interpreter around an existing executor.
    ///
    /// The executor's terminate keyword wins over the one in `config`.
    pub fn with_executor(config: &ShellConfig, executor: Executor<W>) -> Self {
        Self {
            executor,
            prompt: config.prompt.clone(),
            terminated: false,
            last_exit_code: 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn last_exit_code(&self) -> ExitCode {
        self.last_exit_code
    }

    pub fn executor(&self) -> &Executor<W> {
        &self.executor
    }

    /// Parse and execute a single line.
    pub fn run_line(&mut self, line: &str) -> ShellResult<Control> {
        let parsed = parser::parse(line);
        if parsed.is_empty() {
            return Ok(Control::Continue);
        }

        let report = self.executor.run(&parsed)?;
        if let Some(code) = report.last_exit_code() {
            self.last_exit_code = code;
        }
        if report.control.should_terminate() {
            self.terminated = true;
        }
        Ok(report.control)
    }

    /// Read lines from `source` until the terminate keyword or end of input.
    ///
    /// A line that fails fatally (no pipe could be created) is reported once on the
    /// diagnostics sink and abandoned; the loop then prompts again. Any other error,
    /// including one from the line source, ends the loop and is returned.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> ShellResult<()> {
        while !self.terminated {
            let Some(line) = source.read_line(&self.prompt)? else {
                debug!("end of input");
                break;
            };

            match self.run_line(&line) {
                Err(err) if err.is_fatal() => {
                    debug!(%err, line = %line, "line aborted");
                    self.last_exit_code = 1;
                    self.executor.report(&err);
                }
                Err(err) => return Err(err),
                Ok(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::io_adapters::ReaderSource;
    use std::io::Cursor;

    fn interpreter() -> Interpreter<Vec<u8>> {
        let config = ShellConfig::default();
        let executor = Executor::with_diagnostics(config.terminate_keyword.clone(), Vec::new());
        Interpreter::with_executor(&config, executor)
    }

    #[test]
    fn test_repl_stops_at_quit() {
        let mut sh = interpreter();
        let mut source = ReaderSource::new(Cursor::new("true\nquit\ntrue\n"), Vec::new());

        sh.repl(&mut source).unwrap();

        assert!(sh.is_terminated());
        let (rest, prompts) = source.into_inner();
        assert_eq!(prompts, b"$ $ ");
        // The line after `quit` is never read.
        assert_eq!(rest.position(), "true\nquit\n".len() as u64);
    }

    #[test]
    fn test_repl_stops_at_end_of_input() {
        let mut sh = interpreter();
        let mut source = ReaderSource::new(Cursor::new("\n   \ntrue\n"), Vec::new());

        sh.repl(&mut source).unwrap();

        assert!(!sh.is_terminated());
        let (_, prompts) = source.into_inner();
        assert_eq!(prompts, b"$ $ $ $ ");
    }

    #[test]
    fn test_last_exit_code_follows_lines() {
        let mut sh = interpreter();

        sh.run_line("false").unwrap();
        assert_eq!(sh.last_exit_code(), 1);

        // Blank lines leave it alone.
        sh.run_line("").unwrap();
        assert_eq!(sh.last_exit_code(), 1);

        sh.run_line("false ; true").unwrap();
        assert_eq!(sh.last_exit_code(), 0);
    }

    #[test]
    fn test_diagnostics_go_to_executor_sink() {
        let mut sh = interpreter();
        let mut source = ReaderSource::new(Cursor::new("false ; true\n"), Vec::new());

        sh.repl(&mut source).unwrap();

        let diagnostics = String::from_utf8(sh.executor().diagnostics().clone()).unwrap();
        assert_eq!(diagnostics, "command `false` exited with status 1\n");
    }
}
