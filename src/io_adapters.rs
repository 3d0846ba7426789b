use crate::error::{ShellError, ShellResult};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};
use tracing::debug;

/// Supplier of input lines.
///
/// Implementors print `prompt`, then block until a full line is available. The
/// returned line has its trailing newline removed. `Ok(None)` means end of input.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> ShellResult<Option<String>>;
}

/// Interactive line source backed by a [`rustyline`] editor with in-memory history.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> ShellResult<Self> {
        let editor = DefaultEditor::new().map_err(|e| ShellError::Input(e.to_string()))?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> ShellResult<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                            debug!(error = %e, "could not add history entry");
                        }
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C abandons the current input, not the interpreter.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(ShellError::Input(err.to_string())),
            }
        }
    }
}

/// Line source over any buffered reader, writing the prompt to `prompt_out`.
///
/// Used when standard input is not a terminal, and in tests with in-memory buffers.
pub struct ReaderSource<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> ReaderSource<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }

    /// Give back the reader and the prompt writer.
    pub fn into_inner(self) -> (R, W) {
        (self.input, self.prompt_out)
    }
}

impl<R: BufRead, W: Write> LineSource for ReaderSource<R, W> {
    fn read_line(&mut self, prompt: &str) -> ShellResult<Option<String>> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| ShellError::Input(e.to_string()))?;
        if read == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
