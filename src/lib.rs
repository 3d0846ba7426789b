//! A small line-oriented command interpreter.
//!
//! Each input line is split into independent pipelines on `;` and each pipeline into
//! stages on `|`. Every stage is an external program run as a child process; the
//! stdout of one stage feeds the stdin of the next through an OS pipe. All stages of
//! a line are launched first and then reaped in launch order, so pipelines on the
//! same line run concurrently. A stage named like the terminate keyword (`quit` by
//! default) ends the interpreter.
//!
//! There is no quoting, globbing, variable expansion, job control or file redirection.
//!
//! The pieces are:
//! - [`parse`] turns a line into a [`CommandLine`];
//! - [`Executor`] launches and reaps a [`CommandLine`];
//! - [`Interpreter`] drives the read-parse-execute loop over a [`LineSource`].

pub mod command;
pub mod config;
pub mod error;
pub mod executor;
mod external;
mod interpreter;
pub mod io_adapters;
pub mod parser;
mod pipe;

pub use command::{CommandLine, ExitCode, Pipeline, Stage};
pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
pub use executor::{Control, Executor, LineReport, StageStatus};
/// Just a convenient re-export of the read-parse-execute driver.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use io_adapters::{EditorSource, LineSource, ReaderSource};
pub use parser::parse;
