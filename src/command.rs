//! Parsed form of one input line.
//!
//! A [`CommandLine`] is a sequence of independent [`Pipeline`]s (separated by `;`),
//! and each pipeline is a sequence of [`Stage`]s (separated by `|`). These are plain
//! values: nothing here owns a process or a descriptor. The per-line launch state
//! lives in the executor.

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// One external program invocation within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Executable name or path. Never empty for stages produced by the parser.
    pub program: String,
    /// Arguments passed to the program, in order.
    pub arguments: Vec<String>,
    /// Standard input comes from the previous stage's pipe.
    pub reads_from_pipe: bool,
    /// Standard output goes into a pipe this stage creates.
    pub writes_to_pipe: bool,
}

impl Stage {
    /// A stage bound to the inherited streams on both sides.
    pub fn new<S: Into<String>>(
        program: impl Into<String>,
        arguments: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            program: program.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            reads_from_pipe: false,
            writes_to_pipe: false,
        }
    }

    pub fn reading_pipe(mut self, reads: bool) -> Self {
        self.reads_from_pipe = reads;
        self
    }

    pub fn writing_pipe(mut self, writes: bool) -> Self {
        self.writes_to_pipe = writes;
        self
    }
}

/// Stages joined by the piping operator, executed as one connected chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }
}

/// Everything parsed from one input line.
///
/// Pipelines are independent of each other: no pipe crosses a `;` boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub pipelines: Vec<Pipeline>,
}

impl CommandLine {
    pub fn new(pipelines: Vec<Pipeline>) -> Self {
        Self { pipelines }
    }

    /// True when the line holds no pipelines at all (blank input).
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// All stages of the line in launch order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.pipelines
            .iter()
            .flat_map(|pipeline| pipeline.stages.iter())
    }
}
