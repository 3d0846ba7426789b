use crate::command::{CommandLine, Pipeline, Stage};
use tracing::debug;

/// Separates independent pipelines on one line.
pub const SEQUENCE_OPERATOR: char = ';';

/// Connects the output of one stage to the input of the next.
pub const PIPE_OPERATOR: char = '|';

/// Parse a pipeline chunk: stage ('|' stage)*
///
/// A segment with no fields (e.g. `a | | b` or a leading `|`) ends the chunk: the
/// stages parsed before it are kept, everything from the empty segment on is dropped.
fn parse_pipeline(chunk: &str) -> Pipeline {
    let segments: Vec<&str> = chunk.split(PIPE_OPERATOR).collect();
    let last = segments.len() - 1;
    let mut stages = Vec::with_capacity(segments.len());

    for (index, segment) in segments.into_iter().enumerate() {
        let Some(mut stage) = parse_stage(segment) else {
            debug!(index, chunk, "empty segment, dropping rest of pipeline");
            break;
        };
        stage.reads_from_pipe = index > 0;
        stage.writes_to_pipe = index != last;
        stages.push(stage);
    }

    Pipeline::new(stages)
}

/// Parse a stage: program argument*
///
/// Fields are whitespace-delimited; there is no quoting or escaping.
fn parse_stage(segment: &str) -> Option<Stage> {
    let mut fields = segment.split_whitespace();
    let program = fields.next()?;
    Some(Stage::new(program, fields))
}

/// Turns one input line (trailing newline already removed) into a [`CommandLine`].
///
/// The line is split on `;` into independent pipelines, each pipeline on `|` into
/// stages, and each stage on whitespace into a program and its arguments. Every stage
/// but the last of its pipeline writes into a pipe; every stage but the first reads
/// from one. Blank chunks produce no pipeline, so blank input yields an empty line.
///
/// Parsing never fails and has no side effects.
pub fn parse(line: &str) -> CommandLine {
    let pipelines = line
        .split(SEQUENCE_OPERATOR)
        .map(parse_pipeline)
        .filter(|pipeline| !pipeline.is_empty())
        .collect();
    CommandLine::new(pipelines)
}
