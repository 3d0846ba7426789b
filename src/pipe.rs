use std::io::{self, PipeReader, PipeWriter};
use std::process::Stdio;

/// The pipe a producing stage creates when its output feeds the next stage.
///
/// The producing stage owns both ends and is the only one that closes them. Children
/// never receive these handles directly: the producer's stdout and the consumer's stdin
/// are duplicates, which the child processes close when they exit.
///
/// Either end may be released early (once no further child needs to be bound to it);
/// releasing or closing an end that is already gone is a no-op.
#[derive(Debug)]
pub(crate) struct StagePipe {
    reader: Option<PipeReader>,
    writer: Option<PipeWriter>,
}

impl StagePipe {
    pub(crate) fn open() -> io::Result<Self> {
        let (reader, writer) = io::pipe()?;
        Ok(Self {
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// A duplicate of the write end, to become the producer's stdout.
    pub(crate) fn stdout(&self) -> io::Result<Stdio> {
        match &self.writer {
            Some(writer) => Ok(writer.try_clone()?.into()),
            None => Err(closed_end("write")),
        }
    }

    /// A duplicate of the read end, lent to the consuming stage as its stdin.
    pub(crate) fn stdin(&self) -> io::Result<Stdio> {
        match &self.reader {
            Some(reader) => Ok(reader.try_clone()?.into()),
            None => Err(closed_end("read")),
        }
    }

    /// Close the parent's write end. Returns whether anything was closed.
    pub(crate) fn release_write_end(&mut self) -> bool {
        self.writer.take().is_some()
    }

    /// Close the parent's read end. Returns whether anything was closed.
    pub(crate) fn release_read_end(&mut self) -> bool {
        self.reader.take().is_some()
    }

    pub(crate) fn close(&mut self) {
        self.release_write_end();
        self.release_read_end();
    }

    #[cfg(test)]
    pub(crate) fn is_open(&self) -> bool {
        self.reader.is_some() || self.writer.is_some()
    }
}

fn closed_end(which: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        format!("pipe {which} end already closed"),
    )
}
