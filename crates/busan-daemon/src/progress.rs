use std::fmt;
use std::io::Write;

/// Resets terminal colors left over by build output.
const RESET: &str = "\x1b[0m";

/// Destination for live build output.
///
/// Chunks are flushed as they arrive so progress is visible while the
/// daemon is still building.
pub struct ProgressSink {
    out: Box<dyn Write + Send>,
}

impl ProgressSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// A sink that drops all output.
    pub fn discard() -> Self {
        Self::new(std::io::sink())
    }

    pub fn write_chunk(&mut self, chunk: &str) -> std::io::Result<()> {
        self.out.write_all(chunk.as_bytes())?;
        self.out.flush()
    }

    /// Ends a build's output: resets colors and terminates the line.
    pub fn finish(&mut self) -> std::io::Result<()> {
        self.out.write_all(RESET.as_bytes())?;
        self.out.write_all(b"\r\n")?;
        self.out.flush()
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink").finish_non_exhaustive()
    }
}
