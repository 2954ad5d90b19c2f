/*!
 * Console Log
 * Line-oriented stdout protocol, serialized by the process-local log mutex
 */

use super::errors::OsFailure;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Console writer shared by every stage of one process
///
/// Each line is formatted up front and written with a single call while the
/// mutex is held, so lines from one process never tear.
pub struct ConsoleLog {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLog {
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// In-memory console plus a handle for reading back what was written
    pub fn memory() -> (Self, MemorySink) {
        let sink = MemorySink::default();
        (Self::new(Box::new(sink.clone())), sink)
    }

    pub fn line(&self, args: fmt::Arguments<'_>) {
        let mut text = args.to_string();
        text.push('\n');

        let mut sink = self.sink.lock();
        // Nowhere to report a broken stdout
        let _ = sink.write_all(text.as_bytes());
        let _ = sink.flush();
    }

    /// `<pid> - <function>(<param>) failed. errno: <code> (<description>)`
    pub fn failure(&self, pid: u32, failure: &OsFailure) {
        self.line(format_args!("{} - {}", pid, failure));
    }
}

impl fmt::Debug for ConsoleLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLog").finish_non_exhaustive()
    }
}

/// Shared in-memory buffer implementing `Write`
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
