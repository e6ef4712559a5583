//! Turns the raw byte stream of the serial link into lines, without ever
//! blocking the caller.

use log::warn;
use std::{
    io::{self, ErrorKind, Read, Write},
    str::{self, Utf8Error},
};

/// Lines longer than this without a terminator are garbage (usually a
/// baud-rate mismatch), so the buffer is dropped rather than grown forever.
const MAX_PENDING: usize = 4096;

/// One line read from the link, with its `\n` removed. The bytes are kept
/// as-is; whether they are text is decided by [`RawLine::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine(pub Vec<u8>);

impl RawLine {
    /// The line as text, with trailing whitespace (including `\r`) removed.
    pub fn text(&self) -> Result<&str, Utf8Error> {
        str::from_utf8(&self.0).map(|s| s.trim_end())
    }
}

/// A line-oriented, bidirectional link to the potentiometer board.
pub trait LineSource {
    /// Returns the next complete line if one is available, or `None`
    /// straight away if there is not.
    fn try_read_line(&mut self) -> io::Result<Option<RawLine>>;

    /// Writes `data` to the link and flushes it.
    fn send(&mut self, data: &[u8]) -> io::Result<()>;
}

/// A [`LineSource`] over anything that can be read from and written to, in
/// practice a [`serial2::SerialPort`] with a zero read timeout.
pub struct LinkReader<T> {
    link: T,
    pending: Vec<u8>,
    buffer: [u8; 256],
}

impl<T> LinkReader<T>
where
    T: Read + Write,
{
    /// Wraps `link`. Reads on `link` are expected to fail with `TimedOut` or
    /// `WouldBlock` when there is nothing to read.
    pub fn new(link: T) -> Self {
        Self {
            link,
            pending: Vec::new(),
            buffer: [0; 256],
        }
    }

    fn take_line(&mut self) -> Option<RawLine> {
        let end = self.pending.iter().position(|&c| c == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        Some(RawLine(line))
    }
}

fn is_idle(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

impl<T> LineSource for LinkReader<T>
where
    T: Read + Write,
{
    fn try_read_line(&mut self) -> io::Result<Option<RawLine>> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        match self.link.read(&mut self.buffer) {
            Ok(read_len) => self.pending.extend_from_slice(&self.buffer[..read_len]),
            Err(e) if is_idle(&e) => return Ok(None),
            Err(e) => return Err(e),
        }

        let line = self.take_line();
        if line.is_none() && self.pending.len() > MAX_PENDING {
            warn!(
                "Dropping {} bytes received without a line terminator",
                self.pending.len()
            );
            self.pending.clear();
        }
        Ok(line)
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.link.write_all(data)?;
        self.link.flush()
    }
}

/// An in-memory link for exercising everything that sits on top of a
/// [`LineSource`].
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind, Read, Write};
    use std::sync::{Arc, Mutex};

    /// Cloning shares the buffers, so a test can keep one handle and hand
    /// the other to the code under test (or to a thread playing the board).
    #[derive(Clone, Default)]
    pub struct MockLink {
        inner: Arc<Mutex<MockLinkInner>>,
    }

    #[derive(Default)]
    struct MockLinkInner {
        read_buffer: VecDeque<u8>,
        write_buffer: Vec<u8>,
        chunk: Option<usize>,
    }

    impl MockLink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Caps how many bytes a single read may return.
        pub fn with_chunk(self, chunk: usize) -> Self {
            self.inner.lock().unwrap().chunk = Some(chunk);
            self
        }

        /// Queues bytes for the reader.
        pub fn inject(&self, data: &[u8]) {
            self.inner.lock().unwrap().read_buffer.extend(data);
        }

        /// Everything written so far.
        pub fn written(&self) -> Vec<u8> {
            self.inner.lock().unwrap().write_buffer.clone()
        }
    }

    impl Read for MockLink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut inner = self.inner.lock().unwrap();
            if inner.read_buffer.is_empty() {
                return Err(io::Error::from(ErrorKind::TimedOut));
            }
            let limit = inner.chunk.unwrap_or(usize::MAX);
            let available = inner.read_buffer.len().min(buf.len()).min(limit);
            for item in buf.iter_mut().take(available) {
                *item = inner.read_buffer.pop_front().unwrap();
            }
            Ok(available)
        }
    }

    impl Write for MockLink {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.inner
                .lock()
                .unwrap()
                .write_buffer
                .extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
