//! Sentinel framing of command output.
//!
//! The server brackets the output of every command with a PREFIX line and
//! a SUFFIX line. Anything it prints outside those brackets (notifications,
//! output of other tasks, leftovers from a suspended task) is noise and is
//! dropped. The reader is passive: it blocks on the next line until the
//! frame is complete.

use std::io::{self, BufRead};

use protocol_moo::{ParseError, Value, parse_reply};

use crate::error::ClientError;

/// Progress through one command's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Waiting for PREFIX. Lines seen here are discarded.
    Looking,
    /// Inside the frame. Lines seen here belong to the command.
    Found,
    /// SUFFIX seen.
    Done,
}

/// Reads framed command output from a line-oriented stream.
pub struct FrameReader<R> {
    reader: R,
    prefix: String,
    suffix: String,
    verbose: bool,
    buf: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            reader,
            prefix: prefix.into(),
            suffix: suffix.into(),
            verbose: false,
            buf: Vec::with_capacity(256),
        }
    }

    /// Log received lines at debug level instead of trace.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Read the output of one command: every line strictly between the
    /// next PREFIX and the SUFFIX that follows it.
    ///
    /// Blocks until SUFFIX arrives. There is no limit on how long that
    /// takes unless the underlying reader enforces one. Lines before
    /// PREFIX are compared as raw bytes and dropped, so they need not be
    /// UTF-8.
    pub fn read_frame(&mut self) -> Result<Vec<String>, ClientError> {
        let mut state = FrameState::Looking;
        let mut lines = Vec::new();
        while state != FrameState::Done {
            self.next_line()?;
            state = self.step(state, &mut lines)?;
        }
        Ok(lines)
    }

    /// Advance the state machine over the line held in `buf`.
    fn step(
        &mut self,
        state: FrameState,
        lines: &mut Vec<String>,
    ) -> Result<FrameState, ClientError> {
        match state {
            FrameState::Looking if self.buf == self.prefix.as_bytes() => Ok(FrameState::Found),
            FrameState::Looking => {
                tracing::trace!(
                    line = %String::from_utf8_lossy(&self.buf),
                    "discarding unframed line"
                );
                Ok(FrameState::Looking)
            }
            FrameState::Found if self.buf == self.suffix.as_bytes() => Ok(FrameState::Done),
            FrameState::Found => {
                let line = String::from_utf8(std::mem::take(&mut self.buf)).map_err(|_| {
                    ClientError::Protocol("framed line is not valid UTF-8".to_string())
                })?;
                lines.push(line);
                Ok(FrameState::Found)
            }
            FrameState::Done => Ok(FrameState::Done),
        }
    }

    /// Read one line into `buf` without its `\n` or `\r\n` terminator.
    fn next_line(&mut self) -> Result<(), ClientError> {
        self.buf.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(map_read_error)?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        if self.verbose {
            tracing::debug!(line = %String::from_utf8_lossy(&self.buf), "recv");
        } else {
            tracing::trace!(line = %String::from_utf8_lossy(&self.buf), "recv");
        }
        Ok(())
    }
}

fn map_read_error(e: io::Error) -> ClientError {
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ClientError::Timeout,
        io::ErrorKind::UnexpectedEof => ClientError::ConnectionClosed,
        _ => ClientError::Io(e),
    }
}

/// The shaped result of one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The command produced no output.
    Empty,
    /// The command produced exactly one line, decoded.
    Value(Value),
    /// The command produced several lines, in order, undecoded. Each is a
    /// literal on its own; see [`Reply::decode_lines`].
    Lines(Vec<String>),
}

impl Reply {
    /// Shape the lines of one frame. A lone line is decoded, error reports
    /// included; several lines are kept as text.
    pub fn from_lines(mut lines: Vec<String>) -> Result<Self, ParseError> {
        match lines.len() {
            0 => Ok(Reply::Empty),
            1 => {
                let line = lines.pop().unwrap_or_default();
                parse_reply(&line).map(Reply::Value)
            }
            _ => Ok(Reply::Lines(lines)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }

    /// The decoded value of a single-line reply.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Reply::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The raw lines of a multi-line reply.
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Reply::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    /// Decode every line of the reply, in order.
    pub fn decode_lines(&self) -> Result<Vec<Value>, ParseError> {
        match self {
            Reply::Empty => Ok(Vec::new()),
            Reply::Value(value) => Ok(vec![value.clone()]),
            Reply::Lines(lines) => lines.iter().map(|line| parse_reply(line)).collect(),
        }
    }
}
