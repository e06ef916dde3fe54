//! A single connection to a MOO server.

use std::io::{self, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::framing::{FrameReader, Reply};

/// A connected, handshaken session.
///
/// One command is in flight at a time; `command` takes `&mut self` and does
/// not return until the command's SUFFIX has been read. The socket is shut
/// down when the session is dropped, closed, or fails.
///
/// # Example
///
/// ```no_run
/// use moo_client::{Reply, Session, SessionConfig};
/// use protocol_moo::Value;
///
/// # fn example() -> Result<(), moo_client::ClientError> {
/// let config = SessionConfig {
///     address: "127.0.0.1:7777".to_string(),
///     ..Default::default()
/// };
/// let mut session = Session::connect(&config)?;
///
/// let reply = session.command("; return 1 + 1;")?;
/// assert_eq!(reply, Reply::Value(Value::Integer(2)));
/// # Ok(())
/// # }
/// ```
pub struct Session {
    conn: Option<Connection>,
    verbose: bool,
    command_timeout: Option<Duration>,
}

struct Connection {
    reader: FrameReader<BufReader<DeadlineStream>>,
    writer: TcpStream,
}

impl Session {
    /// Connect to the configured server and perform the handshake:
    /// `connect <args>`, then the PREFIX and SUFFIX registrations.
    pub fn connect(config: &SessionConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let stream = connect_any(&config.address, config.connect_timeout())?;
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;
        tracing::debug!(address = %config.address, "connected");

        let reader = FrameReader::new(
            BufReader::new(DeadlineStream::new(stream)),
            config.prefix.as_str(),
            config.suffix.as_str(),
        )
        .verbose(config.verbose);

        let mut session = Session {
            conn: Some(Connection { reader, writer }),
            verbose: config.verbose,
            command_timeout: config.command_timeout(),
        };

        let connect_line = if config.connect_args.is_empty() {
            "connect".to_string()
        } else {
            format!("connect {}", config.connect_args)
        };
        session.send_line(&connect_line)?;
        session.send_line(&format!("PREFIX {}", config.prefix))?;
        session.send_line(&format!("SUFFIX {}", config.suffix))?;
        tracing::debug!(address = %config.address, "handshake sent");

        Ok(session)
    }

    /// Returns true until the session is closed.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Write one line without waiting for any output.
    pub fn send_line(&mut self, line: &str) -> Result<(), ClientError> {
        if line.contains(['\r', '\n']) {
            return Err(ClientError::InvalidCommand("line break in command"));
        }
        let verbose = self.verbose;
        let conn = self.conn.as_mut().ok_or(ClientError::Closed)?;

        if verbose {
            tracing::debug!(line = %line, "send");
        } else {
            tracing::trace!(line = %line, "send");
        }

        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\n");
        let result = conn.writer.write_all(&data).and_then(|()| conn.writer.flush());
        if let Err(e) = result {
            self.close();
            return Err(e.into());
        }
        Ok(())
    }

    /// Send `code` and return the lines of its framed output, undecoded.
    pub fn command_lines(&mut self, code: &str) -> Result<Vec<String>, ClientError> {
        self.send_line(code)?;

        let deadline = self.command_timeout.map(|t| Instant::now() + t);
        let conn = self.conn.as_mut().ok_or(ClientError::Closed)?;
        conn.reader.get_mut().get_mut().deadline = deadline;

        match conn.reader.read_frame() {
            Ok(lines) => Ok(lines),
            Err(e) => {
                // bytes of an unfinished frame may be buffered; never reuse
                if matches!(e, ClientError::Timeout) {
                    tracing::warn!(command = %code, "command timed out, closing session");
                } else {
                    tracing::debug!(error = %e, "read failed, closing session");
                }
                self.close();
                Err(e)
            }
        }
    }

    /// Send `code` and return its shaped, decoded output.
    ///
    /// A single output line is decoded into [`Reply::Value`]; several lines
    /// are returned raw in [`Reply::Lines`].
    pub fn command(&mut self, code: &str) -> Result<Reply, ClientError> {
        let lines = self.command_lines(code)?;
        Ok(Reply::from_lines(lines)?)
    }

    /// Shut the socket down. Idempotent.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = conn.writer.shutdown(Shutdown::Both);
            tracing::debug!("session closed");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect_any(address: &str, timeout: Duration) -> Result<TcpStream, ClientError> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(ClientError::Io(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot resolve address: {address}"),
        )
    })))
}

/// A socket whose reads fail once a deadline has passed.
struct DeadlineStream {
    stream: TcpStream,
    deadline: Option<Instant>,
    /// Read timeout currently set on the socket.
    applied: Option<Duration>,
}

impl DeadlineStream {
    fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            deadline: None,
            applied: None,
        }
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let timeout = match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "command deadline elapsed",
                    ));
                }
                Some(remaining)
            }
            None => None,
        };
        if timeout != self.applied {
            self.stream.set_read_timeout(timeout)?;
            self.applied = timeout;
        }
        self.stream.read(buf)
    }
}
