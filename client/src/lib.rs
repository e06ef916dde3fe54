//! Framed command sessions against a MOO server.
//!
//! A [`Session`] owns one TCP connection. After the handshake it registers
//! two sentinel lines with the server, which then brackets the output of
//! every command with them. [`Session::command`] sends one line of code,
//! skips anything the server prints before the opening sentinel, collects
//! the lines up to the closing sentinel, and decodes them with
//! [`protocol_moo`].
//!
//! Server-side errors such as `E_PERM` are ordinary values in a [`Reply`];
//! only transport, framing, and decoding failures surface as
//! [`ClientError`].

mod config;
mod error;
mod framing;
mod session;

pub mod logging;

pub use config::{Config, ConfigError, LoggingConfig, SessionConfig};
pub use error::ClientError;
pub use framing::{FrameReader, Reply};
pub use session::Session;
