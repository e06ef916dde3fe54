use protocol_moo::ParseError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The server closed the connection before the command's output ended.
    #[error("connection closed")]
    ConnectionClosed,
    /// The command deadline elapsed. The session is closed afterwards.
    #[error("command timed out")]
    Timeout,
    /// The session was closed, either explicitly or after an earlier failure.
    #[error("session closed")]
    Closed,
    #[error("invalid command: {0}")]
    InvalidCommand(&'static str),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
