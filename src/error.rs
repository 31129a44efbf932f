//! Custom error types for the identification daemon
use std::io;

/// Failures that end the serving loop.
///
/// Anything a peer can cause with a bad request is answered on the wire
/// instead; an `IdentError` always means the environment is broken.
#[derive(Debug, thiserror::Error)]
pub enum IdentError {
    #[error("cannot bind listener on port {port}: {source}")]
    Bind { port: u16, source: io::Error },

    #[error("socket activation error: {0}")]
    Activation(String),

    #[error("accept failed: {0}")]
    Accept(io::Error),

    #[error("sending greeting failed: {0}")]
    Greeting(io::Error),

    #[error("sending response {reply:?} failed: {source}")]
    Send { reply: String, source: io::Error },

    #[error("receiving command failed: {0}")]
    Receive(io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
