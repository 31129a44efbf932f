//! Reply lines and their wire framing
use std::fmt;

/// Sent as soon as a connection is accepted
pub const GREETING: &[u8] = b"AVM IDENT\r\n\0";

/// Largest frame a reply may occupy, terminator and NUL included
pub const MAX_REPLY_LEN: usize = 256;

const TERMINATOR: &str = "\r\n";

/// One line of response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A `USERS` listing entry
    Account(String),
    /// Owner of a queried endpoint
    User(String),
    SystemUser,
    NotFound,
    Unspecified,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reply::Account(name) => f.write_str(name),
            Reply::User(name) => write!(f, "USER {}", name),
            Reply::SystemUser => f.write_str("ERROR SYSTEM_USER"),
            Reply::NotFound => f.write_str("ERROR NOT_FOUND"),
            Reply::Unspecified => f.write_str("ERROR UNSPECIFIED"),
        }
    }
}

impl Reply {
    /// Text, CRLF and a trailing NUL, at most [`MAX_REPLY_LEN`] bytes.
    pub fn frame(&self) -> Vec<u8> {
        let mut text = self.to_string();
        let limit = MAX_REPLY_LEN - TERMINATOR.len() - 1;
        if text.len() > limit {
            log::error!("Reply exceeds {} bytes, truncating: {:?}", MAX_REPLY_LEN, text);
            let mut end = limit;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
        }

        let mut frame = Vec::with_capacity(text.len() + TERMINATOR.len() + 1);
        frame.extend_from_slice(text.as_bytes());
        frame.extend_from_slice(TERMINATOR.as_bytes());
        frame.push(0);
        frame
    }
}
