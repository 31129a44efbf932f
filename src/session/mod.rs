//! Identification protocol session
//!
//! One session per accepted connection: greet, read a single command,
//! answer it and let the connection close.
use std::io::{Read, Write};

use crate::accounts::AccountDatabase;
use crate::config::IdentConfig;
use crate::conntable::Transport;
use crate::error::IdentError;

pub mod command;
pub mod reply;

pub use command::Command;
pub use reply::{Reply, GREETING, MAX_REPLY_LEN};

/// Size of the command buffer; one byte stays unused as in the router's own framing
pub const CMD_BUFFER: usize = 256;

/// Everything a session needs besides its socket
pub struct SessionContext<'a> {
    pub config: &'a IdentConfig,
    pub accounts: &'a dyn AccountDatabase,
}

/// Where a session is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Greeting,
    AwaitCommand,
    Dispatch,
    Replied,
    Closed,
}

/// How a session ended, when it ended without a fatal error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Replied,
    PeerClosed,
}

/// One accepted connection
pub struct Session<S: Read + Write> {
    stream: S,
    state: SessionState,
}

impl<S: Read + Write> Session<S> {
    pub fn new(stream: S) -> Self {
        Session {
            stream,
            state: SessionState::Greeting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to completion.
    ///
    /// A peer that closes before sending anything ends the session quietly.
    /// Socket errors come back as `Err` and are fatal to the server.
    pub fn run(&mut self, context: &SessionContext) -> Result<SessionOutcome, IdentError> {
        let outcome = self.exchange(context);
        self.state = SessionState::Closed;
        outcome
    }

    fn exchange(&mut self, context: &SessionContext) -> Result<SessionOutcome, IdentError> {
        self.stream.write_all(GREETING).map_err(IdentError::Greeting)?;
        self.state = SessionState::AwaitCommand;

        // A single read, no reassembly: the router sends its command in one segment
        let mut buffer = [0u8; CMD_BUFFER];
        let bytes = self
            .stream
            .read(&mut buffer[..CMD_BUFFER - 1])
            .map_err(IdentError::Receive)?;
        if bytes == 0 {
            log::debug!("Peer closed the connection without a command");
            return Ok(SessionOutcome::PeerClosed);
        }

        // The command is a C string: nothing after the first NUL counts
        let end = buffer[..bytes].iter().position(|&b| b == 0).unwrap_or(bytes);
        let input = String::from_utf8_lossy(&buffer[..end]);
        log::debug!("recv'd: {}", input);
        self.state = SessionState::Dispatch;

        let command = Command::parse(&input);
        self.dispatch(&command, context)?;
        self.state = SessionState::Replied;
        Ok(SessionOutcome::Replied)
    }

    fn dispatch(&mut self, command: &Command, context: &SessionContext) -> Result<(), IdentError> {
        match command {
            Command::Users => {
                for account in context.accounts.accounts() {
                    if !context.config.uid_ranges.is_admissible(account.uid) {
                        log::trace!("USERS: skipping {} (uid {})", account.name, account.uid);
                        continue;
                    }
                    let name = context.config.qualify(&account.name).to_string();
                    log::info!("USERS: {}", name);
                    self.send(&Reply::Account(name))?;
                }
                Ok(())
            }
            Command::Query {
                transport,
                ip,
                port,
            } => {
                log::info!("Searching for \"{}:{}\" ({})", ip, port.trim_end(), transport);
                let reply = answer_query(*transport, ip, port, context);
                self.send(&reply)
            }
            Command::Unrecognized(raw) => {
                log::info!("Unrecognized command \"{}\"", raw.trim_end());
                self.send(&Reply::Unspecified)
            }
        }
    }

    fn send(&mut self, reply: &Reply) -> Result<(), IdentError> {
        let frame = reply.frame();
        match self.stream.write_all(&frame) {
            Ok(()) => {
                log::debug!("sent: {}", reply);
                Ok(())
            }
            Err(source) => Err(IdentError::Send {
                reply: reply.to_string(),
                source,
            }),
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Work out the reply to a `TCP`/`UDP` query.
pub fn answer_query(transport: Transport, ip: &str, port: &str, context: &SessionContext) -> Reply {
    let port_number = match command::scan_port(port) {
        Some(port_number) => port_number,
        None => {
            log::warn!("Unreadable port number {:?}", port);
            return Reply::NotFound;
        }
    };

    let uid = match context.config.tables.resolve(transport, ip, port_number) {
        Some(uid) => uid,
        None => return Reply::NotFound,
    };

    if !context.config.uid_ranges.is_admissible(uid) {
        log::info!("{} {}: uid {} is a system user", transport, port_number, uid);
        return Reply::SystemUser;
    }

    match context.accounts.account_name(uid) {
        Some(name) => {
            log::info!("{} {}: {}", transport, port_number, name);
            Reply::User(context.config.qualify(&name).to_string())
        }
        None => {
            log::warn!("uid {} owns {} port {} but has no account", uid, transport, port_number);
            Reply::NotFound
        }
    }
}
