//! Listener setup and the sequential accept loop
use std::env;
use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::os::unix::io::{FromRawFd, RawFd};

use crate::error::IdentError;
use crate::session::{Session, SessionContext, SessionOutcome};

/// First descriptor handed over by the service manager
const LISTEN_FDS_START: RawFd = 3;

/// Number of sockets passed by a socket-activating service manager.
///
/// Only counts when `LISTEN_PID` names this process.
pub fn listen_fds(
    listen_pid: Option<&str>,
    listen_fds: Option<&str>,
    pid: u32,
) -> Result<usize, IdentError> {
    let for_us = listen_pid
        .and_then(|value| value.trim().parse::<u32>().ok())
        .map_or(false, |listen_pid| listen_pid == pid);
    if !for_us {
        return Ok(0);
    }

    match listen_fds {
        None => Ok(0),
        Some(value) => value.trim().parse::<usize>().map_err(|e| {
            IdentError::Activation(format!("Unreadable LISTEN_FDS {:?}: {}", value, e))
        }),
    }
}

/// Listener from the service manager if one was passed, else bind `port`.
pub fn open_listener(port: u16) -> Result<TcpListener, IdentError> {
    let passed = listen_fds(
        env::var("LISTEN_PID").ok().as_deref(),
        env::var("LISTEN_FDS").ok().as_deref(),
        std::process::id(),
    )?;

    match passed {
        0 => {
            log::debug!("Binding port {} to socket", port);
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                .map_err(|source| IdentError::Bind { port, source })
        }
        1 => {
            log::debug!("Socket passed by service manager");
            // SAFETY: the service manager hands us exactly one listening
            // socket at LISTEN_FDS_START and nothing else owns it.
            Ok(unsafe { TcpListener::from_raw_fd(LISTEN_FDS_START) })
        }
        n => Err(IdentError::Activation(format!(
            "Too many file descriptors received ({})",
            n
        ))),
    }
}

/// Accepts connections and serves them one after another
pub struct IdentServer<'a> {
    listener: TcpListener,
    context: SessionContext<'a>,
}

impl<'a> IdentServer<'a> {
    pub fn new(listener: TcpListener, context: SessionContext<'a>) -> Self {
        IdentServer { listener, context }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, IdentError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until a fatal error occurs.
    pub fn run(&self) -> Result<(), IdentError> {
        self.announce();
        loop {
            self.serve_one()?;
        }
    }

    /// Serve `sessions` connections, then return.
    pub fn serve(&self, sessions: usize) -> Result<(), IdentError> {
        self.announce();
        for _ in 0..sessions {
            self.serve_one()?;
        }
        Ok(())
    }

    /// Accept one connection and handle it to completion.
    pub fn serve_one(&self) -> Result<SessionOutcome, IdentError> {
        let (stream, peer) = self.listener.accept().map_err(|e| {
            log::error!("accept failed: {}", e);
            IdentError::Accept(e)
        })?;
        log::debug!("Connection from {}", peer);

        let mut session = Session::new(stream);
        let outcome = session.run(&self.context);
        if let Err(e) = &outcome {
            log::error!("Session with {} failed: {}", peer, e);
        }
        // Dropping the session closes the connection
        outcome
    }

    fn announce(&self) {
        match self.local_addr() {
            Ok(addr) => log::info!("Daemon is listening on port {}", addr.port()),
            Err(e) => log::warn!("Daemon is listening, address unknown: {}", e),
        }
    }
}
