//! Library crate for the AVM user identification daemon
//!
//! Answers a home router's `USERS`, `TCP` and `UDP` queries by looking up
//! which local account owns an IPv4 endpoint.

// Range checks read closer to the protocol description written out
#![allow(clippy::manual_range_contains)]

pub mod accounts;
pub mod config;
pub mod conntable;
pub mod error;
pub mod server;
pub mod session;
pub mod uid;

// CLI modules
pub mod cli {
    pub mod args;
}
