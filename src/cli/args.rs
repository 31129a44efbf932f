//! Command-line argument parsing for the identification daemon
use clap::{ArgAction, Parser};
use log::LevelFilter;

use crate::config::{IdentConfig, DEFAULT_PORT, REAL_UID_MAX, REAL_UID_MIN};
use crate::error::IdentError;

#[derive(Parser, Debug)]
#[command(name = "avmident")]
#[command(about = "Answer Fritz!Box user identification requests")]
#[command(
    long_about = "Answer Fritz!Box user identification requests.\n\n\
    Mimics the AVM Windows application that lets the Fritz!Box recognize \
    individual users connecting to the Internet."
)]
pub struct Cli {
    /// Increase verbosity (may be passed multiple times)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Fake a Windows domain
    #[arg(short, long, value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// Port to listen on if not 14013 (for debugging only)
    #[arg(short, long, value_name = "PORT", default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Min. user id to interpret as real user
    #[arg(short = 'i', long, value_name = "MIN_UID", default_value_t = REAL_UID_MIN, value_parser = parse_uid)]
    pub umin: u32,

    /// Max. user id to interpret as real user
    #[arg(short = 'a', long, value_name = "MAX_UID", default_value_t = REAL_UID_MAX, value_parser = parse_uid)]
    pub umax: u32,
}

impl Cli {
    /// Warnings by default, then info, debug and trace per `-v`
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn to_config(&self) -> Result<IdentConfig, IdentError> {
        IdentConfig::new(self.port, self.domain.clone(), self.umin, self.umax)
    }
}

/// Parse an unsigned number with C-style radix prefixes (`0x1F`, `017`, `15`)
fn parse_number(value: &str) -> Result<u64, String> {
    let value = value.trim();
    let (digits, radix) = if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        (hex, 16)
    } else if value.len() > 1 && value.starts_with('0') {
        (&value[1..], 8)
    } else {
        (value, 10)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("unreadable number {:?}: {}", value, e))
}

fn parse_port(value: &str) -> Result<u16, String> {
    let port = parse_number(value)?;
    if !(1..=65535).contains(&port) {
        return Err("Port number out of range (1-65535)".to_string());
    }
    Ok(port as u16)
}

fn parse_uid(value: &str) -> Result<u32, String> {
    let uid = parse_number(value)?;
    u32::try_from(uid).map_err(|_| format!("uid {} out of range", uid))
}
