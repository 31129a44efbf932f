//! Connection table scanner
//!
//! Maps a local IPv4 endpoint to the uid owning the socket by scanning the
//! kernel's `/proc/net/tcp` or `/proc/net/udp` listing.
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

pub const IPV4_TCP_TABLE: &str = "/proc/net/tcp";
pub const IPV4_UDP_TABLE: &str = "/proc/net/udp";

/// Column of the local `ADDRESS:PORT` field in a table row
const LOCAL_ADDRESS_FIELD: usize = 1;
/// Column of the owning uid in a table row
const UID_FIELD: usize = 7;

/// Transport whose connection table is scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "TCP",
            Transport::Udp => "UDP",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated local endpoint to look up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointKey {
    pub transport: Transport,
    pub address: Ipv4Addr,
    pub port: u16,
}

impl EndpointKey {
    /// Validate a dotted-quad address and a port number.
    ///
    /// Returns `None` (and logs why) when either is unusable.
    pub fn parse(transport: Transport, ip: &str, port: u32) -> Option<Self> {
        if ip.is_empty() {
            log::warn!("{} lookup without a local address", transport);
            return None;
        }
        let address = match ip.parse::<Ipv4Addr>() {
            Ok(address) => address,
            Err(e) => {
                log::warn!("Invalid IPv4 address {:?}: {}", ip, e);
                return None;
            }
        };
        let port = match u16::try_from(port) {
            Ok(port) => port,
            Err(_) => {
                log::warn!("Port number {} out of range (0-65535)", port);
                return None;
            }
        };
        Some(EndpointKey {
            transport,
            address,
            port,
        })
    }

    pub fn bind_string(&self) -> String {
        bind_string(self.address, self.port)
    }
}

/// Render an endpoint the way the kernel prints it in `/proc/net/{tcp,udp}`.
///
/// The address is the in-memory (network order) word read as a host integer,
/// so `127.0.0.1:80` becomes `0100007F:0050` on little-endian machines.
pub fn bind_string(address: Ipv4Addr, port: u16) -> String {
    let word = u32::from_ne_bytes(address.octets());
    let bindstring = format!("{:08X}:{:04X}", word, port);
    log::debug!("Bindstring \"{}\"", bindstring);
    bindstring
}

/// Locations of the IPv4 connection tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTables {
    tcp: PathBuf,
    udp: PathBuf,
}

impl Default for ConnectionTables {
    fn default() -> Self {
        ConnectionTables::new(IPV4_TCP_TABLE, IPV4_UDP_TABLE)
    }
}

impl ConnectionTables {
    pub fn new(tcp: impl Into<PathBuf>, udp: impl Into<PathBuf>) -> Self {
        ConnectionTables {
            tcp: tcp.into(),
            udp: udp.into(),
        }
    }

    pub fn path(&self, transport: Transport) -> &Path {
        match transport {
            Transport::Tcp => &self.tcp,
            Transport::Udp => &self.udp,
        }
    }

    /// Find the uid owning the local endpoint `ip:port`.
    ///
    /// Invalid input and unreadable tables are logged and reported as `None`,
    /// exactly like a miss.
    pub fn resolve(&self, transport: Transport, ip: &str, port: u32) -> Option<u32> {
        let key = EndpointKey::parse(transport, ip, port)?;
        self.lookup(&key)
    }

    /// Scan the table for `key`'s transport; the file is opened per call.
    pub fn lookup(&self, key: &EndpointKey) -> Option<u32> {
        let path = self.path(key.transport);
        let bindstring = key.bind_string();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Cannot open {}: {}", path.display(), e);
                return None;
            }
        };

        let uid = uid_from_table(BufReader::new(file), &bindstring);
        match uid {
            Some(uid) => log::debug!("Found UID={} for {} {}", uid, key.transport, bindstring),
            None => log::info!("UID for {} port {} not found", key.transport, key.port),
        }
        uid
    }
}

/// Return the uid of the first row whose local address equals `bindstring`.
///
/// The header line is skipped unconditionally. A row with too few columns
/// ends the scan.
pub fn uid_from_table<R: BufRead>(reader: R, bindstring: &str) -> Option<u32> {
    let mut lines = reader.lines();

    // Header: "  sl  local_address rem_address   st ..."
    match lines.next() {
        Some(Ok(_)) => {}
        Some(Err(e)) => {
            log::warn!("Failed to read connection table header: {}", e);
            return None;
        }
        None => return None,
    }

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to read connection table: {}", e);
                return None;
            }
        };

        let mut fields = line.split_ascii_whitespace();
        let local = fields.nth(LOCAL_ADDRESS_FIELD);
        let uid = fields.nth(UID_FIELD - LOCAL_ADDRESS_FIELD - 1);
        let (local, uid) = match (local, uid) {
            (Some(local), Some(uid)) => (local, uid),
            _ => {
                log::debug!("Short connection table row, stopping scan: {:?}", line);
                return None;
            }
        };

        if local == bindstring {
            return match uid.parse::<u32>() {
                Ok(uid) => Some(uid),
                Err(e) => {
                    log::warn!("Unreadable uid {:?} for {}: {}", uid, bindstring, e);
                    None
                }
            };
        }
    }

    None
}
