//! Command line parsing for the identification protocol
use crate::conntable::Transport;

const VERB_DELIMITERS: &[char] = &['\r', '\n', ' '];
const ADDRESS_DELIMITERS: &[char] = &[':'];
const PORT_DELIMITERS: &[char] = &['\r', '\n'];

/// A parsed request from the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every admissible account
    Users,
    /// Who owns the local endpoint `ip:port`
    Query {
        transport: Transport,
        ip: String,
        port: String,
    },
    /// Unknown verb, or a query missing its address or port
    Unrecognized(String),
}

impl Command {
    /// Parse the bytes of a single receive.
    ///
    /// The verb is the first token delimited by CR, LF or space. A query's
    /// address runs up to the next `:` and its port up to the next CR or LF.
    /// Anything from the first NUL byte on is ignored.
    pub fn parse(input: &str) -> Command {
        let input = input.split('\0').next().unwrap_or_default();
        let mut rest = input;
        let verb = match next_token(&mut rest, VERB_DELIMITERS) {
            Some(verb) => verb,
            None => return Command::Unrecognized(input.to_string()),
        };

        let transport = match verb {
            "USERS" => return Command::Users,
            "TCP" => Transport::Tcp,
            "UDP" => Transport::Udp,
            _ => return Command::Unrecognized(input.to_string()),
        };

        let ip = next_token(&mut rest, ADDRESS_DELIMITERS);
        let port = next_token(&mut rest, PORT_DELIMITERS);

        match (ip, port) {
            (Some(ip), Some(port)) => Command::Query {
                transport,
                ip: ip.trim().to_string(),
                port: port.to_string(),
            },
            _ => Command::Unrecognized(input.to_string()),
        }
    }
}

/// Take the next token from `rest`, skipping leading delimiters and
/// consuming the single delimiter that ends the token.
fn next_token<'a>(rest: &mut &'a str, delimiters: &[char]) -> Option<&'a str> {
    let start = rest.trim_start_matches(delimiters);
    if start.is_empty() {
        *rest = start;
        return None;
    }
    match start.find(delimiters) {
        Some(end) => {
            // Delimiters are all ASCII, so `end + 1` is a char boundary
            *rest = &start[end + 1..];
            Some(&start[..end])
        }
        None => {
            *rest = "";
            Some(start)
        }
    }
}

/// Read a port token the way `%u` does: skip leading whitespace, then take
/// the decimal digits that follow. `None` if there are no digits or the
/// value does not fit in 32 bits.
pub fn scan_port(token: &str) -> Option<u32> {
    let token = token.trim_start();
    let digits = token
        .find(|c: char| !c.is_ascii_digit())
        .map_or(token, |end| &token[..end]);
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}
