//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::fs;
use std::io::{Read, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use avmident::accounts::{Account, AccountDatabase};
use avmident::config::IdentConfig;
use avmident::conntable::{bind_string, ConnectionTables};
use avmident::error::IdentError;
use avmident::server::IdentServer;
use avmident::session::{SessionContext, GREETING};
use tempfile::TempDir;

pub const TABLE_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

/// Accounts served from memory, in insertion order
#[derive(Debug, Clone, Default)]
pub struct FixtureAccounts(pub Vec<Account>);

impl FixtureAccounts {
    pub fn new(accounts: &[(u32, &str)]) -> Self {
        FixtureAccounts(
            accounts
                .iter()
                .map(|&(uid, name)| Account::new(uid, name))
                .collect(),
        )
    }
}

impl AccountDatabase for FixtureAccounts {
    fn accounts(&self) -> Vec<Account> {
        self.0.clone()
    }

    fn account_name(&self, uid: u32) -> Option<String> {
        self.0
            .iter()
            .find(|account| account.uid == uid)
            .map(|account| account.name.clone())
    }
}

/// A connection table row in the kernel's layout
pub fn table_row(slot: usize, address: Ipv4Addr, port: u16, uid: u32) -> String {
    format!(
        "{:>4}: {} 00000000:0000 0A 00000000:00000000 00:00000000 00000000 {:>5}        0 {} 1 0000000000000000 100 0 0 10 0",
        slot,
        bind_string(address, port),
        uid,
        10000 + slot
    )
}

/// Fixture `tcp` and `udp` tables inside a temporary directory
pub struct FixtureTables {
    pub dir: TempDir,
    pub tcp: PathBuf,
    pub udp: PathBuf,
}

impl FixtureTables {
    pub fn new(tcp_rows: &[(Ipv4Addr, u16, u32)], udp_rows: &[(Ipv4Addr, u16, u32)]) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let tcp = dir.path().join("tcp");
        let udp = dir.path().join("udp");
        fs::write(&tcp, render_table(tcp_rows)).expect("write tcp table");
        fs::write(&udp, render_table(udp_rows)).expect("write udp table");
        FixtureTables { dir, tcp, udp }
    }

    pub fn tables(&self) -> ConnectionTables {
        ConnectionTables::new(self.tcp.clone(), self.udp.clone())
    }
}

pub fn render_table(rows: &[(Ipv4Addr, u16, u32)]) -> String {
    let mut text = String::from(TABLE_HEADER);
    text.push('\n');
    for (slot, &(address, port, uid)) in rows.iter().enumerate() {
        text.push_str(&table_row(slot, address, port, uid));
        text.push('\n');
    }
    text
}

/// Run a server for `sessions` connections on a loopback port
pub fn spawn_server(
    config: IdentConfig,
    accounts: FixtureAccounts,
    sessions: usize,
) -> (SocketAddr, JoinHandle<Result<(), IdentError>>) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind loopback");
    let (addr_tx, addr_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let context = SessionContext {
            config: &config,
            accounts: &accounts,
        };
        let server = IdentServer::new(listener, context);
        addr_tx.send(server.local_addr()?).expect("report address");
        server.serve(sessions)
    });
    let addr = addr_rx.recv().expect("server address");
    (addr, handle)
}

/// Connect and consume the greeting
pub fn connect(addr: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(addr).expect("connect");
    let mut greeting = [0u8; 12];
    stream.read_exact(&mut greeting).expect("greeting");
    assert_eq!(&greeting[..], GREETING);
    stream
}

/// Send one command and collect everything until the server closes
pub fn request(addr: SocketAddr, command: &str) -> Vec<u8> {
    let mut stream = connect(addr);
    stream.write_all(command.as_bytes()).expect("send command");
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).expect("read reply");
    reply
}
