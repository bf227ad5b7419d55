use crate::core::{Block, Transaction};
use crate::error::{BlockchainError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);
const IO_TIMEOUT: Duration = Duration::from_millis(3000);

/// A reachable peer endpoint as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddr {
    pub ip: String,
    pub port: u16,
}

impl PeerAddr {
    pub fn new(ip: &str, port: u16) -> PeerAddr {
        PeerAddr {
            ip: ip.to_string(),
            port,
        }
    }

    /// Parse an `ip:port` string.
    pub fn parse(addr: &str) -> Result<PeerAddr> {
        let (ip, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| BlockchainError::Config(format!("Invalid address: {addr}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| BlockchainError::Config(format!("Invalid port in {addr}: {e}")))?;
        Ok(PeerAddr::new(ip, port))
    }

    fn socket_addr(&self) -> Result<SocketAddr> {
        (self.ip.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| BlockchainError::Network(format!("Cannot resolve {self}: {e}")))?
            .next()
            .ok_or_else(|| BlockchainError::Network(format!("Cannot resolve {self}")))
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Gossip and discovery messages.
///
/// Each message is a single JSON object, UTF-8, newline-terminated; the
/// connection is closed after one exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type")]
pub enum Message {
    #[serde(rename = "JOIN")]
    Join { ip: String, port: u16 },
    #[serde(rename = "LEAVE")]
    Leave { ip: String, port: u16 },
    #[serde(rename = "KEEP_ALIVE")]
    KeepAlive { ip: String, port: u16 },
    #[serde(rename = "PEER_LIST")]
    PeerList { peers: Vec<PeerAddr> },
    #[serde(rename = "PEER_UPDATE")]
    PeerUpdate { peers: Vec<PeerAddr> },
    #[serde(rename = "NEW_TRANSACTION")]
    NewTransaction { data: Transaction },
    #[serde(rename = "NEW_BLOCK")]
    NewBlock { data: Block },
}

/// Open a connection, send one message, and close.
pub fn send_message(addr: &PeerAddr, message: &Message) -> Result<()> {
    let stream = TcpStream::connect_timeout(&addr.socket_addr()?, CONNECT_TIMEOUT)
        .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;
    stream
        .set_write_timeout(Some(IO_TIMEOUT))
        .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
    write_message(&stream, message)
}

/// Open a connection, send one message, and read one reply before closing.
pub fn send_expect_reply(addr: &PeerAddr, message: &Message) -> Result<Message> {
    let stream = TcpStream::connect_timeout(&addr.socket_addr()?, CONNECT_TIMEOUT)
        .map_err(|e| BlockchainError::Network(format!("Failed to connect to {addr}: {e}")))?;
    stream
        .set_write_timeout(Some(IO_TIMEOUT))
        .map_err(|e| BlockchainError::Network(format!("Failed to set write timeout: {e}")))?;
    stream
        .set_read_timeout(Some(IO_TIMEOUT))
        .map_err(|e| BlockchainError::Network(format!("Failed to set read timeout: {e}")))?;

    write_message(&stream, message)?;
    read_message(&stream)
}

/// Write one newline-terminated JSON message to an open stream.
pub fn write_message(mut stream: &TcpStream, message: &Message) -> Result<()> {
    let mut line = serde_json::to_string(message)
        .map_err(|e| BlockchainError::Serialization(format!("Failed to encode message: {e}")))?;
    line.push('\n');
    stream
        .write_all(line.as_bytes())
        .map_err(|e| BlockchainError::Network(format!("Failed to send message: {e}")))?;
    stream
        .flush()
        .map_err(|e| BlockchainError::Network(format!("Failed to flush message: {e}")))?;
    Ok(())
}

/// Read one newline-terminated JSON message from an open stream.
pub fn read_message(stream: &TcpStream) -> Result<Message> {
    let mut line = String::new();
    BufReader::new(stream)
        .read_line(&mut line)
        .map_err(|e| BlockchainError::Network(format!("Failed to read message: {e}")))?;

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(BlockchainError::Protocol("Empty message".to_string()));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| BlockchainError::Protocol(format!("Malformed message: {e}")))
}
