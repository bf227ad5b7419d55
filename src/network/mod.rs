//! Peer-to-peer networking
//!
//! The gossip wire protocol, the peer node and its fork resolution, the peer
//! address table, and the discovery (rendezvous) service.

pub mod discovery;
pub mod message;
pub mod peer;
pub mod peer_table;

pub use discovery::DiscoveryService;
pub use message::{read_message, send_expect_reply, send_message, write_message, Message, PeerAddr};
pub use peer::{find_longest_chain, Peer};
pub use peer_table::PeerTable;
