use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "provenance-chain")]
pub struct Opt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "starttracker", about = "Run the peer discovery service")]
    StartTracker {
        #[arg(help = "TCP port to listen on", default_value_t = 7000)]
        port: u16,
    },
    #[command(name = "startpeer", about = "Run a gossip peer node")]
    StartPeer,
    #[command(name = "bootstrap", about = "Create a chain file with a genesis mint")]
    Bootstrap {
        #[arg(help = "Identifier creating the first artwork")]
        creator: String,
        #[arg(help = "Identifier receiving the first artwork")]
        recipient: String,
        #[arg(help = "Unique id of the first artwork")]
        artwork_id: String,
    },
    #[command(name = "mine", about = "Mine a signed transfer onto the chain file")]
    Mine {
        #[arg(help = "Current owner (signing key)")]
        sender: String,
        #[arg(help = "New owner")]
        recipient: String,
        #[arg(help = "Artwork being transferred")]
        artwork_id: String,
    },
    #[command(name = "printchain", about = "Print all blocks in the chain file")]
    Printchain,
}
