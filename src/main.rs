use clap::Parser;
use log::{error, LevelFilter};
use provenance_chain::{
    load_chain, save_chain, BlockChain, Command, DiscoveryService, Opt, Peer, PeerAddr,
    Transaction, GLOBAL_CONFIG,
};
use std::path::Path;
use std::process;
use std::sync::atomic::AtomicBool;

/// Artwork id minted when a peer starts with no chain file
const GENESIS_ARTWORK_ID: &str = "GENESIS_ART";

fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartTracker { port } => {
            let mut service = DiscoveryService::start(&format!("0.0.0.0:{port}"))?;
            println!("Discovery service running on {}", service.local_addr());
            service.wait();
        }
        Command::StartPeer => {
            let node_addr = PeerAddr::parse(&GLOBAL_CONFIG.get_node_addr())?;
            let tracker_addr = PeerAddr::parse(&GLOBAL_CONFIG.get_tracker_addr())?;
            let chain_file = GLOBAL_CONFIG.get_chain_file();

            let chain = load_or_bootstrap(Path::new(&chain_file), &node_addr.ip)?;
            let mut peer = Peer::new(&node_addr.ip, node_addr.port, tracker_addr, chain)?;
            peer.connect()?;
            println!("Peer running on {}", peer.local_addr());
            peer.wait();
        }
        Command::Bootstrap {
            creator,
            recipient,
            artwork_id,
        } => {
            let chain_file = GLOBAL_CONFIG.get_chain_file();
            let path = Path::new(&chain_file);
            if path.exists() {
                return Err(format!("Chain file already exists: {chain_file}").into());
            }

            let cancel = AtomicBool::new(false);
            let mut chain = BlockChain::new();
            chain.bootstrap(&creator, &recipient, &artwork_id, &cancel)?;
            save_chain(path, chain.blocks())?;
            println!("Bootstrapped {chain_file} with genesis mint of {artwork_id:?}");
        }
        Command::Mine {
            sender,
            recipient,
            artwork_id,
        } => {
            let chain_file = GLOBAL_CONFIG.get_chain_file();
            let path = Path::new(&chain_file);
            let mut chain = load_verified_chain(path)?;

            let mut tx = Transaction::new(&sender, &recipient, &artwork_id);
            tx.sign(&sender);

            let cancel = AtomicBool::new(false);
            let block = chain.build_next(vec![tx], &cancel)?;
            if !chain.try_extend(&block) {
                return Err("Mined block was rejected by the chain".into());
            }
            save_chain(path, chain.blocks())?;
            println!(
                "Mined block {} ({})",
                block.header.block_num,
                block.id()?
            );
        }
        Command::Printchain => {
            let chain_file = GLOBAL_CONFIG.get_chain_file();
            let chain = load_verified_chain(Path::new(&chain_file))?;

            for block in chain.blocks() {
                println!(
                    "Block {} - {} (difficulty {}, nonce {})",
                    block.header.block_num,
                    block.id()?,
                    block.header.difficulty,
                    block.header.nonce
                );
                for tx in block.get_transactions() {
                    if tx.is_mint() {
                        println!(
                            "  MINT: artwork {:?} to {}",
                            tx.get_artwork_id(),
                            tx.get_recipient()
                        );
                    } else {
                        println!(
                            "  {} to {}: artwork {:?}",
                            tx.get_sender(),
                            tx.get_recipient(),
                            tx.get_artwork_id()
                        );
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}

/// Load and fully revalidate a chain file.
fn load_verified_chain(path: &Path) -> Result<BlockChain, Box<dyn std::error::Error>> {
    let blocks = load_chain(path)?;
    BlockChain::verify_blocks(&blocks)?;
    Ok(BlockChain::from_blocks(blocks))
}

/// Load the chain file if it exists, otherwise mine a genesis mint for this
/// peer and persist it.
fn load_or_bootstrap(path: &Path, ip: &str) -> Result<BlockChain, Box<dyn std::error::Error>> {
    if path.exists() {
        return load_verified_chain(path);
    }

    let cancel = AtomicBool::new(false);
    let mut chain = BlockChain::new();
    chain.bootstrap("MINT", ip, GENESIS_ARTWORK_ID, &cancel)?;
    save_chain(path, chain.blocks())?;
    Ok(chain)
}
