use crate::core::Block;
use crate::error::{BlockchainError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write the accepted chain as a JSON array of block records.
pub fn save_chain(path: &Path, blocks: &[Block]) -> Result<()> {
    let file = File::create(path)
        .map_err(|e| BlockchainError::Io(format!("Failed to create {}: {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), blocks)?;
    Ok(())
}

/// Read a chain file back into block records.
///
/// This only reconstructs the objects; callers are responsible for running
/// `BlockChain::verify_blocks` before trusting the result.
pub fn load_chain(path: &Path) -> Result<Vec<Block>> {
    let file = File::open(path)
        .map_err(|e| BlockchainError::Io(format!("Failed to open {}: {e}", path.display())))?;
    let blocks = serde_json::from_reader(BufReader::new(file))?;
    Ok(blocks)
}
