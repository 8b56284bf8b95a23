use crate::blockchain::{Block, ChainError, Ledger};
use crate::config::Config;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Shared application state: the ledger plus voters whose block is still being mined.
pub struct AppState {
    pub ledger: Ledger,
    pub pending_voters: Mutex<HashSet<String>>,
    pub mining_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ChainError> {
        Ok(Self::with_ledger(
            Ledger::new(config.difficulty)?,
            config.mining_timeout,
        ))
    }

    pub fn with_ledger(ledger: Ledger, mining_timeout: Option<Duration>) -> Self {
        Self {
            ledger,
            pending_voters: Mutex::new(HashSet::new()),
            mining_timeout,
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<Block>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- Vote API Models ---------- */

#[derive(Deserialize)]
pub struct VoteRequest {
    pub voter: String,
    pub candidate: String,
}

#[derive(Serialize)]
pub struct VoteResponse {
    pub index: u64,
    pub timestamp: String,
    pub hash: String,
    pub nonce: u64,
    pub previous_hash: String,
}

impl From<Block> for VoteResponse {
    fn from(block: Block) -> Self {
        Self {
            index: block.index,
            timestamp: block.timestamp,
            hash: block.hash,
            nonce: block.nonce,
            previous_hash: block.previous_hash,
        }
    }
}

#[derive(Serialize)]
pub struct ResultsResponse {
    pub total_votes: u64,
    pub results: BTreeMap<String, u64>,
}
