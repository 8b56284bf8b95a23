use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ChainError;
use super::mining::{CancelToken, meets_difficulty};
use super::payload::BlockData;

/// Log a progress line every this many attempts.
const PROGRESS_STRIDE: u64 = 100_000;

/// A single block in the ledger holding one vote (or the genesis marker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: String, // RFC 3339, UTC, millisecond precision
    pub data: BlockData,
    pub previous_hash: String,
    pub hash: String, // Cached hash of the block
    pub nonce: u64,   // Proof-of-Work nonce
}

/// Current time in the fixed format used as hash input.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Block {
    /// Create the genesis block (first block in the chain). It is hashed
    /// once and never mined.
    pub fn genesis() -> Self {
        Self::with_timestamp(0, now_timestamp(), BlockData::genesis(), "0".to_string())
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(index: u64, previous_hash: String, data: BlockData) -> Self {
        Self::with_timestamp(index, now_timestamp(), data, previous_hash)
    }

    /// Create a block with an explicit timestamp, hashed at nonce 0.
    pub fn with_timestamp(
        index: u64,
        timestamp: String,
        data: BlockData,
        previous_hash: String,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            data,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 over `index ‖ timestamp ‖ canonical(data) ‖ previous_hash ‖ nonce`,
    /// hex-encoded. Does not read or write the `hash` field.
    pub fn compute_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.index,
            self.timestamp,
            self.data.canonical(),
            self.previous_hash,
            self.nonce
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    /// Perform Proof-of-Work with no way to stop it early.
    /// See `mine_with`.
    pub fn mine(&mut self, difficulty: u32) -> Result<u64, ChainError> {
        self.mine_with(difficulty, &CancelToken::new())
    }

    /// Search nonces upward from the current one until the hash starts
    /// with `difficulty` hex zeros. On success `hash` and `nonce` hold the
    /// winning values and the number of hashes computed is returned.
    ///
    /// `cancel` is polled after every failed attempt. A cancelled block
    /// keeps its last tried nonce and its previous `hash`.
    pub fn mine_with(&mut self, difficulty: u32, cancel: &CancelToken) -> Result<u64, ChainError> {
        let mut attempts: u64 = 0;
        loop {
            let hash = self.compute_hash();
            attempts = attempts.saturating_add(1);
            if meets_difficulty(&hash, difficulty) {
                self.hash = hash;
                info!(
                    "Block #{} mined: {} (nonce={}, attempts={})",
                    self.index, self.hash, self.nonce, attempts
                );
                return Ok(attempts);
            }
            if cancel.should_stop(attempts) {
                return Err(ChainError::MiningCancelled {
                    index: self.index,
                    attempts,
                });
            }
            self.nonce = self
                .nonce
                .checked_add(1)
                .ok_or(ChainError::NonceExhausted { index: self.index })?;
            if attempts % PROGRESS_STRIDE == 0 {
                debug!("Mining block #{}: nonce {}", self.index, self.nonce);
            }
        }
    }

    /// Validate that the block's cached `hash` matches its content and
    /// satisfies the PoW difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash == self.compute_hash() && meets_difficulty(&self.hash, difficulty)
    }
}
