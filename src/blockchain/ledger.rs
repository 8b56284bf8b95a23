use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard};
use std::time::Duration;

use log::{debug, info};

use super::error::{ChainError, ValidationError};
use super::mining::CancelToken;
use super::{Block, Blockchain};

/// Thread-safe wrapper around a `Blockchain`.
///
/// Appends are serialized by `writer` and mine without holding the chain
/// lock, so readers keep going while a block is being mined and only ever
/// see whole blocks.
#[derive(Debug)]
pub struct Ledger {
    chain: RwLock<Blockchain>,
    writer: Mutex<()>,
}

impl Ledger {
    pub fn new(difficulty: u32) -> Result<Self, ChainError> {
        Ok(Self::from_chain(Blockchain::new(difficulty)?))
    }

    pub fn from_chain(chain: Blockchain) -> Self {
        Self {
            chain: RwLock::new(chain),
            writer: Mutex::new(()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.chain.read().expect("ledger lock poisoned")
    }

    /// Mine and append a vote block. Returns a copy of the appended block.
    pub fn append_vote(
        &self,
        voter: &str,
        candidate: &str,
        cancel: &CancelToken,
    ) -> Result<Block, ChainError> {
        self.append_vote_within(voter, candidate, cancel, None)
    }

    /// Like `append_vote`, with mining bounded by `timeout`. The clock starts
    /// once this call holds the writer lock, so time spent queued behind
    /// other appends is not charged to it.
    ///
    /// A token cancelled at any point before the push means nothing is
    /// appended, even if a winning nonce was already found.
    pub fn append_vote_within(
        &self,
        voter: &str,
        candidate: &str,
        cancel: &CancelToken,
        timeout: Option<Duration>,
    ) -> Result<Block, ChainError> {
        let _writer = self.writer.lock().expect("ledger writer poisoned");

        // The tail cannot move while we hold the writer lock.
        let (mut block, difficulty) = {
            let bc = self.read();
            (bc.next_block(voter, candidate)?, bc.difficulty())
        };
        if cancel.is_cancelled() {
            return Err(ChainError::MiningCancelled {
                index: block.index,
                attempts: 0,
            });
        }
        debug!(
            "LEDGER - mining block #{} on {} (difficulty={})",
            block.index, block.previous_hash, difficulty
        );

        let attempts = match timeout {
            Some(timeout) => block.mine_with(difficulty, &cancel.deadline_after(timeout))?,
            None => block.mine_with(difficulty, cancel)?,
        };

        let mut bc = self.chain.write().expect("ledger lock poisoned");
        if cancel.is_cancelled() {
            return Err(ChainError::MiningCancelled {
                index: block.index,
                attempts,
            });
        }
        bc.chain.push(block.clone());
        info!(
            "LEDGER - appended block #{} (height={})",
            block.index,
            bc.len()
        );
        Ok(block)
    }

    /// Clone of the whole chain at this moment.
    pub fn snapshot(&self) -> Blockchain {
        self.read().clone()
    }

    pub fn last_block(&self) -> Block {
        self.read().last_block().clone()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.read().validate()
    }

    pub fn is_valid(&self) -> bool {
        self.read().is_valid_chain()
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.read().has_voted(voter)
    }

    pub fn tally(&self) -> BTreeMap<String, u64> {
        self.read().tally()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn difficulty(&self) -> u32 {
        self.read().difficulty()
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::blockchain::{CancelToken, ChainError};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn concurrent_appends_keep_linkage() {
        let ledger = Arc::new(Ledger::new(1).expect("ledger"));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger
                        .append_vote(&format!("voter-{i}"), "c", &CancelToken::new())
                        .expect("vote");
                })
            })
            .collect();
        for h in handles {
            h.join().expect("join");
        }

        let bc = ledger.snapshot();
        assert_eq!(bc.len(), 9);
        assert!(bc.is_valid_chain());
        for i in 1..bc.len() {
            assert_eq!(bc.chain[i].previous_hash, bc.chain[i - 1].hash);
        }
    }

    #[test]
    fn readers_see_whole_blocks_during_mining() {
        let ledger = Arc::new(Ledger::new(2).expect("ledger"));
        let writer = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for i in 0..4 {
                    ledger
                        .append_vote(&format!("v{i}"), "c", &CancelToken::new())
                        .expect("vote");
                }
            })
        };
        while !writer.is_finished() {
            assert!(ledger.is_valid());
        }
        writer.join().expect("join");
        assert_eq!(ledger.len(), 5);
    }

    #[test]
    fn cancel_from_another_thread() {
        let ledger = Arc::new(Ledger::new(64).expect("ledger"));
        let token = CancelToken::new();
        let worker = {
            let ledger = Arc::clone(&ledger);
            let token = token.clone();
            thread::spawn(move || ledger.append_vote("v", "c", &token))
        };
        token.cancel();
        let result = worker.join().expect("join");
        assert!(matches!(result, Err(ChainError::MiningCancelled { .. })));
        assert_eq!(ledger.len(), 1);
        assert!(ledger.is_valid());
    }

    #[test]
    fn pre_cancelled_token_appends_nothing() {
        // Difficulty 0 wins on the first hash, so only the ledger's own
        // check can stop the push.
        let ledger = Ledger::new(0).expect("ledger");
        let token = CancelToken::new();
        token.cancel();
        let result = ledger.append_vote("v", "c", &token);
        assert!(matches!(
            result,
            Err(ChainError::MiningCancelled {
                index: 1,
                attempts: 0
            })
        ));
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.has_voted("v"));
    }

    #[test]
    fn timeout_starts_after_queueing() {
        let ledger = Arc::new(Ledger::new(0).expect("ledger"));
        // Hold the writer so the append below has to wait longer than its timeout.
        let writer = ledger.writer.lock().expect("writer");
        let worker = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                ledger.append_vote_within(
                    "v",
                    "c",
                    &CancelToken::new(),
                    Some(Duration::from_millis(20)),
                )
            })
        };
        thread::sleep(Duration::from_millis(100));
        drop(writer);
        let block = worker.join().expect("join").expect("vote");
        assert_eq!(block.index, 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn zero_timeout_cancels_hard_mining() {
        let ledger = Ledger::new(64).expect("ledger");
        let result =
            ledger.append_vote_within("v", "c", &CancelToken::new(), Some(Duration::ZERO));
        assert!(matches!(result, Err(ChainError::MiningCancelled { .. })));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn returned_block_is_the_tail() {
        let ledger = Ledger::new(1).expect("ledger");
        let block = ledger
            .append_vote("addrA", "candidate1", &CancelToken::new())
            .expect("vote");
        assert_eq!(block, ledger.last_block());
        assert!(ledger.has_voted("addrA"));
        assert_eq!(ledger.tally().get("candidate1"), Some(&1));
    }
}
