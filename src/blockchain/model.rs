use std::collections::BTreeMap;

use super::error::{ChainError, ValidationError, ValidationFailure};
use super::mining::{CancelToken, meets_difficulty};
use super::{Block, BlockData, MAX_DIFFICULTY};

/// Simple in-memory vote ledger with Proof-of-Work.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub chain: Vec<Block>,
    difficulty: u32,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Result<Self, ChainError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }
        Ok(Self {
            chain: vec![Block::genesis()],
            difficulty,
        })
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Mine and append a block carrying one vote. Blocks until mining is done.
    pub fn append_vote(&mut self, voter: &str, candidate: &str) -> Result<&Block, ChainError> {
        self.append_vote_with(voter, candidate, &CancelToken::new())
    }

    /// Like `append_vote`, but mining can be stopped through `cancel`.
    /// Nothing is appended when mining fails.
    pub fn append_vote_with(
        &mut self,
        voter: &str,
        candidate: &str,
        cancel: &CancelToken,
    ) -> Result<&Block, ChainError> {
        let mut block = self.next_block(voter, candidate)?;
        if cancel.is_cancelled() {
            return Err(ChainError::MiningCancelled {
                index: block.index,
                attempts: 0,
            });
        }
        block.mine_with(self.difficulty, cancel)?;
        self.chain.push(block);
        Ok(self.last_block())
    }

    /// Build the unmined successor of the current tail.
    pub(crate) fn next_block(&self, voter: &str, candidate: &str) -> Result<Block, ChainError> {
        let data = vote_data(voter, candidate)?;
        let index = self.chain.len() as u64;
        let prev_hash = self.last_block().hash.clone();
        Ok(Block::new(index, prev_hash, data))
    }

    /// Validate the entire chain: genesis, linkage, hashes and PoW.
    /// Reports the first block that fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(genesis) = self.chain.first() else {
            return Err(ValidationError {
                index: 0,
                reason: ValidationFailure::EmptyChain,
            });
        };
        if genesis.index != 0
            || genesis.previous_hash != "0"
            || genesis.hash != genesis.compute_hash()
        {
            return Err(ValidationError {
                index: 0,
                reason: ValidationFailure::MalformedGenesis,
            });
        }

        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            let position = i + 1;
            let fail = |reason: ValidationFailure| {
                Err(ValidationError {
                    index: position,
                    reason,
                })
            };

            if current.index != position as u64 {
                return fail(ValidationFailure::IndexMismatch {
                    expected: position as u64,
                    found: current.index,
                });
            }
            if current.hash != current.compute_hash() {
                return fail(ValidationFailure::HashMismatch);
            }
            if current.previous_hash != prev.hash {
                return fail(ValidationFailure::BrokenLink);
            }
            if !meets_difficulty(&current.hash, self.difficulty) {
                return fail(ValidationFailure::InsufficientWork {
                    difficulty: self.difficulty,
                });
            }
        }

        Ok(())
    }

    pub fn is_valid_chain(&self) -> bool {
        self.validate().is_ok()
    }

    /// Whether `voter` already has a vote recorded on the chain.
    pub fn has_voted(&self, voter: &str) -> bool {
        let voter = voter.trim();
        self.votes().any(|v| v.voter == voter)
    }

    /// Number of votes per candidate.
    pub fn tally(&self) -> BTreeMap<String, u64> {
        let mut results = BTreeMap::new();
        for vote in self.votes() {
            *results.entry(vote.candidate.clone()).or_insert(0) += 1;
        }
        results
    }

    fn votes(&self) -> impl Iterator<Item = &super::Vote> {
        self.chain.iter().filter_map(|b| b.data.as_vote())
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }
}

fn vote_data(voter: &str, candidate: &str) -> Result<BlockData, ChainError> {
    let (voter, candidate) = (voter.trim(), candidate.trim());
    if voter.is_empty() {
        return Err(ChainError::InvalidVote("voter address required".into()));
    }
    if candidate.is_empty() {
        return Err(ChainError::InvalidVote("candidate id required".into()));
    }
    Ok(BlockData::vote(voter, candidate))
}

#[cfg(test)]
mod tests {
    use super::Blockchain;
    use crate::blockchain::{BlockData, CancelToken, ChainError, ValidationFailure};

    fn two_votes(difficulty: u32) -> Blockchain {
        let mut bc = Blockchain::new(difficulty).expect("chain");
        bc.append_vote("addrA", "candidate1").expect("vote");
        bc.append_vote("addrB", "candidate2").expect("vote");
        bc
    }

    #[test]
    fn fresh_chain_has_only_genesis() {
        let bc = Blockchain::new(3).expect("chain");
        assert_eq!(bc.len(), 1);
        let g = bc.last_block();
        assert_eq!(g.index, 0);
        assert_eq!(g.previous_hash, "0");
        assert_eq!(g.data, BlockData::genesis());
        assert_eq!(g.hash, g.compute_hash());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn rejects_difficulty_beyond_digest_length() {
        assert!(Blockchain::new(64).is_ok());
        assert_eq!(
            Blockchain::new(65).unwrap_err(),
            ChainError::InvalidDifficulty(65)
        );
    }

    #[test]
    fn end_to_end_voting() {
        let mut bc = Blockchain::new(2).expect("chain");
        bc.append_vote("addrA", "candidate1").expect("vote");
        assert_eq!(bc.len(), 2);
        assert_eq!(bc.chain[1].index, 1);
        assert!(bc.chain[1].hash.starts_with("00"));
        assert_eq!(bc.chain[1].previous_hash, bc.chain[0].hash);
        assert!(bc.is_valid_chain());

        bc.append_vote("addrB", "candidate2").expect("vote");
        assert_eq!(bc.len(), 3);
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn linkage_holds_after_many_appends() {
        let mut bc = Blockchain::new(1).expect("chain");
        for i in 0..6 {
            bc.append_vote(&format!("voter-{i}"), "c").expect("vote");
        }
        for i in 1..bc.len() {
            assert_eq!(bc.chain[i].previous_hash, bc.chain[i - 1].hash);
            assert_eq!(bc.chain[i].index, i as u64);
        }
    }

    #[test]
    fn append_trims_identifiers() {
        let mut bc = Blockchain::new(0).expect("chain");
        let block = bc.append_vote("  addrA ", "\tcandidate1\n").expect("vote");
        assert_eq!(block.data, BlockData::vote("addrA", "candidate1"));
    }

    #[test]
    fn rejects_empty_identifiers() {
        let mut bc = Blockchain::new(0).expect("chain");
        assert!(matches!(
            bc.append_vote("", "c"),
            Err(ChainError::InvalidVote(_))
        ));
        assert!(matches!(
            bc.append_vote("v", "   "),
            Err(ChainError::InvalidVote(_))
        ));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn cancelled_append_leaves_chain_untouched() {
        let mut bc = Blockchain::new(64).expect("chain");
        let token = CancelToken::new();
        token.cancel();
        let err = bc.append_vote_with("v", "c", &token).unwrap_err();
        assert!(matches!(err, ChainError::MiningCancelled { index: 1, .. }));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn cancelled_append_at_zero_difficulty() {
        let mut bc = Blockchain::new(0).expect("chain");
        let token = CancelToken::new();
        token.cancel();
        let err = bc.append_vote_with("v", "c", &token).unwrap_err();
        assert_eq!(
            err,
            ChainError::MiningCancelled {
                index: 1,
                attempts: 0
            }
        );
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn detects_tampered_data() {
        let mut bc = two_votes(2);
        bc.chain[1].data = BlockData::vote("addrA", "candidate2");
        let err = bc.validate().unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.reason, ValidationFailure::HashMismatch);
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn detects_broken_linkage() {
        let mut bc = two_votes(2);
        bc.chain[1].previous_hash = "deadbeef".into();
        assert!(!bc.is_valid_chain());
    }

    #[test]
    fn detects_rehashed_block_without_work() {
        let mut bc = two_votes(3);
        let last = bc.chain.len() - 1;
        // Consistent hash, but no proof-of-work behind it.
        let block = &mut bc.chain[last];
        block.data = BlockData::vote("addrB", "candidate1");
        block.nonce = 0;
        while block.compute_hash().starts_with("000") {
            block.nonce += 1;
        }
        block.hash = block.compute_hash();
        let err = bc.validate().unwrap_err();
        assert_eq!(err.reason, ValidationFailure::InsufficientWork { difficulty: 3 });
    }

    #[test]
    fn detects_altered_genesis() {
        let mut bc = two_votes(1);
        bc.chain[0].data = BlockData::Genesis("forged".into());
        assert_eq!(
            bc.validate().unwrap_err().reason,
            ValidationFailure::MalformedGenesis
        );
    }

    #[test]
    fn detects_reordered_index() {
        let mut bc = two_votes(0);
        bc.chain[2].index = 7;
        bc.chain[2].hash = bc.chain[2].compute_hash();
        assert_eq!(
            bc.validate().unwrap_err().reason,
            ValidationFailure::IndexMismatch {
                expected: 2,
                found: 7
            }
        );
    }

    #[test]
    fn tally_and_has_voted() {
        let mut bc = Blockchain::new(0).expect("chain");
        bc.append_vote("a", "x").expect("vote");
        bc.append_vote("b", "y").expect("vote");
        bc.append_vote("c", "x").expect("vote");
        let tally = bc.tally();
        assert_eq!(tally.get("x"), Some(&2));
        assert_eq!(tally.get("y"), Some(&1));
        assert!(bc.has_voted("b"));
        assert!(!bc.has_voted("d"));
    }
}
