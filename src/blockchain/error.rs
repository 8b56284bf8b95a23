use std::fmt;

/// Errors raised by the ledger core and its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Difficulty cannot exceed the number of hex characters in a digest.
    InvalidDifficulty(u32),
    InvalidVote(String),
    MiningCancelled { index: u64, attempts: u64 },
    NonceExhausted { index: u64 },
    InvalidConfig(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidDifficulty(d) => write!(
                f,
                "invalid difficulty {} (max {})",
                d,
                super::MAX_DIFFICULTY
            ),
            ChainError::InvalidVote(msg) => write!(f, "invalid vote: {}", msg),
            ChainError::MiningCancelled { index, attempts } => write!(
                f,
                "mining of block #{} cancelled after {} attempts",
                index, attempts
            ),
            ChainError::NonceExhausted { index } => {
                write!(f, "nonce space exhausted for block #{}", index)
            }
            ChainError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

/// Why a chain failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    EmptyChain,
    MalformedGenesis,
    IndexMismatch { expected: u64, found: u64 },
    HashMismatch,
    BrokenLink,
    InsufficientWork { difficulty: u32 },
}

/// First block that failed validation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub index: usize,
    pub reason: ValidationFailure,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.reason {
            ValidationFailure::EmptyChain => write!(f, "chain has no genesis block"),
            ValidationFailure::MalformedGenesis => write!(f, "genesis block has been altered"),
            ValidationFailure::IndexMismatch { expected, found } => write!(
                f,
                "block #{}: index {} does not match position {}",
                self.index, found, expected
            ),
            ValidationFailure::HashMismatch => {
                write!(f, "block #{}: stored hash does not match content", self.index)
            }
            ValidationFailure::BrokenLink => write!(
                f,
                "block #{}: previous hash does not match block #{}",
                self.index,
                self.index.saturating_sub(1)
            ),
            ValidationFailure::InsufficientWork { difficulty } => write!(
                f,
                "block #{}: hash does not meet difficulty {}",
                self.index, difficulty
            ),
        }
    }
}

impl std::error::Error for ValidationError {}
