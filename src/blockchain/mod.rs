pub mod block;
pub mod error;
pub mod ledger;
pub mod mining;
pub mod model;
pub mod payload;

pub use block::Block;
pub use error::{ChainError, ValidationError, ValidationFailure};
pub use ledger::Ledger;
pub use mining::CancelToken;
pub use model::Blockchain;
pub use payload::{BlockData, Vote};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// A SHA-256 digest is 64 hex characters; more zeros than that can never match.
pub const MAX_DIFFICULTY: u32 = 64;

/// Payload of the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";
