//! Append-only vote ledger: proof-of-work blocks linked by SHA-256 hashes,
//! plus the HTTP layer that submits votes and presents results.

pub mod api;
pub mod blockchain;
pub mod config;
