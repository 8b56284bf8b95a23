use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::GENESIS_DATA;

/// A single ballot: who voted and for whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub candidate: String,
}

/// Payload carried by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockData {
    Vote(Vote),
    Genesis(String),
}

impl BlockData {
    pub fn genesis() -> Self {
        BlockData::Genesis(GENESIS_DATA.to_string())
    }

    pub fn vote(voter: impl Into<String>, candidate: impl Into<String>) -> Self {
        BlockData::Vote(Vote {
            voter: voter.into(),
            candidate: candidate.into(),
        })
    }

    pub fn as_vote(&self) -> Option<&Vote> {
        match self {
            BlockData::Vote(v) => Some(v),
            BlockData::Genesis(_) => None,
        }
    }

    /// Compact JSON with sorted object keys, used as hash input.
    /// `serde_json::Value` objects are backed by a BTreeMap, so key order
    /// never depends on struct field order.
    pub fn canonical(&self) -> String {
        let value: Value = match self {
            BlockData::Vote(v) => json!({
                "voter": v.voter,
                "candidate": v.candidate,
            }),
            BlockData::Genesis(s) => Value::String(s.clone()),
        };
        value.to_string()
    }
}
