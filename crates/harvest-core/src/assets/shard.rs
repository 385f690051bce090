//! Shard directory naming.

use serde::{Deserialize, Serialize};

/// Which end of the id the shard digits come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardFrom {
    #[default]
    Leading,
    Trailing,
}

/// A shard is named by `digits` characters of the id, bounding fan-out to 10^digits directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    pub digits: usize,
    pub from: ShardFrom,
}

impl Default for ShardLayout {
    fn default() -> Self {
        Self::new(3, ShardFrom::Leading)
    }
}

impl ShardLayout {
    pub fn new(digits: usize, from: ShardFrom) -> Self {
        Self {
            digits: digits.max(1),
            from,
        }
    }

    /// Shard directory name for `id`. Ids shorter than `digits` are their own shard.
    pub fn shard(&self, id: &str) -> String {
        let chars: Vec<char> = id.chars().collect();
        if chars.len() <= self.digits {
            return id.to_string();
        }
        match self.from {
            ShardFrom::Leading => chars[..self.digits].iter().collect(),
            ShardFrom::Trailing => chars[chars.len() - self.digits..].iter().collect(),
        }
    }
}
