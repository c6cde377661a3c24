//! Core types shared by the content-tree manager.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// NodeId: opaque identifier assigned by the node store at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Big-endian key bytes, so byte order in the store matches numeric order
    pub fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_key(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 8] = bytes.try_into().ok()?;
        Some(NodeId(u64::from_be_bytes(raw)))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(NodeId)
    }
}

/// Position among siblings sharing a parent. Advisory, not unique.
pub type SortOrder = i32;

/// Distance from the root (roots are depth 0)
pub type Depth = u32;

/// Which record family a tree holds
///
/// Each family lives in its own store namespace and has its own cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeFamily {
    /// Navigation menu entries
    Navigation,
    /// Asset folders and files
    Assets,
}

impl TreeFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeFamily::Navigation => "navigation",
            TreeFamily::Assets => "assets",
        }
    }
}

impl fmt::Display for TreeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreeFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigation" | "nav" => Ok(TreeFamily::Navigation),
            "assets" | "asset" => Ok(TreeFamily::Assets),
            other => Err(format!(
                "Invalid tree family: {} (must be 'navigation' or 'assets')",
                other
            )),
        }
    }
}
