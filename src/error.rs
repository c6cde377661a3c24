//! Error types for the content-tree manager.

use crate::types::NodeId;
use thiserror::Error;

/// Failures raised by a node store implementation
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Node {0} still has children")]
    HasChildren(NodeId),

    #[error("Concurrent update of node {0}: stored parent changed")]
    Conflict(NodeId),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(io) => StorageError::IoError(io),
            other => StorageError::Database(other.to_string()),
        }
    }
}

impl From<bincode::Error> for StorageError {
    fn from(err: bincode::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by tree operations
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} cannot be its own parent")]
    SelfParent(NodeId),

    #[error("Moving node {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("Node {parent} cannot be a parent: {reason}")]
    InvalidParentKind { parent: NodeId, reason: String },

    #[error("Node {id} has {count} child node(s); delete them first")]
    HasChildren { id: NodeId, count: usize },

    #[error("Invalid attributes: {0}")]
    InvalidAttributes(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to render output: {0}")]
    Output(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::ConfigError(err.to_string())
    }
}

impl TreeError {
    /// True for violations of the structural invariants (rejected before any write)
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TreeError::SelfParent(_)
                | TreeError::Cycle { .. }
                | TreeError::InvalidParentKind { .. }
                | TreeError::HasChildren { .. }
        )
    }
}
