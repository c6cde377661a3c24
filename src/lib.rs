//! Canopy: hierarchical content trees
//!
//! Manages flat node records (navigation entries, asset folders and files) that
//! carry a parent reference, a sibling position, and a stored depth. Assembles
//! them into forests on read, validates re-parenting against cycles, keeps depth
//! and order consistent across edits, and reconstructs breadcrumb paths.

pub mod audience;
pub mod cache;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use audience::Audience;
pub use error::{StorageError, TreeError};
pub use service::{TreeService, TreeStats};
pub use types::{NodeId, TreeFamily};
