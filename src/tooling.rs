//! Tooling
//!
//! Administrative command-line front end over the tree service.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
