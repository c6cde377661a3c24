//! Source composition and merge policy.

pub mod service;
