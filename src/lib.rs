//! UNDERCUT: competitive resale pricing for marketplace listings
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry points.

pub mod config;
pub mod types;
pub mod parser;
pub mod catalog;
pub mod platforms;
pub mod engine;
