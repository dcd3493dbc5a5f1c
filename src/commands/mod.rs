//! Command implementations for the CLI
//!
//! - serve: Start the HTTP server
//! - aggregate: Aggregate a local spreadsheet or CSV export
//! - config: Configuration display and validation

pub mod aggregate;
pub mod config;
pub mod serve;
