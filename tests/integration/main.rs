//! Integration tests for the carve-rs extraction engine.
//!
//! Run with: `cargo test --test integration`

mod atomicity;
mod extract;
mod labels;
