//! Property-based tests for the file view search and boundary scans.
//!
//! Run with: `cargo test --test property`

mod search;
