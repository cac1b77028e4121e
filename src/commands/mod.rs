//! Command implementations for the binary

pub mod fetch;
