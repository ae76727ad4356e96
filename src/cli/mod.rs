//! Command line interface for the `mgt` binary

pub mod commands;
pub mod error;
