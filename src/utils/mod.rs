//! Utility functions and structs.

pub mod cli;
pub mod config;
