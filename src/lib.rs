// Command-line front end for the `asana` crate
// Exposes modules for the binary and for tests

pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
pub mod utils;
