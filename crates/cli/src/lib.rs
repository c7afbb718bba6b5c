//! Command-line front end for the `flowpush` deployment pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
