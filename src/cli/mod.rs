//! CLI module for voxctl - command-line interface and subcommands.
//!
//! Provides the server entry point plus client subcommands that drive a
//! running server over HTTP.

pub mod client;
pub mod commands;

pub use client::ControlClient;
pub use commands::Cli;
