//! Library facade for the `dilithium-signer` binary.
//!
//! Exposing the config loader, git collaborator and command handlers lets
//! integration tests drive the CLI without spawning the binary.

pub mod commands;
pub mod config;
pub mod git;
pub mod hook;
pub mod prompt;
