//! rmk - a personal build runner with native dependency discovery
//!
//! Targets are async functions (or `Rmk.toml` command lists) that submit
//! commands through a [`exec::Session`]. Running a target in shadow mode
//! records those commands without executing them, which is how rmk finds
//! out what a build compiles and links without building it.
//!
//! Main modules:
//! - build: `Rmk.toml` project configuration
//! - cache: JSON-backed persistent key/value cache
//! - cli: Command-line interface parsing
//! - commands: Implementation of the subcommands
//! - discovery: Build-time and run-time package discovery
//! - exec: Execution session, command builder and command log
//! - package: Host package manager backends (dpkg/apt, rpm/dnf)
//! - result: Error handling and result types
//! - target: Target trait and registry
//! - utils: Process helpers

pub mod build;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod discovery;
pub mod exec;
pub mod package;
pub mod result;
pub mod target;
pub mod utils;
