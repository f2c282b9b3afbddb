//! Oracle Instant Client installer library
//!
//! This library provides the install/uninstall pipeline behind the `oraclient` CLI.

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;
