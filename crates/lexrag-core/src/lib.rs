//! Configuration loading, secret resolution and pipeline construction.

pub mod bootstrap;
pub mod config;
pub mod vault;
