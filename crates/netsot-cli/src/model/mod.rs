//! Data models and configuration for the command line

pub mod config;

pub use config::Configuration;
