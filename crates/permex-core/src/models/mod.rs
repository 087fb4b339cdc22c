//! Data models for extracted permits and pipeline configuration.

pub mod config;
pub mod permit;
