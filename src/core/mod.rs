//! Core types shared across the pipeline: configuration and errors.

pub mod config;
pub mod errors;
