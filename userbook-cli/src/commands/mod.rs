//! Command implementations for the userbook CLI

pub mod serve;

pub use serve::run_serve;
