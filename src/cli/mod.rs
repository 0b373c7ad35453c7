//! CLI module for ollamastream
//!
//! Handles command-line argument parsing for the demo binary.

pub mod args;

pub use args::{Args, Commands, Verbosity};
