//! Weight Diff Analyzer library
//!
//! Flags regressions in generated benchmark weight formulas from a git diff.
//! This exposes the internal modules for the CLI and for testing.

pub mod analysis;
pub mod commands;
pub mod evaluate;
pub mod output;
pub mod parser;
pub mod utils;
