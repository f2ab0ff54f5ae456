//! Command-line interface and resolved runtime configuration

pub mod args;

pub use args::{Args, Config};
