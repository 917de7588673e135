pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod output;
pub mod prompt;
pub mod stats;
