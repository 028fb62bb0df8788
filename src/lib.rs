pub mod cli;
pub mod config;
pub mod error;
pub mod hosts;
pub mod orchestrator;
pub mod report;
pub mod script;
pub mod transport;

pub use error::{Error, Result};
