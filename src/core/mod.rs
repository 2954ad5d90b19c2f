/*!
 * Core Module
 * Configuration, console output and error handling
 */

pub mod config;
pub mod console;
pub mod errors;

// Re-export for convenience
pub use config::HarnessConfig;
pub use console::{ConsoleLog, MemorySink};
pub use errors::*;
