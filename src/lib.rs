//! Webwright: an interactive shell that runs commands directly or translates
//! plain English into them.

pub mod api_keys;
pub mod boot;
pub mod config;
pub mod error_handling;
pub mod executor;
pub mod history;
pub mod input_buffer;
pub mod interrupt;
pub mod logging;
pub mod os_context;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod quoting;
pub mod render;
pub mod shell;
pub mod state;
pub mod translator;
pub mod triage;
