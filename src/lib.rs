// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires these together with a real terminal.
pub mod app;
pub mod app_dirs;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod keystroke;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod texts;
pub mod time_series;
pub mod timers;
pub mod ui;
