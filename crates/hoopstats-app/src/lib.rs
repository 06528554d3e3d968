// Library root for the hoopstats binary: configuration, command-line
// surface, command dispatch, and CSV export. Exposed so integration tests can
// drive the app without spawning the binary.

pub mod app;
pub mod cli;
pub mod config;
pub mod export;
