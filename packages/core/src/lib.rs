// Library root: exposes modules to the binary and to integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod cache;
pub mod db;
pub mod error;
pub mod expiry;
pub mod lookup;
pub mod metrics;
pub mod repository;
pub mod scheduler;
pub mod services;

// Startup plumbing used by the binary.
pub mod cli;
pub mod config;
pub mod logging;
