// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod operation;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod summary;
pub mod tables;
pub mod util;
