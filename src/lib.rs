// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod bank;
pub mod exam;
pub mod history;
pub mod runtime;
pub mod save_code;
pub mod scoring;
pub mod session;
pub mod util;
