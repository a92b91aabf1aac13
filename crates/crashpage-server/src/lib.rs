//! Crashpage HTTP Server
//!
//! Networked execution context for crashpage: axum layers that catch
//! handler panics and [`AppError`] returns and answer with the error page
//! chosen by the core dispatcher, plus a small demo server.

pub mod config;
pub mod layer;
pub mod server;

// Re-export main types
pub use config::ServerConfig;
pub use layer::{error_page, error_pages, report_uncaught, request_info, AppError, PanicToReport, Uncaught};
pub use server::{app, run_server};
