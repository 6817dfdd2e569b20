//! storysweep catalog server
//!
//! Serves a built Storybook directory, plus the accessibility rule engine
//! script, on a local port for the headless browser to load.

pub mod server;
pub mod static_files;

pub use server::{CatalogServer, ServerConfig};
pub use static_files::{StaticFiles, ENGINE_SCRIPT_PATH};
