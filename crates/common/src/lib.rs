//! storysweep Common Library
//!
//! Data model, error taxonomy and violation reporting shared by the
//! storysweep crates.

pub mod error;
pub mod report;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use report::{filter_violations, format_entry, is_noise, NOISE_PATTERNS};
pub use types::*;

/// storysweep version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default port for the local catalog server
pub const DEFAULT_PORT: u16 = 9876;
