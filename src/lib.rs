//! Villa Server - Backend and Admin Console API
//!
//! The service behind a lakeside villa's marketing site: a file-backed
//! document store plus the HTTP routes that manage gallery media, SEO
//! generation, enhancement jobs, content items, and booking enquiries.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod api;
pub mod services;
pub mod store;
pub mod system;

// Re-export commonly used items for convenience
pub use crate::core::{AppState, Config, Error, Result};
pub use crate::store::{Document, FileStore};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing and the metrics registry
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Initializing {} v{}", NAME, VERSION);

    system::metrics::init_registry();

    Ok(())
}
