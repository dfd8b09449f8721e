//! Application State Management
//!
//! This module defines the central AppState that holds the store and the
//! external-service clients. It is constructed once at startup and handed
//! to the router, so handlers (and tests) never reach for globals.

use crate::core::config::Config;
use crate::core::error::Result;
use crate::services::{AiClient, MediaLibrary, ProcessorClient};
use crate::store::FileStore;
use std::sync::Arc;
use std::time::Instant;

/// Central application state shared by all request handlers
pub struct AppState {
    /// Application configuration
    pub config: Config,

    /// Document store backing every collection
    pub store: Arc<FileStore>,

    /// AI vision/text collaborator
    pub ai: AiClient,

    /// On-disk media library for uploaded objects
    pub media: MediaLibrary,

    /// External image processor, when one is deployed
    pub processor: Option<ProcessorClient>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Build the full state from configuration: open the store, set up the
    /// media library, and construct the collaborator clients.
    pub fn from_config(config: Config) -> Result<Arc<Self>> {
        std::fs::create_dir_all(&config.store.data_dir)?;

        let store = Arc::new(FileStore::open(
            config.store_path(),
            config.store.seed_sample,
        ));
        let media = MediaLibrary::new(&config.media)?;
        let ai = AiClient::new(config.ai.clone());
        let processor = config
            .media
            .processor_url
            .as_deref()
            .map(ProcessorClient::new);

        Ok(Arc::new(Self {
            config,
            store,
            ai,
            media,
            processor,
            started_at: Instant::now(),
        }))
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
