//! # API Module
//!
//! This module provides the HTTP API interface for the villa server:
//! admin console routes, the public endpoints behind the marketing site,
//! and static serving of stored objects.
//!
//! ## Endpoints Overview
//!
//! ### Gallery
//! - `GET /api/admin/gallery` - List gallery media with category filter and pagination
//! - `POST /api/admin/gallery` - Create a gallery record
//! - `PUT /api/admin/gallery` - Merge-update a record by id
//! - `DELETE /api/admin/gallery` - Delete one record, or all with `action=clear-all`
//! - `POST /api/admin/gallery/upload` - Multipart media upload
//! - `GET /api/admin/gallery/cached` - Public feed of active media (cached)
//! - `GET /api/admin/gallery/hero` - Hero carousel feed
//!
//! ### SEO / Analysis
//! - `POST /api/admin/gallery/analyze` - Analyze one image or video, update its document
//! - `POST /api/admin/gallery/batch-analyze` - Analyze a batch of images
//! - `POST /api/admin/gallery/seo` - Strict SEO generation for one media item
//! - `POST /api/admin/generate-seo` - Page-level SEO content
//!
//! ### Enhancement
//! - `POST /api/admin/gallery/enhance` - Queue an enhancement job
//! - `GET /api/admin/gallery/enhance` - Job status and listings
//! - `POST /api/admin/gallery/enhance-basic` - Synchronous basic enhancement
//! - `GET /api/admin/gallery/thumbnail` - Thumbnails and video posters
//!
//! ### Media Associations
//! - `POST /api/admin/media/associate` - Link a stored object to the gallery
//! - `GET /api/admin/media/associate` - Find associations by object path
//! - `DELETE /api/admin/media/remove` - Unlink and remove a stored object
//!
//! ### Content & Public
//! - `GET|POST|PUT|DELETE /api/admin/villa-life` - Events, news and offers
//! - `POST /api/enquiries` - Public booking enquiries (rate limited)
//! - `GET /api/health`, `GET /api/info`, `GET /metrics` - System essentials
//! - `GET /objects/*` - Stored objects served from disk

pub mod handlers;
pub mod server;

// Re-export commonly used items
pub use server::{create_app, start_server};
