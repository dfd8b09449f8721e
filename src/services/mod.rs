//! External-service clients
//!
//! The collaborators the route handlers wrap: the AI vision/text API, the
//! on-disk media library behind uploads, the optional image-processing
//! service, and the enhancement job vocabulary shared between them.

pub mod ai;
pub mod enhance;
pub mod media;
pub mod processor;

pub use ai::AiClient;
pub use media::{MediaLibrary, MediaType};
pub use processor::ProcessorClient;
