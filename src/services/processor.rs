//! Image-processing service client
//!
//! Thin HTTP wrapper around the external enhancement/resize service. The
//! service owns the actual pixel work; this client only ships bytes back
//! and forth as base64 JSON. Deployments without a processor simply leave
//! it unconfigured and the endpoints that need it degrade.

use crate::core::error::MediaError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};

/// Operations applied by the basic enhancement recipe.
const BASIC_OPERATIONS: &[&str] = &["normalize", "sharpen", "color_boost"];

/// Result of an enhancement call.
pub struct EnhancedImage {
    /// Processed image bytes (JPEG)
    pub bytes: Vec<u8>,
    /// Names of the operations that were applied
    pub operations: Vec<String>,
}

/// Client for the external image processor.
pub struct ProcessorClient {
    http: reqwest::Client,
    base: String,
}

impl ProcessorClient {
    /// Create a client against the processor's base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Run the basic enhancement recipe: auto-contrast, light sharpening,
    /// and a small brightness/saturation boost.
    pub async fn enhance_basic(&self, image: &[u8]) -> Result<EnhancedImage, MediaError> {
        let payload = json!({
            "image": BASE64.encode(image),
            "operations": BASIC_OPERATIONS,
            "format": "jpeg",
            "quality": 88,
        });
        let bytes = self.submit("enhance", payload).await?;
        Ok(EnhancedImage {
            bytes,
            operations: BASIC_OPERATIONS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Resize to cover the given box, center-cropped.
    pub async fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, MediaError> {
        let payload = json!({
            "image": BASE64.encode(image),
            "width": width,
            "height": height,
            "fit": "cover",
            "format": "jpeg",
            "quality": 85,
        });
        self.submit("resize", payload).await
    }

    async fn submit(&self, endpoint: &str, payload: Value) -> Result<Vec<u8>, MediaError> {
        let url = format!("{}/{}", self.base, endpoint);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MediaError::Processor(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Processor(format!("HTTP {status}: {body}")));
        }

        let result: Value = response
            .json()
            .await
            .map_err(|e| MediaError::Processor(e.to_string()))?;
        let encoded = result
            .get("image")
            .and_then(Value::as_str)
            .ok_or_else(|| MediaError::Processor("response missing image field".to_string()))?;
        BASE64
            .decode(encoded)
            .map_err(|e| MediaError::Processor(format!("undecodable image payload: {e}")))
    }
}
