//! Media library
//!
//! Local object storage for gallery uploads plus the small pile of
//! media-shape helpers the handlers share: MIME allow-lists, media-type
//! derivation, filename sanitization, and the branded SVG poster used when
//! a video has no thumbnail of its own.

use crate::core::config::MediaConfig;
use crate::core::error::MediaError;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Image MIME types accepted by the upload endpoint
pub const SUPPORTED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Video MIME types accepted by the upload endpoint
pub const SUPPORTED_VIDEO_TYPES: &[&str] =
    &["video/mp4", "video/mov", "video/avi", "video/webm"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "webm", "mkv"];

/// Whether the upload endpoint accepts this MIME type at all.
pub fn is_supported_mime(mime: &str) -> bool {
    SUPPORTED_IMAGE_TYPES.contains(&mime) || SUPPORTED_VIDEO_TYPES.contains(&mime)
}

/// Coarse media classification used across gallery responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image
    Image,
    /// Video clip
    Video,
}

impl MediaType {
    /// Lowercase name as stored in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive a media type the way gallery consumers expect: an explicit
/// `mediaType` field wins, then the MIME type, then the file extension.
pub fn derive_media_type(
    media_type: Option<&str>,
    mime: Option<&str>,
    object_path: Option<&str>,
) -> MediaType {
    if let Some(explicit) = media_type {
        if explicit.eq_ignore_ascii_case("video") {
            return MediaType::Video;
        }
        if explicit.eq_ignore_ascii_case("image") {
            return MediaType::Image;
        }
    }
    if mime.is_some_and(|m| m.starts_with("video/")) {
        return MediaType::Video;
    }
    if object_path.is_some_and(has_video_extension) {
        return MediaType::Video;
    }
    MediaType::Image
}

/// Whether the path ends in a known video extension.
pub fn has_video_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|v| ext.eq_ignore_ascii_case(v))
        })
}

/// Replace anything outside `[a-zA-Z0-9.-]` with underscores so uploaded
/// names are safe as object names.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// On-disk object storage rooted at the configured upload directory.
pub struct MediaLibrary {
    root: PathBuf,
    public_base: String,
}

impl MediaLibrary {
    /// Create the library, ensuring the upload root exists.
    pub fn new(config: &MediaConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.upload_dir)?;
        Ok(Self {
            root: config.upload_dir.clone(),
            public_base: config.public_base.trim_end_matches('/').to_string(),
        })
    }

    /// Root directory, for the static file service.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL under which a stored object is served.
    pub fn public_url(&self, object_path: &str) -> String {
        format!("{}/{}", self.public_base, object_path.trim_start_matches('/'))
    }

    /// Write an object, creating parent directories as needed.
    pub fn store_object(&self, object_path: &str, bytes: &[u8]) -> Result<(), MediaError> {
        let target = self.resolve(object_path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        debug!(object_path, size = bytes.len(), "object stored");
        Ok(())
    }

    /// Read an object's bytes.
    pub fn read_object(&self, object_path: &str) -> Result<Vec<u8>, MediaError> {
        let target = self.resolve(object_path)?;
        match fs::read(&target) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::NotFound(object_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an object. Deleting something that is already gone is fine.
    pub fn remove_object(&self, object_path: &str) -> Result<(), MediaError> {
        let target = self.resolve(object_path)?;
        match fs::remove_file(&target) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map an object path onto the upload root. Absolute paths and parent
    /// traversal are rejected so documents cannot name files outside it.
    fn resolve(&self, object_path: &str) -> Result<PathBuf, MediaError> {
        let trimmed = object_path.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(MediaError::InvalidPath(object_path.to_string()));
        }
        let relative = Path::new(trimmed);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(MediaError::InvalidPath(object_path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Gradient poster served as the thumbnail for videos, with a play button
/// and the property name baked in.
pub fn video_poster_svg(width: u32, height: u32, property_name: &str) -> String {
    let min_side = width.min(height) as f64;
    let (w, h) = (width as f64, height as f64);
    format!(
        r##"<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 {width} {height}'>
  <defs>
    <linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:#1e3a8a;stop-opacity:1" />
      <stop offset="50%" style="stop-color:#3730a3;stop-opacity:1" />
      <stop offset="100%" style="stop-color:#0f172a;stop-opacity:1" />
    </linearGradient>
  </defs>
  <rect width='{width}' height='{height}' fill='url(#bg)'/>
  <circle cx='{cx}' cy='{cy}' r='{r}' fill='#ffffff' opacity='0.95'/>
  <polygon points='{px1},{py1} {px1},{py2} {px2},{cy}' fill='#1e3a8a'/>
  <text x='{cx}' y='{ty1}' text-anchor='middle' fill='#e2e8f0' font-size='{fs1}' font-family='Arial, sans-serif' font-weight='600'>{property_name}</text>
  <text x='{cx}' y='{ty2}' text-anchor='middle' fill='#94a3b8' font-size='{fs2}' font-family='Arial, sans-serif'>Luxury Experience</text>
</svg>"##,
        cx = w / 2.0,
        cy = h / 2.0,
        r = min_side * 0.12,
        px1 = w / 2.0 - min_side * 0.04,
        py1 = h / 2.0 - min_side * 0.06,
        py2 = h / 2.0 + min_side * 0.06,
        px2 = w / 2.0 + min_side * 0.06,
        ty1 = h * 0.8,
        ty2 = h * 0.88,
        fs1 = min_side * 0.05,
        fs2 = min_side * 0.03,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn library(dir: &TempDir) -> MediaLibrary {
        let config = MediaConfig {
            upload_dir: dir.path().join("objects"),
            ..Default::default()
        };
        MediaLibrary::new(&config).unwrap()
    }

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(sanitize_filename("pool deck (1).jpg"), "pool_deck__1_.jpg");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("drone-villa.mp4"), "drone-villa.mp4");
    }

    #[test]
    fn derives_media_type_with_precedence() {
        assert_eq!(
            derive_media_type(Some("video"), Some("image/jpeg"), None),
            MediaType::Video
        );
        assert_eq!(
            derive_media_type(None, Some("video/mp4"), None),
            MediaType::Video
        );
        assert_eq!(
            derive_media_type(None, None, Some("gallery/tour.MOV")),
            MediaType::Video
        );
        assert_eq!(
            derive_media_type(None, Some("image/png"), Some("gallery/pool.png")),
            MediaType::Image
        );
    }

    #[test]
    fn store_read_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);

        lib.store_object("gallery/pool.jpg", b"jpeg bytes").unwrap();
        assert_eq!(lib.read_object("gallery/pool.jpg").unwrap(), b"jpeg bytes");

        lib.remove_object("gallery/pool.jpg").unwrap();
        assert!(matches!(
            lib.read_object("gallery/pool.jpg"),
            Err(MediaError::NotFound(_))
        ));

        // Removing again stays quiet
        lib.remove_object("gallery/pool.jpg").unwrap();
    }

    #[test]
    fn rejects_traversal_paths() {
        let dir = TempDir::new().unwrap();
        let lib = library(&dir);

        for path in ["../outside.txt", "gallery/../../outside.txt", ""] {
            assert!(matches!(
                lib.store_object(path, b"x"),
                Err(MediaError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn poster_carries_property_name() {
        let svg = video_poster_svg(400, 300, "Ko Lake Villa");
        assert!(svg.contains("Ko Lake Villa"));
        assert!(svg.starts_with("<svg"));
    }
}
