//! Enhancement job vocabulary
//!
//! Jobs queued against the external upscaling/restoration models. The
//! models themselves run elsewhere; this module owns the closed model set,
//! the preset-to-parameter mapping, and the job record shape stored in the
//! `enhanceJobs` collection.

use crate::core::utils::current_timestamp_millis;
use crate::store::Fields;
use serde_json::{json, Value};

/// Collection holding enhancement job records.
pub const JOBS_COLLECTION: &str = "enhanceJobs";

/// Supported enhancement models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceModel {
    /// General-purpose upscaler
    RealEsrgan,
    /// Face restoration
    Gfpgan,
    /// Face restoration with fidelity control
    Codeformer,
    /// Transformer-based super resolution
    Swinir,
}

impl EnhanceModel {
    /// All model names, for error messages.
    pub const NAMES: &'static [&'static str] = &["realesrgan", "gfpgan", "codeformer", "swinir"];

    /// Parse a model name. `None` for anything outside the supported set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "realesrgan" => Some(Self::RealEsrgan),
            "gfpgan" => Some(Self::Gfpgan),
            "codeformer" => Some(Self::Codeformer),
            "swinir" => Some(Self::Swinir),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealEsrgan => "realesrgan",
            Self::Gfpgan => "gfpgan",
            Self::Codeformer => "codeformer",
            Self::Swinir => "swinir",
        }
    }
}

/// Job size presets, mapped to per-model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancePreset {
    /// Fast, low-scale pass
    Small,
    /// Default balance
    Medium,
    /// Maximum quality pass
    Full,
}

impl EnhancePreset {
    /// Parse a preset name. `None` for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Full => "full",
        }
    }
}

/// Resolve the parameter set a preset means for a given model.
pub fn preset_params(model: EnhanceModel, preset: EnhancePreset) -> Fields {
    let params = match (model, preset) {
        (EnhanceModel::RealEsrgan, EnhancePreset::Small) => json!({"scale": 2, "tile": 0}),
        (EnhanceModel::RealEsrgan, EnhancePreset::Medium) => json!({"scale": 4, "tile": 256}),
        (EnhanceModel::RealEsrgan, EnhancePreset::Full) => {
            json!({"scale": 4, "tile": 512, "face_enhance": true})
        }
        (EnhanceModel::Gfpgan, EnhancePreset::Small) => json!({"version": "1.4", "scale": 1}),
        (EnhanceModel::Gfpgan, _) => json!({"version": "1.4", "scale": 2}),
        (EnhanceModel::Codeformer, EnhancePreset::Small) => {
            json!({"fidelity": 0.7, "upscale": 1})
        }
        (EnhanceModel::Codeformer, EnhancePreset::Medium) => {
            json!({"fidelity": 0.7, "upscale": 2})
        }
        (EnhanceModel::Codeformer, EnhancePreset::Full) => {
            json!({"fidelity": 0.5, "upscale": 2, "background_enhance": true})
        }
        (EnhanceModel::Swinir, EnhancePreset::Small) => {
            json!({"task": "real_sr", "scale": 2})
        }
        (EnhanceModel::Swinir, EnhancePreset::Medium) => {
            json!({"task": "real_sr", "scale": 4})
        }
        (EnhanceModel::Swinir, EnhancePreset::Full) => {
            json!({"task": "real_sr", "scale": 4, "large_model": true})
        }
    };
    match params {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Build the job record for the `enhanceJobs` collection: queued status,
/// resolved parameters (caller overrides win), and the source object path.
pub fn build_job(
    gallery_id: &str,
    model: EnhanceModel,
    preset: EnhancePreset,
    overrides: Option<&Fields>,
    origin_path: Option<&str>,
) -> Fields {
    let mut params = preset_params(model, preset);
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            params.insert(key.clone(), value.clone());
        }
    }

    let now = current_timestamp_millis();
    let mut job = Fields::new();
    job.insert("galleryId".into(), gallery_id.into());
    job.insert("model".into(), model.as_str().into());
    job.insert("preset".into(), preset.as_str().into());
    job.insert("params".into(), Value::Object(params));
    job.insert("status".into(), "queued".into());
    job.insert("createdAt".into(), Value::from(now));
    job.insert("updatedAt".into(), Value::from(now));
    if let Some(path) = origin_path {
        job.insert("originalImagePath".into(), path.into());
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_models_only() {
        assert_eq!(EnhanceModel::parse("gfpgan"), Some(EnhanceModel::Gfpgan));
        assert_eq!(EnhanceModel::parse("dall-e"), None);
        for name in EnhanceModel::NAMES {
            assert!(EnhanceModel::parse(name).is_some());
        }
    }

    #[test]
    fn presets_scale_parameters() {
        let small = preset_params(EnhanceModel::RealEsrgan, EnhancePreset::Small);
        let full = preset_params(EnhanceModel::RealEsrgan, EnhancePreset::Full);
        assert_eq!(small.get("scale").and_then(Value::as_u64), Some(2));
        assert_eq!(full.get("scale").and_then(Value::as_u64), Some(4));
        assert_eq!(full.get("face_enhance").and_then(Value::as_bool), Some(true));
    }

    #[test]
    fn job_record_carries_overrides() {
        let mut overrides = Fields::new();
        overrides.insert("scale".into(), Value::from(8));

        let job = build_job(
            "gal-1",
            EnhanceModel::RealEsrgan,
            EnhancePreset::Medium,
            Some(&overrides),
            Some("gallery/pool.jpg"),
        );

        assert_eq!(job.get("status").and_then(Value::as_str), Some("queued"));
        assert_eq!(
            job.get("galleryId").and_then(Value::as_str),
            Some("gal-1")
        );
        let params = job.get("params").and_then(Value::as_object).unwrap();
        assert_eq!(params.get("scale").and_then(Value::as_u64), Some(8));
        assert_eq!(
            job.get("originalImagePath").and_then(Value::as_str),
            Some("gallery/pool.jpg")
        );
    }
}
