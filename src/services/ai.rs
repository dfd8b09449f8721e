//! AI collaborator client
//!
//! OpenAI-compatible chat-completions client used for gallery SEO and
//! image analysis. The wire contract is the vendor's; what lives here is
//! everything around it: prompt assembly, tolerant JSON extraction, schema
//! validation, boilerplate rejection, and the primary/fallback model chain.

use crate::core::config::AiConfig;
use crate::core::error::AiError;
use crate::services::media::MediaType;
use crate::system::metrics;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Copy containing any of these reads as recycled boilerplate and gets
/// regenerated.
const BANNED_PHRASES: &[&str] = &[
    "luxury lakeside property in sri lanka",
    "accommodation - luxury",
];

/// A description that names fewer than two of these is too vague to ship.
const CONCRETE_NOUNS: &[&str] = &[
    "pool", "balcony", "bedroom", "bathroom", "lake", "garden", "palm", "sunset", "deck",
    "dining", "terrace", "fan", "tile", "pier", "dock", "kayak",
];

fn default_confidence() -> f64 {
    92.0
}

/// SEO fields generated for one piece of gallery media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoFields {
    /// Page/media title
    #[serde(default)]
    pub title: String,

    /// Accessible alt text
    #[serde(rename = "altText", default)]
    pub alt_text: String,

    /// Meta description
    #[serde(rename = "seoDescription", alias = "description", default)]
    pub seo_description: String,

    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Model's self-reported confidence, 0-100
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl SeoFields {
    /// Enforce the strict output contract used by the gallery SEO endpoint.
    pub fn validate_strict(&self) -> Result<(), AiError> {
        let checks: &[(bool, &str)] = &[
            (
                (12..=80).contains(&self.title.chars().count()),
                "title must be 12-80 characters",
            ),
            (
                (40..=160).contains(&self.seo_description.chars().count()),
                "description must be 40-160 characters",
            ),
            (
                (5..=18).contains(&self.keywords.len()),
                "keywords must contain 5-18 entries",
            ),
            (
                self.keywords
                    .iter()
                    .all(|k| (2..=32).contains(&k.chars().count())),
                "keywords must each be 2-32 characters",
            ),
            (
                (10..=140).contains(&self.alt_text.chars().count()),
                "altText must be 10-140 characters",
            ),
            (
                (0.0..=100.0).contains(&self.confidence),
                "confidence must be 0-100",
            ),
        ];

        for (ok, msg) in checks {
            if !ok {
                return Err(AiError::Schema((*msg).to_string()));
            }
        }
        Ok(())
    }

    /// Does any field contain a banned stock phrase?
    pub fn is_boilerplate(&self) -> bool {
        let hay = format!("{} {} {}", self.title, self.seo_description, self.alt_text)
            .to_lowercase();
        BANNED_PHRASES.iter().any(|p| hay.contains(p))
    }

    /// Does the copy mention enough concrete visible elements?
    pub fn is_vague(&self) -> bool {
        let text = format!("{} {}", self.seo_description, self.alt_text).to_lowercase();
        let hits = CONCRETE_NOUNS.iter().filter(|n| text.contains(*n)).count();
        hits < 2
    }

    /// Fill any empty fields with serviceable stock content. Used by the
    /// lenient analysis paths, where a partial answer beats an error.
    fn or_stock(mut self, property: &str, category: &str, media: MediaType) -> Self {
        let noun = media.as_str();
        if self.title.is_empty() {
            self.title = format!("{property} {category}");
        }
        if self.alt_text.is_empty() {
            self.alt_text = format!("{property} {category} {noun}");
        }
        if self.seo_description.is_empty() {
            self.seo_description =
                format!("Experience {property} - premium {category} with lakeside views and tropical gardens.");
        }
        if self.keywords.is_empty() {
            self.keywords = vec![
                property.to_lowercase(),
                "luxury accommodation".to_string(),
                "sri lanka".to_string(),
                category.to_lowercase(),
            ];
        }
        self.confidence = self.confidence.clamp(0.0, 100.0);
        self
    }
}

/// SEO content for a whole page or listing, as produced by the SEO
/// generator endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeoContent {
    /// SEO title
    #[serde(default)]
    pub title: String,
    /// Meta description
    #[serde(default)]
    pub description: String,
    /// Accessible alt text
    #[serde(rename = "altText", default)]
    pub alt_text: String,
    /// Search keywords
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Primary SEO target phrase
    #[serde(rename = "focusKeyword", default)]
    pub focus_keyword: String,
}

/// Inputs for the strict gallery SEO endpoint.
pub struct SeoRequest {
    /// Image or video
    pub media_type: MediaType,
    /// Gallery category, defaults to "villa" in prompts
    pub category: Option<String>,
    /// Human-entered title, if any
    pub human_title: Option<String>,
    /// Image URL or data URL fed to the vision model (a poster frame for
    /// videos; raw video is never sent)
    pub image_url: Option<String>,
}

/// Pull a JSON object out of a completion that may be fenced or wrapped in
/// prose.
pub fn extract_json(raw: &str) -> Result<Value, AiError> {
    if raw.is_empty() {
        return Err(AiError::EmptyCompletion);
    }
    let mut text = raw.trim();

    if let Some(stripped) = text.strip_prefix("```") {
        let stripped = stripped.strip_prefix("json").unwrap_or(stripped);
        text = match stripped.rfind("```") {
            Some(end) => stripped[..end].trim(),
            None => stripped.trim(),
        };
    }

    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    let start = text.find('{');
    let end = text.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(AiError::MalformedResponse(truncate(raw, 120)))
}

/// Normalize incoming image payloads to a `data:image/...;base64,` URL and
/// reject data too small to be a real image.
pub fn normalize_image_data_url(raw: &str) -> Result<String, AiError> {
    let url = if raw.starts_with("data:image/") {
        raw.to_string()
    } else {
        let content = match raw.split_once("base64,") {
            Some((_, rest)) => rest,
            None => raw.strip_prefix("data:").unwrap_or(raw),
        };
        format!("data:image/jpeg;base64,{content}")
    };

    let Some((_, encoded)) = url.split_once("base64,") else {
        return Err(AiError::InvalidImage(
            "image must be base64 encoded".to_string(),
        ));
    };
    if encoded.len() < 500 {
        return Err(AiError::InvalidImage(
            "image data too small or invalid".to_string(),
        ));
    }
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| AiError::InvalidImage(e.to_string()))?;
    if bytes.len() < 100 {
        return Err(AiError::InvalidImage("decoded image too small".to_string()));
    }

    Ok(url)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}

/// Client for the OpenAI-compatible completions API.
pub struct AiClient {
    http: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    /// Create a client from the AI configuration.
    pub fn new(config: AiConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Whether an API key is present. Endpoints check this up front so the
    /// admin console gets a clear "not configured" instead of auth noise.
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    /// Property name used in prompts and stock copy.
    pub fn property_name(&self) -> &str {
        &self.config.property_name
    }

    /// Strict SEO generation with the retry/fallback chain: primary model
    /// first, then the fallback model, with a reminder appended on the
    /// final attempt. Boilerplate and vague outputs count as failures.
    pub async fn generate_seo(&self, request: &SeoRequest) -> Result<(SeoFields, String), AiError> {
        let mut last_err: Option<AiError> = None;

        for attempt in 0..=self.config.max_retries {
            let model = if attempt == 0 {
                self.config.text_model.clone()
            } else {
                self.config.fallback_model.clone()
            };
            let messages = self.seo_messages(request, attempt == self.config.max_retries);

            let outcome = self
                .chat_json(&model, 0.4, messages)
                .await
                .and_then(|raw| extract_json(&raw))
                .and_then(|value| {
                    serde_json::from_value::<SeoFields>(value)
                        .map_err(|e| AiError::Schema(e.to_string()))
                })
                .and_then(|out| out.validate_strict().map(|_| out));

            match outcome {
                Ok(out) if !out.is_boilerplate() && !out.is_vague() => {
                    return Ok((out, model));
                }
                Ok(_) => {
                    debug!(model, attempt, "seo output rejected as boilerplate or vague");
                    last_err = Some(AiError::Rejected(
                        "output was boilerplate or too vague".to_string(),
                    ));
                }
                Err(e) => {
                    warn!(model, attempt, error = %e, "seo generation attempt failed");
                    metrics::ai().failures.with_label_values(&[model.as_str()]).inc();
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(AiError::EmptyCompletion))
    }

    /// Vision analysis of one image, returning lenient, stock-filled fields.
    pub async fn analyze_image(
        &self,
        image_url: &str,
        category: &str,
    ) -> Result<SeoFields, AiError> {
        let property = &self.config.property_name;
        let context = &self.config.property_context;

        let prompt = format!(
            "Analyze this {property} {category} image. Generate:\n\
             1. A compelling title (max 60 chars)\n\
             2. Accessible alt text describing the image\n\
             3. SEO description (max 160 chars)\n\
             4. Relevant keywords array (5-8 keywords)\n\
             5. Confidence score (0-100)\n\n\
             Focus on luxury accommodation, lakeside location, Sri Lankan setting, and guest experience.\n\n\
             Respond with JSON only: {{\"title\": \"...\", \"altText\": \"...\", \"seoDescription\": \"...\", \"keywords\": [\"...\"], \"confidence\": 85}}"
        );

        let messages = json!([
            {
                "role": "system",
                "content": format!(
                    "You are an expert at analyzing luxury villa and accommodation images for {property}, {context}. \
                     Generate SEO-optimized descriptions, alt text, and keywords. Always respond with valid JSON."
                ),
            },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_url } },
                ],
            },
        ]);

        let raw = self.chat_json(&self.config.text_model, 0.7, messages).await?;
        let fields: SeoFields = serde_json::from_value(extract_json(&raw)?)
            .map_err(|e| AiError::Schema(e.to_string()))?;
        Ok(fields.or_stock(property, category, MediaType::Image))
    }

    /// Text-only analysis for videos, working from the filename and villa
    /// context since raw video never goes to the vision model.
    pub async fn analyze_video(
        &self,
        filename: &str,
        category: &str,
    ) -> Result<SeoFields, AiError> {
        let property = &self.config.property_name;
        let context = &self.config.property_context;

        let prompt = format!(
            "Create professional SEO content for this {property} video file: \"{filename}\".\n\n\
             {property} is {context} featuring luxury amenities, stunning lake views, beautiful gardens, \
             spa services, and authentic Sri Lankan experiences.\n\n\
             Generate appropriate SEO content based on the filename and villa context.\n\n\
             Return JSON: {{\"title\": \"...\", \"altText\": \"...\", \"seoDescription\": \"...\", \"keywords\": [\"...\"], \"confidence\": 90}}"
        );

        let messages = json!([
            {
                "role": "system",
                "content": format!(
                    "You are an SEO expert for {property}, {context}. Create compelling, accurate video SEO content."
                ),
            },
            { "role": "user", "content": prompt },
        ]);

        let raw = self.chat_json(&self.config.text_model, 0.7, messages).await?;
        let mut fields: SeoFields = serde_json::from_value(extract_json(&raw)?)
            .map_err(|e| AiError::Schema(e.to_string()))?;
        // Filename-based analysis runs with higher floor confidence
        fields.confidence = fields.confidence.clamp(80.0, 100.0);
        Ok(fields.or_stock(property, category, MediaType::Video))
    }

    /// Stock analysis used when the model is unreachable. Callers flag the
    /// response as a fallback rather than failing the request.
    pub fn fallback_analysis(&self, category: &str, media: MediaType) -> SeoFields {
        let property = &self.config.property_name;
        SeoFields {
            title: format!("{property} {category}"),
            alt_text: format!(
                "{property} {category} - luxury lakeside accommodation in Sri Lanka"
            ),
            seo_description: format!(
                "Experience premium accommodation at {property}, a luxury lakeside retreat in Sri Lanka \
                 with stunning natural surroundings."
            ),
            keywords: vec![
                property.to_lowercase(),
                "luxury accommodation".to_string(),
                "sri lanka".to_string(),
                "lakeside villa".to_string(),
                category.to_lowercase(),
            ],
            confidence: match media {
                MediaType::Image => 50.0,
                MediaType::Video => 75.0,
            },
        }
    }

    /// Page/listing SEO content generation from an image plus any existing
    /// copy.
    pub async fn seo_content(
        &self,
        image_url: &str,
        category: &str,
        existing_title: Option<&str>,
        existing_description: Option<&str>,
    ) -> Result<SeoContent, AiError> {
        let property = &self.config.property_name;

        let prompt = format!(
            "Generate SEO-optimized content for this {property} {category} image.\n\n\
             Current content:\n\
             - Title: {}\n\
             - Description: {}\n\n\
             Requirements:\n\
             1. SEO title (max 60 characters, include \"{property}\")\n\
             2. Meta description (max 160 characters, compelling and descriptive)\n\
             3. Alt text (descriptive, accessible, include location context)\n\
             4. Keywords array (5-8 relevant terms for Sri Lankan luxury accommodation)\n\
             5. Focus keyword (primary SEO target)\n\n\
             Respond with JSON: {{\"title\": \"...\", \"description\": \"...\", \"altText\": \"...\", \"keywords\": [...], \"focusKeyword\": \"...\"}}",
            existing_title.unwrap_or("Not set"),
            existing_description.unwrap_or("Not set"),
        );

        let messages = json!([
            {
                "role": "system",
                "content": "You are an SEO expert specializing in luxury hospitality and accommodation marketing. \
                            Generate compelling, search-optimized content that appeals to travelers seeking premium \
                            experiences in Sri Lanka.",
            },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": image_url } },
                ],
            },
        ]);

        let raw = self.chat_json(&self.config.text_model, 0.8, messages).await?;
        let mut content: SeoContent = serde_json::from_value(extract_json(&raw)?)
            .map_err(|e| AiError::Schema(e.to_string()))?;

        if content.title.is_empty() {
            content.title = format!("{property} - Luxury {category}");
        }
        if content.focus_keyword.is_empty() {
            content.focus_keyword = format!("{} luxury accommodation", property.to_lowercase());
        }
        Ok(content)
    }

    /// Stock page SEO used when generation fails.
    pub fn fallback_seo_content(&self, category: &str) -> SeoContent {
        let property = &self.config.property_name;
        SeoContent {
            title: format!("{property} - Luxury {category} Sri Lanka"),
            description: format!(
                "Experience premium accommodation at {property}, a luxury lakeside retreat in Sri Lanka \
                 featuring world-class amenities, stunning lake views, and exceptional hospitality."
            ),
            alt_text: format!(
                "{property} {category} - luxury lakeside accommodation in Sri Lanka"
            ),
            keywords: vec![
                property.to_lowercase(),
                "luxury accommodation sri lanka".to_string(),
                "lakeside villa".to_string(),
                "premium hotel sri lanka".to_string(),
                "luxury resort".to_string(),
                "sri lanka vacation".to_string(),
            ],
            focus_keyword: format!("{} luxury accommodation", property.to_lowercase()),
        }
    }

    fn seo_messages(&self, request: &SeoRequest, reminder: bool) -> Value {
        let property = &self.config.property_name;
        let category = request.category.as_deref().unwrap_or("villa");
        let title = request.human_title.as_deref().unwrap_or("Untitled");

        let system = format!(
            "You create concise, specific, *unique* SEO for {property} media. \
             Use what you SEE; no boilerplate. Return STRICT JSON only."
        );
        let rules = "Output JSON { \"title\",\"description\",\"keywords\",\"altText\",\"confidence\" }.\n\
                     - Title 12-80 chars; no brand unless visibly present.\n\
                     - Description <=160 chars; mention >=2 concrete *visible* elements.\n\
                     - keywords: 5-18 short phrases.\n\
                     - altText 10-140 chars, literal.\n\
                     - Never reuse stock phrasing about luxury lakeside property.";

        let text = format!(
            "Context:\n- Media type: {}\n- Category: {category}\n- Human title: {title}\n\n{rules}",
            request.media_type.as_str().to_uppercase(),
        );

        let mut content = vec![json!({ "type": "text", "text": text })];
        if let Some(url) = &request.image_url {
            content.push(json!({ "type": "image_url", "image_url": { "url": url } }));
        }

        let mut messages = vec![
            json!({ "role": "system", "content": system }),
            json!({ "role": "user", "content": content }),
        ];
        if reminder {
            messages.push(json!({
                "role": "system",
                "content": "Reminder: avoid boilerplate; mention visible details; keep limits; return JSON only.",
            }));
        }
        Value::Array(messages)
    }

    /// One chat-completions call in JSON mode, returning the raw content
    /// string of the first choice.
    async fn chat_json(
        &self,
        model: &str,
        temperature: f64,
        messages: Value,
    ) -> Result<String, AiError> {
        if !self.is_configured() {
            return Err(AiError::NotConfigured);
        }

        metrics::ai().requests.with_label_values(&[model]).inc();

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "model": model,
                "temperature": temperature,
                "response_format": { "type": "json_object" },
                "messages": messages,
                "max_completion_tokens": 1000,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let payload: Value = response.json().await?;
        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
            .ok_or(AiError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> SeoFields {
        SeoFields {
            title: "Sunset deck over the lake".to_string(),
            alt_text: "Wooden deck with two loungers facing the lake at dusk".to_string(),
            seo_description:
                "Private deck with loungers above the lake, framed by palm trees at sunset."
                    .to_string(),
            keywords: vec![
                "villa deck".into(),
                "lake view".into(),
                "sunset".into(),
                "sri lanka stay".into(),
                "private terrace".into(),
            ],
            confidence: 92.0,
        }
    }

    #[test]
    fn strict_validation_accepts_good_output() {
        assert!(valid_fields().validate_strict().is_ok());
    }

    #[test]
    fn strict_validation_rejects_out_of_bounds() {
        let mut short_title = valid_fields();
        short_title.title = "Too short".to_string();
        assert!(short_title.validate_strict().is_err());

        let mut few_keywords = valid_fields();
        few_keywords.keywords.truncate(2);
        assert!(few_keywords.validate_strict().is_err());

        let mut long_description = valid_fields();
        long_description.seo_description = "x".repeat(200);
        assert!(long_description.validate_strict().is_err());
    }

    #[test]
    fn flags_boilerplate_and_vague_copy() {
        let mut stock = valid_fields();
        stock.seo_description =
            "A lovely accommodation - luxury lakeside property in Sri Lanka and garden views."
                .to_string();
        assert!(stock.is_boilerplate());

        let mut vague = valid_fields();
        vague.seo_description = "A wonderful place for an unforgettable holiday.".to_string();
        vague.alt_text = "A beautiful scene".to_string();
        assert!(vague.is_vague());

        assert!(!valid_fields().is_boilerplate());
        assert!(!valid_fields().is_vague());
    }

    #[test]
    fn extracts_json_from_fenced_and_wrapped_output() {
        let fenced = "```json\n{\"title\": \"ok\"}\n```";
        assert_eq!(extract_json(fenced).unwrap()["title"], "ok");

        let bare = "{\"title\": \"ok\"}";
        assert_eq!(extract_json(bare).unwrap()["title"], "ok");

        let wrapped = "Here you go: {\"title\": \"ok\"} hope that helps";
        assert_eq!(extract_json(wrapped).unwrap()["title"], "ok");

        assert!(matches!(
            extract_json("no json here"),
            Err(AiError::MalformedResponse(_))
        ));
        assert!(matches!(extract_json(""), Err(AiError::EmptyCompletion)));
    }

    #[test]
    fn seo_fields_accept_description_alias() {
        let value = json!({
            "title": "Sunset deck over the lake",
            "description": "Private deck with loungers above the lake, framed by palms.",
            "altText": "Deck and loungers by the lake",
            "keywords": ["deck", "lake", "villa", "sunset", "loungers"],
            "confidence": 88,
        });
        let fields: SeoFields = serde_json::from_value(value).unwrap();
        assert!(fields.seo_description.starts_with("Private deck"));
    }

    #[test]
    fn normalizes_and_validates_image_payloads() {
        let pixels = vec![0u8; 4096];
        let encoded = BASE64.encode(&pixels);

        let url = normalize_image_data_url(&encoded).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let already = format!("data:image/png;base64,{encoded}");
        assert_eq!(normalize_image_data_url(&already).unwrap(), already);

        assert!(matches!(
            normalize_image_data_url("dGlueQ=="),
            Err(AiError::InvalidImage(_))
        ));
    }
}
