//! Public enquiry handler
//!
//! Validated booking enquiries from the contact form, rate limited per IP
//! and persisted to the `enquiries` collection for the admin console.

use crate::core::app_state::AppState;
use crate::core::error::{Error, Result};
use crate::core::utils::current_timestamp_millis;
use crate::store::Fields;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Collection holding submitted enquiries.
pub const ENQUIRIES_COLLECTION: &str = "enquiries";

const RATE_WINDOW: Duration = Duration::from_secs(15 * 60);
const RATE_MAX: u32 = 5;

static RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(RATE_MAX, RATE_WINDOW));

/// Fixed-window per-key rate limiter.
pub struct RateLimiter {
    max: u32,
    window_millis: u64,
    hits: DashMap<String, WindowState>,
}

struct WindowState {
    count: u32,
    reset_at: u64,
}

impl RateLimiter {
    /// Allow `max` hits per `window` for each key.
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window_millis: window.as_millis() as u64,
            hits: DashMap::new(),
        }
    }

    /// Record a hit for `key` and report whether it is within the limit.
    pub fn allow(&self, key: &str) -> bool {
        let now = current_timestamp_millis();
        let mut entry = self.hits.entry(key.to_string()).or_insert(WindowState {
            count: 0,
            reset_at: now + self.window_millis,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window_millis;
        }
        if entry.count >= self.max {
            return false;
        }
        entry.count += 1;
        true
    }
}

/// A booking enquiry from the public contact form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    name: String,
    email: String,
    message: String,
    check_in: Option<String>,
    check_out: Option<String>,
    rooms: Option<u32>,
    guests: Option<u32>,
}

impl Enquiry {
    fn validate(&self) -> std::result::Result<(), String> {
        let name_len = self.name.trim().chars().count();
        if !(1..=100).contains(&name_len) {
            return Err("name must be 1-100 characters".to_string());
        }
        if self.email.chars().count() > 255 || !is_plausible_email(&self.email) {
            return Err("email is not valid".to_string());
        }
        let message_len = self.message.trim().chars().count();
        if !(10..=2000).contains(&message_len) {
            return Err("message must be 10-2000 characters".to_string());
        }
        if let Some(rooms) = self.rooms {
            if !(1..=20).contains(&rooms) {
                return Err("rooms must be between 1 and 20".to_string());
            }
        }
        if let Some(guests) = self.guests {
            if !(1..=50).contains(&guests) {
                return Err("guests must be between 1 and 50".to_string());
            }
        }
        Ok(())
    }

    fn into_record(self) -> Fields {
        let now = current_timestamp_millis();
        let record = json!({
            "name": sanitize(&self.name),
            "email": self.email.trim(),
            "message": sanitize(&self.message),
            "checkIn": self.check_in,
            "checkOut": self.check_out,
            "rooms": self.rooms,
            "guests": self.guests,
            "status": "new",
            "createdAt": now,
            "updatedAt": now,
        });
        match record {
            Value::Object(fields) => fields,
            _ => Fields::new(),
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// Strip control characters and angle brackets from user-entered text.
fn sanitize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_control() && *c != '<' && *c != '>')
        .collect()
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// POST /api/enquiries
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let ip = client_ip(&headers);
    if !RATE_LIMITER.allow(&ip) {
        warn!(ip, "enquiry rate limit exceeded");
        return Err(Error::RateLimited);
    }

    let enquiry: Enquiry = serde_json::from_value(payload)
        .map_err(|e| Error::invalid_input(format!("Invalid input: {e}")))?;
    enquiry.validate().map_err(Error::InvalidInput)?;

    state.store.add(ENQUIRIES_COLLECTION, enquiry.into_record())?;

    Ok(Json(json!({
        "success": true,
        "message": "Enquiry received successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enquiry(message: &str) -> Enquiry {
        Enquiry {
            name: "Asha Perera".to_string(),
            email: "asha@example.com".to_string(),
            message: message.to_string(),
            check_in: None,
            check_out: None,
            rooms: Some(2),
            guests: Some(4),
        }
    }

    #[test]
    fn accepts_a_valid_enquiry() {
        assert!(enquiry("We would love to book the lake suite in March.")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_fields() {
        assert!(enquiry("Too short").validate().is_err());

        let mut bad_email = enquiry("A perfectly reasonable message body.");
        bad_email.email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut crowd = enquiry("A perfectly reasonable message body.");
        crowd.guests = Some(500);
        assert!(crowd.validate().is_err());
    }

    #[test]
    fn sanitize_strips_markup_and_control_chars() {
        assert_eq!(
            sanitize("  hello <script>x</script>\u{7}  "),
            "hello scriptx/script"
        );
    }

    #[test]
    fn rate_limiter_caps_hits_per_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.allow("1.2.3.4"));
        }
        assert!(!limiter.allow("1.2.3.4"));
        // Another client is unaffected
        assert!(limiter.allow("5.6.7.8"));
    }

    #[test]
    fn rate_limiter_resets_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(0));
        assert!(limiter.allow("1.2.3.4"));
        // Zero-length window: the next hit starts a fresh window
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.allow("1.2.3.4"));
    }
}
