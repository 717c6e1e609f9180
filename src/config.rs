//! Configuration, loaded from environment variables at bootstrap.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gmail search query for application emails.
pub const DEFAULT_SEARCH_QUERY: &str = "subject:application has:attachment";

/// Default model served by the Groq OpenAI-compatible endpoint.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Intake agent configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// API key for the Groq chat-completions endpoint.
    pub groq_api_key: SecretString,
    /// Model name.
    pub model: String,
    /// OAuth bearer token for the Gmail / Sheets / Drive APIs.
    pub google_token: SecretString,
    /// Gmail search query used to discover application emails.
    pub search_query: String,
    /// Sheet name for accepted candidates.
    pub accepted_sheet: String,
    /// Sheet name for rejected applications.
    pub rejected_sheet: String,
    /// Identity granted write access to newly created sheets (optional).
    pub share_with: Option<String>,
    /// Sleep between scan cycles.
    pub cycle_interval: Duration,
    /// Delay between retry attempts within a cycle.
    pub retry_delay: Duration,
    /// Attempts per cycle before giving up until the next cycle.
    pub max_attempts: u32,
}

impl IntakeConfig {
    /// Build config from environment variables.
    ///
    /// `GROQ_API_KEY` and `GOOGLE_ACCESS_TOKEN` are required; everything
    /// else has a working default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let groq_api_key = require_env("GROQ_API_KEY")?;
        let google_token = require_env("GOOGLE_ACCESS_TOKEN")?;

        let model =
            std::env::var("RESUME_INTAKE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let search_query = std::env::var("INTAKE_SEARCH_QUERY")
            .unwrap_or_else(|_| DEFAULT_SEARCH_QUERY.to_string());

        let accepted_sheet =
            std::env::var("INTAKE_ACCEPTED_SHEET").unwrap_or_else(|_| "candidates".to_string());

        let rejected_sheet = std::env::var("INTAKE_REJECTED_SHEET")
            .unwrap_or_else(|_| "rejected_applications".to_string());

        let share_with = std::env::var("SHEETS_SHARE_WITH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let cycle_interval = Duration::from_secs(parse_env("INTAKE_CYCLE_SECS", 3600)?);
        let retry_delay = Duration::from_secs(parse_env("INTAKE_RETRY_DELAY_SECS", 10)?);
        let max_attempts = parse_env("INTAKE_MAX_ATTEMPTS", 3)?;

        Ok(Self {
            groq_api_key: SecretString::from(groq_api_key),
            model,
            google_token: SecretString::from(google_token),
            search_query,
            accepted_sheet,
            rejected_sheet,
            share_with,
            cycle_interval,
            retry_delay,
            max_attempts,
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional numeric env var. Unset → default; set but
/// unparsable → error, so a typo doesn't silently change the schedule.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}' is not a valid value"),
        }),
        Err(_) => Ok(default),
    }
}
