use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::Specialty;

/// Default per-task retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// How long completed/failed tasks are retained before cleanup (days).
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Top-level config (herald.toml + HERALD_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeraldConfig {
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub preparer: PreparerConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Channel directory the planner distributes posts across.
    #[serde(default)]
    pub specialties: Vec<Specialty>,
}

/// Background publisher loop timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Seconds between queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Milliseconds between consecutive dispatches within one batch.
    #[serde(default = "default_dispatch_delay")]
    pub dispatch_delay_ms: u64,
    /// Seconds to back off after a batch that hit transport-level failures.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            dispatch_delay_ms: default_dispatch_delay(),
            error_backoff_secs: default_error_backoff(),
        }
    }
}

/// Plan preparation retry/pacing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparerConfig {
    /// Generation attempts per plan entry before the entry is skipped.
    #[serde(default = "default_generation_attempts")]
    pub generation_attempts: u32,
    /// Seconds between generation attempts for the same entry.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    /// Seconds between consecutive plan entries (generation-service rate limit).
    #[serde(default = "default_entry_delay")]
    pub entry_delay_secs: u64,
}

impl Default for PreparerConfig {
    fn default() -> Self {
        Self {
            generation_attempts: default_generation_attempts(),
            retry_delay_secs: default_retry_delay(),
            entry_delay_secs: default_entry_delay(),
        }
    }
}

/// Approval workflow knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Hours an unattended pending plan survives before expiry.
    #[serde(default = "default_plan_ttl")]
    pub plan_ttl_hours: u64,
    /// Minutes a post whose publish time already passed is pushed forward.
    #[serde(default = "default_late_grace")]
    pub late_grace_mins: u64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            plan_ttl_hours: default_plan_ttl(),
            late_grace_mins: default_late_grace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    pub openrouter: Option<OpenRouterConfig>,
}

/// OpenRouter-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    pub api_key: String,
    #[serde(default = "default_openrouter_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelsConfig {
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
}

fn default_poll_interval() -> u64 {
    30
}
fn default_dispatch_delay() -> u64 {
    2_000
}
fn default_error_backoff() -> u64 {
    60
}
fn default_generation_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    3
}
fn default_entry_delay() -> u64 {
    5
}
fn default_plan_ttl() -> u64 {
    24
}
fn default_late_grace() -> u64 {
    5
}
fn default_openrouter_base_url() -> String {
    "https://openrouter.ai/api".to_string()
}
fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

impl HeraldConfig {
    /// Load config from a TOML file with HERALD_* env var overrides.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HeraldConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HERALD_").split("_"))
            .extract()
            .map_err(|e| crate::error::HeraldError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.herald/herald.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let cfg = HeraldConfig::default();
        assert_eq!(cfg.publisher.poll_interval_secs, 30);
        assert_eq!(cfg.publisher.dispatch_delay_ms, 2_000);
        assert_eq!(cfg.publisher.error_backoff_secs, 60);
        assert_eq!(cfg.preparer.generation_attempts, 3);
        assert_eq!(cfg.preparer.entry_delay_secs, 5);
        assert_eq!(cfg.review.late_grace_mins, 5);
    }

    #[test]
    fn specialty_deserializes_with_optional_decoration() {
        let s: Specialty = serde_json::from_str(
            r#"{"id":"cardiology","name":"Cardiology Digest","channel":"@cardio"}"#,
        )
        .expect("specialty should parse");
        assert_eq!(s.emoji, "");
        assert_eq!(s.link, "");
    }
}
