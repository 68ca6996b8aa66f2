//! OpenRouter-compatible chat-completions provider.
//!
//! Implements all three boundary traits against a single endpoint. Planner
//! and safety calls instruct the model to answer with bare JSON and decode
//! the reply strictly; a reply that is not valid JSON for the expected
//! schema is surfaced as [`AgentError::Parse`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_core::types::Specialty;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::boundary::{Generator, Planner, SafetyChecker};
use crate::error::AgentError;
use crate::types::{DailyPlan, GenerationRequest, SafetyVerdict};

pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Channel directory embedded into the planner prompt.
    specialties: Vec<Specialty>,
}

impl OpenRouterProvider {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: String,
        specialties: Vec<Specialty>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://openrouter.ai/api".to_string()),
            model,
            specialties,
        }
    }

    /// Send one chat-completions request, return the assistant text.
    async fn chat(&self, system: &str, user: &str, temperature: f32) -> Result<String, AgentError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": temperature,
        });

        debug!(model = %self.model, "sending chat request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(AgentError::RateLimited {
                retry_after_ms: retry,
            });
        }
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "chat API error");
            return Err(AgentError::Api {
                status,
                message: text,
            });
        }

        let api: ApiResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;
        extract_content(api)
    }

    fn planner_system_prompt(&self) -> String {
        let mut channels = String::new();
        for s in &self.specialties {
            channels.push_str(&format!("- {} {} ({}): {}\n", s.emoji, s.name, s.id, s.link));
        }
        format!(
            "You are a content planner for a network of topical channels.\n\
             Available channels:\n{channels}\n\
             Plan 1-3 posts per channel for the given day. Spread publish times \
             across 08:00-22:00 and keep at least 2 hours between posts in the \
             same channel. Vary post types.\n\
             Answer with JSON only, no prose and no code fences, using exactly \
             this shape:\n\
             {{\"plan_date\": \"YYYY-MM-DD\", \"posts\": [{{\"specialty\": \"...\", \
             \"topic\": \"...\", \"post_type\": \"...\", \"publish_time\": \"HH:MM\", \
             \"priority\": 1}}], \"total_posts\": 0, \"reasoning\": \"...\"}}"
        )
    }
}

#[async_trait]
impl Planner for OpenRouterProvider {
    async fn plan(
        &self,
        target_date: DateTime<Utc>,
        specialties: &[String],
    ) -> Result<DailyPlan, AgentError> {
        let user = format!(
            "Create the publication plan for {} covering these specialties: {}.",
            target_date.format("%Y-%m-%d (%A)"),
            specialties.join(", "),
        );
        let raw = self.chat(&self.planner_system_prompt(), &user, 0.7).await?;
        decode_json(&raw)
    }
}

#[async_trait]
impl Generator for OpenRouterProvider {
    async fn generate(&self, req: &GenerationRequest) -> Result<String, AgentError> {
        let system = format!(
            "You write posts for the channel \"{}\" ({}). Audience: practising \
             professionals in {}. Use concise Telegram-flavoured HTML markup \
             (<b>, <i>, <a>). Sign off with the channel link {} when natural.",
            req.channel.name, req.channel.emoji, req.channel.specialty, req.channel.link,
        );
        let mut user = format!(
            "Write a \"{}\" post on the topic: {}.",
            req.post_type, req.topic
        );
        if let Some(feedback) = &req.feedback {
            user.push_str(&format!(
                "\nReviewer feedback on the previous draft, apply it: {feedback}"
            ));
        }
        let content = self.chat(&system, &user, 0.8).await?;
        if content.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }
        Ok(content)
    }
}

#[async_trait]
impl SafetyChecker for OpenRouterProvider {
    async fn check(
        &self,
        content: &str,
        specialty: &str,
        channel_name: &str,
    ) -> Result<SafetyVerdict, AgentError> {
        let system = "You review channel posts for factual and safety problems. \
                      Answer with JSON only, no prose and no code fences: \
                      {\"is_safe\": true, \"severity\": \"low|medium|high\", \
                      \"issues\": [], \"recommendations\": []}";
        let user = format!(
            "Channel: {channel_name} (specialty: {specialty}).\n\nPost under review:\n{content}"
        );
        // Low temperature for consistent verdicts.
        let raw = self.chat(system, &user, 0.3).await?;
        decode_json(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: Option<String>,
}

fn extract_content(api: ApiResponse) -> Result<String, AgentError> {
    api.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(AgentError::EmptyResponse)
}

/// Strict schema decode for structured model output.
fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, AgentError> {
    serde_json::from_str(raw.trim())
        .map_err(|e| AgentError::Parse(format!("model output did not match schema: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    #[test]
    fn extracts_first_choice_content() {
        let api: ApiResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"hello"}},{"message":{"content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(api).unwrap(), "hello");
    }

    #[test]
    fn empty_choices_is_empty_response() {
        let api: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_content(api),
            Err(AgentError::EmptyResponse)
        ));
    }

    #[test]
    fn verdict_decodes_strictly() {
        let v: SafetyVerdict = decode_json(
            r#"{"is_safe": false, "severity": "medium", "issues": ["overstated claim"]}"#,
        )
        .unwrap();
        assert!(!v.is_safe);
        assert_eq!(v.severity, Severity::Medium);
    }

    #[test]
    fn fenced_output_is_rejected_not_salvaged() {
        let fenced = "```json\n{\"is_safe\": true, \"severity\": \"low\"}\n```";
        assert!(matches!(
            decode_json::<SafetyVerdict>(fenced),
            Err(AgentError::Parse(_))
        ));
    }
}
