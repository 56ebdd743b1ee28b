//! Push dispatch service
//!
//! Sends one multicast notification per user through FCM, interprets the
//! per-token delivery results and decides which tokens to prune. A token is
//! removed only when the provider confirms it is no longer registered; every
//! other failure leaves the token in place for the next scheduled run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::PushConfig;
use crate::models::EventSummary;
use crate::utils::errors::{HishoError, PushError, PushResult, Result};
use crate::utils::time::format_day;

/// Delivery result for a single device token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenOutcome {
    Delivered,
    /// The provider confirmed the token is no longer registered
    Unregistered,
    /// Transient, malformed or rate-limited failure; the token survives
    Failed(String),
}

/// Which reminder flow a dispatch belongs to; determines the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    ChecklistDue,
    ScheduledNotice,
}

impl ReminderKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReminderKind::ChecklistDue => "持ち物の準備を忘れずに 📦",
            ReminderKind::ScheduledNotice => "予定の通知 ✅️",
        }
    }

    pub fn lead(&self) -> &'static str {
        match self {
            ReminderKind::ChecklistDue => "今日から準備すべき予定があります:",
            ReminderKind::ScheduledNotice => "直近の予定をお送りします:",
        }
    }
}

/// Provider boundary: one multicast in, one outcome per token out
#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> PushResult<Vec<TokenOutcome>>;
}

/// FCM HTTP v1 error payload, as far as classification needs it
#[derive(Debug, Deserialize)]
struct FcmErrorResponse {
    error: Option<FcmErrorBody>,
}

#[derive(Debug, Deserialize)]
struct FcmErrorBody {
    status: Option<String>,
    message: Option<String>,
}

/// FCM client speaking the HTTP v1 API.
///
/// v1 has no multicast endpoint; the fan-out happens here with one request
/// per token, issued concurrently, and the results are collapsed back into
/// the per-token outcome list the dispatcher expects.
#[derive(Debug, Clone)]
pub struct FcmClient {
    client: Client,
    endpoint: String,
    project_id: String,
    auth_token: String,
}

impl FcmClient {
    pub fn new(config: &PushConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("hisho-backend/0.1")
            .build()
            .map_err(HishoError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    async fn send_one(
        &self,
        token: &str,
        title: &str,
        body: &str,
    ) -> std::result::Result<TokenOutcome, reqwest::Error> {
        let url = format!(
            "{}/v1/projects/{}/messages:send",
            self.endpoint, self.project_id
        );
        let payload = json!({
            "message": {
                "token": token,
                "notification": { "title": title, "body": body }
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.auth_token)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(TokenOutcome::Delivered);
        }

        let status = response.status();
        let error: FcmErrorResponse = response.json().await.unwrap_or(FcmErrorResponse {
            error: None,
        });
        let code = error
            .error
            .as_ref()
            .and_then(|e| e.status.clone())
            .unwrap_or_default();

        if code == "UNREGISTERED" || code == "NOT_FOUND" {
            return Ok(TokenOutcome::Unregistered);
        }

        let message = error
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| status.to_string());
        Ok(TokenOutcome::Failed(message))
    }
}

#[async_trait]
impl PushProvider for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
    ) -> PushResult<Vec<TokenOutcome>> {
        let sends = tokens.iter().map(|token| self.send_one(token, title, body));
        let results = join_all(sends).await;

        // Transport errors on individual tokens are transient failures;
        // losing every token at the transport level means the provider
        // itself was unreachable and the caller's batch entry fails.
        let mut outcomes = Vec::with_capacity(results.len());
        let mut transport_errors = 0usize;
        let mut last_error = String::new();

        for result in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    transport_errors += 1;
                    last_error = e.to_string();
                    outcomes.push(TokenOutcome::Failed(last_error.clone()));
                }
            }
        }

        if !tokens.is_empty() && transport_errors == tokens.len() {
            return Err(PushError::RequestFailed(last_error));
        }

        Ok(outcomes)
    }
}

/// Outcome of one per-user dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Tokens that remain registered after this dispatch; always a subset
    /// of the input set
    pub surviving_tokens: Vec<String>,
    pub success_count: u32,
    pub fail_count: u32,
}

impl DispatchOutcome {
    /// Whether dispatch pruned any tokens
    pub fn tokens_changed(&self, original: &[String]) -> bool {
        self.surviving_tokens.len() != original.len()
    }
}

/// Builds the multicast message for a user's pending events and reconciles
/// the per-token delivery results into a surviving token set
#[derive(Clone)]
pub struct PushDispatcher {
    provider: Arc<dyn PushProvider>,
    timezone_offset_hours: i32,
}

impl PushDispatcher {
    pub fn new(provider: Arc<dyn PushProvider>, timezone_offset_hours: i32) -> Self {
        Self {
            provider,
            timezone_offset_hours,
        }
    }

    /// Message body: one line per event with its start day
    pub fn build_body(&self, kind: ReminderKind, events: &[EventSummary]) -> String {
        let lines: Vec<String> = events
            .iter()
            .map(|e| {
                format!(
                    "・{}（{}）",
                    e.title,
                    format_day(&e.start_time, self.timezone_offset_hours)
                )
            })
            .collect();
        format!("{}\n{}", kind.lead(), lines.join("\n"))
    }

    /// Send one multicast for the user and classify the results.
    ///
    /// Guarantees success_count + fail_count equals the number of tokens
    /// attempted. Tokens reported unregistered are dropped from the
    /// surviving set; all other tokens are kept.
    pub async fn send(
        &self,
        user_id: &str,
        tokens: &[String],
        events: &[EventSummary],
        kind: ReminderKind,
    ) -> Result<DispatchOutcome> {
        let body = self.build_body(kind, events);
        debug!(user_id = user_id, tokens = tokens.len(), "Sending multicast push");

        let outcomes = self
            .provider
            .send_multicast(tokens, kind.title(), &body)
            .await?;

        if outcomes.len() != tokens.len() {
            return Err(PushError::InvalidResponse(format!(
                "expected {} outcomes, got {}",
                tokens.len(),
                outcomes.len()
            ))
            .into());
        }

        let mut surviving = Vec::with_capacity(tokens.len());
        let mut success_count = 0u32;
        let mut fail_count = 0u32;
        let mut pruned = 0usize;

        for (token, outcome) in tokens.iter().zip(outcomes.iter()) {
            match outcome {
                TokenOutcome::Delivered => {
                    success_count += 1;
                    surviving.push(token.clone());
                }
                TokenOutcome::Unregistered => {
                    fail_count += 1;
                    pruned += 1;
                }
                TokenOutcome::Failed(reason) => {
                    fail_count += 1;
                    warn!(user_id = user_id, reason = %reason, "Push delivery failed, token kept");
                    surviving.push(token.clone());
                }
            }
        }

        if pruned > 0 {
            info!(user_id = user_id, pruned = pruned, "Removed unregistered tokens");
        }
        crate::utils::logging::log_dispatch_result(user_id, success_count, fail_count, pruned);

        Ok(DispatchOutcome {
            surviving_tokens: surviving,
            success_count,
            fail_count,
        })
    }
}
