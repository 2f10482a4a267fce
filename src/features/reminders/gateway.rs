//! Notification gateway client (Vapi)
//!
//! Places one outbound voice call per invocation. Expected failures
//! (timeouts, connection errors, non-2xx responses) come back as
//! [`CallOutcome::Failure`], never as `Err`; the `Result` in the trait is
//! reserved for implementations that hit genuinely unexpected errors.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Extracted NotificationGateway trait
//! - 1.0.0: Initial Vapi client

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::time::Duration;

/// Opening instruction the assistant follows after the first message.
const SYSTEM_PROMPT: &str = "You are a helpful reminder assistant. \
    Deliver the reminder message clearly and concisely, then end the call.";

const MODEL_PROVIDER: &str = "openai";
const MODEL_NAME: &str = "gpt-3.5-turbo";
const VOICE_PROVIDER: &str = "11labs";
const VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Error-reason bodies are stored in call logs; keep them bounded.
const MAX_REASON_BODY: usize = 500;

/// Result of a single dispatch attempt.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// Provider accepted the call; raw response payload attached
    Success { response: serde_json::Value },
    /// Anything else: transport error, timeout, provider rejection
    Failure { reason: String },
}

/// Seam for the outbound call provider.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Place one call delivering `message` to `phone_number` (E.164).
    async fn place_call(&self, phone_number: &str, message: &str) -> Result<CallOutcome>;
}

/// HTTP client for the Vapi voice-call API.
pub struct VapiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    phone_number_id: String,
    timeout: Duration,
}

impl VapiClient {
    pub fn new(
        api_key: String,
        phone_number_id: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        // The timeout bound is load-bearing: an unbounded call would stall
        // the single poller task indefinitely.
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(VapiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            phone_number_id,
            timeout,
        })
    }

    /// Request body for `POST /call/phone`.
    fn build_payload(&self, phone_number: &str, message: &str) -> serde_json::Value {
        json!({
            "phoneNumberId": self.phone_number_id,
            "customer": {
                "number": phone_number
            },
            "assistant": {
                "firstMessage": message,
                "model": {
                    "provider": MODEL_PROVIDER,
                    "model": MODEL_NAME,
                    "messages": [
                        {
                            "role": "system",
                            "content": SYSTEM_PROMPT
                        }
                    ]
                },
                "voice": {
                    "provider": VOICE_PROVIDER,
                    "voiceId": VOICE_ID
                }
            }
        })
    }

    fn request_error_reason(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!(
                "call request timed out after {}s",
                self.timeout.as_secs()
            )
        } else if error.is_connect() {
            format!("could not reach call provider: {error}")
        } else {
            format!("call request failed: {error}")
        }
    }
}

#[async_trait]
impl NotificationGateway for VapiClient {
    async fn place_call(&self, phone_number: &str, message: &str) -> Result<CallOutcome> {
        let url = format!("{}/call/phone", self.base_url);
        let payload = self.build_payload(phone_number, message);
        debug!("Placing call to {phone_number} via {url}");

        let response = match self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(CallOutcome::Failure {
                    reason: self.request_error_reason(&e),
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(CallOutcome::Failure {
                reason: format!("provider returned {status}: {}", truncate(&body)),
            });
        }

        match response.json::<serde_json::Value>().await {
            Ok(value) => Ok(CallOutcome::Success { response: value }),
            Err(e) => Ok(CallOutcome::Failure {
                reason: format!("provider response was not valid JSON: {e}"),
            }),
        }
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_REASON_BODY {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX_REASON_BODY)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    }
}
