// SPDX-FileCopyrightText: 2026 Turbodial Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the telephony provider's REST API.
//!
//! Provides [`ProviderClient`], which handles outbound call origination,
//! in-flight call cancellation, authentication, and transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use turbodial_core::{PlaceCallRequest, TelephonyProvider, TurbodialError};

/// Response body for call resource operations.
#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

/// Error body returned by the provider API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    code: Option<i64>,
}

/// HTTP client for the telephony provider.
///
/// Manages basic-auth credentials, connection pooling, and retry logic for
/// transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
    max_retries: u32,
}

impl ProviderClient {
    /// Creates a new provider REST client.
    ///
    /// # Arguments
    /// * `account_sid` - Provider account identifier
    /// * `auth_token` - Provider auth token (basic-auth password)
    /// * `base_url` - API base URL, overridable for testing
    pub fn new(
        account_sid: String,
        auth_token: String,
        base_url: String,
    ) -> Result<Self, TurbodialError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TurbodialError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            account_sid,
            auth_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
        })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Calls.json",
            self.base_url, self.account_sid
        )
    }

    fn call_url(&self, call_handle: &str) -> String {
        format!(
            "{}/Accounts/{}/Calls/{}.json",
            self.base_url, self.account_sid, call_handle
        )
    }

    /// POSTs a form to the provider, retrying once on transient errors.
    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<CallResource, TurbodialError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, url, "retrying provider request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(form)
                .send()
                .await
                .map_err(|e| TurbodialError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, url, "provider response received");

            if status.is_success() {
                return response
                    .json::<CallResource>()
                    .await
                    .map_err(|e| TurbodialError::Provider {
                        message: format!("failed to parse provider response: {e}"),
                        source: Some(Box::new(e)),
                    });
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(api_err) => format!(
                    "provider returned {status}: {} (code {})",
                    api_err.message.unwrap_or_else(|| "unknown error".to_string()),
                    api_err.code.unwrap_or_default()
                ),
                Err(_) => format!("provider returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient provider error, will retry");
                last_error = Some(TurbodialError::Provider {
                    message,
                    source: None,
                });
                continue;
            }

            return Err(TurbodialError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| TurbodialError::Provider {
            message: "provider request failed after retries".to_string(),
            source: None,
        }))
    }
}

#[async_trait]
impl TelephonyProvider for ProviderClient {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TurbodialError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("To", &request.to),
            ("From", &request.from),
            ("Url", &request.answer_url),
            ("StatusCallback", &request.status_url),
            (
                "StatusCallbackEvent",
                "initiated ringing answered completed",
            ),
        ];
        if request.machine_detection {
            form.push(("MachineDetection", "Enable"));
        }

        let resource = self.post_form(&self.calls_url(), &form).await?;
        debug!(call_handle = %resource.sid, to = %request.to, "call placed");
        Ok(resource.sid)
    }

    async fn cancel_call(&self, call_handle: &str) -> Result<(), TurbodialError> {
        self.post_form(&self.call_url(call_handle), &[("Status", "canceled")])
            .await?;
        debug!(call_handle, "call canceled");
        Ok(())
    }
}

/// Returns true for HTTP statuses worth retrying once.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::SERVICE_UNAVAILABLE
    )
}
