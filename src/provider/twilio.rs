//! # Twilio Call Client
//!
//! Places calls through the Twilio REST API (`POST
//! /2010-04-01/Accounts/{sid}/Calls.json`, form encoded, basic auth). The
//! provider later POSTs `CallSid`/`CallStatus` to the status callback URL.

use super::{CallPlacementClient, PlaceCallRequest, ProviderPlacementError};
use crate::config::ProviderConfig;
use crate::error::{DialerError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone)]
pub struct TwilioCallClient {
    http: reqwest::Client,
    api_base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
    code: Option<i64>,
    message: Option<String>,
}

impl TwilioCallClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DialerError::Configuration(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
        })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.api_base_url, self.account_sid
        )
    }

    fn form_params<'a>(&'a self, request: &'a PlaceCallRequest) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![
            ("From", self.from_number.as_str()),
            ("To", request.to.as_str()),
            ("Url", request.prompt_url.as_str()),
            ("StatusCallback", request.status_callback_url.as_str()),
            ("StatusCallbackMethod", "POST"),
        ];
        params.extend(
            request
                .events
                .iter()
                .map(|event| ("StatusCallbackEvent", event.as_str())),
        );
        params
    }
}

#[async_trait]
impl CallPlacementClient for TwilioCallClient {
    #[instrument(skip(self, request), fields(to = %request.to))]
    async fn place(
        &self,
        request: &PlaceCallRequest,
    ) -> std::result::Result<String, ProviderPlacementError> {
        let response = self
            .http
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form_params(request))
            .send()
            .await
            .map_err(|e| ProviderPlacementError::new(format!("transport error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<ErrorResource>(&body) {
                Ok(ErrorResource {
                    code: Some(code),
                    message: Some(message),
                }) => format!("{message} (code {code})"),
                Ok(ErrorResource {
                    message: Some(message),
                    ..
                }) => message,
                _ => body,
            };
            warn!(http_status = status.as_u16(), detail = %detail, "Twilio rejected call placement");
            return Err(ProviderPlacementError::with_status(
                format!("provider rejected call ({status}): {detail}"),
                status.as_u16(),
            ));
        }

        let call: CallResource = response.json().await.map_err(|e| {
            ProviderPlacementError::with_status(
                format!("unreadable provider response: {e}"),
                status.as_u16(),
            )
        })?;

        debug!(provider_call_id = %call.sid, "Twilio accepted call placement");
        Ok(call.sid)
    }

    fn name(&self) -> &'static str {
        "twilio"
    }
}
