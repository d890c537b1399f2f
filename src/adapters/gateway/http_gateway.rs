//! HTTP client for the payment microservice.
//!
//! Every call is bounded by the client-wide timeout from [`GatewayConfig`].
//! Non-2xx responses are logged with the upstream status and body, then
//! returned as [`GatewayError`]. Nothing is retried here.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::wire_types::{CancelBody, CancelResponse, CheckoutBody, CheckoutResponse};
use crate::config::GatewayConfig;
use crate::domain::foundation::UserId;
use crate::ports::{CancelAck, CheckoutRequest, CheckoutSession, GatewayClient, GatewayError};

/// reqwest-backed [`GatewayClient`].
#[derive(Clone)]
pub struct HttpGatewayClient {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

impl HttpGatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            let err = classify(&e);
            tracing::error!(url = %url, kind = %err.kind, error = %e, "Gateway request failed");
            err
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                body = %body,
                "Gateway returned non-success status"
            );
            return Err(GatewayError::upstream(status.as_u16(), body));
        }

        let text = response.text().await.map_err(|e| classify(&e))?;
        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| {
            tracing::error!(url = %url, body = %text, error = %e, "Gateway response unreadable");
            GatewayError::invalid_response(format!("Failed to parse gateway response: {}", e))
        })
    }
}

fn classify(err: &reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::timeout(err.to_string())
    } else {
        GatewayError::transport(err.to_string())
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let body = CheckoutBody::from(&request);
        let response: CheckoutResponse = self.post("checkout", &body).await?;
        CheckoutSession::try_from(response)
    }

    async fn cancel_subscription(
        &self,
        user_id: &UserId,
        provider_ref: &str,
    ) -> Result<CancelAck, GatewayError> {
        let body = CancelBody {
            user_id: user_id.as_str(),
            provider_ref,
        };
        let response: CancelResponse = self.post("cancel", &body).await?;
        Ok(response.into())
    }
}
