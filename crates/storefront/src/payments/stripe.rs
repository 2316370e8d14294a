//! Stripe REST client.
//!
//! Talks to `/v1/customers` and `/v1/checkout/sessions` with the secret key
//! as bearer token. Request bodies use Stripe's bracketed form encoding (see
//! [`super::encode_session_request`]).

use std::sync::Arc;

use async_trait::async_trait;
use leureluxe_core::Email;
use leureluxe_core::checkout::CheckoutSessionRequest;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{CheckoutSession, PaymentError, PaymentProvider, encode_session_request};
use crate::config::StripeConfig;

/// Client for the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    id: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialization fails).
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(StripeClientInner {
                client,
                api_base: config.api_base.trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.api_base)
    }

    /// Read a Stripe response, turning error envelopes into [`PaymentError::Api`].
    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .map(|e| e.error);
            let message = error
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| format!("HTTP {status}"));

            tracing::error!(
                status = %status,
                message = %message,
                body = %body.chars().take(500).collect::<String>(),
                "Stripe API returned non-success status"
            );

            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
                kind: error.as_ref().and_then(|e| e.kind.clone()),
                code: error.and_then(|e| e.code),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse Stripe response"
            );
            PaymentError::Parse(e)
        })
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, email))]
    async fn find_customer_by_email(&self, email: &Email) -> Result<Option<String>, PaymentError> {
        let mut url = Url::parse(&self.endpoint("/v1/customers"))?;
        url.query_pairs_mut()
            .append_pair("email", email.as_str())
            .append_pair("limit", "1");

        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        let customers: List<Customer> = Self::read(response).await?;
        let found = customers.data.into_iter().next().map(|c| c.id);
        tracing::debug!(found = found.is_some(), "Stripe customer lookup");
        Ok(found)
    }

    #[instrument(skip(self, request), fields(line_items = request.line_items.len()))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("/v1/checkout/sessions"))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&encode_session_request(request))
            .send()
            .await?;

        let session: CheckoutSession = Self::read(response).await?;
        tracing::info!(session_id = %session.id, "Stripe checkout session created");
        Ok(session)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = StripeClient::new(&StripeConfig {
            api_base: "http://localhost:12111/".to_string(),
            secret_key: SecretString::from("sk_test_key"),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(
            client.endpoint("/v1/customers"),
            "http://localhost:12111/v1/customers"
        );
    }

    #[test]
    fn test_error_envelope_parses() {
        let body = r#"{"error":{"message":"No such customer: 'cus_x'","type":"invalid_request_error","code":"resource_missing"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.error.message.as_deref(),
            Some("No such customer: 'cus_x'")
        );
        assert_eq!(envelope.error.kind.as_deref(), Some("invalid_request_error"));
        assert_eq!(envelope.error.code.as_deref(), Some("resource_missing"));
    }

    #[test]
    fn test_session_without_url_parses() {
        let session: CheckoutSession =
            serde_json::from_str(r#"{"id":"cs_test_1","url":null}"#).unwrap();
        assert_eq!(session.url, None);
    }
}
