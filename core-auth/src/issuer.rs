//! # Credential Issuance
//!
//! The [`CredentialIssuer`] trait is the seam between the credential cache and
//! whatever produces bearer credentials. [`ClientCredentialsIssuer`] implements
//! it with the OAuth 2.0 client-credentials grant:
//!
//! ```text
//! POST {token_url}
//! Authorization: Basic base64(client_id:client_secret)
//! Content-Type: application/x-www-form-urlencoded
//!
//! grant_type=client_credentials
//! ```
//!
//! The issuer makes exactly one attempt. Failures surface to the cache, which
//! surfaces them to the caller.

use crate::error::{AuthError, Result};
use crate::types::{ClientCredentials, Credential};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bridge_traits::time::Clock;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Produces a fresh bearer credential from application credentials.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, credentials: &ClientCredentials) -> Result<Credential>;
}

/// Issues credentials from an OAuth 2.0 token endpoint.
pub struct ClientCredentialsIssuer {
    token_url: String,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    timeout: Option<Duration>,
}

impl ClientCredentialsIssuer {
    pub fn new(
        token_url: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            http_client,
            clock,
            timeout: None,
        }
    }

    /// Per-request timeout forwarded to the HTTP client.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn build_request(&self, credentials: &ClientCredentials) -> Result<HttpRequest> {
        let encoded_body = serde_urlencoded::to_string([("grant_type", "client_credentials")])
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        let mut request = HttpRequest::new(HttpMethod::Post, self.token_url.clone())
            .header("Authorization", credentials.basic_auth_header())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(Bytes::from(encoded_body));

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        Ok(request)
    }
}

#[async_trait]
impl CredentialIssuer for ClientCredentialsIssuer {
    #[instrument(skip(self, credentials), fields(token_url = %self.token_url))]
    async fn issue(&self, credentials: &ClientCredentials) -> Result<Credential> {
        let request = self.build_request(credentials)?;

        debug!("Requesting client-credentials token");

        let response = self.http_client.execute(request).await.map_err(|e| {
            warn!(error = %e, "Token endpoint request failed");
            AuthError::Transport(e.to_string())
        })?;

        if !response.is_success() {
            let message = response
                .json::<TokenErrorResponse>()
                .ok()
                .map(|body| body.describe())
                .or_else(|| response.text().ok().filter(|text| !text.is_empty()))
                .unwrap_or_else(|| "Unable to read error response".to_string());

            warn!(status = response.status, error = %message, "Token endpoint rejected request");

            return Err(AuthError::IssuanceFailed {
                status: response.status,
                message,
            });
        }

        let token_response: TokenResponse = response.json().map_err(|e| {
            AuthError::MalformedResponse(format!("Failed to parse token response: {}", e))
        })?;

        if token_response.access_token.is_empty() {
            return Err(AuthError::MalformedResponse(
                "Token response contained an empty access_token".to_string(),
            ));
        }

        if !(0..=MAX_EXPIRES_IN_SECS).contains(&token_response.expires_in) {
            return Err(AuthError::MalformedResponse(format!(
                "Token response expires_in {} is outside 0..={}",
                token_response.expires_in, MAX_EXPIRES_IN_SECS
            )));
        }

        debug!(
            expires_in = token_response.expires_in,
            "Client-credentials token issued"
        );

        Ok(Credential::new(
            token_response.access_token,
            token_response.token_type,
            self.clock.now(),
            token_response.expires_in,
        ))
    }
}

/// Longest validity accepted from the token endpoint (one year).
const MAX_EXPIRES_IN_SECS: i64 = 365 * 24 * 60 * 60;

/// Token response from the OAuth provider.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

fn default_expires_in() -> i64 {
    3600
}

/// RFC 6749 error body.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn describe(self) -> String {
        match self.error_description {
            Some(description) => format!("{}: {}", self.error, description),
            None => self.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::HttpResponse;
    use bridge_traits::time::ManualClock;
    use chrono::{TimeZone, Utc};
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        ))
    }

    fn issuer(http: MockHttpClient, clock: Arc<ManualClock>) -> ClientCredentialsIssuer {
        ClientCredentialsIssuer::new(
            "https://accounts.example.com/api/token",
            Arc::new(http),
            clock,
        )
    }

    #[tokio::test]
    async fn test_issue_sends_client_credentials_grant() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .withf(|request| {
                request.method == HttpMethod::Post
                    && request.url == "https://accounts.example.com/api/token"
                    && request.headers.get("Authorization").map(String::as_str)
                        == Some("Basic Y2xpZW50OnNlY3JldA==")
                    && request.headers.get("Content-Type").map(String::as_str)
                        == Some("application/x-www-form-urlencoded")
                    && request.body.as_deref() == Some(&b"grant_type=client_credentials"[..])
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"access_token":"BQD123","token_type":"Bearer","expires_in":3600}"#,
                ))
            });

        let clock = clock();
        let credential = issuer(http, clock.clone())
            .issue(&ClientCredentials::new("client", "secret"))
            .await
            .unwrap();

        assert_eq!(credential.access_token(), "BQD123");
        assert_eq!(credential.token_type(), "Bearer");
        assert_eq!(credential.validity_secs(), 3600);
        assert_eq!(credential.created_at(), clock.now());
    }

    #[tokio::test]
    async fn test_issue_defaults_missing_fields() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"abc"}"#)));

        let credential = issuer(http, clock())
            .issue(&ClientCredentials::new("client", "secret"))
            .await
            .unwrap();

        assert_eq!(credential.token_type(), "Bearer");
        assert_eq!(credential.validity_secs(), 3600);
    }

    #[tokio::test]
    async fn test_issue_rejected_by_endpoint() {
        let mut http = MockHttpClient::new();
        http.expect_execute().returning(|_| {
            Ok(HttpResponse::new(
                400,
                r#"{"error":"invalid_client","error_description":"Invalid client secret"}"#,
            ))
        });

        let err = issuer(http, clock())
            .issue(&ClientCredentials::new("client", "wrong"))
            .await
            .unwrap_err();

        match err {
            AuthError::IssuanceFailed { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "invalid_client: Invalid client secret");
            }
            other => panic!("Expected IssuanceFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_issue_plain_text_error_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(503, "upstream unavailable")));

        let err = issuer(http, clock())
            .issue(&ClientCredentials::new("client", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::IssuanceFailed { status: 503, ref message } if message == "upstream unavailable"
        ));
    }

    #[tokio::test]
    async fn test_issue_transport_failure_is_not_retried() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::Network("connection refused".to_string())));

        let err = issuer(http, clock())
            .issue(&ClientCredentials::new("client", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Transport(_)));
    }

    #[tokio::test]
    async fn test_issue_malformed_body() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .returning(|_| Ok(HttpResponse::new(200, "<html>not json</html>")));

        let err = issuer(http, clock())
            .issue(&ClientCredentials::new("client", "secret"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_issue_rejects_out_of_range_expiry() {
        for expires_in in ["-1", "9223372036854775807", "31536001"] {
            let body = format!(
                r#"{{"access_token":"BQD123","token_type":"Bearer","expires_in":{expires_in}}}"#
            );
            let mut http = MockHttpClient::new();
            http.expect_execute()
                .returning(move |_| Ok(HttpResponse::new(200, body.clone())));

            let err = issuer(http, clock())
                .issue(&ClientCredentials::new("client", "secret"))
                .await
                .unwrap_err();

            assert!(
                matches!(err, AuthError::MalformedResponse(_)),
                "expires_in {expires_in} was accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_timeout_forwarded_to_request() {
        let mut http = MockHttpClient::new();
        http.expect_execute()
            .with(function(|request: &HttpRequest| {
                request.timeout == Some(Duration::from_secs(5))
            }))
            .returning(|_| Ok(HttpResponse::new(200, r#"{"access_token":"abc"}"#)));

        let result = issuer(http, clock())
            .with_timeout(Duration::from_secs(5))
            .issue(&ClientCredentials::new("client", "secret"))
            .await;

        assert!(result.is_ok());
    }
}
