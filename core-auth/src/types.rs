use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Application credentials presented to the token endpoint.
///
/// The secret never appears in `Debug` output.
///
/// # Examples
///
/// ```
/// use core_auth::ClientCredentials;
///
/// let credentials = ClientCredentials::new("client", "secret");
/// assert_eq!(credentials.basic_auth_header(), "Basic Y2xpZW50OnNlY3JldA==");
/// assert!(format!("{:?}", credentials).contains("[REDACTED]"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// `Authorization` header value for HTTP Basic authentication.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// A bearer credential issued by the token endpoint.
///
/// Credentials are immutable. A refresh replaces the whole value rather than
/// mutating the cached one, so callers holding an `Arc<Credential>` keep a
/// consistent view for the duration of their call.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    access_token: String,
    token_type: String,
    created_at: DateTime<Utc>,
    validity_secs: i64,
}

impl Credential {
    /// Creates a credential issued at `created_at`, valid for `validity_secs`.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        created_at: DateTime<Utc>,
        validity_secs: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            created_at,
            validity_secs,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn validity_secs(&self) -> i64 {
        self.validity_secs
    }

    /// Instant after which the credential is no longer accepted.
    ///
    /// Saturates at the bounds of `DateTime<Utc>` for out-of-range
    /// validities.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Duration::try_seconds(self.validity_secs)
            .and_then(|validity| self.created_at.checked_add_signed(validity))
            .unwrap_or(if self.validity_secs < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            })
    }

    /// `true` once `now` is strictly past `created_at + validity`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use core_auth::Credential;
    ///
    /// let issued = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    /// let credential = Credential::new("BQD", "Bearer", issued, 3600);
    ///
    /// assert!(!credential.is_expired(issued + Duration::seconds(3600)));
    /// assert!(credential.is_expired(issued + Duration::seconds(3601)));
    /// ```
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    /// Like [`is_expired`](Self::is_expired) but treats the last
    /// `leeway_secs` of validity as already expired.
    ///
    /// A leeway reaching past the representable range counts as expired.
    pub fn is_expired_with_leeway(&self, now: DateTime<Utc>, leeway_secs: i64) -> bool {
        match Duration::try_seconds(leeway_secs.max(0))
            .and_then(|leeway| now.checked_add_signed(leeway))
        {
            Some(shifted) => self.is_expired(shifted),
            None => true,
        }
    }

    /// `Authorization` header value for catalog requests.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("created_at", &self.created_at)
            .field("validity_secs", &self.validity_secs)
            .finish()
    }
}
