//! Client-credentials token exchange.

use std::fmt;

use tracing::{debug, instrument, warn};

use super::OrcidClient;
use super::model::TokenResponse;
use crate::http::RequestSpec;

/// Scope requested for every token; the pipeline only reads public data.
pub const READ_PUBLIC_SCOPE: &str = "/read-public";

/// Short-lived bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for the `Authorization` header.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl OrcidClient {
    /// Exchanges the configured client id/secret for a bearer token.
    ///
    /// Fails soft: any error (after retries) is logged and yields `None`, so
    /// the caller decides whether an unauthenticated run is acceptable.
    #[instrument(skip(self), fields(token_url = %self.config.token_url))]
    pub async fn acquire_token(&self) -> Option<AccessToken> {
        let credentials = &self.config.credentials;
        let spec = RequestSpec::post_form(
            &self.config.token_url,
            &[
                ("client_id", credentials.client_id()),
                ("client_secret", credentials.client_secret()),
                ("grant_type", "client_credentials"),
                ("scope", READ_PUBLIC_SCOPE),
            ],
            self.config.request_timeout,
        )
        .accept("application/json");

        let response = match self.http.send(&spec).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "token request failed");
                return None;
            }
        };

        match response.json::<TokenResponse>() {
            Ok(TokenResponse {
                access_token: Some(token),
            }) if !token.trim().is_empty() => {
                debug!("access token acquired");
                Some(AccessToken::new(token))
            }
            Ok(_) => {
                warn!("token response carried no access_token");
                None
            }
            Err(error) => {
                warn!(error = %error, "token response was not valid JSON");
                None
            }
        }
    }
}
