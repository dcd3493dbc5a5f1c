use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::{AzureConfig, ClientCredentials};
use crate::error::AppError;
use crate::logging::SensitiveValue;

/// Bearer token issued by the identity platform
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", SensitiveValue::new(&self.0))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

pub fn token_url(authority_host: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host.trim_end_matches('/'),
        tenant_id
    )
}

/// Acquire an access token for `scope` with the client-credential grant.
///
/// Tokens are not cached; every call performs a fresh exchange.
pub async fn acquire_token(
    client: &Client,
    azure: &AzureConfig,
    creds: &ClientCredentials,
    scope: &str,
) -> Result<AccessToken, AppError> {
    let url = token_url(&azure.authority_host, &creds.tenant_id);
    debug!(
        tenant_id = %creds.tenant_id,
        client_id = %creds.client_id,
        client_secret = %SensitiveValue::new(&creds.client_secret),
        scope,
        "Requesting access token"
    );

    let request = client
        .post(&url)
        .timeout(Duration::from_secs(azure.timeout_seconds))
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("scope", scope),
        ]);

    let response = super::send("token", request).await?;
    let body: TokenResponse = response.json().await?;

    if let Some(token_type) = body.token_type.as_deref() {
        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err(AppError::InternalError(format!(
                "Unsupported token type '{}'",
                token_type
            )));
        }
    }

    Ok(AccessToken(body.access_token))
}
