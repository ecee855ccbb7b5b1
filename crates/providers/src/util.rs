//! Shared utility functions for provider adapters.

use ic_domain::config::AuthConfig;
use ic_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Read a response body and turn non-2xx statuses into [`Error::Provider`].
///
/// The vendor wraps failures as `{"error": {"message": ...}}`; when that
/// shape is present only the message is kept.
pub(crate) async fn read_success_body(
    provider: &str,
    resp: reqwest::Response,
) -> Result<serde_json::Value> {
    let status = resp.status();
    let text = resp.text().await.map_err(from_reqwest)?;

    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(text);
        return Err(Error::Provider {
            provider: provider.to_string(),
            message: format!("HTTP {} - {}", status.as_u16(), message),
        });
    }

    Ok(serde_json::from_str(&text)?)
}

/// Resolved header name and value for authenticated requests.
#[derive(Clone)]
pub(crate) struct AuthHeader {
    pub name: String,
    pub value: String,
}

impl AuthHeader {
    pub(crate) fn from_config(auth: &AuthConfig) -> Result<Self> {
        let key = resolve_api_key(auth)?;
        let name = auth.header.clone().unwrap_or_else(|| "Authorization".into());
        let prefix = auth.prefix.clone().unwrap_or_else(|| "Bearer ".into());
        Ok(Self {
            name,
            value: format!("{prefix}{key}"),
        })
    }
}

/// Resolve the API key from an [`AuthConfig`].
///
/// Precedence:
/// 1. `key` field (plaintext, logs a warning)
/// 2. `service` + `account` → OS keychain via `keyring`
/// 3. `env` field (reads environment variable)
/// 4. Fallback for keychain mode: env var `{SERVICE}_{ACCOUNT}` uppercased
/// 5. Error
pub fn resolve_api_key(auth: &AuthConfig) -> Result<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; \
             prefer 'env' or keychain instead"
        );
        return Ok(key.clone());
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        match resolve_from_keychain(service, account) {
            Ok(secret) => return Ok(secret),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = auth.env {
        match std::env::var(env_var) {
            Ok(val) if !val.trim().is_empty() => return Ok(val),
            _ if auth.service.is_none() => {
                return Err(Error::Auth(format!(
                    "environment variable '{env_var}' not set or empty"
                )));
            }
            _ => {}
        }
    }

    if let (Some(ref service), Some(ref account)) = (&auth.service, &auth.account) {
        let fallback_var = keychain_fallback_env_name(service, account);
        if let Ok(val) = std::env::var(&fallback_var) {
            tracing::info!(
                env_var = %fallback_var,
                "API key resolved from keychain headless fallback env var"
            );
            return Ok(val);
        }
    }

    Err(Error::Auth(
        "no API key configured: set 'key', 'env', or keychain \
         'service'+'account' under [llm.auth]"
            .into(),
    ))
}

/// Read a secret from the OS keychain.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}

/// Build the headless fallback env var name for a keychain service/account.
///
/// Example: `("imagechat", "openai-api-key")` → `"IMAGECHAT_OPENAI_API_KEY"`.
pub fn keychain_fallback_env_name(service: &str, account: &str) -> String {
    format!(
        "{}_{}",
        service.to_uppercase().replace('-', "_"),
        account.to_uppercase().replace('-', "_"),
    )
}
