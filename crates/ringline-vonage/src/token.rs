use std::path::Path;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use ringline_core::GatewayError;

/// Lifetime of the bearer tokens minted for our own API calls.
pub const API_TOKEN_LIFETIME_SECS: u64 = 900;

/// Application JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub application_id: String,
    pub iat: i64,
    pub jti: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<Value>,
}

impl Claims {
    /// Claims valid from `now` for `lifetime_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Signing`] when the lifetime overflows a timestamp.
    pub fn new(
        application_id: &str,
        now: DateTime<Utc>,
        lifetime_secs: u64,
    ) -> Result<Self, GatewayError> {
        let iat = now.timestamp();
        let exp = i64::try_from(lifetime_secs)
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(|| GatewayError::Signing(format!("lifetime {lifetime_secs}s is too large")))?;

        Ok(Self {
            application_id: application_id.to_string(),
            iat,
            jti: uuid::Uuid::new_v4().to_string(),
            exp,
            sub: None,
            acl: None,
        })
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    /// Grant access to `paths` (each with unrestricted methods).
    #[must_use]
    pub fn with_acl<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths: Map<String, Value> = paths
            .into_iter()
            .map(|p| (p.as_ref().to_string(), Value::Object(Map::new())))
            .collect();
        self.acl = Some(serde_json::json!({ "paths": paths }));
        self
    }

    /// Expiry as a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Signing`] when `exp` is out of range.
    pub fn expires_at(&self) -> Result<DateTime<Utc>, GatewayError> {
        DateTime::from_timestamp(self.exp, 0)
            .ok_or_else(|| GatewayError::Signing(format!("expiry {} is out of range", self.exp)))
    }
}

/// Parse an RSA private key in PEM form.
///
/// # Errors
///
/// Returns [`GatewayError::KeyMaterial`] when the PEM is not an RSA key.
pub fn encoding_key(pem: &[u8], path: &Path) -> Result<EncodingKey, GatewayError> {
    EncodingKey::from_rsa_pem(pem).map_err(|e| GatewayError::KeyMaterial {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Read and parse the private key at `path`.
///
/// # Errors
///
/// Returns [`GatewayError::KeyMaterial`] when the file is unreadable or not a key.
pub async fn load_key(path: &Path) -> Result<EncodingKey, GatewayError> {
    let pem = tokio::fs::read(path)
        .await
        .map_err(|e| GatewayError::KeyMaterial {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    encoding_key(&pem, path)
}

/// Sign `claims` with RS256.
///
/// # Errors
///
/// Returns [`GatewayError::Signing`] when encoding fails.
pub fn sign(claims: &Claims, key: &EncodingKey) -> Result<String, GatewayError> {
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), claims, key)
        .map_err(|e| GatewayError::Signing(e.to_string()))
}
