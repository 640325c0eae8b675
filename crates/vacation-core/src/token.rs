//! Bearer token decoding and credential derivation
//!
//! Callers present a JWT issued by the vault service. The gateway needs the
//! payload (downstream base URL, user identifier) and a credential derived from
//! it. Signature verification only happens when a signing secret is configured;
//! without one the payload is trusted on decode.

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use hmac::{digest::KeyInit, Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sha2::{Sha256, Sha384, Sha512};
use thiserror::Error;
use tracing::debug;
use zeroize::Zeroizing;

/// Token validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid or malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token validation failed: {0}")]
    Internal(String),
}

impl TokenError {
    /// Whether this failure is the caller's fault (401) rather than ours (500)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, TokenError::Internal(_))
    }
}

/// Claims carried by a vault-issued token
///
/// Every field is optional: a token that decodes to a JSON object is accepted.
/// Missing values, and values of an unexpected type, read as `None` and fall
/// through to configured fallbacks downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPayload {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub vault_name: Option<String>,
    /// Downstream API base URL
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Opaque key object; `identifier` is the downstream user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub access_time: Option<String>,
    #[serde(default, deserialize_with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, deserialize_with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Unix seconds; fractional values are truncated
fn timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    })
}

impl TokenPayload {
    /// `key.identifier`, accepting either a string or a number
    pub fn user_identifier(&self) -> Option<String> {
        match self.key.as_ref()?.get("identifier")? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether `exp` lies strictly before `now` (unix seconds)
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if exp < now)
    }
}

/// Secret presented to the downstream API, derived from the token payload
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedCredential(String);

impl DerivedCredential {
    /// The raw credential value (sent as `x-api-token`)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for DerivedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedCredential([REDACTED])")
    }
}

/// Claims feeding the derived credential, serialized in this order
const CREDENTIAL_CLAIMS: [&str; 4] = ["vaultId", "vaultName", "link", "iat"];

/// Derive the downstream credential: base64(JSON{vaultId, vaultName, link, iat})
///
/// Pure function of those four fields.
pub fn derive_credential(payload: &TokenPayload) -> Result<DerivedCredential, TokenError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(claims)) => credential_from_claims(&claims),
        Ok(_) => Err(TokenError::Internal("payload is not an object".to_string())),
        Err(e) => Err(TokenError::Internal(e.to_string())),
    }
}

/// Credential over the raw claim values, whatever their JSON type
fn credential_from_claims(claims: &Map<String, Value>) -> Result<DerivedCredential, TokenError> {
    let seed: Map<String, Value> = CREDENTIAL_CLAIMS
        .iter()
        .filter_map(|name| claims.get(*name).map(|v| (name.to_string(), v.clone())))
        .collect();
    let json = serde_json::to_vec(&seed).map_err(|e| TokenError::Internal(e.to_string()))?;
    Ok(DerivedCredential(STANDARD.encode(json)))
}

/// Validated caller identity, threaded through a single request
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub payload: TokenPayload,
    pub credential: DerivedCredential,
}

/// HMAC secret for verifying token signatures
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

#[derive(Debug, Deserialize)]
struct TokenHeader {
    #[serde(default)]
    alg: Option<String>,
}

/// Validate a bearer token against the current clock
pub fn validate_token(
    token: &str,
    secret: Option<&SigningSecret>,
) -> Result<CallerContext, TokenError> {
    validate_token_at(token, secret, chrono::Utc::now().timestamp())
}

/// Validate a bearer token at an explicit `now` (unix seconds)
///
/// Order: decode, expiry, signature (only when `secret` is given).
pub fn validate_token_at(
    token: &str,
    secret: Option<&SigningSecret>,
    now: i64,
) -> Result<CallerContext, TokenError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        debug!(
            segments = segments.len(),
            "[Token] Expected header.payload.signature"
        );
        return Err(TokenError::Malformed);
    };

    let header: TokenHeader =
        serde_json::from_value(Value::Object(decode_segment(header_b64)?))
            .map_err(|_| TokenError::Malformed)?;
    let claims = decode_segment(payload_b64)?;
    let payload: TokenPayload = serde_json::from_value(Value::Object(claims.clone()))
        .map_err(|_| TokenError::Malformed)?;

    if payload.is_expired_at(now) {
        debug!(exp = ?payload.exp, now, "[Token] Expired");
        return Err(TokenError::Expired);
    }

    if let Some(secret) = secret {
        let signature = base64_url_decode(signature_b64).ok_or(TokenError::BadSignature)?;
        let signing_input = format!("{}.{}", header_b64, payload_b64);
        let alg = header.alg.as_deref().unwrap_or("none");
        if !verify_signature(alg, signing_input.as_bytes(), &signature, secret.as_bytes()) {
            debug!(alg, "[Token] Signature verification failed");
            return Err(TokenError::BadSignature);
        }
    }

    let credential = credential_from_claims(&claims)?;
    Ok(CallerContext {
        payload,
        credential,
    })
}

/// Sign `payload` as an HS256 JWT
pub fn issue_token(payload: &TokenPayload, secret: &SigningSecret) -> Result<String, TokenError> {
    let header = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let header_b64 = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_json =
        serde_json::to_vec(payload).map_err(|e| TokenError::Internal(e.to_string()))?;
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json);

    let signing_input = format!("{}.{}", header_b64, payload_b64);
    let mut mac = <Hmac<Sha256> as KeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|e| TokenError::Internal(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

/// Base64url JSON object segment
fn decode_segment(segment: &str) -> Result<Map<String, Value>, TokenError> {
    let bytes = base64_url_decode(segment).ok_or(TokenError::Malformed)?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(TokenError::Malformed),
    }
}

fn verify_signature(alg: &str, input: &[u8], signature: &[u8], secret: &[u8]) -> bool {
    match alg {
        "HS256" => verify_hmac::<Hmac<Sha256>>(secret, input, signature),
        "HS384" => verify_hmac::<Hmac<Sha384>>(secret, input, signature),
        "HS512" => verify_hmac::<Hmac<Sha512>>(secret, input, signature),
        _ => false,
    }
}

fn verify_hmac<M: Mac + KeyInit>(secret: &[u8], input: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = <M as KeyInit>::new_from_slice(secret) else {
        return false;
    };
    mac.update(input);
    mac.verify_slice(signature).is_ok()
}

/// Base64 URL-safe decoding, tolerating trailing padding
fn base64_url_decode(s: &str) -> Option<Vec<u8>> {
    if s.is_empty() {
        return None;
    }
    URL_SAFE_NO_PAD.decode(s.trim_end_matches('=')).ok()
}
