use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Map, Value};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

use shared_models::auth::{Identity, JwtClaims};

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token secret is not set")]
    MissingSecret,

    #[error("Invalid token format")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Invalid claims format")]
    InvalidClaims,

    #[error("Token expired")]
    Expired,

    #[error("Token claims carry no email")]
    MissingEmail,
}

fn sign(signing_input: &str, secret: &str) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| TokenError::MissingSecret)?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Issues an HS256 token embedding `claims`, stamped with `iat` and `exp`.
pub fn issue_token(claims: Map<String, Value>, secret: &str, ttl_hours: i64) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    if !claims.get("email").is_some_and(Value::is_string) {
        return Err(TokenError::MissingEmail);
    }

    let now = Utc::now();
    let mut payload = claims;
    payload.insert("iat".to_string(), json!(now.timestamp()));
    payload.insert("exp".to_string(), json!((now + Duration::hours(ttl_hours)).timestamp()));

    let header = json!({ "alg": "HS256", "typ": "JWT" });
    let header_encoded = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload_encoded = URL_SAFE_NO_PAD.encode(Value::Object(payload).to_string());

    let signing_input = format!("{}.{}", header_encoded, payload_encoded);
    let signature = sign(&signing_input, secret)?;

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

/// Convenience for the common case of a token that only names its holder.
pub fn issue_email_token(email: &str, secret: &str, ttl_hours: i64) -> Result<String, TokenError> {
    let mut claims = Map::new();
    claims.insert("email".to_string(), json!(email));
    issue_token(claims, secret, ttl_hours)
}

pub fn validate_token(token: &str, secret: &str) -> Result<Identity, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        TokenError::Malformed
    })?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| TokenError::MissingSecret)?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());

    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(TokenError::BadSignature);
    }

    let claims_json = URL_SAFE_NO_PAD.decode(claims_b64)
        .map_err(|_| TokenError::InvalidClaims)?;

    let claims: JwtClaims = serde_json::from_slice(&claims_json).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        TokenError::InvalidClaims
    })?;

    if let Some(exp) = claims.exp {
        let now = Utc::now().timestamp() as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err(TokenError::Expired);
        }
    }

    let email = claims.email.ok_or(TokenError::MissingEmail)?;

    debug!("Token validated successfully for {}", email);
    Ok(Identity {
        email,
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}
