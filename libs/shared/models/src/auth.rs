use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims carried by an access token. `email` is the identity key; anything
/// else the client submitted at login rides along in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub email: Option<String>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The authenticated principal resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub issued_at: Option<u64>,
    pub expires_at: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}
