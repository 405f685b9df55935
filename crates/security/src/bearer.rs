//! Bearer-token issuance and verification.
//!
//! HS256 only — an unsigned (`alg: none`) or asymmetrically signed token is
//! rejected even if otherwise well-formed, closing the "Open Question" in
//! spec.md §9 (the router does not reproduce a placeholder validator that
//! skips signature verification).
//!
//! Derives its HMAC-SHA256 usage from the same `hmac`+`sha2` crate pairing
//! the teacher uses for `SecretsManager`'s key derivation
//! (`rustedclaw-security::secrets`), applied here to message authentication
//! instead of key stretching.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Minimum secret length the router accepts at startup (spec.md §3, §6).
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BearerError {
    #[error("Authorization header is required")]
    MissingHeader,
    #[error("Invalid authorization header format")]
    MalformedHeader,
    #[error("Invalid or expired token")]
    InvalidOrExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// The verified claim set extracted from a valid bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: u64,
    pub email: String,
    pub role: String,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

/// Issue an HS256 bearer token. Used by tests (and by any tooling that
/// needs to mint a token for a diagnostic call); the Identity service is
/// the production issuer.
pub fn issue(secret: &[u8], claims: &Claims) -> String {
    let header = Header {
        alg: "HS256".into(),
        typ: "JWT".into(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).expect("header encodes"));
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims encode"));
    let signing_input = format!("{header_b64}.{claims_b64}");
    let sig = sign(secret, signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(sig);
    format!("{signing_input}.{sig_b64}")
}

fn sign(secret: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Verify a bearer token against `secret`, returning its claims on success.
///
/// Steps, per spec.md §4.3:
/// 1. three dot-separated segments
/// 2. header's `alg` must be a symmetric HMAC variant (only `HS256` here)
/// 3. signature verifies
/// 4. `exp` strictly greater than `now`; `nbf` (if present) ≤ `now`
pub fn verify(secret: &[u8], token: &str, now: i64) -> Result<Claims, BearerError> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(claims_b64), Some(sig_b64)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(BearerError::MalformedHeader);
    };
    if parts.next().is_some() {
        return Err(BearerError::MalformedHeader);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64)
        .map_err(|_| BearerError::MalformedHeader)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| BearerError::MalformedHeader)?;
    if header.alg != "HS256" {
        // Rejects "none" and any asymmetric algorithm (RS*, ES*, ...).
        return Err(BearerError::InvalidOrExpired);
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| BearerError::MalformedHeader)?;
    let claims: Claims =
        serde_json::from_slice(&claims_bytes).map_err(|_| BearerError::MalformedHeader)?;

    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| BearerError::MalformedHeader)?;

    let signing_input = format!("{header_b64}.{claims_b64}");
    let expected = sign(secret, signing_input.as_bytes());
    if expected.ct_eq(&sig).unwrap_u8() != 1 {
        return Err(BearerError::InvalidOrExpired);
    }

    if claims.exp <= now {
        return Err(BearerError::InvalidOrExpired);
    }
    if let Some(nbf) = claims.nbf {
        if nbf > now {
            return Err(BearerError::InvalidOrExpired);
        }
    }

    Ok(claims)
}

/// Parse the `Authorization` header value, requiring exactly two
/// space-separated tokens with a case-insensitive `bearer` scheme.
pub fn parse_authorization_header(value: &str) -> Result<&str, BearerError> {
    let mut parts = value.splitn(2, ' ');
    let (Some(scheme), Some(token)) = (parts.next(), parts.next()) else {
        return Err(BearerError::MalformedHeader);
    };
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(BearerError::MalformedHeader);
    }
    Ok(token)
}
