//! Identity
//!
//! Resolves the caller's user id from the `Authorization` header. Bearer
//! tokens are HS256 JWTs issued by the auth service; the signature is
//! checked against the shared secret before the `sub` claim is trusted.
//! Without a configured secret every caller is rejected.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::utils::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Opaque user identifier
pub type UserId = String;

/// Maps an `Authorization` header to a user
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, authorization_header: Option<&str>) -> Option<UserId>;
}

/// Identity provider used when no token secret is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledIdentity;

impl IdentityProvider for DisabledIdentity {
    fn identify(&self, _authorization_header: Option<&str>) -> Option<UserId> {
        None
    }
}

/// HS256 bearer-token identity.
///
/// Accepts `Bearer <header>.<payload>.<signature>` where the header names
/// `HS256`, the signature matches the shared secret and `exp` (when
/// present) lies in the future. The user id is the `sub` claim.
#[derive(Clone)]
pub struct JwtIdentity {
    mac: HmacSha256,
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
    exp: Option<i64>,
}

impl JwtIdentity {
    pub fn new(secret: &str) -> AppResult<Self> {
        if secret.trim().is_empty() {
            return Err(AppError::config("JWT secret cannot be empty"));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::config(format!("Invalid JWT secret: {}", e)))?;
        Ok(Self { mac })
    }

    /// Issue a token for `claims` signed with this secret.
    pub fn sign(&self, claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header, payload);

        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", signing_input, signature)
    }

    fn verify(&self, token: &str) -> Option<UserId> {
        let mut parts = token.split('.');
        let (header, payload, signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let jwt_header: JwtHeader = serde_json::from_slice(&decode_segment(header)?).ok()?;
        if jwt_header.alg != "HS256" {
            return None;
        }

        let mut mac = self.mac.clone();
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&decode_segment(signature)?).ok()?;

        let claims: Claims = serde_json::from_slice(&decode_segment(payload)?).ok()?;
        if let Some(exp) = claims.exp {
            if exp <= chrono::Utc::now().timestamp() {
                return None;
            }
        }
        claims.sub.filter(|sub| !sub.trim().is_empty())
    }
}

impl IdentityProvider for JwtIdentity {
    fn identify(&self, authorization_header: Option<&str>) -> Option<UserId> {
        let header = authorization_header?.trim();
        let (scheme, token) = header.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        self.verify(token)
    }
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    // Some issuers keep the base64 padding.
    URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')).ok()
}
