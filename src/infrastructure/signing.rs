//! Request signing for the exchange's private endpoints.
//!
//! The signature scheme is fixed by the exchange:
//! `base64( HMAC-SHA512( secret, path ++ SHA256(nonce ++ post_body) ) )`
//! where `secret` is the base64-decoded API secret and `path` is the full
//! endpoint path including the private prefix. Signing is a pure function
//! of its inputs.

use crate::domain::errors::SigningError;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

type HmacSha512 = Hmac<Sha512>;

/// API credentials. The secret is decoded once at construction and held
/// zeroized; an undecodable secret is fatal at startup, not per call.
pub struct Credentials {
    key: String,
    secret: Zeroizing<Vec<u8>>,
}

impl Credentials {
    pub fn new(key: impl Into<String>, base64_secret: &str) -> Result<Self, SigningError> {
        let secret = general_purpose::STANDARD
            .decode(base64_secret)
            .map_err(|e| SigningError::InvalidSecret(e.to_string()))?;
        Ok(Credentials {
            key: key.into(),
            secret: Zeroizing::new(secret),
        })
    }

    /// Value for the `API-Key` header.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value for the `API-Sign` header of one private request.
    pub fn sign(&self, path: &str, nonce: u64, post_body: &str) -> Result<String, SigningError> {
        sign_request(path, nonce, post_body, &self.secret)
    }
}

/// Compute the request signature. Deterministic: identical inputs always
/// produce the identical signature.
pub fn sign_request(
    path: &str,
    nonce: u64,
    post_body: &str,
    secret: &[u8],
) -> Result<String, SigningError> {
    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(post_body.as_bytes());
    let digest = sha.finalize();

    let mut mac =
        HmacSha512::new_from_slice(secret).map_err(|e| SigningError::Hmac(e.to_string()))?;
    mac.update(path.as_bytes());
    mac.update(&digest);
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
