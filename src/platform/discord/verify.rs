//! Ed25519 verification of inbound interaction requests.
//!
//! The platform signs `timestamp || body` and sends the signature and
//! timestamp in the `X-Signature-Ed25519` / `X-Signature-Timestamp` headers.

use ring::signature::{ED25519, UnparsedPublicKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

const PUBLIC_KEY_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("public key must be {PUBLIC_KEY_LEN} hex-encoded bytes")]
    BadKey,
    #[error("malformed signature header")]
    BadSignature,
    #[error("signature does not match")]
    Mismatch,
}

/// Holds the application's public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> Result<Self, VerifyError> {
        match hex::decode(public_key.trim()) {
            Ok(key) if key.len() == PUBLIC_KEY_LEN => Ok(Self { key }),
            _ => Err(VerifyError::BadKey),
        }
    }

    /// Check `signature` (hex) over `timestamp || body`.
    pub fn verify(&self, signature: &str, timestamp: &str, body: &[u8]) -> Result<(), VerifyError> {
        let signature = hex::decode(signature.trim())
            .ok()
            .filter(|s| s.len() == SIGNATURE_LEN)
            .ok_or(VerifyError::BadSignature)?;
        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);
        UnparsedPublicKey::new(&ED25519, &self.key)
            .verify(&message, &signature)
            .map_err(|_| VerifyError::Mismatch)
    }
}
