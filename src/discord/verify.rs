//! Ed25519 verification of incoming interaction requests

use crate::error::{BotError, Result};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

/// Checks `X-Signature-Ed25519` over `timestamp || body`
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Build from the application's hex-encoded public key
    pub fn from_hex(public_key: &str) -> Result<Self> {
        let bytes = hex::decode(public_key.trim()).map_err(|e| BotError::ConfigurationError {
            message: format!("Discord public key is not valid hex: {}", e),
        })?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| BotError::ConfigurationError {
                message: "Discord public key must be 32 bytes".to_string(),
            })?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|e| BotError::ConfigurationError {
            message: format!("Discord public key is not a valid Ed25519 key: {}", e),
        })?;

        Ok(Self { key })
    }

    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> Result<()> {
        let invalid = |reason: &str| BotError::InvalidInteraction {
            reason: reason.to_string(),
        };

        let signature_bytes: [u8; 64] = hex::decode(signature_hex)
            .map_err(|_| invalid("signature is not hex"))?
            .try_into()
            .map_err(|_| invalid("signature must be 64 bytes"))?;
        let signature = Signature::from_bytes(&signature_bytes);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| invalid("signature mismatch"))?;
        Ok(())
    }
}
