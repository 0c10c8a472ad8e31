//! HTTP Message Signatures for Open Payments requests
//!
//! Open Payments authorization and resource servers authenticate clients by
//! verifying an Ed25519 signature over selected request components
//! (RFC 9421). This module provides:
//! - Loading the client's Ed25519 key from PKCS#8 PEM
//! - `Content-Digest` (SHA-512) for request bodies
//! - Signature base construction and the `Signature` / `Signature-Input` headers
//!
//! # Covered components
//! `@method` and `@target-uri` always; `authorization` when an access token
//! is sent; `content-digest`, `content-length` and `content-type` when the
//! request has a body. The signature label is `sig1` with parameters
//! `keyid` and `created`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::{pkcs8::DecodePrivateKey, Signer, SigningKey};
use sha2::{Digest, Sha512};

use super::error::{OpenPaymentsError, OpenPaymentsResult};

/// Signature label used in `Signature-Input` and `Signature`
pub const SIGNATURE_LABEL: &str = "sig1";

/// Parse an Ed25519 private key from PKCS#8 PEM text
pub fn signing_key_from_pem(pem: &str) -> OpenPaymentsResult<SigningKey> {
    SigningKey::from_pkcs8_pem(pem.trim()).map_err(|e| OpenPaymentsError::Key(e.to_string()))
}

/// Load the signing key from a key reference.
///
/// The reference is either inline PEM text or a path to a PEM file.
pub async fn load_signing_key(reference: &str) -> OpenPaymentsResult<SigningKey> {
    if reference.trim_start().starts_with("-----BEGIN") {
        return signing_key_from_pem(reference);
    }

    let pem = tokio::fs::read_to_string(reference)
        .await
        .map_err(|e| OpenPaymentsError::Key(format!("could not read {}: {}", reference, e)))?;
    signing_key_from_pem(&pem)
}

/// `Content-Digest` header value for a body
pub fn content_digest(body: &[u8]) -> String {
    format!("sha-512=:{}:", STANDARD.encode(Sha512::digest(body)))
}

/// Request components a signature covers
#[derive(Debug, Clone)]
pub struct SignatureInput<'a> {
    pub method: &'a str,
    pub target_uri: &'a str,
    pub authorization: Option<&'a str>,
    pub body: Option<SignedBody<'a>>,
}

/// Body related components; the digest is computed by the caller
#[derive(Debug, Clone)]
pub struct SignedBody<'a> {
    pub content_digest: &'a str,
    pub content_length: usize,
    pub content_type: &'a str,
}

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureHeaders {
    pub signature: String,
    pub signature_input: String,
}

impl SignatureInput<'_> {
    fn components(&self) -> Vec<(&'static str, String)> {
        let mut components = vec![
            ("@method", self.method.to_uppercase()),
            ("@target-uri", self.target_uri.to_string()),
        ];
        if let Some(authorization) = self.authorization {
            components.push(("authorization", authorization.to_string()));
        }
        if let Some(body) = &self.body {
            components.push(("content-digest", body.content_digest.to_string()));
            components.push(("content-length", body.content_length.to_string()));
            components.push(("content-type", body.content_type.to_string()));
        }
        components
    }

    /// Value of the `@signature-params` component (without the label)
    pub fn signature_params(&self, key_id: &str, created: i64) -> String {
        let names: Vec<String> = self
            .components()
            .iter()
            .map(|(name, _)| format!("\"{}\"", name))
            .collect();
        format!("({});keyid=\"{}\";created={}", names.join(" "), key_id, created)
    }

    /// The exact bytes that get signed
    pub fn signature_base(&self, key_id: &str, created: i64) -> String {
        let mut lines: Vec<String> = self
            .components()
            .into_iter()
            .map(|(name, value)| format!("\"{}\": {}", name, value))
            .collect();
        lines.push(format!(
            "\"@signature-params\": {}",
            self.signature_params(key_id, created)
        ));
        lines.join("\n")
    }

    /// Sign the request components
    pub fn sign(&self, key: &SigningKey, key_id: &str, created: i64) -> SignatureHeaders {
        let base = self.signature_base(key_id, created);
        let signature = key.sign(base.as_bytes());

        SignatureHeaders {
            signature: format!("{}=:{}:", SIGNATURE_LABEL, STANDARD.encode(signature.to_bytes())),
            signature_input: format!(
                "{}={}",
                SIGNATURE_LABEL,
                self.signature_params(key_id, created)
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
