//! OCI HTTP request signatures.
//!
//! Every Identity API request carries an `Authorization` header of the form
//!
//! ```text
//! Signature version="1",keyId="<tenancy>/<user>/<fingerprint>",algorithm="rsa-sha256",
//!     headers="date (request-target) host",signature="<base64>"
//! ```
//!
//! where the signature is RSA-SHA256 (PKCS#1 v1.5) over the signed headers,
//! one `name: value` line each, joined with `\n`. Only `GET` requests are
//! issued, so no body headers are signed.

use std::fmt;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;

use crate::error::{OciError, OciResult};
use crate::profile::OciProfile;

/// Headers covered by the signature, in signing order.
pub const SIGNED_HEADERS: &str = "date (request-target) host";

/// Signs requests on behalf of one API key.
#[derive(Clone)]
pub struct RequestSigner {
    key_id: String,
    signing_key: SigningKey<Sha256>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(key_id: impl Into<String>, private_key: RsaPrivateKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key: SigningKey::<Sha256>::new(private_key),
        }
    }

    /// Build a signer from a PEM-encoded PKCS#8 or PKCS#1 RSA key.
    ///
    /// `source` names the key in error messages.
    pub fn from_pem(key_id: impl Into<String>, pem: &str, source: &str) -> OciResult<Self> {
        if pem.contains("ENCRYPTED") {
            return Err(OciError::private_key(
                source,
                "encrypted private keys are not supported; provide an unencrypted key",
            ));
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| OciError::private_key(source, e.to_string()))?;

        Ok(Self::new(key_id, private_key))
    }

    /// Build a signer from the key file referenced by `profile`.
    pub fn from_profile(profile: &OciProfile) -> OciResult<Self> {
        if profile.pass_phrase.is_some() {
            return Err(OciError::configuration(format!(
                "Profile {} sets pass_phrase; encrypted private keys are not supported",
                profile.name
            )));
        }
        Self::from_key_file(profile.key_id(), &profile.key_file)
    }

    pub fn from_key_file(key_id: impl Into<String>, path: &Path) -> OciResult<Self> {
        let source = path.display().to_string();
        let pem = std::fs::read_to_string(path)
            .map_err(|e| OciError::private_key(&source, e.to_string()))?;
        Self::from_pem(key_id, &pem, &source)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The text that gets signed for a request.
    ///
    /// `method` is lower-cased; `target` is the path plus query string.
    pub fn signing_string(date: &str, method: &str, target: &str, host: &str) -> String {
        format!(
            "date: {date}\n(request-target): {} {target}\nhost: {host}",
            method.to_lowercase()
        )
    }

    /// Value for the `Authorization` header of a request.
    pub fn authorization(
        &self,
        date: &str,
        method: &str,
        target: &str,
        host: &str,
    ) -> OciResult<String> {
        let signing_string = Self::signing_string(date, method, target, host);
        let signature = self
            .signing_key
            .try_sign(signing_string.as_bytes())
            .map_err(|e| OciError::signing(e.to_string()))?;

        Ok(format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{SIGNED_HEADERS}\",signature=\"{}\"",
            self.key_id,
            STANDARD.encode(signature.to_bytes())
        ))
    }
}
