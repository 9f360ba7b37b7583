use std::fmt::Debug;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::signing::SigningError;

/// Implementations of this trait provide the keyed hash used to sign the
/// string-to-sign. Unlike a fixed-key signer, the key is supplied on every
/// call because it comes from the caller's credentials at send time.
///
/// The algorithm name is never transmitted: both sides must be configured
/// with the same algorithm.
pub trait SignatureAlgorithm: Debug + Send + Sync + 'static {
    /// A short, human readable name for the algorithm, used in diagnostics.
    fn name(&self) -> &str;
    /// Returns the encoded signature, ready for inclusion in the `X-Signature`
    /// header.
    fn sign(&self, key: &[u8], bytes_to_sign: &[u8]) -> Result<String, SigningError>;
    /// Returns true if the signature is valid for the provided content. The
    /// default implementation re-signs the content and compares the encoded
    /// forms in constant time.
    fn verify(&self, key: &[u8], bytes_to_verify: &[u8], signature: &str) -> bool {
        match self.sign(key, bytes_to_verify) {
            Ok(expected_signature) => expected_signature
                .as_bytes()
                .ct_eq(signature.as_bytes())
                .into(),
            Err(_) => false,
        }
    }
}

/// HMAC-SHA256, encoded as standard padded base64.
#[derive(Debug, Default, Copy, Clone)]
pub struct HmacSha256;

impl SignatureAlgorithm for HmacSha256 {
    fn name(&self) -> &str {
        "hmac-sha256"
    }
    fn sign(&self, key: &[u8], bytes_to_sign: &[u8]) -> Result<String, SigningError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| SigningError::Primitive(e.to_string()))?;
        mac.update(bytes_to_sign);
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}
