use std::fmt;

use http::header::{HeaderName, InvalidHeaderName};

use crate::{X_ACCESS_KEY, X_SIGNATURE, X_TIMESTAMP};

/// The role a header plays in a signed request.
#[derive(Debug, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SignatureHeader {
    /// Carries the access key.
    AccessKey,
    /// Carries the bucketed timestamp.
    Timestamp,
    /// Carries the signature.
    Signature,
}

impl SignatureHeader {
    /// Every role, in the order the headers are attached.
    pub const ALL: [SignatureHeader; 3] = [
        SignatureHeader::AccessKey,
        SignatureHeader::Timestamp,
        SignatureHeader::Signature,
    ];

    /// Short name of the role, for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureHeader::AccessKey => "access key",
            SignatureHeader::Timestamp => "timestamp",
            SignatureHeader::Signature => "signature",
        }
    }
}

impl fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the three headers written by the signer and read by the verifier.
///
/// Defaults to `X-Access-Key`, `X-Timestamp` and `X-Signature`. Header names
/// are case-insensitive, and are stored in lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeaders {
    access_key: HeaderName,
    timestamp: HeaderName,
    signature: HeaderName,
}

impl Default for SignatureHeaders {
    fn default() -> Self {
        SignatureHeaders {
            access_key: X_ACCESS_KEY,
            timestamp: X_TIMESTAMP,
            signature: X_SIGNATURE,
        }
    }
}

impl SignatureHeaders {
    /// Builds a set of header names from strings.
    pub fn from_names(
        access_key: &str,
        timestamp: &str,
        signature: &str,
    ) -> Result<Self, InvalidHeaderName> {
        Ok(SignatureHeaders {
            access_key: access_key.parse()?,
            timestamp: timestamp.parse()?,
            signature: signature.parse()?,
        })
    }

    /// Returns the header name used for the given role.
    pub fn name(&self, header: SignatureHeader) -> &HeaderName {
        match header {
            SignatureHeader::AccessKey => &self.access_key,
            SignatureHeader::Timestamp => &self.timestamp,
            SignatureHeader::Signature => &self.signature,
        }
    }

    /// Overrides the header name used for the given role (in-place).
    pub fn set_name(&mut self, header: SignatureHeader, name: HeaderName) -> &mut Self {
        match header {
            SignatureHeader::AccessKey => self.access_key = name,
            SignatureHeader::Timestamp => self.timestamp = name,
            SignatureHeader::Signature => self.signature = name,
        }
        self
    }

    /// Overrides the header name used for the given role.
    pub fn with_name(mut self, header: SignatureHeader, name: HeaderName) -> Self {
        self.set_name(header, name);
        self
    }

    /// The access key header name.
    pub fn access_key(&self) -> &HeaderName {
        &self.access_key
    }
    /// The timestamp header name.
    pub fn timestamp(&self) -> &HeaderName {
        &self.timestamp
    }
    /// The signature header name.
    pub fn signature(&self) -> &HeaderName {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wire_contract() {
        let headers = SignatureHeaders::default();
        assert_eq!(headers.access_key(), "x-access-key");
        assert_eq!(headers.timestamp(), "x-timestamp");
        assert_eq!(headers.signature(), "x-signature");
    }

    #[test]
    fn names_are_case_insensitive() {
        let headers = SignatureHeaders::from_names("X-Access-Key", "X-TIMESTAMP", "x-signature")
            .unwrap();
        assert_eq!(headers, SignatureHeaders::default());
    }

    #[test]
    fn override_single_name() {
        let headers = SignatureHeaders::default().with_name(
            SignatureHeader::Signature,
            HeaderName::from_static("x-api-signature"),
        );
        assert_eq!(headers.name(SignatureHeader::Signature), "x-api-signature");
        assert_eq!(headers.name(SignatureHeader::AccessKey), "x-access-key");
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(SignatureHeaders::from_names("X Access Key", "x-timestamp", "x-signature").is_err());
    }
}
