use std::fmt;

use http::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::header::{SignatureHeader, SignatureHeaders};

/// The types of error which may occur whilst recovering the "string to sign"
/// from a request that has already been signed.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CanonicalizeError {
    /// A header required to rebuild the string to sign was absent or was not
    /// valid UTF-8.
    #[error("Missing or unreadable {0} header")]
    MissingHeader(SignatureHeader),
    /// The timestamp header was not a base-10 integer.
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),
}

/// Base trait for all request types
pub trait RequestLike {
    /// Returns an existing header on the request. This method *must* reflect changes made
    /// by the `ClientRequestLike::set_header` method.
    fn header(&self, header: &HeaderName) -> Option<HeaderValue>;

    /// Returns true if this request contains a value for the specified header. If this
    /// returns true, following requests to `header()` for the same name must return a
    /// value.
    fn has_header(&self, header: &HeaderName) -> bool {
        self.header(header).is_some()
    }
}

impl<T: RequestLike> RequestLike for &T {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        (**self).header(header)
    }
}

impl<T: RequestLike> RequestLike for &mut T {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        (**self).header(header)
    }
}

/// The exact bytes covered by a signature: `"<access key>:<timestamp>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToSign {
    content: String,
    split: usize,
    timestamp: i64,
}

impl StringToSign {
    /// Builds the string to sign for an access key and an already bucketed
    /// timestamp.
    pub fn new(access_key: &str, timestamp: i64) -> Self {
        StringToSign {
            content: format!("{}:{}", access_key, timestamp),
            split: access_key.len(),
            timestamp,
        }
    }

    /// Obtain a view of this string to sign as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
    /// Obtain a view of this string to sign as a string slice
    pub fn as_str(&self) -> &str {
        &self.content
    }
    /// The access key part.
    pub fn access_key(&self) -> &str {
        &self.content[..self.split]
    }
    /// The timestamp part.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

impl fmt::Display for StringToSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.content)
    }
}

impl From<StringToSign> for Vec<u8> {
    fn from(other: StringToSign) -> Self {
        other.content.into_bytes()
    }
}

/// Extension method for recovering the "string to sign" from a signed request.
pub trait CanonicalizeExt {
    /// Rebuild the string to sign from the access key and timestamp headers
    /// of this request.
    fn canonicalize(&self, headers: &SignatureHeaders) -> Result<StringToSign, CanonicalizeError>;
}

fn header_str<T: RequestLike + ?Sized>(
    req: &T,
    headers: &SignatureHeaders,
    which: SignatureHeader,
) -> Result<String, CanonicalizeError> {
    req.header(headers.name(which))
        .and_then(|value| String::from_utf8(value.as_bytes().to_vec()).ok())
        .ok_or(CanonicalizeError::MissingHeader(which))
}

impl<T: RequestLike> CanonicalizeExt for T {
    fn canonicalize(&self, headers: &SignatureHeaders) -> Result<StringToSign, CanonicalizeError> {
        let access_key = header_str(self, headers, SignatureHeader::AccessKey)?;
        let timestamp = header_str(self, headers, SignatureHeader::Timestamp)?;

        // Only plain decimal digits with an optional minus sign, as produced by the signer
        let digits = timestamp.strip_prefix('-').unwrap_or(&timestamp);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CanonicalizeError::MalformedTimestamp(timestamp));
        }
        let parsed = timestamp
            .parse::<i64>()
            .map_err(|_| CanonicalizeError::MalformedTimestamp(timestamp.clone()))?;

        // Re-render so that non-canonical forms (leading zeros) don't verify
        let string_to_sign = StringToSign::new(&access_key, parsed);
        if string_to_sign.as_str()[access_key.len() + 1..] != timestamp {
            return Err(CanonicalizeError::MalformedTimestamp(timestamp));
        }
        Ok(string_to_sign)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::mock_request::MockRequest;

    fn request(access_key: &str, timestamp: &str) -> MockRequest {
        MockRequest::new(Method::GET, "http://example.com/foo")
            .with_header("X-Access-Key", access_key)
            .with_header("X-Timestamp", timestamp)
    }

    #[test]
    fn builds_colon_separated_string() {
        let s = StringToSign::new("AK123", 1_700_000_100);
        assert_eq!(s.as_str(), "AK123:1700000100");
        assert_eq!(s.access_key(), "AK123");
        assert_eq!(s.timestamp(), 1_700_000_100);
    }

    #[test]
    fn access_key_may_contain_colons() {
        let s = StringToSign::new("tenant:AK123", 60);
        assert_eq!(s.as_str(), "tenant:AK123:60");
        assert_eq!(s.access_key(), "tenant:AK123");
    }

    #[test]
    fn recovers_from_headers() {
        let s = request("AK123", "1700000100")
            .canonicalize(&SignatureHeaders::default())
            .unwrap();
        assert_eq!(s, StringToSign::new("AK123", 1_700_000_100));
    }

    #[test]
    fn missing_timestamp() {
        let req = MockRequest::new(Method::GET, "http://example.com/foo")
            .with_header("X-Access-Key", "AK123");
        assert_eq!(
            req.canonicalize(&SignatureHeaders::default()),
            Err(CanonicalizeError::MissingHeader(SignatureHeader::Timestamp))
        );
    }

    #[test]
    fn rejects_non_canonical_timestamps() {
        for bad in &["", "+1700000100", "01700000100", "1700000100.0", "abc", "-"] {
            assert!(
                request("AK123", bad)
                    .canonicalize(&SignatureHeaders::default())
                    .is_err(),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
