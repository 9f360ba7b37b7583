use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::algorithm::SignatureAlgorithm;
use crate::canonicalize::{RequestLike, StringToSign};
use crate::credentials::{CredentialField, Credentials};
use crate::header::{SignatureHeader, SignatureHeaders};
use crate::time::{bucket, width_secs, Clock, SystemClock};
use crate::{DefaultSignatureAlgorithm, DEFAULT_BUCKET_WIDTH};

/// This trait is to be implemented for types representing an outgoing
/// HTTP request. The HTTP signing extension methods are available on
/// any type implementing this trait.
pub trait ClientRequestLike: RequestLike {
    /// Add a header to the request. This header must be returned when
    /// `RequestLike::header` is called afterwards. An existing header
    /// with the same name is replaced.
    fn set_header(&mut self, header: HeaderName, value: HeaderValue);
}

impl<T: ClientRequestLike> ClientRequestLike for &mut T {
    fn set_header(&mut self, header: HeaderName, value: HeaderValue) {
        (**self).set_header(header, value)
    }
}

/// The types of error which may occur whilst signing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SigningError {
    /// One half of the credential pair is empty. No signing was attempted.
    #[error("The {0} is missing, fill in both the access key and the secret key")]
    MissingCredential(CredentialField),
    /// The keyed hash primitive failed.
    #[error("Signature algorithm failed: {0}")]
    Primitive(String),
    /// A computed value could not be carried in an HTTP header.
    #[error("The {0} cannot be sent as an HTTP header value")]
    InvalidHeaderValue(SignatureHeader),
    /// The time has no representable bucket.
    #[error("Time {0} is out of range")]
    TimeOutOfRange(i64),
}

impl SigningError {
    /// True if signing was refused before any cryptographic work because a
    /// credential was missing.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, SigningError::MissingCredential(_))
    }
}

/// The output of the signing engine for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedStamp {
    access_key: String,
    timestamp: i64,
    signature: String,
}

impl SignedStamp {
    /// The access key the signature was made for.
    pub fn access_key(&self) -> &str {
        &self.access_key
    }
    /// The bucketed Unix timestamp that was signed.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
    /// The base64 encoded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }
    /// The string which was signed.
    pub fn string_to_sign(&self) -> StringToSign {
        StringToSign::new(&self.access_key, self.timestamp)
    }

    /// Renders the three header values, in `SignatureHeader::ALL` order.
    /// Fails without partial output if any value is not a valid header value.
    pub fn header_values(&self) -> Result<[HeaderValue; 3], SigningError> {
        let access_key = HeaderValue::from_bytes(self.access_key.as_bytes())
            .map_err(|_| SigningError::InvalidHeaderValue(SignatureHeader::AccessKey))?;
        let timestamp = HeaderValue::from(self.timestamp);
        let signature = HeaderValue::from_str(&self.signature)
            .map_err(|_| SigningError::InvalidHeaderValue(SignatureHeader::Signature))?;
        Ok([access_key, timestamp, signature])
    }
}

/// The configuration used for signing HTTP requests.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    algorithm: Arc<dyn SignatureAlgorithm>,
    headers: SignatureHeaders,
    bucket_width: Duration,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self::new(DefaultSignatureAlgorithm::default())
    }
}

impl SigningConfig {
    /// Creates a new signing configuration using the given keyed hash.
    pub fn new<SigAlg: SignatureAlgorithm>(algorithm: SigAlg) -> Self {
        SigningConfig {
            algorithm: Arc::new(algorithm),
            headers: SignatureHeaders::default(),
            bucket_width: Duration::from_secs(DEFAULT_BUCKET_WIDTH as u64),
        }
    }

    /// Returns the signature algorithm.
    pub fn algorithm(&self) -> &dyn SignatureAlgorithm {
        &*self.algorithm
    }
    /// Returns the names of the headers the signature is written to.
    pub fn headers(&self) -> &SignatureHeaders {
        &self.headers
    }
    /// Controls the names of the headers the signature is written to (in-place).
    pub fn set_headers(&mut self, headers: SignatureHeaders) -> &mut Self {
        self.headers = headers;
        self
    }
    /// Controls the names of the headers the signature is written to.
    pub fn with_headers(mut self, headers: SignatureHeaders) -> Self {
        self.set_headers(headers);
        self
    }
    /// Returns the width of a time bucket.
    ///
    /// This is set to 60 seconds by default.
    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }
    /// Controls the width of a time bucket (in-place). Sub-second parts are
    /// ignored, and widths under one second are treated as one second.
    ///
    /// This is set to 60 seconds by default.
    pub fn set_bucket_width(&mut self, bucket_width: Duration) -> &mut Self {
        self.bucket_width = bucket_width;
        self
    }
    /// Controls the width of a time bucket. Sub-second parts are ignored, and
    /// widths under one second are treated as one second.
    ///
    /// This is set to 60 seconds by default.
    pub fn with_bucket_width(mut self, bucket_width: Duration) -> Self {
        self.set_bucket_width(bucket_width);
        self
    }

    /// The signing engine: buckets `now`, builds the string to sign, and
    /// computes the signature. Performs no I/O and reads no clock.
    pub fn sign_at(&self, credentials: &Credentials, now: i64) -> Result<SignedStamp, SigningError> {
        if let Some(field) = credentials.missing() {
            return Err(SigningError::MissingCredential(field));
        }

        let timestamp =
            bucket(now, width_secs(self.bucket_width)).ok_or(SigningError::TimeOutOfRange(now))?;
        let string_to_sign = StringToSign::new(credentials.access_key(), timestamp);
        let signature = self
            .algorithm
            .sign(credentials.secret_key().as_bytes(), string_to_sign.as_bytes())?;

        Ok(SignedStamp {
            access_key: credentials.access_key().to_owned(),
            timestamp,
            signature,
        })
    }
}

/// Signs with the default configuration: HMAC-SHA256 over
/// `"<access key>:<now rounded down to the minute>"`.
pub fn sign(access_key: &str, secret_key: &str, now: i64) -> Result<SignedStamp, SigningError> {
    SigningConfig::default().sign_at(&Credentials::new(access_key, secret_key), now)
}

/// Import this trait to get access to access the `sign` methods on all types implementing
/// `ClientRequestLike`.
pub trait SigningExt: Sized {
    /// Signs the request as of `now` and returns it.
    fn signed_at(
        mut self,
        config: &SigningConfig,
        credentials: &Credentials,
        now: i64,
    ) -> Result<Self, SigningError> {
        self.sign_at(config, credentials, now)?;
        Ok(self)
    }

    /// Signs the request as of the current system time and returns it.
    fn signed(self, config: &SigningConfig, credentials: &Credentials) -> Result<Self, SigningError> {
        self.signed_at(config, credentials, SystemClock.now())
    }

    /// Signs the request in place as of the current system time.
    fn sign(
        &mut self,
        config: &SigningConfig,
        credentials: &Credentials,
    ) -> Result<SignedStamp, SigningError> {
        self.sign_at(config, credentials, SystemClock.now())
    }

    /// Signs the request in place as of `now`. On error the request is left
    /// unmodified.
    fn sign_at(
        &mut self,
        config: &SigningConfig,
        credentials: &Credentials,
        now: i64,
    ) -> Result<SignedStamp, SigningError>;
}

impl<R: ClientRequestLike> SigningExt for R {
    fn sign_at(
        &mut self,
        config: &SigningConfig,
        credentials: &Credentials,
        now: i64,
    ) -> Result<SignedStamp, SigningError> {
        let stamp = config.sign_at(credentials, now)?;

        // Render every value before touching the request
        let values = stamp.header_values()?;
        for (which, value) in SignatureHeader::ALL.iter().zip(values.iter()) {
            self.set_header(config.headers.name(*which).clone(), value.clone());
        }

        Ok(stamp)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::Method;

    use super::*;
    use crate::mock_request::MockRequest;
    use crate::{X_ACCESS_KEY, X_SIGNATURE, X_TIMESTAMP};

    const FIXTURE_SIGNATURE: &str = "gsBwFdR05qv9tq0moO3XE/7c0bcbxqU1yuTXUi64R5I=";

    #[derive(Debug)]
    struct CountingAlgorithm(Arc<AtomicUsize>);

    impl SignatureAlgorithm for CountingAlgorithm {
        fn name(&self) -> &str {
            "counting"
        }
        fn sign(&self, _key: &[u8], _bytes_to_sign: &[u8]) -> Result<String, SigningError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("c2ln".into())
        }
    }

    #[test]
    fn known_fixture() {
        let stamp = sign("AK123", "topsecret", 1_700_000_125).unwrap();
        assert_eq!(stamp.timestamp(), 1_700_000_100);
        assert_eq!(stamp.string_to_sign().as_str(), "AK123:1700000100");
        assert_eq!(stamp.signature(), FIXTURE_SIGNATURE);
    }

    #[test]
    fn same_bucket_same_signature() {
        let first = sign("AK123", "topsecret", 1_700_000_100).unwrap();
        for now in 1_700_000_100..1_700_000_160 {
            assert_eq!(sign("AK123", "topsecret", now).unwrap(), first);
        }
    }

    #[test]
    fn next_bucket_changes_everything() {
        let before = sign("AK123", "topsecret", 1_700_000_159).unwrap();
        let after = sign("AK123", "topsecret", 1_700_000_160).unwrap();
        assert_eq!(after.timestamp(), 1_700_000_160);
        assert_ne!(before.timestamp(), after.timestamp());
        assert_ne!(before.signature(), after.signature());
        assert_eq!(
            after.signature(),
            "JbNFHC8pE/s5xxrhueJTiDtUKTZN8qOYg/sjDkdTRwU="
        );
    }

    #[test]
    fn empty_credentials_skip_the_primitive() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = SigningConfig::new(CountingAlgorithm(calls.clone()));

        let err = config
            .sign_at(&Credentials::new("", "topsecret"), 1_700_000_125)
            .unwrap_err();
        assert_eq!(err, SigningError::MissingCredential(CredentialField::AccessKey));
        let err = config
            .sign_at(&Credentials::new("AK123", ""), 1_700_000_125)
            .unwrap_err();
        assert_eq!(err, SigningError::MissingCredential(CredentialField::SecretKey));
        assert!(err.is_missing_credential());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        config
            .sign_at(&Credentials::new("AK123", "topsecret"), 1_700_000_125)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_bucket_width() {
        let config = SigningConfig::default().with_bucket_width(Duration::from_secs(3600));
        let stamp = config
            .sign_at(&Credentials::new("AK123", "topsecret"), 1_700_000_125)
            .unwrap();
        assert_eq!(stamp.timestamp(), 1_699_999_200);
    }

    #[test]
    fn sets_three_headers() {
        let credentials = Credentials::new("AK123", "topsecret");
        let req = MockRequest::new(Method::POST, "http://test.com/foo/bar")
            .with_body(br#"{ "x": 1, "y": 2}"#.to_vec())
            .signed_at(&SigningConfig::default(), &credentials, 1_700_000_125)
            .unwrap();

        assert_eq!(req.header(&X_ACCESS_KEY).unwrap(), "AK123");
        assert_eq!(req.header(&X_TIMESTAMP).unwrap(), "1700000100");
        assert_eq!(req.header(&X_SIGNATURE).unwrap(), FIXTURE_SIGNATURE);
        assert_eq!(req.body(), Some(&br#"{ "x": 1, "y": 2}"#[..]));
        assert_eq!(req.path(), "/foo/bar");
    }

    #[test]
    fn custom_header_names() {
        let headers = SignatureHeaders::from_names("ak", "ts", "sig").unwrap();
        let config = SigningConfig::default().with_headers(headers);
        let req = MockRequest::new(Method::GET, "http://test.com/")
            .signed_at(&config, &Credentials::new("AK123", "topsecret"), 1_700_000_125)
            .unwrap();

        assert_eq!(req.header(&HeaderName::from_static("sig")).unwrap(), FIXTURE_SIGNATURE);
        assert!(!req.has_header(&X_SIGNATURE));
    }

    #[test]
    fn unicode_access_key_is_sent_as_utf8() {
        let req = MockRequest::new(Method::GET, "http://test.com/")
            .signed_at(
                &SigningConfig::default(),
                &Credentials::new("clé-🔑", "topsecret"),
                1_700_000_125,
            )
            .unwrap();
        assert_eq!(
            req.header(&X_ACCESS_KEY).unwrap().as_bytes(),
            "clé-🔑".as_bytes()
        );
    }

    #[test]
    fn unicode_keys_are_signed_as_utf8() {
        let stamp = SigningConfig::default()
            .sign_at(&Credentials::new("clé-🔑", "sécret-🔑"), 1_700_000_125)
            .unwrap();
        assert_eq!(stamp.string_to_sign().as_str(), "clé-🔑:1700000100");
        assert_eq!(
            stamp.signature(),
            "Due3yuOA1sqsEv8YrBfW/kXcoiokm0lyqNI9ldHVp20="
        );
    }

    #[test]
    fn earliest_instant_is_refused() {
        assert_eq!(
            sign("AK123", "topsecret", i64::MIN),
            Err(SigningError::TimeOutOfRange(i64::MIN))
        );
    }

    #[test]
    fn unsendable_access_key_leaves_request_untouched() {
        let original = MockRequest::new(Method::GET, "http://test.com/");
        let mut req = original.clone();
        let err = req
            .sign_at(
                &SigningConfig::default(),
                &Credentials::new("AK\n123", "topsecret"),
                1_700_000_125,
            )
            .unwrap_err();
        assert_eq!(err, SigningError::InvalidHeaderValue(SignatureHeader::AccessKey));
        assert_eq!(req, original);
    }
}
