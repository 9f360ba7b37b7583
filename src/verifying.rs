use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::algorithm::SignatureAlgorithm;
use crate::canonicalize::{CanonicalizeError, CanonicalizeExt, RequestLike};
use crate::header::{SignatureHeader, SignatureHeaders};
use crate::time::{bucket, width_secs, Clock, SystemClock};
use crate::{DefaultSignatureAlgorithm, DEFAULT_BUCKET_WIDTH};

/// This error indicates that we failed to verify the request. As a result
/// the request should be ignored.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum VerifyingError {
    /// One of the signature headers was absent or not valid UTF-8.
    #[error("Missing or unreadable {0} header")]
    MissingHeader(SignatureHeader),
    /// The timestamp header was not a canonical base-10 integer.
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),
    /// The timestamp does not sit on a bucket boundary, so no signer produced it.
    #[error("Timestamp {0} is not aligned to a bucket boundary")]
    UnalignedTimestamp(i64),
    /// The timestamp is older than the accepted window.
    #[error("Timestamp {timestamp} has expired, oldest accepted is {oldest}")]
    Expired {
        /// The received timestamp.
        timestamp: i64,
        /// The oldest timestamp that would have been accepted.
        oldest: i64,
    },
    /// The timestamp lies in a bucket that hasn't started yet, even allowing
    /// for clock leeway.
    #[error("Timestamp {timestamp} is in the future, newest accepted is {newest}")]
    FromTheFuture {
        /// The received timestamp.
        timestamp: i64,
        /// The newest timestamp that would have been accepted.
        newest: i64,
    },
    /// No secret is known for the access key.
    #[error("Unknown access key")]
    UnknownAccessKey,
    /// The signature does not match.
    #[error("Signature mismatch")]
    BadSignature,
}

impl From<CanonicalizeError> for VerifyingError {
    fn from(other: CanonicalizeError) -> Self {
        match other {
            CanonicalizeError::MissingHeader(h) => VerifyingError::MissingHeader(h),
            CanonicalizeError::MalformedTimestamp(t) => VerifyingError::MalformedTimestamp(t),
        }
    }
}

/// The verification process will use this trait to find the secret key
/// belonging to an access key.
///
/// You do not need to implement this yourself: the `SimpleKeyProvider` type provides an
/// key store that should be suitable for many situations.
pub trait KeyProvider: Debug + Send + Sync + 'static {
    /// Given an access key, return the matching secret key. Returns `None`
    /// if the access key is unknown.
    fn provide_secret(&self, access_key: &str) -> Option<&[u8]>;
}

/// Implementation of a simple key store, mapping access keys to secret keys.
#[derive(Default, Clone)]
pub struct SimpleKeyProvider {
    keys: HashMap<String, Vec<u8>>,
}

impl Debug for SimpleKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SimpleKeyProvider")
            .field("access_keys", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SimpleKeyProvider {
    /// Initializes the key store from a list of access keys and secret keys.
    pub fn new<I, A, S>(key_iter: I) -> Self
    where
        I: IntoIterator<Item = (A, S)>,
        A: Into<String>,
        S: Into<Vec<u8>>,
    {
        Self {
            keys: key_iter
                .into_iter()
                .map(|(access_key, secret)| (access_key.into(), secret.into()))
                .collect(),
        }
    }

    /// Adds a key to the key store, replacing any previous secret for the
    /// same access key.
    pub fn add<S: Into<Vec<u8>>>(&mut self, access_key: &str, secret: S) {
        self.keys.insert(access_key.into(), secret.into());
    }
    /// Clears all keys from the key store
    pub fn clear(&mut self) {
        self.keys.clear();
    }
    /// Removes the key with the specified access key from the key store
    pub fn remove(&mut self, access_key: &str) {
        self.keys.remove(access_key);
    }
}

impl KeyProvider for SimpleKeyProvider {
    fn provide_secret(&self, access_key: &str) -> Option<&[u8]> {
        self.keys.get(access_key).map(Vec::as_slice)
    }
}

/// The configuration used for verifying HTTP requests.
///
/// A request is accepted when its timestamp names the verifier's current
/// bucket or one of the `previous_buckets` before it. A signer whose clock
/// runs up to `clock_leeway` ahead of ours may also be in the next bucket.
#[derive(Debug, Clone)]
pub struct VerifyingConfig {
    key_provider: Arc<dyn KeyProvider>,
    algorithm: Arc<dyn SignatureAlgorithm>,
    headers: SignatureHeaders,
    bucket_width: Duration,
    previous_buckets: u32,
    clock_leeway: Duration,
}

impl VerifyingConfig {
    /// Creates a new verifying configuration using the given key provider.
    pub fn new<KP: KeyProvider>(key_provider: KP) -> Self {
        VerifyingConfig {
            key_provider: Arc::new(key_provider),
            algorithm: Arc::new(DefaultSignatureAlgorithm::default()),
            headers: SignatureHeaders::default(),
            bucket_width: Duration::from_secs(DEFAULT_BUCKET_WIDTH as u64),
            previous_buckets: 1,
            clock_leeway: Duration::from_secs(30),
        }
    }

    /// Returns the key provider.
    pub fn key_provider(&self) -> &dyn KeyProvider {
        &*self.key_provider
    }
    /// Returns the signature algorithm.
    pub fn algorithm(&self) -> &dyn SignatureAlgorithm {
        &*self.algorithm
    }
    /// Sets the signature algorithm.
    pub fn with_algorithm<SigAlg: SignatureAlgorithm>(mut self, algorithm: SigAlg) -> Self {
        self.algorithm = Arc::new(algorithm);
        self
    }
    /// Returns the names of the headers the signature is read from.
    pub fn headers(&self) -> &SignatureHeaders {
        &self.headers
    }
    /// Controls the names of the headers the signature is read from (in-place).
    pub fn set_headers(&mut self, headers: SignatureHeaders) -> &mut Self {
        self.headers = headers;
        self
    }
    /// Controls the names of the headers the signature is read from.
    pub fn with_headers(mut self, headers: SignatureHeaders) -> Self {
        self.set_headers(headers);
        self
    }
    /// Returns the width of a time bucket. Must match the signer.
    ///
    /// This is set to 60 seconds by default.
    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }
    /// Controls the width of a time bucket (in-place). Must match the signer.
    ///
    /// This is set to 60 seconds by default.
    pub fn set_bucket_width(&mut self, bucket_width: Duration) -> &mut Self {
        self.bucket_width = bucket_width;
        self
    }
    /// Controls the width of a time bucket. Must match the signer.
    ///
    /// This is set to 60 seconds by default.
    pub fn with_bucket_width(mut self, bucket_width: Duration) -> Self {
        self.set_bucket_width(bucket_width);
        self
    }
    /// Returns how many buckets before the current one are still accepted.
    ///
    /// This is set to 1 by default.
    pub fn previous_buckets(&self) -> u32 {
        self.previous_buckets
    }
    /// Controls how many buckets before the current one are still accepted (in-place).
    ///
    /// This is set to 1 by default.
    pub fn set_previous_buckets(&mut self, previous_buckets: u32) -> &mut Self {
        self.previous_buckets = previous_buckets;
        self
    }
    /// Controls how many buckets before the current one are still accepted.
    ///
    /// This is set to 1 by default.
    pub fn with_previous_buckets(mut self, previous_buckets: u32) -> Self {
        self.set_previous_buckets(previous_buckets);
        self
    }
    /// Returns how far ahead of ours the signer's clock may run.
    ///
    /// This is set to 30 seconds by default.
    pub fn clock_leeway(&self) -> Duration {
        self.clock_leeway
    }
    /// Controls how far ahead of ours the signer's clock may run (in-place).
    ///
    /// This is set to 30 seconds by default.
    pub fn set_clock_leeway(&mut self, clock_leeway: Duration) -> &mut Self {
        self.clock_leeway = clock_leeway;
        self
    }
    /// Controls how far ahead of ours the signer's clock may run.
    ///
    /// This is set to 30 seconds by default.
    pub fn with_clock_leeway(mut self, clock_leeway: Duration) -> Self {
        self.set_clock_leeway(clock_leeway);
        self
    }

    /// The range of timestamps accepted at `now`, inclusive at both ends.
    pub fn accepted_window(&self, now: i64) -> (i64, i64) {
        let width = width_secs(self.bucket_width);
        let leeway = i64::try_from(self.clock_leeway.as_secs()).unwrap_or(i64::MAX);
        let oldest = bucket(now, width)
            .unwrap_or(i64::MIN)
            .saturating_sub(width.saturating_mul(i64::from(self.previous_buckets)));
        let newest = bucket(now.saturating_add(leeway), width).unwrap_or(i64::MIN);
        (oldest, newest)
    }
}

/// Details of a successfully verified request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    access_key: String,
    timestamp: i64,
}

impl Verified {
    /// The access key which signed the request.
    pub fn access_key(&self) -> &str {
        &self.access_key
    }
    /// The bucketed timestamp the request was signed at.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Import this trait to get access to access the `verify` method on all types implementing
/// `RequestLike`.
pub trait VerifyingExt {
    /// Verify the request as of the current system time.
    fn verify(&self, config: &VerifyingConfig) -> Result<Verified, VerifyingError> {
        self.verify_at(config, SystemClock.now())
    }

    /// Verify the request as of `now`.
    fn verify_at(&self, config: &VerifyingConfig, now: i64) -> Result<Verified, VerifyingError>;
}

impl<T: RequestLike> VerifyingExt for T {
    fn verify_at(&self, config: &VerifyingConfig, now: i64) -> Result<Verified, VerifyingError> {
        let string_to_sign = self.canonicalize(&config.headers)?;
        let timestamp = string_to_sign.timestamp();

        let provided_signature = self
            .header(config.headers.signature())
            .ok_or(VerifyingError::MissingHeader(SignatureHeader::Signature))?;
        let provided_signature = provided_signature
            .to_str()
            .map_err(|_| VerifyingError::MissingHeader(SignatureHeader::Signature))?;

        // Check the timestamp is one a signer could have produced
        let width = width_secs(config.bucket_width);
        if bucket(timestamp, width) != Some(timestamp) {
            return Err(VerifyingError::UnalignedTimestamp(timestamp));
        }
        let (oldest, newest) = config.accepted_window(now);
        if timestamp < oldest {
            return Err(VerifyingError::Expired { timestamp, oldest });
        }
        if timestamp > newest {
            return Err(VerifyingError::FromTheFuture { timestamp, newest });
        }

        // Find the appropriate key
        let secret = config
            .key_provider
            .provide_secret(string_to_sign.access_key())
            .ok_or(VerifyingError::UnknownAccessKey)?;

        // Constant time comparison happens inside the algorithm
        if !config
            .algorithm
            .verify(secret, string_to_sign.as_bytes(), provided_signature)
        {
            return Err(VerifyingError::BadSignature);
        }

        Ok(Verified {
            access_key: string_to_sign.access_key().to_owned(),
            timestamp,
        })
    }
}
