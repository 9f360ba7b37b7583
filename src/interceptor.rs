use std::fmt::Debug;
use std::sync::Arc;

use crate::credentials::{CredentialSource, Credentials};
use crate::signing::{ClientRequestLike, SigningConfig, SigningError, SigningExt};
use crate::time::{Clock, SystemClock};

/// Receives the user-facing message when the interceptor refuses to send a
/// request.
pub trait Notifier: Debug + Send + Sync + 'static {
    /// Called once per rejected request.
    fn notify(&self, error: &SigningError);
}

/// Reports rejections through the `log` crate at warning level.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, error: &SigningError) {
        if error.is_missing_credential() {
            warn!("Request not sent: {}", error);
        } else {
            warn!("Request not sent, signing failed: {}", error);
        }
    }
}

/// Pre-send hook which signs outgoing requests.
///
/// Each call reads the clock once, signs with the caller's credentials and
/// either returns the request with the signature headers attached, or `None`
/// to indicate that the request must not be sent. Nothing is retried.
#[derive(Debug, Clone)]
pub struct Interceptor {
    config: SigningConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl Interceptor {
    /// Creates an interceptor using the system clock, reporting rejections
    /// to the log.
    pub fn new(config: SigningConfig) -> Self {
        Interceptor {
            config,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
        }
    }

    /// Returns the signing configuration.
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }
    /// Replaces the clock.
    pub fn with_clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }
    /// Replaces the notifier.
    pub fn with_notifier<N: Notifier>(mut self, notifier: N) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Signs `request`, or returns the error without reporting it. The
    /// request is dropped on failure.
    pub fn try_before_send<R: ClientRequestLike>(
        &self,
        mut request: R,
        credentials: &Credentials,
    ) -> Result<R, SigningError> {
        let now = self.clock.now();
        let stamp = request.sign_at(&self.config, credentials, now)?;

        info!(
            "Signed request: access_key={} timestamp={} signature={}",
            stamp.access_key(),
            stamp.timestamp(),
            stamp.signature()
        );
        Ok(request)
    }

    /// Signs `request`. Returns `None` if it must not be sent, after passing
    /// the reason to the notifier.
    pub fn before_send<R: ClientRequestLike>(
        &self,
        request: R,
        credentials: &Credentials,
    ) -> Option<R> {
        match self.try_before_send(request, credentials) {
            Ok(request) => Some(request),
            Err(e) => {
                self.notifier.notify(&e);
                None
            }
        }
    }

    /// Like `before_send`, taking a snapshot of the credentials from `source`.
    pub fn before_send_from<R, S>(&self, request: R, source: &S) -> Option<R>
    where
        R: ClientRequestLike,
        S: CredentialSource + ?Sized,
    {
        self.before_send(request, &source.credentials())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;

    use super::*;
    use crate::mock_request::MockRequest;
    use crate::{
        CredentialField, FixedClock, InMemoryCredentials, RequestLike, SignatureAlgorithm,
        X_SIGNATURE, X_TIMESTAMP,
    };

    #[derive(Debug, Default, Clone)]
    struct RecordingNotifier(Arc<Mutex<Vec<SigningError>>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, error: &SigningError) {
            self.0.lock().unwrap().push(error.clone());
        }
    }

    impl RecordingNotifier {
        fn take(&self) -> Vec<SigningError> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[derive(Debug)]
    struct BrokenAlgorithm;

    impl SignatureAlgorithm for BrokenAlgorithm {
        fn name(&self) -> &str {
            "broken"
        }
        fn sign(&self, _key: &[u8], _bytes_to_sign: &[u8]) -> Result<String, SigningError> {
            Err(SigningError::Primitive("unavailable".into()))
        }
    }

    fn request() -> MockRequest {
        MockRequest::new(Method::GET, "http://test.com/foo")
    }

    #[test]
    fn signs_with_captured_time() {
        let notifier = RecordingNotifier::default();
        let interceptor = Interceptor::new(SigningConfig::default())
            .with_clock(FixedClock(1_700_000_125))
            .with_notifier(notifier.clone());

        let signed = interceptor
            .before_send(request(), &Credentials::new("AK123", "topsecret"))
            .expect("request to be signed");

        assert_eq!(signed.header(&X_TIMESTAMP).unwrap(), "1700000100");
        assert_eq!(
            signed.header(&X_SIGNATURE).unwrap(),
            "gsBwFdR05qv9tq0moO3XE/7c0bcbxqU1yuTXUi64R5I="
        );
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn missing_secret_is_rejected_and_reported() {
        let notifier = RecordingNotifier::default();
        let interceptor = Interceptor::new(SigningConfig::default())
            .with_clock(FixedClock(1_700_000_125))
            .with_notifier(notifier.clone());

        let original = request();
        let mut req = original.clone();
        assert!(interceptor
            .before_send(&mut req, &Credentials::new("AK123", ""))
            .is_none());

        assert_eq!(req, original);
        assert_eq!(
            notifier.take(),
            vec![SigningError::MissingCredential(CredentialField::SecretKey)]
        );
    }

    #[test]
    fn primitive_failure_becomes_sentinel() {
        let notifier = RecordingNotifier::default();
        let interceptor = Interceptor::new(SigningConfig::new(BrokenAlgorithm))
            .with_notifier(notifier.clone());

        let original = request();
        let mut req = original.clone();
        assert!(interceptor
            .before_send(&mut req, &Credentials::new("AK123", "topsecret"))
            .is_none());
        assert_eq!(req, original);
        assert_eq!(
            notifier.take(),
            vec![SigningError::Primitive("unavailable".into())]
        );
    }

    #[test]
    fn requests_straddling_a_boundary_get_different_timestamps() {
        let credentials = Credentials::new("AK123", "topsecret");
        let first = Interceptor::new(SigningConfig::default())
            .with_clock(FixedClock(1_700_000_150))
            .before_send(request(), &credentials)
            .unwrap();
        let second = Interceptor::new(SigningConfig::default())
            .with_clock(FixedClock(1_700_000_150 + 61))
            .before_send(request(), &credentials)
            .unwrap();

        assert_eq!(first.header(&X_TIMESTAMP).unwrap(), "1700000100");
        assert_eq!(second.header(&X_TIMESTAMP).unwrap(), "1700000160");
        assert_ne!(
            first.header(&X_SIGNATURE).unwrap(),
            second.header(&X_SIGNATURE).unwrap()
        );
    }

    #[test]
    fn reads_credentials_from_source() {
        let source = InMemoryCredentials::default();
        let notifier = RecordingNotifier::default();
        let interceptor = Interceptor::new(SigningConfig::default())
            .with_clock(FixedClock(1_700_000_125))
            .with_notifier(notifier.clone());

        assert!(interceptor.before_send_from(request(), &source).is_none());
        assert_eq!(
            notifier.take(),
            vec![SigningError::MissingCredential(CredentialField::AccessKey)]
        );

        source.set_access_key("AK123");
        source.set_secret_key("topsecret");
        assert!(interceptor.before_send_from(request(), &source).is_some());
        assert!(notifier.take().is_empty());
    }

    #[test]
    fn try_before_send_returns_error() {
        let interceptor = Interceptor::new(SigningConfig::default());
        let err = interceptor
            .try_before_send(request(), &Credentials::default())
            .unwrap_err();
        assert!(err.is_missing_credential());
    }
}
