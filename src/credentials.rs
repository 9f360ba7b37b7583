use std::fmt;
use std::sync::RwLock;

/// Identifies one half of a credential pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CredentialField {
    /// The public access key.
    AccessKey,
    /// The private secret key.
    SecretKey,
}

impl fmt::Display for CredentialField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CredentialField::AccessKey => f.write_str("access key"),
            CredentialField::SecretKey => f.write_str("secret key"),
        }
    }
}

/// An access key / secret key pair, held in memory by the caller.
///
/// The secret is kept in plaintext and never written to logs: the `Debug`
/// implementation redacts it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Creates a new credential pair.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// The access key.
    pub fn access_key(&self) -> &str {
        &self.access_key
    }
    /// Sets the access key.
    pub fn set_access_key(&mut self, access_key: impl Into<String>) -> &mut Self {
        self.access_key = access_key.into();
        self
    }
    /// The secret key.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
    /// Sets the secret key.
    pub fn set_secret_key(&mut self, secret_key: impl Into<String>) -> &mut Self {
        self.secret_key = secret_key.into();
        self
    }

    /// Returns the first empty field, if any. Access key is checked first.
    pub fn missing(&self) -> Option<CredentialField> {
        if self.access_key.is_empty() {
            Some(CredentialField::AccessKey)
        } else if self.secret_key.is_empty() {
            Some(CredentialField::SecretKey)
        } else {
            None
        }
    }

    /// True if both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        self.missing().is_none()
    }
}

/// Where the interceptor reads credentials from.
///
/// This stands in for whatever user-facing surface collects the keys: the
/// surface writes through the setters, the signer only ever takes snapshots.
pub trait CredentialSource {
    /// Returns a snapshot of the current credential pair.
    fn credentials(&self) -> Credentials;
    /// Replaces the access key.
    fn set_access_key(&self, access_key: &str);
    /// Replaces the secret key.
    fn set_secret_key(&self, secret_key: &str);
}

/// A credential source backed by a lock-protected pair in memory.
#[derive(Debug, Default)]
pub struct InMemoryCredentials {
    inner: RwLock<Credentials>,
}

impl InMemoryCredentials {
    /// Creates a new source holding the given pair.
    pub fn new(credentials: Credentials) -> Self {
        InMemoryCredentials {
            inner: RwLock::new(credentials),
        }
    }
}

impl CredentialSource for InMemoryCredentials {
    fn credentials(&self) -> Credentials {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
    fn set_access_key(&self, access_key: &str) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.set_access_key(access_key);
    }
    fn set_secret_key(&self, secret_key: &str) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.set_secret_key(secret_key);
    }
}
