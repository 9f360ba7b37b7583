#![deny(missing_docs)]
//! Time-bucketed access key / secret key signing of HTTP requests.
//!
//! A caller holds an access key (a public identifier) and a secret key. Right
//! before a request is sent, the current Unix time is rounded down to a
//! 60 second bucket and the string `"<access key>:<bucket>"` is signed with
//! HMAC-SHA256 keyed by the secret. Three headers are then attached:
//!
//! | Header         | Value                                 |
//! | -------------- | ------------------------------------- |
//! | `X-Access-Key` | the access key, verbatim              |
//! | `X-Timestamp`  | the bucketed Unix time, in decimal    |
//! | `X-Signature`  | the HMAC, standard padded base64      |
//!
//! Because the signed time is bucketed, a receiver with a loosely synchronized
//! clock can recompute the same signature without knowing the exact instant
//! the request was signed at. The receiving half lives in [`VerifyingExt`].
//!
//! ## Features
//!
//! This crate is intended to be used with multiple different HTTP clients and/or servers.
//! As such, client/server-specific implementations are gated by correspondingly named
//! features. `http::Request` and the bundled [`mock_request::MockRequest`] are always
//! supported.
//!
//! ### Supported crates:
//!
//! | Crate / Feature name                              | Client/Server | Notes                                  |
//! | ------------------------------------------------- | ------------- | -------------------------------------- |
//! | [reqwest](https://crates.io/crates/reqwest)       | Client        | Supports blocking and non-blocking requests. |
//! | [rouille](https://crates.io/crates/rouille)       | Server        |                                        |
//!
//! ## Example usage (interceptor)
//!
//! ```rust
//! use aksk_sig::mock_request::MockRequest;
//! use aksk_sig::*;
//!
//! let interceptor = Interceptor::new(SigningConfig::default());
//! let credentials = Credentials::new("AK123", "topsecret");
//!
//! let req = MockRequest::new(http::Method::GET, "http://localhost:8080/items");
//!
//! match interceptor.before_send(req, &credentials) {
//!     Some(signed) => assert!(signed.has_header(&X_SIGNATURE)),
//!     None => unreachable!("credentials are present"),
//! }
//! ```

use http::header::HeaderName;

/// Width of a signing time bucket, in seconds, unless configured otherwise.
pub const DEFAULT_BUCKET_WIDTH: i64 = 60;

/// Header carrying the access key.
pub const X_ACCESS_KEY: HeaderName = HeaderName::from_static("x-access-key");
/// Header carrying the bucketed timestamp.
pub const X_TIMESTAMP: HeaderName = HeaderName::from_static("x-timestamp");
/// Header carrying the base64 signature.
pub const X_SIGNATURE: HeaderName = HeaderName::from_static("x-signature");

type DefaultSignatureAlgorithm = algorithm::HmacSha256;

#[macro_use]
mod macros;

mod algorithm;
pub use algorithm::*;

mod header;
pub use header::*;

mod time;
pub use time::*;

mod credentials;
pub use credentials::*;

mod canonicalize;
pub use canonicalize::*;

mod signing;
pub use signing::*;

mod interceptor;
pub use interceptor::*;

mod verifying;
pub use verifying::*;

mod http_impls;

/// Module containing a mock request type which implements both
/// `ClientRequestLike` and `RequestLike` for testing.
pub mod mock_request;

#[cfg(feature = "reqwest")]
mod reqwest_impls;

#[cfg(feature = "rouille")]
mod rouille_impls;
