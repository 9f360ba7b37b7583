use http::header::{HeaderName, HeaderValue};

use super::*;

impl RequestLike for rouille::Request {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        rouille::Request::header(self, header.as_str())
            .and_then(|v| HeaderValue::from_bytes(v.as_bytes()).ok())
    }
}
