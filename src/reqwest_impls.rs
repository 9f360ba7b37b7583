use http::header::{HeaderName, HeaderValue};

use super::*;

impl RequestLike for reqwest::Request {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        self.headers().get(header).cloned()
    }
}

impl ClientRequestLike for reqwest::Request {
    fn set_header(&mut self, header: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(header, value);
    }
}

impl RequestLike for reqwest::blocking::Request {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        self.headers().get(header).cloned()
    }
}

impl ClientRequestLike for reqwest::blocking::Request {
    fn set_header(&mut self, header: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(header, value);
    }
}
