use http::header::{HeaderName, HeaderValue};

use super::*;

impl<B> RequestLike for http::Request<B> {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        self.headers().get(header).cloned()
    }
}

impl<B> ClientRequestLike for http::Request<B> {
    fn set_header(&mut self, header: HeaderName, value: HeaderValue) {
        self.headers_mut().insert(header, value);
    }
}

impl RequestLike for http::request::Parts {
    fn header(&self, header: &HeaderName) -> Option<HeaderValue> {
        self.headers.get(header).cloned()
    }
}

impl ClientRequestLike for http::request::Parts {
    fn set_header(&mut self, header: HeaderName, value: HeaderValue) {
        self.headers.insert(header, value);
    }
}
