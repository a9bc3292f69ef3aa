//! Request types the client can stamp with the anti-forgery header.

// crates.io
use http::{HeaderName, HeaderValue, Method};

/// Outbound request that exposes its method and accepts an extra header.
pub trait CsrfRequest {
	/// HTTP method of the request.
	fn method(&self) -> &Method;

	/// Inserts (or replaces) a header.
	fn insert_header(&mut self, name: HeaderName, value: HeaderValue);

	/// Returns `true` when the request is a pure read and must not carry a token.
	fn is_read_only(&self) -> bool {
		self.method() == Method::GET
	}
}
impl<B> CsrfRequest for http::Request<B> {
	fn method(&self) -> &Method {
		http::Request::method(self)
	}

	fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
		self.headers_mut().insert(name, value);
	}
}
#[cfg(feature = "reqwest")]
impl CsrfRequest for reqwest::Request {
	fn method(&self) -> &Method {
		reqwest::Request::method(self)
	}

	fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
		self.headers_mut().insert(name, value);
	}
}
