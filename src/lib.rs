//! # Proxied request
//!
//! This crate resolves the original client information (address, host, scheme, port) of an
//! http request that crossed one or more trusted reverse proxies, and turns a generic
//! incoming request into a resolved request value object.
//!
//! ## Usage
//!
//! ```rust
//! use proxied_request::{HttpServerRequest, RequestFactory};
//!
//! let incoming = http::Request::get("http://internal/index")
//!     .header("forwarded", "for=1.2.3.4; proto=https; by=myproxy; host=mydomain.com:8080")
//!     .body(Vec::new())
//!     .unwrap();
//! let incoming = HttpServerRequest::new(incoming)
//!     .with_server_param("REMOTE_ADDR", "127.0.0.1");
//!
//! let mut factory = RequestFactory::new();
//! factory.set_trusted_proxies(["127.0.0.0/8"]).unwrap();
//!
//! let request = factory.request_from(incoming);
//!
//! assert_eq!(request.remote_addr(), Some("1.2.3.4"));
//! assert_eq!(request.url().url().scheme().as_str(), "https");
//! assert_eq!(request.url().url().host(), "mydomain.com");
//! assert_eq!(request.url().url().port(), Some(8080));
//! ```
//!
//! ## Features
//!
//!  * Believes forwarded headers only when the peer address matches a configured set of
//!    IP/CIDR patterns.
//!  * Uses the standardized `Forwarded` header in priority, falling back to the legacy
//!    `X-Forwarded-*` family when it is absent.
//!  * Correlates `X-Forwarded-For` and `X-Forwarded-Host` entries by hop position.
//!  * Copies method, cookies, post fields, uploaded files and headers into the resolved
//!    request; the body is read lazily.
//!
//! ## Implementation
//!
//! The `Forwarded` parsing tries to follow the [RFC 7239](https://tools.ietf.org/html/rfc7239)
//! specifications but may differ on real world usage.

mod config;
mod extract;
mod factory;
mod origin;
mod request;
mod url;

pub use config::{Config, Error};
#[cfg(feature = "http")]
pub use extract::HttpServerRequest;
pub use extract::{ServerRequest, UploadDescriptor};
pub use factory::RequestFactory;
pub use origin::ClientOrigin;
pub use request::{FileUpload, Request, UploadError};
pub use url::{Scheme, Url, UrlScript};
