use std::io;
use std::path::PathBuf;

/// Raw descriptor of one uploaded file, as reported by the embedding server.
///
/// This is a pure data copy, no logic is attached to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadDescriptor {
    /// File name sent by the client, untrusted
    pub client_filename: Option<String>,
    /// Size in bytes, when known
    pub size: Option<u64>,
    /// Upload error code, `0` meaning success
    pub error: u32,
    /// Backing storage of the upload on the local filesystem
    pub temp_path: Option<PathBuf>,
}

/// A trait to extract required information from an incoming server request
///
/// Header names are matched case-insensitively; values of a repeated header
/// are yielded in their original order.
pub trait ServerRequest {
    /// Http method of the request
    fn method(&self) -> &str;

    /// Scheme of the incoming uri, when present
    fn uri_scheme(&self) -> Option<&str>;

    /// Host of the incoming uri, without user-info or port
    fn uri_host(&self) -> Option<&str>;

    /// Explicit port of the incoming uri
    fn uri_port(&self) -> Option<u16>;

    /// Path of the incoming uri
    fn uri_path(&self) -> &str;

    /// Query string of the incoming uri, without the leading `?`
    fn uri_query(&self) -> Option<&str>;

    /// User-info part of the incoming uri (`user` or `user:pass`)
    fn uri_user_info(&self) -> Option<&str>;

    /// Server parameter by exact name, e.g. `REMOTE_ADDR` or `SCRIPT_NAME`
    fn server_param(&self, name: &str) -> Option<&str>;

    /// Ordered values of the given header
    fn header_values(&self, name: &str) -> impl DoubleEndedIterator<Item = &str>;

    /// Every distinct header name of the request
    fn header_names(&self) -> impl Iterator<Item = &str>;

    /// Cookies sent with the request
    fn cookies(&self) -> impl Iterator<Item = (&str, &str)>;

    /// Parsed body fields of the request
    fn post_fields(&self) -> impl Iterator<Item = (&str, &str)>;

    /// Descriptors of the uploaded files of the request
    fn uploaded_files(&self) -> Vec<UploadDescriptor>;

    /// Read the raw body bytes
    ///
    /// Only called on demand, when the produced request's body accessor is used.
    fn read_body(&self) -> io::Result<Vec<u8>>;

    /// Get the `Forwarded` header values
    fn forwarded(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.header_values("forwarded")
    }

    /// Get the `X-Forwarded-For` header values
    fn x_forwarded_for(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.header_values("x-forwarded-for")
    }

    /// Get the `X-Forwarded-Host` header values
    fn x_forwarded_host(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.header_values("x-forwarded-host")
    }

    /// Get the `X-Forwarded-Proto` header values
    fn x_forwarded_proto(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.header_values("x-forwarded-proto")
    }

    /// Get the `X-Forwarded-Port` header values
    fn x_forwarded_port(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.header_values("x-forwarded-port")
    }
}

#[cfg(feature = "http")]
mod http_impl {
    use std::collections::HashMap;
    use std::io;

    use super::{ServerRequest, UploadDescriptor};

    /// [`ServerRequest`] adapter over an [`http::Request`]
    ///
    /// The `http` crate carries the method, uri and headers; server parameters,
    /// parsed body fields and upload descriptors are supplied by the embedding
    /// server through the builder methods, as `http::Request` has no notion of
    /// them.
    ///
    /// # Example
    /// ```
    /// use proxied_request::HttpServerRequest;
    ///
    /// let request = http::Request::get("http://example.com/index").body(Vec::<u8>::new()).unwrap();
    /// let request = HttpServerRequest::new(request)
    ///     .with_server_param("REMOTE_ADDR", "127.0.0.1")
    ///     .with_server_param("SCRIPT_NAME", "/index");
    /// ```
    pub struct HttpServerRequest<T = Vec<u8>> {
        request: http::Request<T>,
        server_params: HashMap<String, String>,
        post_fields: Vec<(String, String)>,
        uploaded_files: Vec<UploadDescriptor>,
    }

    impl<T> HttpServerRequest<T> {
        pub fn new(request: http::Request<T>) -> Self {
            Self {
                request,
                server_params: HashMap::new(),
                post_fields: Vec::new(),
                uploaded_files: Vec::new(),
            }
        }

        pub fn with_server_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.server_params.insert(name.into(), value.into());
            self
        }

        pub fn with_post_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.post_fields.push((name.into(), value.into()));
            self
        }

        pub fn with_uploaded_file(mut self, file: UploadDescriptor) -> Self {
            self.uploaded_files.push(file);
            self
        }
    }

    impl<T: AsRef<[u8]>> ServerRequest for HttpServerRequest<T> {
        fn method(&self) -> &str {
            self.request.method().as_str()
        }

        fn uri_scheme(&self) -> Option<&str> {
            self.request.uri().scheme_str()
        }

        fn uri_host(&self) -> Option<&str> {
            self.request.uri().host()
        }

        fn uri_port(&self) -> Option<u16> {
            self.request.uri().port_u16()
        }

        fn uri_path(&self) -> &str {
            self.request.uri().path()
        }

        fn uri_query(&self) -> Option<&str> {
            self.request.uri().query()
        }

        fn uri_user_info(&self) -> Option<&str> {
            self.request
                .uri()
                .authority()
                .and_then(|auth| auth.as_str().rsplit_once('@'))
                .map(|(user_info, _)| user_info)
        }

        fn server_param(&self, name: &str) -> Option<&str> {
            self.server_params.get(name).map(String::as_str)
        }

        fn header_values(&self, name: &str) -> impl DoubleEndedIterator<Item = &str> {
            self.request
                .headers()
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
        }

        fn header_names(&self) -> impl Iterator<Item = &str> {
            self.request.headers().keys().map(|name| name.as_str())
        }

        fn cookies(&self) -> impl Iterator<Item = (&str, &str)> {
            self.request
                .headers()
                .get_all("cookie")
                .iter()
                .filter_map(|value| value.to_str().ok())
                .flat_map(|value| value.split(';'))
                .filter_map(|pair| pair.split_once('='))
                .map(|(name, value)| (name.trim(), value.trim()))
        }

        fn post_fields(&self) -> impl Iterator<Item = (&str, &str)> {
            self.post_fields
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
        }

        fn uploaded_files(&self) -> Vec<UploadDescriptor> {
            self.uploaded_files.clone()
        }

        fn read_body(&self) -> io::Result<Vec<u8>> {
            Ok(self.request.body().as_ref().to_vec())
        }
    }
}

#[cfg(feature = "http")]
pub use http_impl::HttpServerRequest;
