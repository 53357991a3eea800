use std::fmt;

/// Url scheme, always normalized to plain `http` or `https`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    /// Normalize a forwarded protocol value
    ///
    /// Anything that is not `https` (case-insensitive) is `http`.
    pub fn from_proto(proto: &str) -> Self {
        if proto.eq_ignore_ascii_case("https") {
            Self::Https
        } else {
            Self::Http
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Conventional port for the scheme
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable url descriptor assembled from the incoming request and rewritten
/// from the resolved client origin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Url {
    scheme: Scheme,
    user: String,
    password: String,
    host: String,
    port: Option<u16>,
    path: String,
    query: String,
}

impl Url {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn set_scheme(&mut self, scheme: Scheme) {
        self.scheme = scheme;
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Split a uri user-info string on the first `:` into user and password
    ///
    /// The password defaults to empty.
    pub fn set_user_info(&mut self, user_info: &str) {
        match user_info.split_once(':') {
            Some((user, password)) => {
                self.user = user.to_string();
                self.password = password.to_string();
            }
            None => {
                self.user = user_info.to_string();
                self.password = String::new();
            }
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn set_host(&mut self, host: &str) {
        self.host = host.to_string();
    }

    /// Explicitly set port, if any
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn set_port(&mut self, port: Option<u16>) {
        self.port = port;
    }

    /// Explicit port, falling back to the scheme default
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.scheme.default_port())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Host with the port appended when it differs from the scheme default
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) if port != self.scheme.default_port() => {
                format!("{}:{}", self.host, port)
            }
            _ => self.host.clone(),
        }
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;

        if !self.user.is_empty() {
            f.write_str(&self.user)?;

            if !self.password.is_empty() {
                write!(f, ":{}", self.password)?;
            }

            f.write_str("@")?;
        }

        f.write_str(&self.authority())?;
        f.write_str(&self.path)?;

        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }

        Ok(())
    }
}

/// A [`Url`] paired with the script path a front controller is mounted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScript {
    url: Url,
    script_path: String,
}

impl UrlScript {
    pub fn new(url: Url, script_path: impl Into<String>) -> Self {
        Self {
            url,
            script_path: script_path.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn script_path(&self) -> &str {
        &self.script_path
    }

    /// Directory part of the script path, up to and including the last `/`
    pub fn base_path(&self) -> &str {
        match self.script_path.rfind('/') {
            Some(pos) => &self.script_path[..=pos],
            None => "/",
        }
    }

    /// Part of the url path after the base path
    pub fn relative_path(&self) -> &str {
        self.url
            .path()
            .strip_prefix(self.base_path())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_normalization() {
        assert_eq!(Scheme::from_proto("https"), Scheme::Https);
        assert_eq!(Scheme::from_proto("HTTPS"), Scheme::Https);
        assert_eq!(Scheme::from_proto("http"), Scheme::Http);
        assert_eq!(Scheme::from_proto("wss"), Scheme::Http);
        assert_eq!(Scheme::from_proto(""), Scheme::Http);
    }

    #[test]
    fn user_info_split() {
        let mut url = Url::new();

        url.set_user_info("alice:s3cret");
        assert_eq!(url.user(), "alice");
        assert_eq!(url.password(), "s3cret");

        url.set_user_info("bob");
        assert_eq!(url.user(), "bob");
        assert_eq!(url.password(), "");

        // only the first colon is significant
        url.set_user_info("carol:pa:ss");
        assert_eq!(url.user(), "carol");
        assert_eq!(url.password(), "pa:ss");
    }

    #[test]
    fn effective_port_falls_back_to_scheme() {
        let mut url = Url::new();
        assert_eq!(url.effective_port(), 80);

        url.set_scheme(Scheme::Https);
        assert_eq!(url.effective_port(), 443);

        url.set_port(Some(8443));
        assert_eq!(url.effective_port(), 8443);
    }

    #[test]
    fn display_hides_default_port() {
        let mut url = Url::new();
        url.set_host("example.com");
        url.set_path("/index");
        url.set_port(Some(80));

        assert_eq!(url.to_string(), "http://example.com/index");

        url.set_port(Some(8080));
        url.set_query("a=b");
        assert_eq!(url.to_string(), "http://example.com:8080/index?a=b");
    }

    #[test]
    fn base_and_relative_path() {
        let mut url = Url::new();
        url.set_host("example.com");
        url.set_path("/app/public/index.php/foo");

        let url = UrlScript::new(url, "/app/public/index.php");
        assert_eq!(url.base_path(), "/app/public/");
        assert_eq!(url.relative_path(), "index.php/foo");
    }
}
