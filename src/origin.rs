use log::debug;

use crate::extract::ServerRequest;
use crate::url::Scheme;
use crate::Config;

/// Client origin resolved from a request that may have crossed trusted proxies.
///
/// `None` in `scheme`, `host` or `port` means the corresponding url field is
/// left as the transport reported it. Resolution never mutates shared state;
/// the caller applies the descriptor to its url in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOrigin {
    remote_addr: Option<String>,
    remote_host: Option<String>,
    scheme: Option<Scheme>,
    host: Option<String>,
    port: Option<u16>,
    by: Option<String>,
}

/// Trim whitespace then any quote marks.
fn unquote(val: &str) -> &str {
    val.trim().trim_start_matches('"').trim_end_matches('"')
}

/// Remove port and IPv6 square brackets from a peer specification.
fn bare_address(val: &str) -> &str {
    match val.find('[') {
        // bracketed IPv6, keep what sits between the brackets
        Some(open) => val[open + 1..].split(']').next().unwrap_or(val),
        // IPv4 or hostname, strip an optional port
        None => val.split(':').next().unwrap_or(val),
    }
}

/// Split a forwarded host specification into host and optional port.
fn split_host_port(val: &str) -> (&str, Option<u16>) {
    match val.find('[') {
        Some(open) => {
            let rest = &val[open + 1..];
            match rest.split_once(']') {
                Some((host, after)) => {
                    let port = after.split_once(':').and_then(|(_, port)| parse_port(port));
                    (host, port)
                }
                None => (rest, None),
            }
        }
        None => {
            let mut parts = val.splitn(2, ':');
            let host = parts.next().unwrap_or(val);
            let port = parts.next().and_then(parse_port);
            (host, port)
        }
    }
}

/// Parse the leading digits of a forwarded port value.
///
/// Ports are loosely formatted in the wild; a value with no leading digits,
/// or whose digits do not fit a port number, yields `None` so the caller
/// keeps its previous port.
fn parse_port(val: &str) -> Option<u16> {
    let digits = val.bytes().take_while(|b| b.is_ascii_digit()).count();

    val[..digits].parse().ok()
}

/// Accumulated parameter values of the `Forwarded` header, in segment order.
#[derive(Debug, Default)]
struct ForwardedParams<'a> {
    r#for: Vec<&'a str>,
    host: Vec<&'a str>,
    proto: Vec<&'a str>,
    by: Vec<&'a str>,
}

impl<'a> ForwardedParams<'a> {
    /// Flatten the header value list into `key=value` segments and group the
    /// values by parameter name
    ///
    /// A segment without `=` counts as a key with an empty value, which is
    /// harmless for the parameters read here. Unknown parameters are legal
    /// and ignored.
    fn parse(values: impl Iterator<Item = &'a str>) -> Self {
        let mut params = Self::default();

        for segment in values.flat_map(|value| value.split([',', ';'])) {
            let (key, value) = match segment.split_once('=') {
                Some((key, value)) => (key, value),
                None => (segment, ""),
            };

            let key = key.trim();
            let value = unquote(value);

            if key.eq_ignore_ascii_case("for") {
                params.r#for.push(value);
            } else if key.eq_ignore_ascii_case("host") {
                params.host.push(value);
            } else if key.eq_ignore_ascii_case("proto") {
                params.proto.push(value);
            } else if key.eq_ignore_ascii_case("by") {
                params.by.push(value);
            }
        }

        params
    }
}

impl ClientOrigin {
    /// Resolved client address, without brackets or port
    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Resolved client host name
    pub fn remote_host(&self) -> Option<&str> {
        self.remote_host.as_deref()
    }

    /// Scheme rewrite requested by a forwarded header, if any
    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    /// Host rewrite requested by a forwarded header, if any
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Port rewrite requested by a forwarded header, if any
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Identity the proxy reported for itself in `Forwarded`, informational
    pub fn by(&self) -> Option<&str> {
        self.by.as_deref()
    }

    /// Resolve the client origin of a request against a set of trusted proxies
    ///
    /// The raw remote address and host come from the `REMOTE_ADDR` and
    /// `REMOTE_HOST` server parameters, falling back to headers of the same
    /// name. When the peer is trusted, exactly one of the two header families
    /// is consulted, the standardized `Forwarded` header taking priority.
    pub fn resolve<R: ServerRequest>(request: &R, config: &Config) -> Self {
        let remote_addr = request
            .server_param("REMOTE_ADDR")
            .or_else(|| request.header_values("remote_addr").next())
            .map(str::to_string);
        let remote_host = request
            .server_param("REMOTE_HOST")
            .or_else(|| request.header_values("remote_host").next())
            .map(str::to_string);

        let mut origin = Self {
            remote_addr,
            remote_host,
            ..Self::default()
        };

        let trusted = origin
            .remote_addr
            .as_deref()
            .is_some_and(|addr| config.is_trusted(addr));

        if !trusted {
            debug!(
                "peer {:?} is not a trusted proxy, forwarded headers ignored",
                origin.remote_addr
            );

            return origin;
        }

        if request.forwarded().next().is_some() {
            origin.apply_forwarded(request);
        } else {
            origin.apply_x_forwarded(request, config);
        }

        debug!(
            "client origin rewritten by trusted proxy: addr={:?} host={:?}",
            origin.remote_addr, origin.remote_host
        );

        origin
    }

    /// Apply the standardized `Forwarded` header, RFC 7239 style
    fn apply_forwarded<R: ServerRequest>(&mut self, request: &R) {
        let params = ForwardedParams::parse(request.forwarded());

        if let Some(address) = params.r#for.first() {
            self.remote_addr = Some(bare_address(address).to_string());
        }

        // an ambiguous multi-value host is ignored
        if let [host] = params.host.as_slice() {
            let (host, port) = split_host_port(host);

            self.remote_host = Some(host.to_string());
            self.host = Some(host.to_string());

            if port.is_some() {
                self.port = port;
            }
        }

        let proto = match params.proto.as_slice() {
            [proto] => *proto,
            _ => "http",
        };

        self.scheme = Some(Scheme::from_proto(proto));

        if let Some(by) = params.by.first() {
            self.by = Some(by.to_string());
        }
    }

    /// Apply the legacy `X-Forwarded-*` header family
    fn apply_x_forwarded<R: ServerRequest>(&mut self, request: &R, config: &Config) {
        if let Some(proto) = request.x_forwarded_proto().next() {
            let scheme = Scheme::from_proto(proto.trim());

            self.scheme = Some(scheme);
            // an explicit forwarded port below overrides the scheme default
            self.port = Some(scheme.default_port());
        }

        if let Some(port) = request
            .x_forwarded_port()
            .next()
            .and_then(|value| parse_port(value.trim()))
        {
            self.port = Some(port);
        }

        // leftmost entry is the original client, rightmost the nearest proxy;
        // entries that are themselves known proxies are discarded, and the
        // last remaining entry in original order wins
        let entries: Vec<&str> = request
            .x_forwarded_for()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .collect();

        let mut client_index = None;

        for (index, entry) in entries.iter().enumerate() {
            if !config.is_trusted(entry) {
                client_index = Some(index);
            }
        }

        if let Some(index) = client_index {
            self.remote_addr = Some(entries[index].to_string());

            // the host chain correlates with the for chain by position, so
            // exact index semantics matter more than set membership
            let host = request
                .x_forwarded_host()
                .flat_map(|value| value.split(','))
                .nth(index);

            if let Some(host) = host {
                let host = host.trim();

                self.remote_host = Some(host.to_string());
                self.host = Some(host.to_string());
            }
        }
    }
}
