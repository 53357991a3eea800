use core::net::IpAddr;

use ipnet::IpNet;

/// Error raised by the configuration surface.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The given trusted proxy pattern is neither an IP address nor a CIDR block
    #[error("invalid trusted proxy pattern `{pattern}`: {source}")]
    InvalidProxyPattern {
        pattern: String,
        source: ipnet::AddrParseError,
    },
}

/// Set of trusted proxy ranges used to decide whether forwarded headers may be believed.
///
/// A pattern may be a bare IP address or a CIDR block, IPv4 or IPv6. The set is
/// read-only during a resolution; replace or extend it at startup or under an
/// external write lock.
///
/// # Example
/// ```
/// use proxied_request::Config;
///
/// let mut config = Config::new();
/// config.add_trusted_proxy("168.10.0.0/16").unwrap();
/// config.add_trusted_proxy("2001:db8::1").unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    trusted_proxies: Vec<IpNet>,
}

impl Config {
    /// Create a configuration with no trusted proxies
    ///
    /// With an empty set no request is ever trusted, so forwarded headers are
    /// never consulted.
    pub fn new() -> Self {
        Self {
            trusted_proxies: Vec::new(),
        }
    }

    /// Create a configuration trusting loopback and private networks
    pub fn new_local() -> Self {
        Self {
            trusted_proxies: vec![
                // IPV4 Loopback
                "127.0.0.0/8".parse().unwrap(),
                // IPV4 Private Networks
                "10.0.0.0/8".parse().unwrap(),
                "172.16.0.0/12".parse().unwrap(),
                "192.168.0.0/16".parse().unwrap(),
                // IPV6 Loopback
                "::1/128".parse().unwrap(),
                // IPV6 Private network
                "fd00::/8".parse().unwrap(),
            ],
        }
    }

    /// Add a trusted proxy to the set
    ///
    /// The pattern can be an IP address or a CIDR block.
    pub fn add_trusted_proxy(&mut self, pattern: &str) -> Result<(), Error> {
        let net = match pattern.parse() {
            Ok(net) => net,
            Err(e) => match pattern.parse::<IpAddr>() {
                Ok(addr) => IpNet::from(addr),
                Err(_) => {
                    return Err(Error::InvalidProxyPattern {
                        pattern: pattern.to_string(),
                        source: e,
                    })
                }
            },
        };

        self.trusted_proxies.push(net);

        Ok(())
    }

    /// Replace the whole set of trusted proxies
    ///
    /// On error the previous set is left untouched.
    pub fn set_trusted_proxies<I, S>(&mut self, patterns: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut replacement = Self::new();

        for pattern in patterns {
            replacement.add_trusted_proxy(pattern.as_ref())?;
        }

        self.trusted_proxies = replacement.trusted_proxies;

        Ok(())
    }

    /// Check if a remote address matches at least one trusted range
    pub fn is_ip_trusted(&self, remote_addr: &IpAddr) -> bool {
        for proxy in &self.trusted_proxies {
            if proxy.contains(remote_addr) {
                return true;
            }
        }

        false
    }

    /// Check if a textual address matches at least one trusted range
    ///
    /// A value that does not parse as an IP literal is never trusted.
    pub fn is_trusted(&self, remote_addr: &str) -> bool {
        remote_addr
            .parse::<IpAddr>()
            .map(|addr| self.is_ip_trusted(&addr))
            .unwrap_or(false)
    }
}
