use super::BridgeError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Port both bridge ends use unless told otherwise.
pub const DEFAULT_PORT: u16 = 5979;

/// A remote receiver address. Unique by `(host, port)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteEndpoint {
    host: String,
    port: u16,
}

impl RemoteEndpoint {
    /// Blank hosts fall back to `localhost`; port 0 is rejected.
    pub fn new(host: &str, port: u16) -> Result<Self, BridgeError> {
        if port == 0 {
            return Err(BridgeError::InvalidEndpoint(format!(
                "port must be non-zero (host '{}')",
                host.trim()
            )));
        }

        let host = host.trim();
        let host = if host.is_empty() { "localhost" } else { host };

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Target of every POST: the root path of the endpoint.
    pub fn url(&self) -> Result<Url, BridgeError> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        Url::parse(&format!("http://{host}:{}/", self.port))
            .map_err(|e| BridgeError::InvalidEndpoint(format!("{self}: {e}")))
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for RemoteEndpoint {
    type Err = BridgeError;

    /// Parses `host:port`, `host` (default port) or `[v6]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| BridgeError::InvalidEndpoint(format!("unclosed bracket in '{s}'")))?;
            let port = match tail.strip_prefix(':') {
                Some(port) => parse_port(s, port)?,
                None if tail.is_empty() => DEFAULT_PORT,
                None => {
                    return Err(BridgeError::InvalidEndpoint(format!(
                        "unexpected text after address in '{s}'"
                    )));
                }
            };
            return Self::new(host, port);
        }

        match s.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => Self::new(host, parse_port(s, port)?),
            // No port, or a bare IPv6 address
            _ => Self::new(s, DEFAULT_PORT),
        }
    }
}

fn parse_port(input: &str, port: &str) -> Result<u16, BridgeError> {
    port.trim()
        .parse::<u16>()
        .map_err(|e| BridgeError::InvalidEndpoint(format!("bad port in '{input}': {e}")))
}
