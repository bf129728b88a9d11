//! Proxy Configuration Types
//!
//! Data types for outbound proxy configuration. The model provider's HTTP
//! client is the only consumer today; the client factory lives in `cmdshift-llm`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks5" | "socks5h" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Only held in memory; excluded from serialization so a saved config
    /// file never carries the secret.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy URL of the form `scheme://[user[:pass]@]host:port`.
    pub fn from_url(url: &str) -> CoreResult<Self> {
        let url = url.trim();
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| CoreError::parse(format!("proxy url '{}' has no scheme", url)))?;
        let protocol = ProxyProtocol::from_scheme(scheme)
            .ok_or_else(|| CoreError::parse(format!("unsupported proxy scheme '{}'", scheme)))?;

        let rest = rest.trim_end_matches('/');
        let (credentials, authority) = match rest.rsplit_once('@') {
            Some((creds, authority)) => (Some(creds), authority),
            None => (None, rest),
        };
        let (username, password) = match credentials {
            Some(creds) => match creds.split_once(':') {
                Some((user, pass)) => (Some(user.to_string()), Some(pass.to_string())),
                None => (Some(creds.to_string()), None),
            },
            None => (None, None),
        };

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| CoreError::parse(format!("proxy url '{}' has no port", url)))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| CoreError::parse(format!("invalid proxy port '{}': {}", port, e)))?;

        let config = Self {
            protocol,
            host: host.to_string(),
            port,
            username,
            password,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Validate host and port.
    pub fn validate(&self) -> CoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::validation("proxy host cannot be empty"));
        }
        if self.port == 0 {
            return Err(CoreError::validation("proxy port must be non-zero"));
        }
        Ok(())
    }
}
