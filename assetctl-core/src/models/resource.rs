//! Resource kinds served by the platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A kind of asset the platform can look up in batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Internet-facing host, keyed by IP address.
    Host,
    /// X.509 certificate, keyed by SHA-256 fingerprint.
    Certificate,
    /// Web property, keyed by `hostname:port`.
    WebProperty,
}

impl ResourceKind {
    /// Maximum number of identifiers one batch request accepts.
    ///
    /// These are API limits, not tunables.
    pub const fn batch_ceiling(self) -> usize {
        match self {
            Self::Host => 100,
            Self::Certificate => 1000,
            Self::WebProperty => 100,
        }
    }

    /// Path segment of the asset endpoint.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Host => "hosts",
            Self::Certificate => "certificates",
            Self::WebProperty => "webproperties",
        }
    }

    /// Short CLI name.
    pub fn cli_name(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Certificate => "cert",
            Self::WebProperty => "web",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" | "hosts" => Ok(Self::Host),
            "cert" | "certs" | "certificate" | "certificates" => Ok(Self::Certificate),
            "web" | "webproperty" | "webproperties" => Ok(Self::WebProperty),
            other => Err(CoreError::InvalidInput(format!(
                "unknown resource kind: {other} (expected host, cert or web)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_ceilings() {
        assert_eq!(ResourceKind::Host.batch_ceiling(), 100);
        assert_eq!(ResourceKind::Certificate.batch_ceiling(), 1000);
        assert_eq!(ResourceKind::WebProperty.batch_ceiling(), 100);
    }

    #[test]
    fn test_parse() {
        assert_eq!("host".parse::<ResourceKind>().unwrap(), ResourceKind::Host);
        assert_eq!("Certs".parse::<ResourceKind>().unwrap(), ResourceKind::Certificate);
        assert_eq!("web".parse::<ResourceKind>().unwrap(), ResourceKind::WebProperty);
        assert!("domain".parse::<ResourceKind>().is_err());
    }
}
