//! Typed references to entities in a topology.
//!
//! Text form is `kind/id`, except subnets which are scoped by their network:
//! `subnet/<network>/<id>`. Identifiers are therefore non-empty and never
//! contain `/`; see [`is_identifier`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether `id` can name an entity without breaking the key text form.
pub fn is_identifier(id: &str) -> bool {
    !id.is_empty() && !id.contains('/')
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceKey {
    Network(String),
    Subnet { network: String, subnet: String },
    Gateway(String),
    Attachment(String),
    Route(String),
    RuleSet(String),
    Endpoint(String),
    Consumer(String),
}

impl ResourceKey {
    pub fn network(id: impl Into<String>) -> Self {
        Self::Network(id.into())
    }

    pub fn subnet(network: impl Into<String>, subnet: impl Into<String>) -> Self {
        Self::Subnet {
            network: network.into(),
            subnet: subnet.into(),
        }
    }

    pub fn gateway(id: impl Into<String>) -> Self {
        Self::Gateway(id.into())
    }

    pub fn attachment(id: impl Into<String>) -> Self {
        Self::Attachment(id.into())
    }

    pub fn route(id: impl Into<String>) -> Self {
        Self::Route(id.into())
    }

    pub fn rule_set(id: impl Into<String>) -> Self {
        Self::RuleSet(id.into())
    }

    pub fn endpoint(id: impl Into<String>) -> Self {
        Self::Endpoint(id.into())
    }

    pub fn consumer(id: impl Into<String>) -> Self {
        Self::Consumer(id.into())
    }

    /// Namespace label, the part before the first `/`.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceKey::Network(_) => "network",
            ResourceKey::Subnet { .. } => "subnet",
            ResourceKey::Gateway(_) => "gateway",
            ResourceKey::Attachment(_) => "attachment",
            ResourceKey::Route(_) => "route",
            ResourceKey::RuleSet(_) => "rule-set",
            ResourceKey::Endpoint(_) => "endpoint",
            ResourceKey::Consumer(_) => "consumer",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Subnet { network, subnet } => write!(f, "subnet/{network}/{subnet}"),
            ResourceKey::Network(id)
            | ResourceKey::Gateway(id)
            | ResourceKey::Attachment(id)
            | ResourceKey::Route(id)
            | ResourceKey::RuleSet(id)
            | ResourceKey::Endpoint(id)
            | ResourceKey::Consumer(id) => write!(f, "{}/{id}", self.kind()),
        }
    }
}

impl FromStr for ResourceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((kind, rest)) = s.split_once('/') else {
            return Err(format!("invalid resource key '{s}': expected 'kind/id'"));
        };
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(format!("invalid resource key '{s}': empty identifier"));
        }

        let key = match (kind, segments.as_slice()) {
            ("subnet", [network, subnet]) => Self::subnet(*network, *subnet),
            ("subnet", _) => {
                return Err(format!(
                    "invalid resource key '{s}': expected 'subnet/<network>/<id>'"
                ));
            }
            (_, [_, _, ..]) => {
                return Err(format!("invalid resource key '{s}': identifier contains '/'"));
            }
            ("network", _) => Self::network(rest),
            ("gateway", _) => Self::gateway(rest),
            ("attachment", _) => Self::attachment(rest),
            ("route", _) => Self::route(rest),
            ("rule-set", _) => Self::rule_set(rest),
            ("endpoint", _) => Self::endpoint(rest),
            ("consumer", _) => Self::consumer(rest),
            (other, _) => {
                return Err(format!("invalid resource key '{s}': unknown kind '{other}'"));
            }
        };
        Ok(key)
    }
}

impl TryFrom<String> for ResourceKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKey> for String {
    fn from(key: ResourceKey) -> Self {
        key.to_string()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
