//! # Topology Entities
//!
//! Plain data types. All cross-entity references are identifiers; whether
//! they resolve is the validator's concern, except a subnet's network which
//! the builder checks at insertion.
//!
//! Every entity also carries `depends_on`, user-declared plan edges on top
//! of the ones derived from its references.

use serde::{Deserialize, Serialize};

use crate::error::{CidrFault, InvalidCidr};
use crate::network::cidr::{self, Block, Family};
use crate::topology::key::ResourceKey;

/// A virtual network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub cidr: Block,
    pub zones: Vec<String>,
    pub dns_support: bool,
    pub dns_hostnames: bool,
    pub depends_on: Vec<ResourceKey>,
}

impl Network {
    pub fn new(id: impl Into<String>, cidr: Block) -> Self {
        Self {
            id: id.into(),
            cidr,
            zones: Vec::new(),
            dns_support: true,
            dns_hostnames: true,
            depends_on: Vec::new(),
        }
    }

    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zones = zones.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::network(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: String,
    pub network: String,
    pub cidr: Block,
    pub zone: String,
    pub visibility: Visibility,
    pub map_public_ip: bool,
    pub depends_on: Vec<ResourceKey>,
}

impl Subnet {
    pub fn new(
        network: impl Into<String>,
        id: impl Into<String>,
        cidr: Block,
        zone: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            id: id.into(),
            network: network.into(),
            cidr,
            zone: zone.into(),
            visibility,
            map_public_ip: false,
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::subnet(&self.network, &self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatewayKind {
    Internet,
    NatInstance,
    Transit,
}

impl GatewayKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayKind::Internet => "internet",
            GatewayKind::NatInstance => "nat-instance",
            GatewayKind::Transit => "transit",
        }
    }
}

/// Internet gateway, NAT instance or transit hub.
///
/// * `internet` and `nat-instance` gateways belong to a network.
/// * A `nat-instance` is also placed in one of that network's subnets.
/// * A `transit` gateway has no owner; networks reach it through
///   [`Attachment`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gateway {
    pub id: String,
    pub kind: GatewayKind,
    pub network: Option<String>,
    pub subnet: Option<String>,
    pub instance_type: Option<String>,
    pub rule_sets: Vec<String>,
    pub depends_on: Vec<ResourceKey>,
}

impl Gateway {
    pub fn internet(id: impl Into<String>, network: impl Into<String>) -> Self {
        Self::bare(id, GatewayKind::Internet, Some(network.into()))
    }

    pub fn nat_instance(
        id: impl Into<String>,
        network: impl Into<String>,
        subnet: impl Into<String>,
    ) -> Self {
        let mut gateway = Self::bare(id, GatewayKind::NatInstance, Some(network.into()));
        gateway.subnet = Some(subnet.into());
        gateway
    }

    pub fn transit(id: impl Into<String>) -> Self {
        Self::bare(id, GatewayKind::Transit, None)
    }

    fn bare(id: impl Into<String>, kind: GatewayKind, network: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            network,
            subnet: None,
            instance_type: None,
            rule_sets: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::gateway(&self.id)
    }
}

/// Binds one network's subnets to a transit gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub gateway: String,
    pub network: String,
    pub subnets: Vec<String>,
    /// Also export the default route into the gateway table.
    pub advertise_default: bool,
    pub depends_on: Vec<ResourceKey>,
}

impl Attachment {
    pub fn new<I, S>(
        id: impl Into<String>,
        gateway: impl Into<String>,
        network: impl Into<String>,
        subnets: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            gateway: gateway.into(),
            network: network.into(),
            subnets: subnets.into_iter().map(Into::into).collect(),
            advertise_default: false,
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::attachment(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteTarget {
    Gateway(String),
    Attachment(String),
}

impl RouteTarget {
    pub fn key(&self) -> ResourceKey {
        match self {
            RouteTarget::Gateway(id) => ResourceKey::gateway(id),
            RouteTarget::Attachment(id) => ResourceKey::attachment(id),
        }
    }
}

/// An explicit route in a subnet's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub network: String,
    pub subnet: String,
    pub destination: Block,
    pub target: RouteTarget,
    pub depends_on: Vec<ResourceKey>,
}

impl Route {
    pub fn new(
        id: impl Into<String>,
        network: impl Into<String>,
        subnet: impl Into<String>,
        destination: Block,
        target: RouteTarget,
    ) -> Self {
        Self {
            id: id.into(),
            network: network.into(),
            subnet: subnet.into(),
            destination,
            target,
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::route(&self.id)
    }

    pub fn owner(&self) -> ResourceKey {
        ResourceKey::subnet(&self.network, &self.subnet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
}

/// Inclusive port range. Signed and wider than `u16` so out-of-range input,
/// negative ports included, survives loading and is reported by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub from: i64,
    pub to: i64,
}

impl PortRange {
    pub fn single(port: i64) -> Self {
        Self {
            from: port,
            to: port,
        }
    }

    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub direction: Direction,
    pub protocol: Protocol,
    pub ports: Option<PortRange>,
    /// CIDR text, or `any-ipv4` / `any-ipv6`.
    pub peer: String,
    pub description: String,
}

impl AccessRule {
    pub fn ingress(protocol: Protocol, ports: PortRange, peer: impl Into<String>) -> Self {
        Self {
            direction: Direction::Ingress,
            protocol,
            ports: Some(ports),
            peer: peer.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Resolves the peer text to a block.
    pub fn peer_block(&self) -> Result<Block, InvalidCidr> {
        match self.peer.as_str() {
            "any-ipv4" => Ok(Block::default_route(Family::V4)),
            "any-ipv6" => Ok(Block::default_route(Family::V6)),
            "" => Err(InvalidCidr {
                text: String::new(),
                reason: CidrFault::MissingPrefix,
            }),
            text => cidr::parse(text),
        }
    }
}

/// A named set of access rules guarding endpoints and instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub id: String,
    pub network: String,
    pub description: String,
    pub allow_all_outbound: bool,
    pub rules: Vec<AccessRule>,
    pub depends_on: Vec<ResourceKey>,
}

impl RuleSet {
    pub fn new(id: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            network: network.into(),
            description: String::new(),
            allow_all_outbound: true,
            rules: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::rule_set(&self.id)
    }
}

/// Managed-service interface endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub id: String,
    pub network: String,
    pub subnets: Vec<String>,
    pub service: String,
    pub private_dns: bool,
    pub rule_sets: Vec<String>,
    pub depends_on: Vec<ResourceKey>,
}

impl Endpoint {
    pub fn new<I, S>(
        id: impl Into<String>,
        network: impl Into<String>,
        service: impl Into<String>,
        subnets: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            network: network.into(),
            subnets: subnets.into_iter().map(Into::into).collect(),
            service: service.into(),
            private_dns: true,
            rule_sets: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::endpoint(&self.id)
    }
}

/// A managed service that runs capacity inside one network's subnets, guarded
/// by that network's rule sets, and is reached through access endpoints that
/// may live in any network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    pub id: String,
    pub service: String,
    pub network: String,
    pub subnets: Vec<String>,
    pub rule_sets: Vec<String>,
    pub endpoints: Vec<String>,
    pub instance_type: Option<String>,
    pub capacity: u32,
    pub depends_on: Vec<ResourceKey>,
}

impl Consumer {
    pub fn new<I, S>(
        id: impl Into<String>,
        service: impl Into<String>,
        network: impl Into<String>,
        subnets: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            service: service.into(),
            network: network.into(),
            subnets: subnets.into_iter().map(Into::into).collect(),
            rule_sets: Vec::new(),
            endpoints: Vec::new(),
            instance_type: None,
            capacity: 1,
            depends_on: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::consumer(&self.id)
    }
}
