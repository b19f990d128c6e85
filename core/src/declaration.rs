//! # Declaration Loader
//!
//! The JSON document format, deserialized with serde into plain records and
//! then fed through the topology builder. CIDR text is parsed here; every
//! parse failure and builder error is collected, so a broken document is
//! reported in one go.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use topoc_common::config::Config;
use topoc_common::error::{GraphError, InvalidCidr, Violation, Violations};
use topoc_common::network::cidr::{self, Block};
use topoc_common::topology::{
    AccessRule, Attachment, Consumer, Direction, Endpoint, Gateway, GatewayKind, Network, PortRange,
    Protocol, ResourceKey, Route, RouteTarget, RuleSet, Subnet, Topology, Visibility,
};

#[derive(Debug, Error)]
pub enum DeclarationError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed declaration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(Violations),
}

/// Naming parameters carried by the document. Absent values leave the
/// configuration as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    pub env: Option<String>,
    pub corp: Option<String>,
    pub service: Option<String>,
    pub key_pair: Option<String>,
}

impl Parameters {
    pub fn apply(&self, config: &mut Config) {
        if let Some(env) = &self.env {
            config.naming.env = env.clone();
        }
        if let Some(corp) = &self.corp {
            config.naming.corp = corp.clone();
        }
        if let Some(service) = &self.service {
            config.naming.service = service.clone();
        }
        if let Some(key_pair) = &self.key_pair {
            config.key_pair = key_pair.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Declaration {
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    networks: Vec<NetworkDecl>,
    #[serde(default)]
    subnets: Vec<SubnetDecl>,
    #[serde(default)]
    rule_sets: Vec<RuleSetDecl>,
    #[serde(default)]
    gateways: Vec<GatewayDecl>,
    #[serde(default)]
    attachments: Vec<AttachmentDecl>,
    #[serde(default)]
    routes: Vec<RouteDecl>,
    #[serde(default)]
    endpoints: Vec<EndpointDecl>,
    #[serde(default)]
    consumers: Vec<ConsumerDecl>,
}

fn yes() -> bool {
    true
}

fn ingress() -> Direction {
    Direction::Ingress
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct NetworkDecl {
    id: String,
    cidr: String,
    #[serde(default)]
    zones: Vec<String>,
    #[serde(default = "yes")]
    dns_support: bool,
    #[serde(default = "yes")]
    dns_hostnames: bool,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubnetDecl {
    id: String,
    network: String,
    cidr: String,
    zone: String,
    visibility: Visibility,
    #[serde(default)]
    map_public_ip: bool,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct GatewayDecl {
    id: String,
    kind: GatewayKind,
    network: Option<String>,
    subnet: Option<String>,
    instance_type: Option<String>,
    #[serde(default)]
    rule_sets: Vec<String>,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttachmentDecl {
    id: String,
    gateway: String,
    network: String,
    #[serde(default)]
    subnets: Vec<String>,
    #[serde(default)]
    advertise_default: bool,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TargetDecl {
    Gateway(String),
    Attachment(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteDecl {
    id: String,
    network: String,
    subnet: String,
    destination: String,
    target: TargetDecl,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

/// `443` or `{"from": 1400, "to": 1499}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum PortsDecl {
    Single(i64),
    Range(PortRange),
}

impl From<PortsDecl> for PortRange {
    fn from(ports: PortsDecl) -> Self {
        match ports {
            PortsDecl::Single(port) => PortRange::single(port),
            PortsDecl::Range(range) => range,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleDecl {
    #[serde(default = "ingress")]
    direction: Direction,
    protocol: Protocol,
    ports: Option<PortsDecl>,
    peer: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleSetDecl {
    id: String,
    network: String,
    #[serde(default)]
    description: String,
    #[serde(default = "yes")]
    allow_all_outbound: bool,
    #[serde(default)]
    rules: Vec<RuleDecl>,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct EndpointDecl {
    id: String,
    network: String,
    service: String,
    #[serde(default)]
    subnets: Vec<String>,
    #[serde(default = "yes")]
    private_dns: bool,
    #[serde(default)]
    rule_sets: Vec<String>,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsumerDecl {
    id: String,
    service: String,
    network: String,
    #[serde(default)]
    subnets: Vec<String>,
    #[serde(default)]
    rule_sets: Vec<String>,
    #[serde(default)]
    endpoints: Vec<String>,
    instance_type: Option<String>,
    #[serde(default = "one")]
    capacity: u32,
    #[serde(default)]
    depends_on: Vec<ResourceKey>,
}

fn one() -> u32 {
    1
}

impl Declaration {
    pub fn from_json(text: &str) -> Result<Self, DeclarationError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, DeclarationError> {
        let text = fs::read_to_string(path).map_err(|source| DeclarationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("read {} byte(s) from {}", text.len(), path.display());
        Self::from_json(&text)
    }

    /// Reads a document and builds its topology.
    pub fn load(path: &Path) -> Result<(Topology, Parameters), DeclarationError> {
        let declaration = Self::from_path(path)?;
        let parameters = declaration.parameters.clone();
        let topology = declaration
            .into_topology()
            .map_err(DeclarationError::Invalid)?;
        Ok((topology, parameters))
    }

    /// Builds the topology, collecting every CIDR and builder failure.
    pub fn into_topology(self) -> Result<Topology, Violations> {
        let mut builder = Builder::default();

        for decl in self.networks {
            let key = ResourceKey::network(&decl.id);
            let Some(cidr) = builder.block(&key, "cidr", &decl.cidr) else {
                builder.broken_networks.insert(decl.id);
                continue;
            };
            let id = decl.id.clone();
            let mut network = Network::new(decl.id, cidr).with_zones(decl.zones);
            network.dns_support = decl.dns_support;
            network.dns_hostnames = decl.dns_hostnames;
            network.depends_on = decl.depends_on;
            let result = builder.topology.add_network(network);
            if let Err(GraphError::InvalidIdentifier { .. }) = result {
                builder.broken_networks.insert(id);
            }
            builder.record(result);
        }

        for decl in self.subnets {
            let key = ResourceKey::subnet(&decl.network, &decl.id);
            let cidr = builder.block(&key, "cidr", &decl.cidr);
            // Already reported through the network's own CIDR.
            let Some(cidr) = cidr.filter(|_| !builder.broken_networks.contains(&decl.network)) else {
                continue;
            };
            let mut subnet = Subnet::new(decl.network, decl.id, cidr, decl.zone, decl.visibility);
            subnet.map_public_ip = decl.map_public_ip;
            subnet.depends_on = decl.depends_on;
            let result = builder.topology.add_subnet(subnet);
            builder.record(result);
        }

        for decl in self.rule_sets {
            let mut rule_set = RuleSet::new(decl.id, decl.network);
            rule_set.description = decl.description;
            rule_set.allow_all_outbound = decl.allow_all_outbound;
            rule_set.depends_on = decl.depends_on;
            rule_set.rules = decl
                .rules
                .into_iter()
                .map(|rule| AccessRule {
                    direction: rule.direction,
                    protocol: rule.protocol,
                    ports: rule.ports.map(PortRange::from),
                    peer: rule.peer,
                    description: rule.description,
                })
                .collect();
            let result = builder.topology.add_rule_set(rule_set);
            builder.record(result);
        }

        for decl in self.gateways {
            let gateway = Gateway {
                id: decl.id,
                kind: decl.kind,
                network: decl.network,
                subnet: decl.subnet,
                instance_type: decl.instance_type,
                rule_sets: decl.rule_sets,
                depends_on: decl.depends_on,
            };
            let result = builder.topology.add_gateway(gateway);
            builder.record(result);
        }

        for decl in self.attachments {
            let mut attachment = Attachment::new(decl.id, decl.gateway, decl.network, decl.subnets);
            attachment.advertise_default = decl.advertise_default;
            attachment.depends_on = decl.depends_on;
            let result = builder.topology.add_attachment(attachment);
            builder.record(result);
        }

        for decl in self.routes {
            let key = ResourceKey::route(&decl.id);
            let Some(destination) = builder.block(&key, "destination", &decl.destination) else {
                continue;
            };
            let target = match decl.target {
                TargetDecl::Gateway(id) => RouteTarget::Gateway(id),
                TargetDecl::Attachment(id) => RouteTarget::Attachment(id),
            };
            let mut route = Route::new(decl.id, decl.network, decl.subnet, destination, target);
            route.depends_on = decl.depends_on;
            let result = builder.topology.add_route(route);
            builder.record(result);
        }

        for decl in self.endpoints {
            let mut endpoint = Endpoint::new(decl.id, decl.network, decl.service, decl.subnets);
            endpoint.private_dns = decl.private_dns;
            endpoint.rule_sets = decl.rule_sets;
            endpoint.depends_on = decl.depends_on;
            let result = builder.topology.add_endpoint(endpoint);
            builder.record(result);
        }

        for decl in self.consumers {
            let mut consumer = Consumer::new(decl.id, decl.service, decl.network, decl.subnets);
            consumer.rule_sets = decl.rule_sets;
            consumer.endpoints = decl.endpoints;
            consumer.instance_type = decl.instance_type;
            consumer.capacity = decl.capacity;
            consumer.depends_on = decl.depends_on;
            let result = builder.topology.add_consumer(consumer);
            builder.record(result);
        }

        match Violations::from_vec(builder.violations) {
            Some(violations) => Err(violations),
            None => Ok(builder.topology),
        }
    }
}

#[derive(Default)]
struct Builder {
    topology: Topology,
    violations: Vec<Violation>,
    broken_networks: BTreeSet<String>,
}

impl Builder {
    fn block(&mut self, owner: &ResourceKey, field: &'static str, text: &str) -> Option<Block> {
        match cidr::parse(text) {
            Ok(block) => Some(block),
            Err(source) => {
                self.invalid(owner, field, source);
                None
            }
        }
    }

    fn invalid(&mut self, owner: &ResourceKey, field: &'static str, source: InvalidCidr) {
        self.violations.push(Violation::InvalidCidr {
            owner: owner.clone(),
            field,
            source,
        });
    }

    fn record(&mut self, result: Result<(), GraphError>) {
        if let Err(err) = result {
            self.violations.push(err.into());
        }
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
