//! # Validator
//!
//! Static analysis over a fully populated [`Topology`]. The passes run in a
//! fixed order and every violation is collected; nothing stops at the first
//! problem.
//!
//! 1. **CIDR sanity**: containment and pairwise overlap.
//! 2. **Referential integrity**: every reference resolves, in the right network.
//! 3. **Attachment cardinality**: one attachment per (network, transit gateway).
//! 4. **Access rules**: port ranges and peers.
//!
//! Success yields a [`VerifiedGraph`], the only input the resolver and the
//! plan emitter accept.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::debug;

use topoc_common::error::{Violation, Violations};
use topoc_common::topology::{
    Attachment, GatewayKind, Network, ResourceKey, RouteTarget, Topology,
};

const PORTS: std::ops::RangeInclusive<i64> = 0..=u16::MAX as i64;

/// A topology that passed every validation pass.
///
/// Only [`validate`] can build one.
#[derive(Debug, Clone)]
pub struct VerifiedGraph {
    topology: Topology,
}

impl VerifiedGraph {
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn into_inner(self) -> Topology {
        self.topology
    }

    /// The attachment binding `network` to the transit gateway `gateway`.
    /// Unique once validated.
    pub fn attachment_between(&self, network: &str, gateway: &str) -> Option<&Attachment> {
        self.topology
            .attachments()
            .find(|attachment| attachment.gateway == gateway && attachment.network == network)
    }
}

pub fn validate(topology: Topology) -> Result<VerifiedGraph, Violations> {
    let mut violations = cidr_pass(&topology);
    debug!("cidr pass: {} violation(s)", violations.len());

    let before = violations.len();
    violations.extend(reference_pass(&topology));
    debug!("reference pass: {} violation(s)", violations.len() - before);

    let before = violations.len();
    violations.extend(cardinality_pass(&topology));
    debug!("attachment pass: {} violation(s)", violations.len() - before);

    let before = violations.len();
    violations.extend(rule_pass(&topology));
    debug!("rule pass: {} violation(s)", violations.len() - before);

    match Violations::from_vec(violations) {
        Some(violations) => Err(violations),
        None => Ok(VerifiedGraph { topology }),
    }
}

/// Containment and overlap. Runs in parallel per network; rayon's indexed
/// collect keeps the report order stable.
fn cidr_pass(topology: &Topology) -> Vec<Violation> {
    let networks: Vec<&Network> = topology.networks().collect();

    let network_overlaps: Vec<Violation> = networks
        .par_iter()
        .enumerate()
        .map(|(i, first)| {
            networks[i + 1..]
                .iter()
                .filter(|second| first.cidr.overlaps(&second.cidr))
                .map(|second| Violation::Overlap {
                    first: first.key(),
                    first_block: first.cidr,
                    second: second.key(),
                    second_block: second.cidr,
                })
                .collect::<Vec<_>>()
        })
        .flatten()
        .collect();

    let subnet_problems: Vec<Violation> = networks
        .par_iter()
        .map(|network| subnet_violations(topology, network))
        .flatten()
        .collect();

    network_overlaps.into_iter().chain(subnet_problems).collect()
}

fn subnet_violations(topology: &Topology, network: &Network) -> Vec<Violation> {
    let subnets: Vec<_> = topology.subnets_of(&network.id).collect();
    let mut violations = Vec::new();

    for subnet in &subnets {
        if !network.cidr.contains(&subnet.cidr) {
            violations.push(Violation::NotContained {
                subnet: subnet.key(),
                block: subnet.cidr,
                network: network.key(),
                network_block: network.cidr,
            });
        }
    }

    for (i, first) in subnets.iter().enumerate() {
        for second in &subnets[i + 1..] {
            if first.cidr.overlaps(&second.cidr) {
                violations.push(Violation::Overlap {
                    first: first.key(),
                    first_block: first.cidr,
                    second: second.key(),
                    second_block: second.cidr,
                });
            }
        }
    }
    violations
}

struct References<'a> {
    topology: &'a Topology,
    violations: Vec<Violation>,
}

impl<'a> References<'a> {
    /// Records a dangling reference; returns whether `reference` exists.
    fn expect(&mut self, owner: &ResourceKey, reference: ResourceKey) -> bool {
        if self.topology.contains(&reference) {
            return true;
        }
        self.violations.push(Violation::DanglingReference {
            owner: owner.clone(),
            reference,
        });
        false
    }

    fn expect_subnets(&mut self, owner: &ResourceKey, network: &str, subnets: &[String]) {
        for subnet in subnets {
            self.expect(owner, ResourceKey::subnet(network, subnet));
        }
    }

    /// Rule sets must exist and guard the same network as their user.
    fn expect_rule_sets(&mut self, owner: &ResourceKey, network: &str, rule_sets: &[String]) {
        for id in rule_sets {
            let reference = ResourceKey::rule_set(id);
            match self.topology.rule_set(id) {
                None => self.violations.push(Violation::DanglingReference {
                    owner: owner.clone(),
                    reference,
                }),
                Some(rule_set) if rule_set.network != network => {
                    self.violations.push(Violation::ForeignReference {
                        owner: owner.clone(),
                        reference,
                        network: ResourceKey::network(network),
                    })
                }
                Some(_) => {}
            }
        }
    }

    fn expect_all(&mut self, owner: &ResourceKey, depends_on: &[ResourceKey]) {
        for reference in depends_on {
            self.expect(owner, reference.clone());
        }
    }

    fn gateway_ownership(&mut self, gateway: ResourceKey, reason: &'static str) {
        self.violations
            .push(Violation::GatewayOwnership { gateway, reason });
    }
}

fn reference_pass(topology: &Topology) -> Vec<Violation> {
    let mut refs = References {
        topology,
        violations: Vec::new(),
    };

    for network in topology.networks() {
        refs.expect_all(&network.key(), &network.depends_on);
    }

    for subnet in topology.subnets() {
        refs.expect_all(&subnet.key(), &subnet.depends_on);
    }

    for gateway in topology.gateways() {
        let owner = gateway.key();
        match (gateway.kind, &gateway.network) {
            (GatewayKind::Transit, Some(_)) => {
                refs.gateway_ownership(owner.clone(), "is a transit gateway and cannot belong to a network")
            }
            (GatewayKind::Transit, None) => {}
            (_, None) => refs.gateway_ownership(owner.clone(), "must belong to a network"),
            (kind, Some(network)) => {
                if refs.expect(&owner, ResourceKey::network(network)) {
                    match (kind, &gateway.subnet) {
                        (GatewayKind::NatInstance, Some(subnet)) => {
                            refs.expect(&owner, ResourceKey::subnet(network, subnet));
                        }
                        (GatewayKind::NatInstance, None) => {
                            refs.gateway_ownership(owner.clone(), "is a NAT instance without a subnet")
                        }
                        _ => {}
                    }
                    refs.expect_rule_sets(&owner, network, &gateway.rule_sets);
                }
            }
        }
        if gateway.kind != GatewayKind::NatInstance && gateway.subnet.is_some() {
            refs.gateway_ownership(owner.clone(), "is placed in a subnet but is not a NAT instance");
        }
        refs.expect_all(&owner, &gateway.depends_on);
    }

    for attachment in topology.attachments() {
        let owner = attachment.key();
        refs.expect(&owner, ResourceKey::gateway(&attachment.gateway));
        if refs.expect(&owner, ResourceKey::network(&attachment.network)) {
            refs.expect_subnets(&owner, &attachment.network, &attachment.subnets);
        }
        refs.expect_all(&owner, &attachment.depends_on);
    }

    for route in topology.routes() {
        let owner = route.key();
        refs.expect(&owner, route.owner());
        let network = ResourceKey::network(&route.network);

        match &route.target {
            RouteTarget::Gateway(id) => match topology.gateway(id) {
                None => {
                    refs.expect(&owner, route.target.key());
                }
                Some(gateway) if gateway.kind == GatewayKind::Transit => {
                    let attached = topology
                        .attachments_to(id)
                        .any(|attachment| attachment.network == route.network);
                    if !attached {
                        refs.violations.push(Violation::Unattached {
                            owner: owner.clone(),
                            gateway: gateway.key(),
                            network,
                        });
                    }
                }
                Some(gateway) => {
                    if gateway.network.as_deref() != Some(route.network.as_str()) {
                        refs.violations.push(Violation::ForeignReference {
                            owner: owner.clone(),
                            reference: gateway.key(),
                            network,
                        });
                    }
                }
            },
            RouteTarget::Attachment(id) => match topology.attachment(id) {
                None => {
                    refs.expect(&owner, route.target.key());
                }
                Some(attachment) if attachment.network != route.network => {
                    refs.violations.push(Violation::ForeignReference {
                        owner: owner.clone(),
                        reference: attachment.key(),
                        network,
                    });
                }
                Some(_) => {}
            },
        }
        refs.expect_all(&owner, &route.depends_on);
    }

    for rule_set in topology.rule_sets() {
        let owner = rule_set.key();
        refs.expect(&owner, ResourceKey::network(&rule_set.network));
        refs.expect_all(&owner, &rule_set.depends_on);
    }

    for endpoint in topology.endpoints() {
        let owner = endpoint.key();
        if refs.expect(&owner, ResourceKey::network(&endpoint.network)) {
            refs.expect_subnets(&owner, &endpoint.network, &endpoint.subnets);
            refs.expect_rule_sets(&owner, &endpoint.network, &endpoint.rule_sets);
        }
        refs.expect_all(&owner, &endpoint.depends_on);
    }

    // Capacity stays inside one network; access endpoints may sit anywhere.
    for consumer in topology.consumers() {
        let owner = consumer.key();
        if refs.expect(&owner, ResourceKey::network(&consumer.network)) {
            refs.expect_subnets(&owner, &consumer.network, &consumer.subnets);
            refs.expect_rule_sets(&owner, &consumer.network, &consumer.rule_sets);
        }
        for endpoint in &consumer.endpoints {
            refs.expect(&owner, ResourceKey::endpoint(endpoint));
        }
        refs.expect_all(&owner, &consumer.depends_on);
    }

    refs.violations
}

fn cardinality_pass(topology: &Topology) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut seen: BTreeMap<(&str, &str), &Attachment> = BTreeMap::new();
    let mut not_transit: BTreeSet<&str> = BTreeSet::new();

    for attachment in topology.attachments() {
        if let Some(gateway) = topology.gateway(&attachment.gateway)
            && gateway.kind != GatewayKind::Transit
            && not_transit.insert(gateway.id.as_str())
        {
            violations.push(Violation::GatewayOwnership {
                gateway: gateway.key(),
                reason: "has attachments but is not a transit gateway",
            });
        }

        let pair = (attachment.network.as_str(), attachment.gateway.as_str());
        match seen.get(&pair) {
            Some(first) => violations.push(Violation::DuplicateAttachment {
                network: ResourceKey::network(&attachment.network),
                gateway: ResourceKey::gateway(&attachment.gateway),
                first: first.key(),
                second: attachment.key(),
            }),
            None => {
                seen.insert(pair, attachment);
            }
        }
    }
    violations
}

fn rule_pass(topology: &Topology) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rule_set in topology.rule_sets() {
        for (index, rule) in rule_set.rules.iter().enumerate() {
            let mut invalid = |reason: String| {
                violations.push(Violation::InvalidRule {
                    rule_set: rule_set.key(),
                    index,
                    reason,
                })
            };

            if let Some(ports) = rule.ports {
                if !PORTS.contains(&ports.from) || !PORTS.contains(&ports.to) {
                    invalid(format!(
                        "port range {}-{} is outside {}-{}",
                        ports.from,
                        ports.to,
                        PORTS.start(),
                        PORTS.end()
                    ));
                } else if ports.from > ports.to {
                    invalid(format!(
                        "port range start {} is after end {}",
                        ports.from, ports.to
                    ));
                }
            }

            if let Err(err) = rule.peer_block() {
                invalid(err.to_string());
            }
        }
    }
    violations
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
