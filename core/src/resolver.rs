//! # Route Resolver
//!
//! Builds the effective route table of every subnet of a [`VerifiedGraph`]:
//!
//! * the implicit `local` entry for the owning network's block;
//! * the subnet's explicit routes;
//! * for routes into a transit attachment, every block the network imports
//!   through that attachment.
//!
//! Each attachment-bound route is also traced hop by hop through the
//! gateway tables. A destination no table covers is reported as a warning;
//! a trace that comes back to an attachment already on its path is a fatal
//! [`ResolveError::RoutingLoop`].
//!
//! Resolution is a pure function of the verified graph, so running it twice
//! yields identical tables.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use topoc_common::network::cidr::Block;
use topoc_common::topology::{
    Attachment, GatewayKind, ResourceKey, Route, RouteTarget, Subnet, Topology,
};

use crate::validator::VerifiedGraph;

mod propagation;

use propagation::Propagation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("routing loop: {route} cycles through {}", join(cycle))]
    RoutingLoop {
        route: ResourceKey,
        cycle: Vec<ResourceKey>,
    },
}

/// Non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("unreachable route: {route} sends {destination} into {gateway}, which has no route for it")]
    UnreachableRoute {
        route: ResourceKey,
        destination: Block,
        gateway: ResourceKey,
    },
}

fn join(keys: &[ResourceKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextHop {
    Local,
    Gateway { gateway: String, kind: GatewayKind },
    Attachment { attachment: String, gateway: String },
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextHop::Local => write!(f, "local"),
            NextHop::Gateway { gateway, kind } => write!(f, "{} {gateway}", kind.as_str()),
            NextHop::Attachment {
                attachment,
                gateway,
            } => write!(f, "{attachment} via {gateway}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOrigin {
    Local,
    Explicit { route: String },
    Propagated { route: String, exporter: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: Block,
    pub next_hop: NextHop,
    pub origin: RouteOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub subnet: ResourceKey,
    pub entries: Vec<RouteEntry>,
}

impl RouteTable {
    /// Longest-prefix match.
    pub fn lookup(&self, destination: &Block) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.destination.contains(destination))
            .max_by_key(|entry| entry.destination.prefix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub tables: Vec<RouteTable>,
    /// Shared transit tables: gateway → (block, exporting attachment).
    pub gateway_tables: BTreeMap<String, Vec<(Block, String)>>,
    pub warnings: Vec<Warning>,
}

impl Resolution {
    pub fn table(&self, subnet: &ResourceKey) -> Option<&RouteTable> {
        self.tables.iter().find(|table| table.subnet == *subnet)
    }
}

/// How a traced route ends.
enum Reach {
    Delivered,
    Unreachable { gateway: String },
}

pub fn resolve(graph: &VerifiedGraph) -> Result<Resolution, ResolveError> {
    let topology = graph.topology();
    let propagation = propagation::propagate(topology);
    debug!("transit propagation settled after {} round(s)", propagation.rounds);

    let resolver = Resolver {
        graph,
        topology,
        propagation: &propagation,
    };

    let mut tables = Vec::new();
    let mut warnings = Vec::new();
    for subnet in topology.subnets() {
        tables.push(resolver.subnet_table(subnet, &mut warnings)?);
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    let gateway_tables = propagation
        .tables
        .iter()
        .map(|(gateway, table)| {
            let entries = table
                .iter()
                .map(|(block, origin)| (*block, origin.clone()))
                .collect();
            (gateway.clone(), entries)
        })
        .collect();

    Ok(Resolution {
        tables,
        gateway_tables,
        warnings,
    })
}

struct Resolver<'a> {
    graph: &'a VerifiedGraph,
    topology: &'a Topology,
    propagation: &'a Propagation,
}

impl Resolver<'_> {
    fn subnet_table(
        &self,
        subnet: &Subnet,
        warnings: &mut Vec<Warning>,
    ) -> Result<RouteTable, ResolveError> {
        let mut entries = Vec::new();
        if let Some(network) = self.topology.network(&subnet.network) {
            entries.push(RouteEntry {
                destination: network.cidr,
                next_hop: NextHop::Local,
                origin: RouteOrigin::Local,
            });
        }

        let mut through: Vec<(&Route, &Attachment)> = Vec::new();
        for route in self.topology.routes_of(&subnet.network, &subnet.id) {
            let Some(attachment) = self.attachment_for(route) else {
                if let RouteTarget::Gateway(id) = &route.target
                    && let Some(gateway) = self.topology.gateway(id)
                {
                    entries.push(RouteEntry {
                        destination: route.destination,
                        next_hop: NextHop::Gateway {
                            gateway: gateway.id.clone(),
                            kind: gateway.kind,
                        },
                        origin: RouteOrigin::Explicit {
                            route: route.id.clone(),
                        },
                    });
                }
                continue;
            };

            entries.push(RouteEntry {
                destination: route.destination,
                next_hop: NextHop::Attachment {
                    attachment: attachment.id.clone(),
                    gateway: attachment.gateway.clone(),
                },
                origin: RouteOrigin::Explicit {
                    route: route.id.clone(),
                },
            });

            if let Reach::Unreachable { gateway } = self.trace(route, attachment)? {
                warnings.push(Warning::UnreachableRoute {
                    route: route.key(),
                    destination: route.destination,
                    gateway: ResourceKey::gateway(gateway),
                });
            }
            through.push((route, attachment));
        }

        // Explicit entries win over imports for the same destination.
        let mut present: BTreeSet<Block> = entries.iter().map(|entry| entry.destination).collect();
        for (route, attachment) in through {
            let Some(imports) = self.propagation.learned.get(&subnet.network) else {
                continue;
            };
            for (block, learned) in imports {
                if learned.via != attachment.id || !present.insert(*block) {
                    continue;
                }
                entries.push(RouteEntry {
                    destination: *block,
                    next_hop: NextHop::Attachment {
                        attachment: attachment.id.clone(),
                        gateway: attachment.gateway.clone(),
                    },
                    origin: RouteOrigin::Propagated {
                        route: route.id.clone(),
                        exporter: learned.origin.clone(),
                    },
                });
            }
        }

        Ok(RouteTable {
            subnet: subnet.key(),
            entries,
        })
    }

    /// The attachment a route enters, if it targets a transit gateway.
    fn attachment_for(&self, route: &Route) -> Option<&Attachment> {
        match &route.target {
            RouteTarget::Attachment(id) => self.topology.attachment(id),
            RouteTarget::Gateway(id) => {
                let gateway = self.topology.gateway(id)?;
                if gateway.kind != GatewayKind::Transit {
                    return None;
                }
                self.graph.attachment_between(&route.network, id)
            }
        }
    }

    /// Follows `route` from its entry attachment through gateway tables and
    /// the imports of each network reached, until it is delivered, falls
    /// off a table, or revisits an attachment.
    fn trace(&self, route: &Route, start: &Attachment) -> Result<Reach, ResolveError> {
        let destination = route.destination;
        let mut path = vec![start.key()];
        let mut visited = BTreeSet::from([start.id.as_str()]);
        let mut current = start;

        loop {
            let gateway = current.gateway.as_str();
            path.push(ResourceKey::gateway(gateway));

            let Some((matched, origin)) = self.propagation.lookup(gateway, &destination) else {
                return Ok(Reach::Unreachable {
                    gateway: gateway.to_string(),
                });
            };

            path.push(ResourceKey::attachment(origin));
            if !visited.insert(origin.as_str()) {
                return Err(ResolveError::RoutingLoop {
                    route: route.key(),
                    cycle: path,
                });
            }

            let Some(egress) = self.topology.attachment(origin) else {
                return Ok(Reach::Delivered);
            };
            let Some(network) = self.topology.network(&egress.network) else {
                return Ok(Reach::Delivered);
            };
            if network.cidr.contains(&destination)
                || (matched.is_default_route() && egress.advertise_default)
            {
                return Ok(Reach::Delivered);
            }

            let Some((_, learned)) =
                self.propagation
                    .learned_route(self.topology, &network.id, &destination, gateway)
            else {
                return Ok(Reach::Delivered);
            };

            path.push(ResourceKey::attachment(&learned.via));
            if !visited.insert(learned.via.as_str()) {
                return Err(ResolveError::RoutingLoop {
                    route: route.key(),
                    cycle: path,
                });
            }
            let Some(next) = self.topology.attachment(&learned.via) else {
                return Ok(Reach::Delivered);
            };
            current = next;
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
