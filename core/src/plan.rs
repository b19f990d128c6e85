//! # Plan Emitter
//!
//! Turns a [`VerifiedGraph`] and its [`Resolution`] into an ordered list of
//! provider-agnostic operations. Edges come from two places: the reference
//! fields of every entity, and the `depends_on` keys users declare.
//!
//! Operations are first drafted in a fixed emission order (resource type,
//! then identifier) and then topologically sorted; see [`order`].

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use topoc_common::config::Config;
use topoc_common::topology::{
    AccessRule, Gateway, GatewayKind, ResourceKey, Route, RouteTarget, Topology,
};

use crate::resolver::Resolution;
use crate::validator::VerifiedGraph;

mod order;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("cyclic plan: {}", join(cycle))]
    CyclicPlan { cycle: Vec<OperationId> },

    #[error("{operation} is drafted twice")]
    DuplicateOperation { operation: OperationId },

    #[error("{operation} depends on {dependency}, which is not part of the plan")]
    UnknownDependency {
        operation: OperationId,
        dependency: String,
    },
}

fn join(ids: &[OperationId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Update => write!(f, "update"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Network,
    Subnet,
    RuleSet,
    InternetGateway,
    GatewayAttachment,
    NatInstance,
    TransitGateway,
    TransitRouteTable,
    TransitAttachment,
    TransitRoute,
    Route,
    Endpoint,
    Consumer,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Network => "network",
            ResourceType::Subnet => "subnet",
            ResourceType::RuleSet => "rule-set",
            ResourceType::InternetGateway => "internet-gateway",
            ResourceType::GatewayAttachment => "gateway-attachment",
            ResourceType::NatInstance => "nat-instance",
            ResourceType::TransitGateway => "transit-gateway",
            ResourceType::TransitRouteTable => "transit-route-table",
            ResourceType::TransitAttachment => "transit-attachment",
            ResourceType::TransitRoute => "transit-route",
            ResourceType::Route => "route",
            ResourceType::Endpoint => "endpoint",
            ResourceType::Consumer => "consumer",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one operation, rendered as `create subnet/vpc-a/private-a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId {
    pub kind: OperationKind,
    pub resource_type: ResourceType,
    pub resource_id: String,
}

impl OperationId {
    pub fn create(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Create,
            resource_type,
            resource_id: resource_id.into(),
        }
    }

    pub fn update(resource_type: ResourceType, resource_id: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Update,
            resource_type,
            resource_id: resource_id.into(),
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.resource_type, self.resource_id)
    }
}

impl Serialize for OperationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub resource_type: ResourceType,
    pub resource_id: String,
    pub properties: Value,
    pub depends_on: Vec<OperationId>,
}

impl Operation {
    pub fn id(&self) -> OperationId {
        OperationId {
            kind: self.kind,
            resource_type: self.resource_type,
            resource_id: self.resource_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub operations: Vec<Operation>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    /// Position of an operation in the ordered plan.
    pub fn position(&self, id: &OperationId) -> Option<usize> {
        self.operations.iter().position(|operation| operation.id() == *id)
    }

    /// Hands every operation to `executor` in plan order, stopping at the
    /// first failure. Returns the number of operations applied.
    pub fn execute<E: PlanExecutor + ?Sized>(&self, executor: &mut E) -> anyhow::Result<usize> {
        for (applied, operation) in self.operations.iter().enumerate() {
            if let Err(err) = executor.apply(operation) {
                return Err(err.context(format!(
                    "{} failed after {applied} applied operation(s)",
                    operation.id()
                )));
            }
        }
        Ok(self.operations.len())
    }
}

/// Whatever actually provisions resources.
pub trait PlanExecutor {
    fn apply(&mut self, operation: &Operation) -> anyhow::Result<()>;
}

pub fn emit(
    graph: &VerifiedGraph,
    resolution: &Resolution,
    config: &Config,
) -> Result<Plan, PlanError> {
    let mut draft = Draft {
        topology: graph.topology(),
        graph,
        config,
        operations: Vec::new(),
    };

    draft.networks()?;
    draft.subnets()?;
    draft.rule_sets()?;
    draft.gateways()?;
    draft.transit_attachments()?;
    draft.transit_routes(resolution);
    draft.routes()?;
    draft.endpoints()?;
    draft.consumers()?;

    debug!("drafted {} operation(s)", draft.operations.len());
    let operations = order::topological(draft.operations)?;
    Ok(Plan { operations })
}

struct Draft<'a> {
    topology: &'a Topology,
    graph: &'a VerifiedGraph,
    config: &'a Config,
    operations: Vec<Operation>,
}

impl Draft<'_> {
    fn name(&self, id: &str) -> String {
        self.config.naming.resource_name(id)
    }

    fn push(
        &mut self,
        id: OperationId,
        properties: Value,
        mut depends_on: Vec<OperationId>,
        declared: &[ResourceKey],
    ) -> Result<(), PlanError> {
        for key in declared {
            let dependency = self
                .creator(key)
                .ok_or_else(|| PlanError::UnknownDependency {
                    operation: id.clone(),
                    dependency: key.to_string(),
                })?;
            depends_on.push(dependency);
        }

        let mut seen = std::collections::BTreeSet::new();
        depends_on.retain(|dependency| seen.insert(dependency.clone()));

        self.operations.push(Operation {
            kind: id.kind,
            resource_type: id.resource_type,
            resource_id: id.resource_id,
            properties,
            depends_on,
        });
        Ok(())
    }

    /// The operation that creates the resource behind a key.
    fn creator(&self, key: &ResourceKey) -> Option<OperationId> {
        let id = match key {
            ResourceKey::Network(id) => OperationId::create(ResourceType::Network, id),
            ResourceKey::Subnet { network, subnet } => subnet_op(network, subnet),
            ResourceKey::Gateway(id) => gateway_op(self.topology.gateway(id)?),
            ResourceKey::Attachment(id) => OperationId::create(ResourceType::TransitAttachment, id),
            ResourceKey::Route(id) => OperationId::create(ResourceType::Route, id),
            ResourceKey::RuleSet(id) => OperationId::create(ResourceType::RuleSet, id),
            ResourceKey::Endpoint(id) => OperationId::create(ResourceType::Endpoint, id),
            ResourceKey::Consumer(id) => OperationId::create(ResourceType::Consumer, id),
        };
        self.topology.contains(key).then_some(id)
    }

    fn networks(&mut self) -> Result<(), PlanError> {
        for network in self.topology.networks() {
            let properties = json!({
                "name": self.name(&network.id),
                "cidr": network.cidr.to_string(),
                "zones": network.zones,
                "dns_support": network.dns_support,
                "dns_hostnames": network.dns_hostnames,
            });
            self.push(
                OperationId::create(ResourceType::Network, &network.id),
                properties,
                Vec::new(),
                &network.depends_on,
            )?;
        }
        Ok(())
    }

    fn subnets(&mut self) -> Result<(), PlanError> {
        for subnet in self.topology.subnets() {
            let properties = json!({
                "name": self.name(&format!("{}-{}", subnet.network, subnet.id)),
                "network": subnet.network,
                "cidr": subnet.cidr.to_string(),
                "zone": subnet.zone,
                "visibility": subnet.visibility,
                "map_public_ip": subnet.map_public_ip,
            });
            self.push(
                subnet_op(&subnet.network, &subnet.id),
                properties,
                vec![OperationId::create(ResourceType::Network, &subnet.network)],
                &subnet.depends_on,
            )?;
        }
        Ok(())
    }

    fn rule_sets(&mut self) -> Result<(), PlanError> {
        for rule_set in self.topology.rule_sets() {
            let rules: Vec<Value> = rule_set.rules.iter().map(rule_properties).collect();
            let properties = json!({
                "name": self.name(&rule_set.id),
                "network": rule_set.network,
                "description": rule_set.description,
                "allow_all_outbound": rule_set.allow_all_outbound,
                "rules": rules,
            });
            self.push(
                OperationId::create(ResourceType::RuleSet, &rule_set.id),
                properties,
                vec![OperationId::create(ResourceType::Network, &rule_set.network)],
                &rule_set.depends_on,
            )?;
        }
        Ok(())
    }

    fn gateways(&mut self) -> Result<(), PlanError> {
        for gateway in self.topology.gateways() {
            match gateway.kind {
                GatewayKind::Internet => self.internet_gateway(gateway)?,
                GatewayKind::NatInstance => self.nat_instance(gateway)?,
                GatewayKind::Transit => self.transit_gateway(gateway)?,
            }
        }
        Ok(())
    }

    fn internet_gateway(&mut self, gateway: &Gateway) -> Result<(), PlanError> {
        self.push(
            OperationId::create(ResourceType::InternetGateway, &gateway.id),
            json!({ "name": self.name(&gateway.id) }),
            Vec::new(),
            &gateway.depends_on,
        )?;

        let Some(network) = &gateway.network else {
            return Ok(());
        };
        self.push(
            OperationId::create(ResourceType::GatewayAttachment, &gateway.id),
            json!({ "gateway": gateway.id, "network": network }),
            vec![
                OperationId::create(ResourceType::InternetGateway, &gateway.id),
                OperationId::create(ResourceType::Network, network),
            ],
            &[],
        )
    }

    fn nat_instance(&mut self, gateway: &Gateway) -> Result<(), PlanError> {
        let mut depends_on = Vec::new();
        if let (Some(network), Some(subnet)) = (&gateway.network, &gateway.subnet) {
            depends_on.push(subnet_op(network, subnet));
        }
        depends_on.extend(
            gateway
                .rule_sets
                .iter()
                .map(|id| OperationId::create(ResourceType::RuleSet, id)),
        );

        let properties = json!({
            "name": self.name(&gateway.id),
            "network": gateway.network,
            "subnet": gateway.subnet,
            "instance_type": gateway.instance_type,
            "key_pair": self.config.key_pair,
            "source_dest_check": false,
            "rule_sets": gateway.rule_sets,
        });
        self.push(
            OperationId::create(ResourceType::NatInstance, &gateway.id),
            properties,
            depends_on,
            &gateway.depends_on,
        )
    }

    fn transit_gateway(&mut self, gateway: &Gateway) -> Result<(), PlanError> {
        let gateway_op = OperationId::create(ResourceType::TransitGateway, &gateway.id);
        self.push(
            gateway_op.clone(),
            json!({ "name": self.name(&gateway.id) }),
            Vec::new(),
            &gateway.depends_on,
        )?;
        self.push(
            OperationId::create(ResourceType::TransitRouteTable, &gateway.id),
            json!({
                "name": self.name(&format!("{}-rt", gateway.id)),
                "gateway": gateway.id,
            }),
            vec![gateway_op],
            &[],
        )
    }

    /// Attachment creates, then one `update` per attachment associating it
    /// with its gateway's route table.
    fn transit_attachments(&mut self) -> Result<(), PlanError> {
        for attachment in self.topology.attachments() {
            let mut depends_on = vec![
                OperationId::create(ResourceType::TransitGateway, &attachment.gateway),
                OperationId::create(ResourceType::Network, &attachment.network),
            ];
            depends_on.extend(
                attachment
                    .subnets
                    .iter()
                    .map(|subnet| subnet_op(&attachment.network, subnet)),
            );
            let properties = json!({
                "name": self.name(&attachment.id),
                "gateway": attachment.gateway,
                "network": attachment.network,
                "subnets": attachment.subnets,
            });
            self.push(
                OperationId::create(ResourceType::TransitAttachment, &attachment.id),
                properties,
                depends_on,
                &attachment.depends_on,
            )?;
        }

        for attachment in self.topology.attachments() {
            self.push(
                OperationId::update(ResourceType::TransitAttachment, &attachment.id),
                json!({ "route_table": attachment.gateway }),
                vec![
                    OperationId::create(ResourceType::TransitAttachment, &attachment.id),
                    OperationId::create(ResourceType::TransitRouteTable, &attachment.gateway),
                ],
                &[],
            )?;
        }
        Ok(())
    }

    /// One static route per entry of every settled gateway table.
    fn transit_routes(&mut self, resolution: &Resolution) {
        for (gateway, entries) in &resolution.gateway_tables {
            for (block, attachment) in entries {
                let properties = json!({
                    "route_table": gateway,
                    "destination": block.to_string(),
                    "attachment": attachment,
                    "blackhole": false,
                });
                self.operations.push(Operation {
                    kind: OperationKind::Create,
                    resource_type: ResourceType::TransitRoute,
                    resource_id: format!("{gateway}/{block}"),
                    properties,
                    depends_on: vec![
                        OperationId::create(ResourceType::TransitRouteTable, gateway),
                        OperationId::create(ResourceType::TransitAttachment, attachment),
                    ],
                });
            }
        }
    }

    fn routes(&mut self) -> Result<(), PlanError> {
        for route in self.topology.routes() {
            let (target, hop) = self.route_target(route);
            let mut depends_on = vec![subnet_op(&route.network, &route.subnet)];
            depends_on.extend(hop);

            let properties = json!({
                "network": route.network,
                "subnet": route.subnet,
                "destination": route.destination.to_string(),
                "target": target,
            });
            self.push(
                OperationId::create(ResourceType::Route, &route.id),
                properties,
                depends_on,
                &route.depends_on,
            )?;
        }
        Ok(())
    }

    /// Target properties and the operation the route has to wait for.
    fn route_target(&self, route: &Route) -> (Value, Option<OperationId>) {
        match &route.target {
            RouteTarget::Attachment(id) => (
                json!({ "attachment": id }),
                Some(OperationId::create(ResourceType::TransitAttachment, id)),
            ),
            RouteTarget::Gateway(id) => match self.topology.gateway(id).map(|gw| gw.kind) {
                Some(GatewayKind::Internet) => (
                    json!({ "internet_gateway": id }),
                    Some(OperationId::create(ResourceType::GatewayAttachment, id)),
                ),
                Some(GatewayKind::NatInstance) => (
                    json!({ "instance": id }),
                    Some(OperationId::create(ResourceType::NatInstance, id)),
                ),
                Some(GatewayKind::Transit) => {
                    let attachment = self.graph.attachment_between(&route.network, id);
                    (
                        json!({ "transit_gateway": id, "attachment": attachment.map(|a| &a.id) }),
                        attachment
                            .map(|a| OperationId::create(ResourceType::TransitAttachment, &a.id)),
                    )
                }
                None => (json!({ "gateway": id }), None),
            },
        }
    }

    fn endpoints(&mut self) -> Result<(), PlanError> {
        for endpoint in self.topology.endpoints() {
            let mut depends_on = vec![OperationId::create(ResourceType::Network, &endpoint.network)];
            depends_on.extend(
                endpoint
                    .subnets
                    .iter()
                    .map(|subnet| subnet_op(&endpoint.network, subnet)),
            );
            depends_on.extend(
                endpoint
                    .rule_sets
                    .iter()
                    .map(|id| OperationId::create(ResourceType::RuleSet, id)),
            );

            let properties = json!({
                "name": self.name(&endpoint.id),
                "network": endpoint.network,
                "service": endpoint.service,
                "subnets": endpoint.subnets,
                "private_dns": endpoint.private_dns,
                "rule_sets": endpoint.rule_sets,
            });
            self.push(
                OperationId::create(ResourceType::Endpoint, &endpoint.id),
                properties,
                depends_on,
                &endpoint.depends_on,
            )?;
        }
        Ok(())
    }

    fn consumers(&mut self) -> Result<(), PlanError> {
        for consumer in self.topology.consumers() {
            let mut depends_on: Vec<OperationId> = consumer
                .subnets
                .iter()
                .map(|subnet| subnet_op(&consumer.network, subnet))
                .collect();
            depends_on.extend(
                consumer
                    .rule_sets
                    .iter()
                    .map(|id| OperationId::create(ResourceType::RuleSet, id)),
            );
            depends_on.extend(
                consumer
                    .endpoints
                    .iter()
                    .map(|id| OperationId::create(ResourceType::Endpoint, id)),
            );

            let properties = json!({
                "name": self.name(&consumer.id),
                "service": consumer.service,
                "network": consumer.network,
                "subnets": consumer.subnets,
                "rule_sets": consumer.rule_sets,
                "endpoints": consumer.endpoints,
                "instance_type": consumer.instance_type,
                "capacity": consumer.capacity,
            });
            self.push(
                OperationId::create(ResourceType::Consumer, &consumer.id),
                properties,
                depends_on,
                &consumer.depends_on,
            )?;
        }
        Ok(())
    }
}

fn subnet_op(network: &str, subnet: &str) -> OperationId {
    OperationId::create(ResourceType::Subnet, format!("{network}/{subnet}"))
}

fn gateway_op(gateway: &Gateway) -> OperationId {
    let resource_type = match gateway.kind {
        GatewayKind::Internet => ResourceType::InternetGateway,
        GatewayKind::NatInstance => ResourceType::NatInstance,
        GatewayKind::Transit => ResourceType::TransitGateway,
    };
    OperationId::create(resource_type, &gateway.id)
}

fn rule_properties(rule: &AccessRule) -> Value {
    // Peers were checked by the validator; unresolvable text is passed through.
    let peer = rule
        .peer_block()
        .map(|block| block.to_string())
        .unwrap_or_else(|_| rule.peer.clone());
    json!({
        "direction": rule.direction,
        "protocol": rule.protocol,
        "from_port": rule.ports.map(|ports| ports.from),
        "to_port": rule.ports.map(|ports| ports.to),
        "peer": peer,
        "description": rule.description,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::multi_vpc;
    use crate::resolver::resolve;
    use crate::validator::validate;

    fn planned(topology: Topology) -> Result<Plan, PlanError> {
        let graph = validate(topology).unwrap();
        let resolution = resolve(&graph).unwrap();
        emit(&graph, &resolution, &Config::default())
    }

    fn assert_topological(plan: &Plan) {
        for (index, operation) in plan.iter().enumerate() {
            for dependency in &operation.depends_on {
                let before = plan.position(dependency).unwrap();
                assert!(before < index, "{} runs before {dependency}", operation.id());
            }
        }
    }

    #[test]
    fn every_dependency_precedes_its_dependent() {
        let plan = planned(multi_vpc()).unwrap();
        assert_topological(&plan);
    }

    #[test]
    fn plan_covers_every_resource() {
        let plan = planned(multi_vpc()).unwrap();
        let count = |resource_type| {
            plan.iter()
                .filter(|op| op.resource_type == resource_type)
                .count()
        };
        assert_eq!(count(ResourceType::Network), 2);
        assert_eq!(count(ResourceType::Subnet), 6);
        assert_eq!(count(ResourceType::RuleSet), 4);
        assert_eq!(count(ResourceType::InternetGateway), 1);
        assert_eq!(count(ResourceType::GatewayAttachment), 1);
        assert_eq!(count(ResourceType::NatInstance), 1);
        assert_eq!(count(ResourceType::TransitGateway), 1);
        assert_eq!(count(ResourceType::TransitRouteTable), 1);
        // Two creates plus two route table associations.
        assert_eq!(count(ResourceType::TransitAttachment), 4);
        // 172.24/16, 10.254/16 and the advertised default route.
        assert_eq!(count(ResourceType::TransitRoute), 3);
        assert_eq!(count(ResourceType::Route), 8);
        assert_eq!(count(ResourceType::Endpoint), 1);
        assert_eq!(count(ResourceType::Consumer), 1);
    }

    #[test]
    fn consumer_waits_for_its_access_endpoint() {
        let plan = planned(multi_vpc()).unwrap();
        let fleet = OperationId::create(ResourceType::Consumer, "asfleet");
        let consumer = &plan.operations[plan.position(&fleet).unwrap()];

        assert_eq!(consumer.properties["capacity"], 1);
        for dependency in [
            OperationId::create(ResourceType::Endpoint, "asvpcendpoint"),
            OperationId::create(ResourceType::RuleSet, "ashttpshttpsg"),
            OperationId::create(ResourceType::Subnet, "vpc-appstream/private-c"),
        ] {
            assert!(consumer.depends_on.contains(&dependency), "missing {dependency}");
        }
        assert_eq!(plan.operations.last().map(Operation::id), Some(fleet));
    }

    #[test]
    fn acyclic_input_keeps_emission_order() {
        let plan = planned(multi_vpc()).unwrap();
        let first: Vec<String> = plan.iter().take(3).map(|op| op.id().to_string()).collect();
        assert_eq!(
            first,
            vec![
                "create network/vpc-appstream",
                "create network/vpc-squid",
                "create subnet/vpc-appstream/private-a",
            ]
        );
    }

    #[test]
    fn nat_instance_carries_config() {
        let plan = planned(multi_vpc()).unwrap();
        let squid = plan
            .iter()
            .find(|op| op.resource_type == ResourceType::NatInstance)
            .unwrap();
        assert_eq!(squid.properties["name"], "test-samcorp-tgwtest-squid");
        assert_eq!(squid.properties["key_pair"], "sample_keypair");
        assert_eq!(squid.properties["source_dest_check"], false);
        assert!(squid
            .depends_on
            .contains(&OperationId::create(ResourceType::RuleSet, "httpsg")));
    }

    #[test]
    fn transit_gateway_route_waits_for_the_attachment() {
        let plan = planned(multi_vpc()).unwrap();
        let route = &plan.operations
            [plan.position(&OperationId::create(ResourceType::Route, "tgw-squid-a")).unwrap()];
        assert_eq!(route.properties["target"]["attachment"], "tgwatt-squid");
        assert!(route
            .depends_on
            .contains(&OperationId::create(ResourceType::TransitAttachment, "tgwatt-squid")));
    }

    #[test]
    fn declared_edges_reorder_the_plan() {
        let mut topology = multi_vpc();
        topology.remove(&ResourceKey::network("vpc-appstream"));
        let mut network = topoc_common::topology::Network::new(
            "vpc-appstream",
            crate::fixtures::block("172.24.0.0/16"),
        );
        network.depends_on = vec![ResourceKey::network("vpc-squid")];
        topology.add_network(network).unwrap();
        for subnet in crate::fixtures::multi_vpc().subnets_of("vpc-appstream") {
            topology.add_subnet(subnet.clone()).unwrap();
        }

        let plan = planned(topology).unwrap();
        assert_topological(&plan);
        let squid = plan.position(&OperationId::create(ResourceType::Network, "vpc-squid"));
        let appstream = plan.position(&OperationId::create(ResourceType::Network, "vpc-appstream"));
        assert!(squid < appstream);
    }

    #[test]
    fn mutual_dependency_is_cyclic() {
        let mut topology = multi_vpc();
        topology.remove(&ResourceKey::network("vpc-appstream"));
        let mut network = topoc_common::topology::Network::new(
            "vpc-appstream",
            crate::fixtures::block("172.24.0.0/16"),
        );
        network.depends_on = vec![ResourceKey::subnet("vpc-appstream", "private-a")];
        topology.add_network(network).unwrap();
        for subnet in crate::fixtures::multi_vpc().subnets_of("vpc-appstream") {
            topology.add_subnet(subnet.clone()).unwrap();
        }

        let err = planned(topology).unwrap_err();
        let PlanError::CyclicPlan { cycle } = err else {
            panic!("expected a cyclic plan, got {err}");
        };
        assert_eq!(cycle.len(), 2);
        assert!(cycle.contains(&OperationId::create(ResourceType::Network, "vpc-appstream")));
        assert!(cycle.contains(&OperationId::create(ResourceType::Subnet, "vpc-appstream/private-a")));
    }

    #[test]
    fn self_dependency_is_cyclic() {
        let mut topology = multi_vpc();
        topology.remove(&ResourceKey::rule_set("appstreamsg"));
        let mut rule_set = topoc_common::topology::RuleSet::new("appstreamsg", "vpc-squid");
        rule_set.depends_on = vec![ResourceKey::rule_set("appstreamsg")];
        topology.add_rule_set(rule_set).unwrap();

        let err = planned(topology).unwrap_err();
        assert_eq!(
            err,
            PlanError::CyclicPlan {
                cycle: vec![OperationId::create(ResourceType::RuleSet, "appstreamsg")],
            }
        );
    }

    struct Recorder(Vec<String>);

    impl PlanExecutor for Recorder {
        fn apply(&mut self, operation: &Operation) -> anyhow::Result<()> {
            if operation.resource_type == ResourceType::Endpoint {
                anyhow::bail!("quota exceeded");
            }
            self.0.push(operation.id().to_string());
            Ok(())
        }
    }

    #[test]
    fn executor_stops_at_first_failure() {
        let plan = planned(multi_vpc()).unwrap();
        let mut recorder = Recorder(Vec::new());
        let err = plan.execute(&mut recorder).unwrap_err();

        let endpoint = plan
            .position(&OperationId::create(ResourceType::Endpoint, "asvpcendpoint"))
            .unwrap();
        assert_eq!(recorder.0.len(), endpoint);
        assert!(format!("{err:#}").contains("quota exceeded"));
    }
}
