use std::collections::BTreeMap;

use tracing::trace;

use crate::error::GraphError;
use crate::topology::entity::{
    Attachment, Consumer, Endpoint, Gateway, Network, Route, RuleSet, Subnet,
};
use crate::topology::key::{self, ResourceKey};

/// The in-memory topology of one compilation.
///
/// Each entity kind has its own identifier namespace; subnet identifiers are
/// scoped by their network. Entities are immutable once inserted: an edit is
/// a [`Topology::remove`] followed by a fresh insertion. Iteration order is
/// identifier order, which keeps every later stage deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    networks: BTreeMap<String, Network>,
    subnets: BTreeMap<(String, String), Subnet>,
    gateways: BTreeMap<String, Gateway>,
    attachments: BTreeMap<String, Attachment>,
    routes: BTreeMap<String, Route>,
    rule_sets: BTreeMap<String, RuleSet>,
    endpoints: BTreeMap<String, Endpoint>,
    consumers: BTreeMap<String, Consumer>,
}

/// Identifiers end up in `/`-separated key and operation text.
fn check_identifier(kind: &'static str, id: &str) -> Result<(), GraphError> {
    if key::is_identifier(id) {
        Ok(())
    } else {
        Err(GraphError::InvalidIdentifier {
            kind,
            id: id.to_string(),
        })
    }
}

/// Inserts into a namespace, refusing duplicates.
fn insert_unique<K: Ord, V>(
    map: &mut BTreeMap<K, V>,
    id: K,
    value: V,
    key: ResourceKey,
) -> Result<(), GraphError> {
    if map.contains_key(&id) {
        return Err(GraphError::DuplicateIdentifier { key });
    }
    trace!("added {key}");
    map.insert(id, value);
    Ok(())
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_network(&mut self, network: Network) -> Result<(), GraphError> {
        check_identifier("network", &network.id)?;
        let key = network.key();
        insert_unique(&mut self.networks, network.id.clone(), network, key)
    }

    /// Fails with [`GraphError::UnknownParent`] when the network is missing.
    pub fn add_subnet(&mut self, subnet: Subnet) -> Result<(), GraphError> {
        check_identifier("subnet", &subnet.id)?;
        let key = subnet.key();
        if !self.networks.contains_key(&subnet.network) {
            return Err(GraphError::UnknownParent {
                key,
                parent: ResourceKey::network(&subnet.network),
            });
        }
        let id = (subnet.network.clone(), subnet.id.clone());
        insert_unique(&mut self.subnets, id, subnet, key)
    }

    pub fn add_gateway(&mut self, gateway: Gateway) -> Result<(), GraphError> {
        check_identifier("gateway", &gateway.id)?;
        let key = gateway.key();
        insert_unique(&mut self.gateways, gateway.id.clone(), gateway, key)
    }

    pub fn add_attachment(&mut self, attachment: Attachment) -> Result<(), GraphError> {
        check_identifier("attachment", &attachment.id)?;
        let key = attachment.key();
        insert_unique(&mut self.attachments, attachment.id.clone(), attachment, key)
    }

    pub fn add_route(&mut self, route: Route) -> Result<(), GraphError> {
        check_identifier("route", &route.id)?;
        let key = route.key();
        insert_unique(&mut self.routes, route.id.clone(), route, key)
    }

    pub fn add_rule_set(&mut self, rule_set: RuleSet) -> Result<(), GraphError> {
        check_identifier("rule-set", &rule_set.id)?;
        let key = rule_set.key();
        insert_unique(&mut self.rule_sets, rule_set.id.clone(), rule_set, key)
    }

    pub fn add_endpoint(&mut self, endpoint: Endpoint) -> Result<(), GraphError> {
        check_identifier("endpoint", &endpoint.id)?;
        let key = endpoint.key();
        insert_unique(&mut self.endpoints, endpoint.id.clone(), endpoint, key)
    }

    pub fn add_consumer(&mut self, consumer: Consumer) -> Result<(), GraphError> {
        check_identifier("consumer", &consumer.id)?;
        let key = consumer.key();
        insert_unique(&mut self.consumers, consumer.id.clone(), consumer, key)
    }

    /// Removes an entity. Removing a network also removes its subnets.
    pub fn remove(&mut self, key: &ResourceKey) -> bool {
        match key {
            ResourceKey::Network(id) => {
                self.subnets.retain(|(network, _), _| network != id);
                self.networks.remove(id).is_some()
            }
            ResourceKey::Subnet { network, subnet } => self
                .subnets
                .remove(&(network.clone(), subnet.clone()))
                .is_some(),
            ResourceKey::Gateway(id) => self.gateways.remove(id).is_some(),
            ResourceKey::Attachment(id) => self.attachments.remove(id).is_some(),
            ResourceKey::Route(id) => self.routes.remove(id).is_some(),
            ResourceKey::RuleSet(id) => self.rule_sets.remove(id).is_some(),
            ResourceKey::Endpoint(id) => self.endpoints.remove(id).is_some(),
            ResourceKey::Consumer(id) => self.consumers.remove(id).is_some(),
        }
    }

    pub fn contains(&self, key: &ResourceKey) -> bool {
        match key {
            ResourceKey::Network(id) => self.networks.contains_key(id),
            ResourceKey::Subnet { network, subnet } => self.subnet(network, subnet).is_some(),
            ResourceKey::Gateway(id) => self.gateways.contains_key(id),
            ResourceKey::Attachment(id) => self.attachments.contains_key(id),
            ResourceKey::Route(id) => self.routes.contains_key(id),
            ResourceKey::RuleSet(id) => self.rule_sets.contains_key(id),
            ResourceKey::Endpoint(id) => self.endpoints.contains_key(id),
            ResourceKey::Consumer(id) => self.consumers.contains_key(id),
        }
    }

    pub fn network(&self, id: &str) -> Option<&Network> {
        self.networks.get(id)
    }

    pub fn subnet(&self, network: &str, id: &str) -> Option<&Subnet> {
        self.subnets.get(&(network.to_string(), id.to_string()))
    }

    pub fn gateway(&self, id: &str) -> Option<&Gateway> {
        self.gateways.get(id)
    }

    pub fn attachment(&self, id: &str) -> Option<&Attachment> {
        self.attachments.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn rule_set(&self, id: &str) -> Option<&RuleSet> {
        self.rule_sets.get(id)
    }

    pub fn endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.get(id)
    }

    pub fn consumer(&self, id: &str) -> Option<&Consumer> {
        self.consumers.get(id)
    }

    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.networks.values()
    }

    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.subnets.values()
    }

    pub fn subnets_of<'a, 'k>(
        &'a self,
        network: &'k str,
    ) -> impl Iterator<Item = &'a Subnet> + use<'a, 'k> {
        self.subnets
            .values()
            .filter(move |subnet| subnet.network == network)
    }

    pub fn gateways(&self) -> impl Iterator<Item = &Gateway> {
        self.gateways.values()
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.values()
    }

    /// Attachments bound to the given transit gateway.
    pub fn attachments_to<'a, 'k>(
        &'a self,
        gateway: &'k str,
    ) -> impl Iterator<Item = &'a Attachment> + use<'a, 'k> {
        self.attachments
            .values()
            .filter(move |attachment| attachment.gateway == gateway)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    pub fn routes_of<'a, 'k>(
        &'a self,
        network: &'k str,
        subnet: &'k str,
    ) -> impl Iterator<Item = &'a Route> + use<'a, 'k> {
        self.routes
            .values()
            .filter(move |route| route.network == network && route.subnet == subnet)
    }

    pub fn rule_sets(&self) -> impl Iterator<Item = &RuleSet> {
        self.rule_sets.values()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn consumers(&self) -> impl Iterator<Item = &Consumer> {
        self.consumers.values()
    }

    /// Total number of entities across all namespaces.
    pub fn len(&self) -> usize {
        self.networks.len()
            + self.subnets.len()
            + self.gateways.len()
            + self.attachments.len()
            + self.routes.len()
            + self.rule_sets.len()
            + self.endpoints.len()
            + self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
