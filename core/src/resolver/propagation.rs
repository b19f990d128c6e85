//! Transit route propagation.
//!
//! Each attachment exports its network's block (plus the default route when
//! it advertises one) into its gateway's shared table, together with every
//! block its network learned through *other* gateways. Every other
//! attachment on the gateway imports the table. Iterates to a fixed point;
//! the sets only grow, so it terminates.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::trace;

use topoc_common::network::cidr::Block;
use topoc_common::topology::{GatewayKind, Topology};

/// A block a network imported from a transit gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Learned {
    /// The importing network's attachment.
    pub via: String,
    /// The attachment that exported the block.
    pub origin: String,
}

#[derive(Debug, Default)]
pub(crate) struct Propagation {
    /// gateway → block → exporting attachment
    pub tables: BTreeMap<String, BTreeMap<Block, String>>,
    /// network → block → import
    pub learned: BTreeMap<String, BTreeMap<Block, Learned>>,
    pub rounds: usize,
}

impl Propagation {
    /// Longest-prefix entry of a gateway table covering `destination`.
    pub fn lookup(&self, gateway: &str, destination: &Block) -> Option<(&Block, &String)> {
        self.tables
            .get(gateway)?
            .iter()
            .filter(|(block, _)| block.contains(destination))
            .max_by_key(|(block, _)| block.prefix())
    }

    /// Longest-prefix import of `network` covering `destination`, ignoring
    /// anything learned through `skip_gateway`.
    pub fn learned_route<'a>(
        &'a self,
        topology: &Topology,
        network: &str,
        destination: &Block,
        skip_gateway: &str,
    ) -> Option<(&'a Block, &'a Learned)> {
        self.learned
            .get(network)?
            .iter()
            .filter(|(block, _)| block.contains(destination))
            .filter(|(_, learned)| gateway_of(topology, &learned.via) != Some(skip_gateway))
            .max_by_key(|(block, _)| block.prefix())
    }
}

fn gateway_of<'a>(topology: &'a Topology, attachment: &str) -> Option<&'a str> {
    topology
        .attachment(attachment)
        .map(|attachment| attachment.gateway.as_str())
}

pub(crate) fn propagate(topology: &Topology) -> Propagation {
    let mut state = Propagation::default();
    let transit: Vec<&str> = topology
        .gateways()
        .filter(|gateway| gateway.kind == GatewayKind::Transit)
        .map(|gateway| gateway.id.as_str())
        .collect();

    loop {
        state.rounds += 1;
        let mut changed = false;

        for &gateway in &transit {
            let attachments: Vec<_> = topology.attachments_to(gateway).collect();

            for attachment in &attachments {
                let Some(network) = topology.network(&attachment.network) else {
                    continue;
                };
                let mut exports = vec![network.cidr];
                if attachment.advertise_default {
                    exports.push(Block::default_route(network.cidr.family()));
                }
                if let Some(learned) = state.learned.get(&network.id) {
                    exports.extend(
                        learned
                            .iter()
                            .filter(|(_, entry)| gateway_of(topology, &entry.via) != Some(gateway))
                            .map(|(block, _)| *block),
                    );
                }

                let table = state.tables.entry(gateway.to_string()).or_default();
                for block in exports {
                    if let Entry::Vacant(slot) = table.entry(block) {
                        trace!("{gateway}: {} exports {block}", attachment.id);
                        slot.insert(attachment.id.clone());
                        changed = true;
                    }
                }
            }

            let Some(table) = state.tables.get(gateway) else {
                continue;
            };
            for attachment in &attachments {
                let Some(network) = topology.network(&attachment.network) else {
                    continue;
                };
                let imports = state.learned.entry(network.id.clone()).or_default();
                for (block, origin) in table {
                    if *origin == attachment.id || network.cidr.contains(block) {
                        continue;
                    }
                    if let Entry::Vacant(slot) = imports.entry(*block) {
                        trace!("{gateway}: {} imports {block} from {origin}", attachment.id);
                        slot.insert(Learned {
                            via: attachment.id.clone(),
                            origin: origin.clone(),
                        });
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return state;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{block, multi_vpc};
    use topoc_common::topology::{Attachment, Gateway, Network};

    #[test]
    fn two_networks_exchange_blocks() {
        let state = propagate(&multi_vpc());

        let table = &state.tables["tgw"];
        assert_eq!(table[&block("172.24.0.0/16")], "tgwatt-appstream");
        assert_eq!(table[&block("10.254.0.0/16")], "tgwatt-squid");
        assert_eq!(table[&block("0.0.0.0/0")], "tgwatt-squid");

        let appstream = &state.learned["vpc-appstream"];
        assert_eq!(appstream.len(), 2);
        assert_eq!(appstream[&block("10.254.0.0/16")].via, "tgwatt-appstream");
        assert_eq!(appstream[&block("0.0.0.0/0")].origin, "tgwatt-squid");

        let squid = &state.learned["vpc-squid"];
        assert_eq!(squid.len(), 1);
        assert_eq!(squid[&block("172.24.0.0/16")].origin, "tgwatt-appstream");
    }

    #[test]
    fn blocks_travel_across_chained_gateways() {
        let mut topology = multi_vpc();
        topology
            .add_network(Network::new("vpc-edge", block("192.168.0.0/16")))
            .unwrap();
        topology.add_gateway(Gateway::transit("tgw-edge")).unwrap();
        topology
            .add_attachment(Attachment::new("edge-squid", "tgw-edge", "vpc-squid", Vec::<String>::new()))
            .unwrap();
        topology
            .add_attachment(Attachment::new("edge-edge", "tgw-edge", "vpc-edge", Vec::<String>::new()))
            .unwrap();

        let state = propagate(&topology);

        // vpc-edge learns the streaming network through vpc-squid.
        let edge = &state.learned["vpc-edge"];
        assert_eq!(edge[&block("172.24.0.0/16")].origin, "edge-squid");
        // And the streaming network learns vpc-edge the same way.
        let appstream = &state.learned["vpc-appstream"];
        assert_eq!(appstream[&block("192.168.0.0/16")].origin, "tgwatt-squid");
        assert!(state.rounds > 1);
    }

    #[test]
    fn lookup_prefers_longest_prefix() {
        let state = propagate(&multi_vpc());
        let (matched, origin) = state.lookup("tgw", &block("10.254.80.0/24")).unwrap();
        assert_eq!(*matched, block("10.254.0.0/16"));
        assert_eq!(origin, "tgwatt-squid");

        let (matched, _) = state.lookup("tgw", &block("8.8.8.0/24")).unwrap();
        assert!(matched.is_default_route());
        assert!(state.lookup("tgw-missing", &block("8.8.8.0/24")).is_none());
    }
}
