#![cfg(test)]
//! Any acyclic set of declared edges yields a plan in which every dependency
//! comes first.

use proptest::prelude::*;
use topoc_common::config::Config;
use topoc_common::network::cidr::Block;
use topoc_common::topology::{Network, ResourceKey, Topology};
use topoc_core::compiler;
use topoc_core::plan::{OperationId, ResourceType};

/// A random DAG: node count, a topological rank per node, and edges that
/// always point from a later rank to an earlier one.
fn dag() -> impl Strategy<Value = (usize, Vec<usize>, Vec<(usize, usize)>)> {
    (2usize..10).prop_flat_map(|nodes| {
        let ranks = Just((0..nodes).collect::<Vec<_>>()).prop_shuffle();
        let edges = prop::collection::vec((0..nodes, 0..nodes), 0..nodes * 3);
        (Just(nodes), ranks, edges)
    })
}

fn network_id(node: usize) -> String {
    format!("net-{node}")
}

proptest! {
    #[test]
    fn declared_dags_always_order(
        (nodes, ranks, edges) in dag()
    ) {
        let mut depends_on: Vec<Vec<ResourceKey>> = vec![Vec::new(); nodes];
        for &(a, b) in &edges {
            if ranks[a] > ranks[b] {
                depends_on[a].push(ResourceKey::network(network_id(b)));
            } else if ranks[b] > ranks[a] {
                depends_on[b].push(ResourceKey::network(network_id(a)));
            }
        }

        let mut topology = Topology::new();
        for (node, declared) in depends_on.iter().enumerate() {
            let block: Block = format!("10.{node}.0.0/16").parse().unwrap();
            let mut network = Network::new(network_id(node), block);
            network.depends_on = declared.clone();
            topology.add_network(network).unwrap();
        }

        let plan = compiler::compile(topology, &Config::default()).unwrap().plan;
        prop_assert_eq!(plan.len(), nodes);

        let position = |node: usize| {
            plan.position(&OperationId::create(ResourceType::Network, network_id(node)))
                .unwrap()
        };
        for (node, declared) in depends_on.iter().enumerate() {
            for key in declared {
                let ResourceKey::Network(id) = key else {
                    unreachable!("only networks are declared");
                };
                let dependency = id.trim_start_matches("net-").parse::<usize>().unwrap();
                prop_assert!(position(dependency) < position(node));
            }
        }
    }
}
