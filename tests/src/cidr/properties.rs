#![cfg(test)]
//! Properties of block arithmetic and of what the validator lets through.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use proptest::prelude::*;
use topoc_common::network::cidr::{self, Block};
use topoc_common::topology::{Network, Subnet, Topology, Visibility};
use topoc_core::validator::validate;

fn v4_block() -> impl Strategy<Value = Block> {
    (any::<u32>(), 0u8..=32).prop_map(|(addr, prefix)| {
        let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
        Block::new(IpAddr::V4(Ipv4Addr::from(addr & mask)), prefix).unwrap()
    })
}

fn v6_block() -> impl Strategy<Value = Block> {
    (any::<u128>(), 0u8..=128).prop_map(|(addr, prefix)| {
        let mask = if prefix == 0 { 0 } else { u128::MAX << (128 - prefix) };
        Block::new(IpAddr::V6(Ipv6Addr::from(addr & mask)), prefix).unwrap()
    })
}

/// Blocks clustered in 10.0.0.0/8 so that overlaps actually happen.
fn clustered_block() -> impl Strategy<Value = Block> {
    (0u32..=0x00ff_ffff, 8u8..=24).prop_map(|(low, prefix)| {
        let mask = u32::MAX << (32 - prefix);
        let addr = (0x0a00_0000 | low) & mask;
        Block::new(IpAddr::V4(Ipv4Addr::from(addr)), prefix).unwrap()
    })
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in v4_block(), b in v4_block()) {
        prop_assert_eq!(cidr::overlaps(&a, &b), cidr::overlaps(&b, &a));
    }

    #[test]
    fn blocks_overlap_exactly_when_one_contains_the_other(a in clustered_block(), b in clustered_block()) {
        let nested = cidr::contains(&a, &b) || cidr::contains(&b, &a);
        prop_assert_eq!(cidr::overlaps(&a, &b), nested);
    }

    #[test]
    fn containment_is_reflexive_and_bounded(a in v6_block()) {
        prop_assert!(cidr::contains(&a, &a));
        prop_assert!(cidr::contains(&Block::default_route(a.family()), &a));
        prop_assert!(a.first() <= a.last());
    }

    #[test]
    fn families_never_mix(a in v4_block(), b in v6_block()) {
        prop_assert!(!cidr::overlaps(&a, &b));
        prop_assert!(!cidr::contains(&a, &b));
        prop_assert!(!cidr::contains(&b, &a));
    }

    #[test]
    fn canonical_text_parses_back(a in v6_block()) {
        prop_assert_eq!(cidr::parse(&a.to_string()).unwrap(), a);
    }

    #[test]
    fn validated_networks_never_overlap(blocks in prop::collection::vec(clustered_block(), 1..6)) {
        let mut topology = Topology::new();
        for (i, block) in blocks.iter().enumerate() {
            topology.add_network(Network::new(format!("net-{i}"), *block)).unwrap();
        }

        let any_overlap = blocks.iter().enumerate().any(|(i, a)| {
            blocks[i + 1..].iter().any(|b| cidr::overlaps(a, b))
        });
        prop_assert_eq!(validate(topology).is_ok(), !any_overlap);
    }

    #[test]
    fn validated_subnets_are_contained(network in clustered_block(), subnet in clustered_block()) {
        let mut topology = Topology::new();
        topology.add_network(Network::new("net", network)).unwrap();
        topology
            .add_subnet(Subnet::new("net", "sub", subnet, "zone-a", Visibility::Private))
            .unwrap();

        prop_assert_eq!(validate(topology).is_ok(), cidr::contains(&network, &subnet));
    }
}
