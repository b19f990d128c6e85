//! Shared unit-test topology: the proxy network and the streaming network
//! joined by one transit gateway.

use topoc_common::network::cidr::Block;
use topoc_common::topology::{
    AccessRule, Attachment, Consumer, Endpoint, Gateway, Network, PortRange, Protocol, Route, RouteTarget,
    RuleSet, Subnet, Topology, Visibility,
};

pub fn block(s: &str) -> Block {
    s.parse().unwrap()
}

fn subnet(network: &str, id: &str, cidr: &str, zone: &str, visibility: Visibility) -> Subnet {
    Subnet::new(network, id, block(cidr), zone, visibility)
}

pub fn multi_vpc() -> Topology {
    let mut t = Topology::new();
    let zones = ["ap-northeast-2a", "ap-northeast-2c"];

    t.add_network(Network::new("vpc-appstream", block("172.24.0.0/16")).with_zones(zones))
        .unwrap();
    t.add_subnet(subnet("vpc-appstream", "private-a", "172.24.80.0/24", zones[0], Visibility::Private))
        .unwrap();
    t.add_subnet(subnet("vpc-appstream", "private-c", "172.24.81.0/24", zones[1], Visibility::Private))
        .unwrap();

    t.add_network(Network::new("vpc-squid", block("10.254.0.0/16")).with_zones(zones))
        .unwrap();
    t.add_subnet(subnet("vpc-squid", "public-a", "10.254.0.0/24", zones[0], Visibility::Public))
        .unwrap();
    t.add_subnet(subnet("vpc-squid", "public-c", "10.254.1.0/24", zones[1], Visibility::Public))
        .unwrap();
    t.add_subnet(subnet("vpc-squid", "private-a", "10.254.80.0/24", zones[0], Visibility::Private))
        .unwrap();
    t.add_subnet(subnet("vpc-squid", "private-c", "10.254.81.0/24", zones[1], Visibility::Private))
        .unwrap();

    t.add_rule_set(
        RuleSet::new("httpsg", "vpc-squid")
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(22), "any-ipv4"))
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(80), "10.254.0.0/16"))
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(443), "172.24.0.0/16")),
    )
    .unwrap();
    t.add_rule_set(
        RuleSet::new("appstreamsg", "vpc-squid")
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(443), "10.254.0.0/16"))
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::new(1400, 1499), "10.254.0.0/16")),
    )
    .unwrap();
    t.add_rule_set(
        RuleSet::new("rdpsg", "vpc-squid")
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(3389), "any-ipv4")),
    )
    .unwrap();
    t.add_rule_set(
        RuleSet::new("ashttpshttpsg", "vpc-appstream")
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(80), "172.24.0.0/16"))
            .with_rule(AccessRule::ingress(Protocol::Tcp, PortRange::single(443), "172.24.0.0/16")),
    )
    .unwrap();

    t.add_gateway(Gateway::internet("igw", "vpc-squid")).unwrap();
    let mut squid = Gateway::nat_instance("squid", "vpc-squid", "public-a");
    squid.instance_type = Some("t3.micro".into());
    squid.rule_sets = vec!["httpsg".into()];
    t.add_gateway(squid).unwrap();
    t.add_gateway(Gateway::transit("tgw")).unwrap();

    t.add_attachment(Attachment::new(
        "tgwatt-appstream",
        "tgw",
        "vpc-appstream",
        ["private-a", "private-c"],
    ))
    .unwrap();
    let mut squid_att = Attachment::new("tgwatt-squid", "tgw", "vpc-squid", ["private-a", "private-c"]);
    squid_att.advertise_default = true;
    t.add_attachment(squid_att).unwrap();

    let default = block("0.0.0.0/0");
    for (id, sub) in [("igw-public-a", "public-a"), ("igw-public-c", "public-c")] {
        t.add_route(Route::new(id, "vpc-squid", sub, default, RouteTarget::Gateway("igw".into())))
            .unwrap();
    }
    for (id, sub) in [("nat-private-a", "private-a"), ("nat-private-c", "private-c")] {
        t.add_route(Route::new(id, "vpc-squid", sub, default, RouteTarget::Gateway("squid".into())))
            .unwrap();
    }
    for (id, sub) in [("tgw-appstream-a", "private-a"), ("tgw-appstream-c", "private-c")] {
        t.add_route(Route::new(
            id,
            "vpc-appstream",
            sub,
            default,
            RouteTarget::Attachment("tgwatt-appstream".into()),
        ))
        .unwrap();
    }
    for (id, sub) in [("tgw-squid-a", "private-a"), ("tgw-squid-c", "private-c")] {
        t.add_route(Route::new(
            id,
            "vpc-squid",
            sub,
            block("172.24.0.0/16"),
            RouteTarget::Gateway("tgw".into()),
        ))
        .unwrap();
    }

    let mut vpce = Endpoint::new(
        "asvpcendpoint",
        "vpc-squid",
        "com.amazonaws.ap-northeast-2.appstream.streaming",
        ["private-a", "private-c"],
    );
    vpce.rule_sets = vec!["appstreamsg".into()];
    t.add_endpoint(vpce).unwrap();

    let mut fleet = Consumer::new("asfleet", "appstream", "vpc-appstream", ["private-a", "private-c"]);
    fleet.rule_sets = vec!["ashttpshttpsg".into()];
    fleet.endpoints = vec!["asvpcendpoint".into()];
    fleet.instance_type = Some("stream.standard.medium".into());
    t.add_consumer(fleet).unwrap();

    t
}
