#![cfg(test)]
use std::path::PathBuf;

use serde_json::{Value, json};
use topoc_common::config::Config;
use topoc_common::error::{GraphError, Violation};
use topoc_common::network::cidr::Block;
use topoc_common::topology::ResourceKey;
use topoc_core::compiler::{self, CompileError};
use topoc_core::declaration::{Declaration, DeclarationError};
use topoc_core::plan::{OperationId, PlanError, ResourceType};
use topoc_core::resolver::{NextHop, ResolveError};

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../declarations/multi-vpc.json")
}

fn sample() -> Value {
    let text = std::fs::read_to_string(sample_path()).expect("sample declaration is readable");
    serde_json::from_str(&text).expect("sample declaration is JSON")
}

fn push(document: &mut Value, section: &str, entry: Value) {
    document[section]
        .as_array_mut()
        .expect("section is an array")
        .push(entry);
}

fn compile(document: Value) -> Result<topoc_core::compiler::Compilation, CompileError> {
    let declaration = Declaration::from_json(&document.to_string()).expect("declaration parses");
    let mut config = Config::default();
    declaration.parameters.apply(&mut config);
    let topology = declaration.into_topology().expect("declaration builds");
    compiler::compile(topology, &config)
}

fn two_networks(a: &str, b: &str) -> Value {
    json!({
        "networks": [
            { "id": "a", "cidr": a },
            { "id": "b", "cidr": b }
        ]
    })
}

/// This test verifies the whole pipeline on the bundled proxy/streaming
/// declaration: loading from disk, validation, resolution and a plan whose
/// every dependency comes first.
#[test]
fn sample_declaration_compiles() -> anyhow::Result<()> {
    let (topology, parameters) = Declaration::load(&sample_path())?;
    let mut config = Config::default();
    parameters.apply(&mut config);

    let compilation = compiler::compile(topology, &config)?;
    assert!(compilation.warnings().is_empty());

    let plan = &compilation.plan;
    for (index, operation) in plan.iter().enumerate() {
        for dependency in &operation.depends_on {
            let before = plan.position(dependency).expect("dependency is planned");
            assert!(before < index, "{} is planned before {dependency}", operation.id());
        }
    }

    let tgw = plan
        .position(&OperationId::create(ResourceType::TransitGateway, "tgw"))
        .expect("transit gateway is planned");
    assert_eq!(
        plan.operations[tgw].properties["name"],
        "test-samcorp-tgwtest-tgw"
    );
    Ok(())
}

#[test]
fn disjoint_networks_validate() {
    assert!(compile(two_networks("172.24.0.0/16", "10.254.0.0/16")).is_ok());
}

#[test]
fn enclosing_networks_overlap() {
    let Err(CompileError::Invalid(violations)) = compile(two_networks("10.0.0.0/8", "10.254.0.0/16"))
    else {
        panic!("expected an overlap");
    };
    let violations = violations.into_inner();
    assert_eq!(violations.len(), 1);
    assert!(matches!(violations[0], Violation::Overlap { .. }));
}

#[test]
fn second_attachment_to_the_same_gateway_is_rejected() {
    let mut document = sample();
    push(
        &mut document,
        "attachments",
        json!({
            "id": "tgwatt-appstream-2",
            "gateway": "tgw",
            "network": "vpc-appstream",
            "subnets": ["private-a"]
        }),
    );

    let Err(CompileError::Invalid(violations)) = compile(document) else {
        panic!("expected a duplicate attachment");
    };
    assert_eq!(
        violations.into_inner(),
        vec![Violation::DuplicateAttachment {
            network: ResourceKey::network("vpc-appstream"),
            gateway: ResourceKey::gateway("tgw"),
            first: ResourceKey::attachment("tgwatt-appstream"),
            second: ResourceKey::attachment("tgwatt-appstream-2"),
        }]
    );
}

#[test]
fn route_into_own_network_through_transit_loops() {
    let mut document = sample();
    push(
        &mut document,
        "routes",
        json!({
            "id": "boomerang",
            "network": "vpc-appstream",
            "subnet": "private-c",
            "destination": "172.24.80.0/24",
            "target": { "attachment": "tgwatt-appstream" }
        }),
    );

    let Err(CompileError::Resolve(ResolveError::RoutingLoop { route, cycle })) = compile(document)
    else {
        panic!("expected a routing loop");
    };
    assert_eq!(route, ResourceKey::route("boomerang"));
    assert_eq!(cycle.first(), cycle.last());
}

#[test]
fn circular_declared_dependencies_are_cyclic() {
    let mut document = sample();
    document["rule_sets"][1]["depends_on"] = json!(["endpoint/asvpcendpoint"]);

    let Err(CompileError::Plan(PlanError::CyclicPlan { cycle })) = compile(document) else {
        panic!("expected a cyclic plan");
    };
    assert!(cycle.contains(&OperationId::create(ResourceType::Endpoint, "asvpcendpoint")));
    assert!(cycle.contains(&OperationId::create(ResourceType::RuleSet, "appstreamsg")));
}

#[test]
fn plan_serializes_as_operation_list() {
    let compilation = compile(sample()).unwrap();
    let value = serde_json::to_value(&compilation.plan).unwrap();

    let first = &value["operations"][0];
    assert_eq!(first["kind"], "create");
    assert_eq!(first["resource_type"], "network");
    assert_eq!(first["resource_id"], "vpc-appstream");

    let association = value["operations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|op| op["kind"] == "update")
        .unwrap();
    assert_eq!(association["resource_type"], "transit-attachment");
    assert!(association["depends_on"]
        .as_array()
        .unwrap()
        .contains(&json!("create transit-route-table/tgw")));
}

#[test]
fn naming_parameters_reach_the_plan() {
    let mut document = sample();
    document["parameters"]["env"] = json!("prod");

    let compilation = compile(document).unwrap();
    let network = &compilation.plan.operations[0];
    assert_eq!(network.properties["name"], "prod-samcorp-tgwtest-vpc-appstream");
}

#[test]
fn unreadable_declaration_is_an_io_error() {
    let err = Declaration::load(&sample_path().with_file_name("missing.json")).unwrap_err();
    assert!(matches!(err, DeclarationError::Io { .. }));
}

#[test]
fn ipv6_networks_compile_end_to_end() {
    let document = json!({
        "networks": [
            { "id": "v6-a", "cidr": "2001:db8:1::/48" },
            { "id": "v6-b", "cidr": "2001:db8:2::/48" }
        ],
        "subnets": [
            { "id": "app", "network": "v6-a", "cidr": "2001:db8:1:1::/64", "zone": "z", "visibility": "private" },
            { "id": "app", "network": "v6-b", "cidr": "2001:db8:2:1::/64", "zone": "z", "visibility": "private" }
        ],
        "rule_sets": [
            {
                "id": "https6",
                "network": "v6-a",
                "rules": [{ "protocol": "tcp", "ports": 443, "peer": "any-ipv6" }]
            }
        ],
        "gateways": [{ "id": "tgw", "kind": "transit" }],
        "attachments": [
            { "id": "att-a", "gateway": "tgw", "network": "v6-a", "subnets": ["app"] },
            { "id": "att-b", "gateway": "tgw", "network": "v6-b", "subnets": ["app"] }
        ],
        "routes": [
            { "id": "a-to-b", "network": "v6-a", "subnet": "app", "destination": "2001:db8:2::/48", "target": { "gateway": "tgw" } },
            { "id": "b-to-a", "network": "v6-b", "subnet": "app", "destination": "2001:db8:1::/48", "target": { "gateway": "tgw" } }
        ]
    });

    let compilation = compile(document).expect("IPv6 topology compiles");
    assert!(compilation.warnings().is_empty());

    let table = compilation
        .resolution
        .table(&ResourceKey::subnet("v6-a", "app"))
        .expect("subnet has a table");
    let host: Block = "2001:db8:2::1/128".parse().unwrap();
    let entry = table.lookup(&host).expect("peer block is routed");
    assert_eq!(
        entry.next_hop,
        NextHop::Attachment {
            attachment: "att-a".into(),
            gateway: "tgw".into(),
        }
    );

    let transit: Vec<&str> = compilation
        .plan
        .iter()
        .filter(|op| op.resource_type == ResourceType::TransitRoute)
        .map(|op| op.properties["destination"].as_str().unwrap())
        .collect();
    assert_eq!(transit, ["2001:db8:1::/48", "2001:db8:2::/48"]);
}

#[test]
fn slashed_identifiers_never_reach_the_plan() {
    let document = json!({
        "networks": [
            { "id": "a", "cidr": "10.0.0.0/16" },
            { "id": "a/b", "cidr": "10.1.0.0/16" }
        ],
        "subnets": [
            { "id": "b/c", "network": "a", "cidr": "10.0.1.0/24", "zone": "z", "visibility": "private" },
            { "id": "c", "network": "a/b", "cidr": "10.1.1.0/24", "zone": "z", "visibility": "private" }
        ]
    });

    let declaration = Declaration::from_json(&document.to_string()).unwrap();
    let violations = declaration.into_topology().unwrap_err().into_inner();
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .all(|v| matches!(v, Violation::Graph(GraphError::InvalidIdentifier { .. }))));
}

#[test]
fn streaming_fleet_is_planned_after_its_access_endpoint() {
    let compilation = compile(sample()).unwrap();
    let plan = &compilation.plan;

    let endpoint = plan
        .position(&OperationId::create(ResourceType::Endpoint, "asvpcendpoint"))
        .unwrap();
    let fleet = plan
        .position(&OperationId::create(ResourceType::Consumer, "asfleet"))
        .unwrap();
    assert!(endpoint < fleet);
    assert_eq!(
        plan.operations[fleet].properties["rule_sets"],
        json!(["ashttpshttpsg"])
    );
}
