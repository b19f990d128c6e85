use colored::*;

use topoc_common::network::cidr::{Block, Family};
use topoc_core::plan::{Operation, OperationKind};
use topoc_core::resolver::{NextHop, RouteEntry, RouteOrigin};

use crate::terminal::colors;

pub type Detail = (String, ColoredString);

pub fn block(block: &Block) -> ColoredString {
    let color = if block.is_default_route() {
        colors::DEFAULT_ROUTE
    } else {
        match block.family() {
            Family::V4 => colors::IPV4_BLOCK,
            Family::V6 => colors::IPV6_BLOCK,
        }
    };
    block.to_string().color(color)
}

fn origin(origin: &RouteOrigin) -> String {
    match origin {
        RouteOrigin::Local => "implicit".to_string(),
        RouteOrigin::Explicit { route } => format!("route {route}"),
        RouteOrigin::Propagated { route, exporter } => {
            format!("propagated from {exporter}, via route {route}")
        }
    }
}

/// `destination: next hop (origin)`
pub fn entry_to_detail(entry: &RouteEntry) -> Detail {
    let hop: ColoredString = match &entry.next_hop {
        NextHop::Local => "local".color(colors::SEPARATOR),
        hop => hop.to_string().color(colors::PRIMARY),
    };
    let value = format!(
        "{hop} {}",
        format!("({})", origin(&entry.origin)).color(colors::SEPARATOR)
    );
    (entry.destination.to_string(), value.normal())
}

pub fn operation_line(idx: usize, operation: &Operation) -> String {
    let kind: ColoredString = match operation.kind {
        OperationKind::Create => "create".green().bold(),
        OperationKind::Update => "update".yellow().bold(),
    };
    format!(
        "{} {kind} {} {}",
        format!("{idx:>3}.").color(colors::SEPARATOR),
        operation.resource_type.to_string().color(colors::SECONDARY),
        operation.resource_id.color(colors::PRIMARY)
    )
}

pub fn dependencies(operation: &Operation) -> Option<Detail> {
    if operation.depends_on.is_empty() {
        return None;
    }
    let joined: String = operation
        .depends_on
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(", ");
    Some(("after".to_string(), joined.color(colors::TEXT_DEFAULT)))
}
