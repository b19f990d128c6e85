//! # Topology Model
//!
//! * [`entity`]: networks, subnets, gateways, attachments, routes, rule sets,
//!   endpoints and the managed services consuming them.
//! * [`graph::Topology`]: the builder that owns them, with one identifier
//!   namespace per entity kind.
//! * [`key::ResourceKey`]: the typed reference every entity is addressed by.

pub mod entity;
pub mod graph;
pub mod key;

pub use entity::{
    AccessRule, Attachment, Consumer, Direction, Endpoint, Gateway, GatewayKind, Network, PortRange,
    Protocol, Route, RouteTarget, RuleSet, Subnet, Visibility,
};
pub use graph::Topology;
pub use key::ResourceKey;
