//! # topoc common
//!
//! Shared building blocks for the topology compiler:
//!
//! * **[`network`]**: CIDR arithmetic over IPv4 and IPv6 blocks.
//! * **[`topology`]**: the entity model and the graph builder.
//! * **[`error`]**: error kinds raised while building and checking a graph.
//! * **[`config`]**: explicit compiler configuration (naming, key pair).

pub mod config;
pub mod error;
pub mod network;
pub mod topology;
