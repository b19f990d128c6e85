//! Error kinds raised while building and checking a topology.
//!
//! Graph construction fails fast with a [`GraphError`]. Everything found by
//! the loader and the validator is a [`Violation`]; those are collected into
//! [`Violations`] so a caller sees every problem in one pass.

use std::fmt;

use thiserror::Error;

use crate::network::cidr::Block;
use crate::topology::key::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CidrFault {
    #[error("missing '/prefix'")]
    MissingPrefix,
    #[error("address does not parse")]
    BadAddress,
    #[error("prefix must be within 0-{max}")]
    BadPrefix { max: u8 },
    #[error("host bits are set below the prefix")]
    HostBitsSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid CIDR '{text}': {reason}")]
pub struct InvalidCidr {
    pub text: String,
    pub reason: CidrFault,
}

/// Raised by the graph builder at insertion time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("duplicate identifier: {key} already exists")]
    DuplicateIdentifier { key: ResourceKey },

    #[error("invalid identifier: {kind} '{id}' must be non-empty and must not contain '/'")]
    InvalidIdentifier { kind: &'static str, id: String },

    #[error("unknown parent: {key} refers to missing {parent}")]
    UnknownParent {
        key: ResourceKey,
        parent: ResourceKey,
    },
}

/// A single consistency problem in a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{owner}: {field} is not a valid block: {source}")]
    InvalidCidr {
        owner: ResourceKey,
        field: &'static str,
        source: InvalidCidr,
    },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("overlap: {first} ({first_block}) overlaps {second} ({second_block})")]
    Overlap {
        first: ResourceKey,
        first_block: Block,
        second: ResourceKey,
        second_block: Block,
    },

    #[error("overlap: {subnet} ({block}) is not contained in {network} ({network_block})")]
    NotContained {
        subnet: ResourceKey,
        block: Block,
        network: ResourceKey,
        network_block: Block,
    },

    #[error("dangling reference: {owner} refers to missing {reference}")]
    DanglingReference {
        owner: ResourceKey,
        reference: ResourceKey,
    },

    #[error("dangling reference: {owner} refers to {reference}, which is outside {network}")]
    ForeignReference {
        owner: ResourceKey,
        reference: ResourceKey,
        network: ResourceKey,
    },

    #[error("dangling reference: {owner} targets {gateway}, but {network} has no attachment to it")]
    Unattached {
        owner: ResourceKey,
        gateway: ResourceKey,
        network: ResourceKey,
    },

    #[error("gateway ownership: {gateway} {reason}")]
    GatewayOwnership {
        gateway: ResourceKey,
        reason: &'static str,
    },

    #[error("duplicate attachment: {network} is attached to {gateway} by both {first} and {second}")]
    DuplicateAttachment {
        network: ResourceKey,
        gateway: ResourceKey,
        first: ResourceKey,
        second: ResourceKey,
    },

    #[error("invalid rule: {rule_set} rule #{index}: {reason}")]
    InvalidRule {
        rule_set: ResourceKey,
        index: usize,
        reason: String,
    },
}

/// Ordered, non-empty list of violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Returns `None` when there is nothing to report.
    pub fn from_vec(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self(violations))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Violation> {
        self.0
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.0.len())?;
        for violation in &self.0 {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
