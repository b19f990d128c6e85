//! # topoc core
//!
//! The compiler stages, in pipeline order:
//!
//! 1. **[`declaration`]**: JSON document → [`Topology`](topoc_common::topology::Topology).
//! 2. **[`validator`]**: batch consistency checks → [`validator::VerifiedGraph`].
//! 3. **[`resolver`]**: effective route tables, transit propagation, loop detection.
//! 4. **[`plan`]**: ordered create/update operations with dependency edges.
//!
//! [`compiler::compile`] chains the last three.

pub mod compiler;
pub mod declaration;
pub mod plan;
pub mod resolver;
pub mod validator;

#[cfg(test)]
mod fixtures;
