// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical authorization and visibility engine.
//!
//! Decides which principals may see or act on protected records of an organization, based on the
//! organization tree ([`OrgTree`]), the manager graph derived from active employment
//! ([`ManagerialHierarchy`]), per-record [`PrivacyLevel`]s and the goal dependency graph
//! ([`GoalGraph`]).
//!
//! All decisions are pure functions over a snapshot of organization data. Callers load a
//! [`PolicyContext`] for a company through the store traits (batched, one query per concern) and
//! then ask single-record questions with [`policy::can_view`] or filter whole collections with
//! [`scope::scope`].
mod context;
mod employment;
pub mod goal_graph;
pub mod managerial;
mod memory_store;
pub mod org;
pub mod policy;
mod privacy;
pub mod scope;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;
mod viewer;

pub use context::{ContextError, PolicyContext};
pub use employment::{EmploymentEdge, Permissions, Teammate, Timestamp};
pub use goal_graph::{GoalGraph, GoalLink, GoalLinkError, LinkType};
pub use managerial::{HierarchyAnomaly, HierarchyEntry, ManagerialHierarchy, TraversalLimits};
pub use memory_store::{MemoryStore, StoreError};
pub use org::{OrgIntegrityError, OrgKind, OrgTree, Organization};
pub use policy::{Action, ResourceKind};
pub use privacy::{PrivacyLevel, UnknownPrivacyLevel};
pub use viewer::Viewer;
