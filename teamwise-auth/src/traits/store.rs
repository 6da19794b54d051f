// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read interfaces the engine uses to fetch organization data.
//!
//! The engine does not own persistence. Every query is batched per scope ("all active employment
//! edges in these organizations") so that a traversal costs one round-trip, not one per row.
use std::collections::HashSet;
use std::error::Error;

use crate::employment::{EmploymentEdge, Teammate};
use crate::goal_graph::GoalLink;
use crate::org::Organization;
use crate::traits::IdentityHandle;

/// Access to organization parent/child edges.
pub trait OrganizationStore<ID>
where
    ID: IdentityHandle,
{
    type Error: Error;

    /// All known organizations, archived ones included.
    fn organizations(&self) -> Result<Vec<Organization<ID>>, Self::Error>;
}

/// Access to employment tenures and teammate memberships.
pub trait EmploymentStore<ID>
where
    ID: IdentityHandle,
{
    type Error: Error;

    /// Active (not ended) employment edges whose organization is in `scope`.
    fn active_employment(
        &self,
        scope: &HashSet<ID>,
    ) -> Result<Vec<EmploymentEdge<ID>>, Self::Error>;

    /// Teammate memberships whose organization is in `scope`, employed or not.
    fn teammates(&self, scope: &HashSet<ID>) -> Result<Vec<Teammate<ID>>, Self::Error>;
}

/// Access to goal link edges.
pub trait GoalLinkStore<ID>
where
    ID: IdentityHandle,
{
    type Error: Error;

    fn goal_links(&self) -> Result<Vec<GoalLink<ID>>, Self::Error>;

    /// Persist a link which already passed validation.
    fn insert_goal_link(&mut self, link: GoalLink<ID>) -> Result<(), Self::Error>;

    /// Remove a link, returns `false` if it did not exist.
    fn remove_goal_link(&mut self, link: &GoalLink<ID>) -> Result<bool, Self::Error>;
}
