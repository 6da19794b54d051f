// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type Timestamp = u64;

/// Time-bounded assignment of a person to an organization, optionally under a manager.
///
/// Tenures are ended, never deleted. At most one tenure per (person, organization) may be active
/// at any time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct EmploymentEdge<ID> {
    pub person: ID,
    pub organization: ID,
    pub manager: Option<ID>,
    pub position: Option<ID>,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl<ID> EmploymentEdge<ID> {
    pub fn new(person: ID, organization: ID, started_at: Timestamp) -> Self {
        Self {
            person,
            organization,
            manager: None,
            position: None,
            started_at,
            ended_at: None,
        }
    }

    pub fn with_manager(mut self, manager: ID) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn with_position(mut self, position: ID) -> Self {
        self.position = Some(position);
        self
    }

    pub fn ended(mut self, ended_at: Timestamp) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    /// Tenure has not been ended.
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Tenure covered the given point in time.
    pub fn is_active_at(&self, at: Timestamp) -> bool {
        self.started_at <= at && self.ended_at.is_none_or(|ended_at| at < ended_at)
    }
}

/// Capabilities a teammate holds within their organization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Permissions {
    /// Manage hiring, tenures and everything employment related. Grants view access to all
    /// protected records of the company.
    pub can_manage_employment: bool,

    pub can_create_employment: bool,

    /// Manage abilities, assignments, titles and positions.
    pub can_manage_maap: bool,
}

impl Permissions {
    pub fn manage_employment() -> Self {
        Self {
            can_manage_employment: true,
            ..Default::default()
        }
    }

    pub fn manage_maap() -> Self {
        Self {
            can_manage_maap: true,
            ..Default::default()
        }
    }
}

/// Membership of a person in an organization.
///
/// Outlives any single tenure: a teammate stays around after termination, only their
/// employment timestamps change.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Teammate<ID> {
    pub id: ID,
    pub person: ID,
    pub organization: ID,
    pub permissions: Permissions,
    pub first_employed_at: Option<Timestamp>,
    pub last_terminated_at: Option<Timestamp>,
}

impl<ID> Teammate<ID> {
    pub fn new(id: ID, person: ID, organization: ID) -> Self {
        Self {
            id,
            person,
            organization,
            permissions: Permissions::default(),
            first_employed_at: None,
            last_terminated_at: None,
        }
    }

    pub fn employed_since(mut self, at: Timestamp) -> Self {
        self.first_employed_at = Some(at);
        self
    }

    pub fn terminated_at(mut self, at: Timestamp) -> Self {
        self.last_terminated_at = Some(at);
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Currently employed: hired at some point and not terminated since.
    pub fn is_employed(&self) -> bool {
        self.first_employed_at.is_some() && self.last_terminated_at.is_none()
    }

    pub fn can_manage_employment(&self) -> bool {
        self.is_employed() && self.permissions.can_manage_employment
    }

    pub fn can_manage_maap(&self) -> bool {
        self.is_employed() && self.permissions.can_manage_maap
    }
}
