// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{BTreeMap, BTreeSet, HashSet};

use thiserror::Error;
use tracing::warn;

use crate::employment::{EmploymentEdge, Teammate, Timestamp};
use crate::goal_graph::GoalLink;
use crate::org::Organization;
use crate::traits::{EmploymentStore, GoalLinkStore, IdentityHandle, OrganizationStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError<ID>
where
    ID: IdentityHandle,
{
    #[error("person {person} already holds an active tenure in organization {organization}")]
    OverlappingTenure { person: ID, organization: ID },

    #[error("organization {0} already exists")]
    DuplicateOrganization(ID),

    #[error("teammate {0} already exists")]
    DuplicateTeammate(ID),
}

/// In-memory store for organization, employment and goal link data.
#[derive(Clone, Debug)]
pub struct MemoryStore<ID> {
    organizations: BTreeMap<ID, Organization<ID>>,
    employment: Vec<EmploymentEdge<ID>>,
    teammates: BTreeMap<ID, Teammate<ID>>,
    goal_links: BTreeSet<GoalLink<ID>>,
}

impl<ID> Default for MemoryStore<ID> {
    fn default() -> Self {
        Self {
            organizations: Default::default(),
            employment: Default::default(),
            teammates: Default::default(),
            goal_links: Default::default(),
        }
    }
}

impl<ID> MemoryStore<ID>
where
    ID: IdentityHandle,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_organization(
        &mut self,
        organization: Organization<ID>,
    ) -> Result<(), StoreError<ID>> {
        if self.organizations.contains_key(&organization.id) {
            return Err(StoreError::DuplicateOrganization(organization.id));
        }
        self.organizations.insert(organization.id, organization);
        Ok(())
    }

    /// Record a tenure. A person can only hold one active tenure per organization.
    pub fn insert_employment(&mut self, edge: EmploymentEdge<ID>) -> Result<(), StoreError<ID>> {
        if edge.is_active()
            && self.employment.iter().any(|existing| {
                existing.is_active()
                    && existing.person == edge.person
                    && existing.organization == edge.organization
            })
        {
            warn!(
                person = %edge.person,
                organization = %edge.organization,
                "rejected overlapping active tenure"
            );
            return Err(StoreError::OverlappingTenure {
                person: edge.person,
                organization: edge.organization,
            });
        }
        self.employment.push(edge);
        Ok(())
    }

    /// End the active tenure of a person in an organization, returns `false` if there was none.
    pub fn end_employment(&mut self, person: &ID, organization: &ID, at: Timestamp) -> bool {
        match self.employment.iter_mut().find(|edge| {
            edge.is_active() && edge.person == *person && edge.organization == *organization
        }) {
            Some(edge) => {
                edge.ended_at = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn insert_teammate(&mut self, teammate: Teammate<ID>) -> Result<(), StoreError<ID>> {
        if self.teammates.contains_key(&teammate.id) {
            return Err(StoreError::DuplicateTeammate(teammate.id));
        }
        self.teammates.insert(teammate.id, teammate);
        Ok(())
    }
}

impl<ID> OrganizationStore<ID> for MemoryStore<ID>
where
    ID: IdentityHandle,
{
    type Error = StoreError<ID>;

    fn organizations(&self) -> Result<Vec<Organization<ID>>, Self::Error> {
        Ok(self.organizations.values().cloned().collect())
    }
}

impl<ID> EmploymentStore<ID> for MemoryStore<ID>
where
    ID: IdentityHandle,
{
    type Error = StoreError<ID>;

    fn active_employment(
        &self,
        scope: &HashSet<ID>,
    ) -> Result<Vec<EmploymentEdge<ID>>, Self::Error> {
        Ok(self
            .employment
            .iter()
            .filter(|edge| edge.is_active() && scope.contains(&edge.organization))
            .cloned()
            .collect())
    }

    fn teammates(&self, scope: &HashSet<ID>) -> Result<Vec<Teammate<ID>>, Self::Error> {
        Ok(self
            .teammates
            .values()
            .filter(|teammate| scope.contains(&teammate.organization))
            .cloned()
            .collect())
    }
}

impl<ID> GoalLinkStore<ID> for MemoryStore<ID>
where
    ID: IdentityHandle,
{
    type Error = StoreError<ID>;

    fn goal_links(&self) -> Result<Vec<GoalLink<ID>>, Self::Error> {
        Ok(self.goal_links.iter().copied().collect())
    }

    fn insert_goal_link(&mut self, link: GoalLink<ID>) -> Result<(), Self::Error> {
        self.goal_links.insert(link);
        Ok(())
    }

    fn remove_goal_link(&mut self, link: &GoalLink<ID>) -> Result<bool, Self::Error> {
        Ok(self.goal_links.remove(link))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::employment::EmploymentEdge;
    use crate::test_utils::{ENG, PLATFORM, SALES};
    use crate::traits::EmploymentStore;

    use super::{MemoryStore, StoreError};

    #[test]
    fn one_active_tenure_per_organization() {
        let mut store = MemoryStore::new();
        store.insert_employment(EmploymentEdge::new('R', ENG, 0)).unwrap();
        store
            .insert_employment(EmploymentEdge::new('R', PLATFORM, 0))
            .unwrap();

        assert_eq!(
            store.insert_employment(EmploymentEdge::new('R', ENG, 5).with_manager('M')),
            Err(StoreError::OverlappingTenure {
                person: 'R',
                organization: ENG,
            })
        );

        // A transfer ends the old tenure before the new one starts.
        assert!(store.end_employment(&'R', &ENG, 5));
        assert!(!store.end_employment(&'R', &ENG, 6));
        store
            .insert_employment(EmploymentEdge::new('R', ENG, 5).with_manager('M'))
            .unwrap();

        let scope = HashSet::from([ENG, SALES]);
        let active = store.active_employment(&scope).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].manager, Some('M'));
    }
}
