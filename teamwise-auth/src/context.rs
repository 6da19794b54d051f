// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot of one company's organization data used to take authorization decisions.
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::error::Error;

use thiserror::Error;
use tracing::debug;

use crate::employment::{EmploymentEdge, Teammate};
use crate::managerial::{ManagerialGraph, TraversalLimits};
use crate::org::{OrgIntegrityError, OrgTree};
use crate::policy::Subject;
use crate::traits::{EmploymentStore, IdentityHandle, OrganizationStore};

#[derive(Debug, Error)]
pub enum ContextError<ID, E = Infallible>
where
    ID: IdentityHandle,
    E: Error,
{
    #[error("store error: {0}")]
    Store(E),

    #[error(transparent)]
    Integrity(#[from] OrgIntegrityError<ID>),

    #[error("organization {0} is not the root company of its tree")]
    NotACompany(ID),
}

/// Organization tree, managerial graph and teammate directory of a single company.
///
/// Loaded once per request (or cached by the host) and immutable afterwards, decisions only read
/// from it.
#[derive(Clone, Debug)]
pub struct PolicyContext<ID>
where
    ID: IdentityHandle,
{
    company: ID,
    tree: OrgTree<ID>,

    /// The company and all its descendant organizations.
    scope: HashSet<ID>,

    managers: ManagerialGraph<ID>,
    teammates: HashMap<ID, Teammate<ID>>,

    /// Teammate ids of every person, sorted.
    by_person: HashMap<ID, Vec<ID>>,
}

impl<ID> PolicyContext<ID>
where
    ID: IdentityHandle,
{
    /// Assemble a context from already fetched data.
    ///
    /// Employment edges and teammates outside of the company are ignored.
    pub fn new(
        company: ID,
        tree: OrgTree<ID>,
        edges: &[EmploymentEdge<ID>],
        teammates: impl IntoIterator<Item = Teammate<ID>>,
    ) -> Result<Self, ContextError<ID>> {
        let root = tree.root_company(&company)?;
        if root.id != company {
            return Err(ContextError::NotACompany(company));
        }

        let scope = tree.self_and_descendants(&company);
        let managers = ManagerialGraph::build(edges, &scope);

        let mut directory = HashMap::new();
        let mut by_person: HashMap<ID, Vec<ID>> = HashMap::new();
        for teammate in teammates {
            if !scope.contains(&teammate.organization) {
                continue;
            }
            by_person.entry(teammate.person).or_default().push(teammate.id);
            directory.insert(teammate.id, teammate);
        }
        for ids in by_person.values_mut() {
            ids.sort();
            ids.dedup();
        }

        debug!(
            %company,
            organizations = scope.len(),
            teammates = directory.len(),
            persons = managers.population(),
            "loaded policy context"
        );

        Ok(Self {
            company,
            tree,
            scope,
            managers,
            teammates: directory,
            by_person,
        })
    }

    /// Load the context for a company with one query per concern.
    pub fn load<S>(
        store: &S,
        company: ID,
    ) -> Result<Self, ContextError<ID, <S as OrganizationStore<ID>>::Error>>
    where
        S: OrganizationStore<ID>
            + EmploymentStore<ID, Error = <S as OrganizationStore<ID>>::Error>,
    {
        let organizations = OrganizationStore::organizations(store).map_err(ContextError::Store)?;
        let tree = OrgTree::from_organizations(organizations);
        let scope = tree.self_and_descendants(&company);

        let edges = store
            .active_employment(&scope)
            .map_err(ContextError::Store)?;
        let teammates = store.teammates(&scope).map_err(ContextError::Store)?;

        Self::new(company, tree, &edges, teammates).map_err(|err| match err {
            ContextError::Integrity(err) => ContextError::Integrity(err),
            ContextError::NotACompany(id) => ContextError::NotACompany(id),
            ContextError::Store(never) => match never {},
        })
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.managers = self.managers.with_limits(limits);
        self
    }

    pub fn company(&self) -> ID {
        self.company
    }

    pub fn tree(&self) -> &OrgTree<ID> {
        &self.tree
    }

    /// Ids of the company and all organizations below it.
    pub fn scope(&self) -> &HashSet<ID> {
        &self.scope
    }

    pub fn contains_organization(&self, organization: &ID) -> bool {
        self.scope.contains(organization)
    }

    /// Company owning the given organization.
    pub fn company_of(&self, organization: &ID) -> Result<ID, OrgIntegrityError<ID>> {
        self.tree.root_company(organization).map(|company| company.id)
    }

    pub fn managers(&self) -> &ManagerialGraph<ID> {
        &self.managers
    }

    pub fn teammate(&self, id: &ID) -> Option<&Teammate<ID>> {
        self.teammates.get(id)
    }

    /// Person behind a record subject. Teammates outside of the company resolve to `None`.
    pub fn resolve_subject(&self, subject: &Subject<ID>) -> Option<ID> {
        match subject {
            Subject::Person(person) => Some(*person),
            Subject::Teammate(id) => self.teammate(id).map(|teammate| teammate.person),
        }
    }

    /// All memberships of a person within the company.
    pub fn teammates_of(&self, person: &ID) -> impl Iterator<Item = &Teammate<ID>> {
        self.by_person
            .get(person)
            .into_iter()
            .flatten()
            .filter_map(|id| self.teammates.get(id))
    }

    /// Person is currently employed anywhere in the company.
    pub fn is_employed(&self, person: &ID) -> bool {
        self.teammates_of(person).any(Teammate::is_employed)
    }

    /// Person holds the manage employment capability for the company.
    ///
    /// Capabilities are read from the company directory, never from a viewer's acting teammate.
    pub fn can_manage_employment(&self, person: &ID) -> bool {
        self.teammates_of(person).any(Teammate::can_manage_employment)
    }

    pub fn can_manage_maap(&self, person: &ID) -> bool {
        self.teammates_of(person).any(Teammate::can_manage_maap)
    }

    /// Return `true` if `manager` sits anywhere above `person` in the company's hierarchy.
    pub fn manages(&self, manager: &ID, person: &ID) -> bool {
        self.managers
            .managers_of(person)
            .iter()
            .any(|entry| entry.person == *manager)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::org::OrgIntegrityError;
    use crate::test_utils::{
        ACME, CEO, ENG, EX, GLOBEX, HR, M1, M2, OUTSIDER, R, T_R, acme_context, acme_store,
        acme_tree,
    };

    use super::{ContextError, PolicyContext};

    #[test]
    fn loads_company_snapshot() {
        let ctx = acme_context();

        assert_eq!(ctx.company(), ACME);
        assert_eq!(ctx.scope().len(), 4);
        assert!(!ctx.contains_organization(&GLOBEX));
        assert_eq!(ctx.company_of(&ENG), Ok(ACME));

        assert!(ctx.is_employed(&R));
        assert!(!ctx.is_employed(&EX));
        assert!(!ctx.is_employed(&OUTSIDER));
        assert!(ctx.can_manage_employment(&HR));
        assert!(!ctx.can_manage_employment(&M1));

        assert_eq!(ctx.teammate(&T_R).map(|teammate| teammate.person), Some(R));
        assert!(ctx.manages(&M2, &R));
        assert!(ctx.manages(&CEO, &R));
        assert!(!ctx.manages(&R, &M1));
    }

    #[test]
    fn only_companies_anchor_a_context() {
        assert_matches!(
            PolicyContext::new(ENG, acme_tree(), &[], []),
            Err(ContextError::NotACompany(ENG))
        );
        assert_matches!(
            PolicyContext::new('?', acme_tree(), &[], []),
            Err(ContextError::Integrity(OrgIntegrityError::UnknownOrganization('?')))
        );
        assert_matches!(
            PolicyContext::load(&acme_store(), ENG),
            Err(ContextError::NotACompany(ENG))
        );
    }
}
