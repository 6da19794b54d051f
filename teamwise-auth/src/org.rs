// SPDX-License-Identifier: MIT OR Apache-2.0

//! Organization tree of company, department and team nodes.
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::employment::Timestamp;
use crate::traits::IdentityHandle;

/// Structural problems in the organization tree.
///
/// These indicate corrupt data and are never turned into an authorization outcome silently.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrgIntegrityError<ID>
where
    ID: IdentityHandle,
{
    #[error("organization {0} is its own parent")]
    SelfParent(ID),

    #[error("parent cycle detected while walking up from organization {0}")]
    ParentCycle(ID),

    #[error("organization {0} references unknown parent {1}")]
    DanglingParent(ID, ID),

    #[error("organization {0} is not known")]
    UnknownOrganization(ID),

    #[error("root organization {0} is a {1}, expected a company")]
    RootNotCompany(ID, OrgKind),

    #[error("company {0} can not have parent {1}")]
    NestedCompany(ID, ID),

    #[error("organization {0} already exists")]
    DuplicateOrganization(ID),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum OrgKind {
    Company,
    Department,
    Team,
}

impl Display for OrgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrgKind::Company => "company",
            OrgKind::Department => "department",
            OrgKind::Team => "team",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Organization<ID> {
    pub id: ID,
    pub parent_id: Option<ID>,
    pub kind: OrgKind,
    pub name: String,

    /// Organizations are soft-archived, never deleted.
    pub archived_at: Option<Timestamp>,
}

impl<ID> Organization<ID> {
    pub fn company(id: ID, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            kind: OrgKind::Company,
            name: name.into(),
            archived_at: None,
        }
    }

    pub fn department(id: ID, parent_id: ID, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            kind: OrgKind::Department,
            name: name.into(),
            archived_at: None,
        }
    }

    pub fn team(id: ID, parent_id: ID, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: Some(parent_id),
            kind: OrgKind::Team,
            name: name.into(),
            archived_at: None,
        }
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Forest of organizations indexed by id, with a child index for downward walks.
///
/// A tree built with [`OrgTree::from_organizations`] is a raw snapshot of stored data and may be
/// malformed. Queries walking upwards detect this and return an [`OrgIntegrityError`], queries
/// walking downwards carry a visited set and always terminate. Mutations through
/// [`OrgTree::insert`] and [`OrgTree::reparent`] never introduce malformed parent pointers.
#[derive(Clone, Debug)]
pub struct OrgTree<ID> {
    organizations: HashMap<ID, Organization<ID>>,
    children: HashMap<ID, Vec<ID>>,
}

impl<ID> Default for OrgTree<ID> {
    fn default() -> Self {
        Self {
            organizations: Default::default(),
            children: Default::default(),
        }
    }
}

impl<ID> OrgTree<ID>
where
    ID: IdentityHandle,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from stored organizations without validating it.
    pub fn from_organizations(organizations: impl IntoIterator<Item = Organization<ID>>) -> Self {
        let mut tree = Self::new();
        for organization in organizations {
            tree.organizations.insert(organization.id, organization);
        }
        tree.rebuild_children();
        tree
    }

    /// Build a tree and check all invariants with [`OrgTree::validate`].
    pub fn validated(
        organizations: impl IntoIterator<Item = Organization<ID>>,
    ) -> Result<Self, OrgIntegrityError<ID>> {
        let tree = Self::from_organizations(organizations);
        tree.validate()?;
        Ok(tree)
    }

    fn rebuild_children(&mut self) {
        self.children.clear();
        for organization in self.organizations.values() {
            if let Some(parent_id) = organization.parent_id {
                self.children
                    .entry(parent_id)
                    .or_default()
                    .push(organization.id);
            }
        }
        for children in self.children.values_mut() {
            children.sort();
        }
    }

    pub fn get(&self, id: &ID) -> Option<&Organization<ID>> {
        self.organizations.get(id)
    }

    pub fn contains(&self, id: &ID) -> bool {
        self.organizations.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization<ID>> {
        self.organizations.values()
    }

    /// Direct children of an organization, sorted by id.
    pub fn children(&self, id: &ID) -> &[ID] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The organization itself and every organization below it.
    ///
    /// Returns an empty set for unknown organizations.
    pub fn self_and_descendants(&self, id: &ID) -> HashSet<ID> {
        let mut visited = HashSet::new();
        if !self.contains(id) {
            return visited;
        }

        visited.insert(*id);
        let mut queue = VecDeque::from([*id]);
        while let Some(current) = queue.pop_front() {
            for child in self.children(&current) {
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }

        visited
    }

    pub fn descendants(&self, id: &ID) -> HashSet<ID> {
        let mut descendants = self.self_and_descendants(id);
        descendants.remove(id);
        descendants
    }

    /// Return `true` if `descendant` sits anywhere below `ancestor`.
    ///
    /// An organization is not its own ancestor. Malformed parent pointers end the walk and count
    /// as "not an ancestor".
    pub fn is_ancestor_of(&self, ancestor: &ID, descendant: &ID) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.get(descendant).and_then(|org| org.parent_id);
        while let Some(id) = current {
            if id == *ancestor {
                return true;
            }
            if !visited.insert(id) {
                return false;
            }
            current = self.get(&id).and_then(|org| org.parent_id);
        }
        false
    }

    /// Parents of an organization, nearest first.
    pub fn ancestors(&self, id: &ID) -> Result<Vec<ID>, OrgIntegrityError<ID>> {
        let mut current = self
            .get(id)
            .ok_or(OrgIntegrityError::UnknownOrganization(*id))?;

        let mut ancestors = Vec::new();
        let mut visited = HashSet::from([current.id]);
        while let Some(parent_id) = current.parent_id {
            if parent_id == current.id {
                return Err(OrgIntegrityError::SelfParent(current.id));
            }

            let parent = self
                .get(&parent_id)
                .ok_or(OrgIntegrityError::DanglingParent(current.id, parent_id))?;

            // Every organization can be visited at most once, this bounds the walk by the size of
            // the tree.
            if !visited.insert(parent_id) {
                return Err(OrgIntegrityError::ParentCycle(*id));
            }

            ancestors.push(parent_id);
            current = parent;
        }

        Ok(ancestors)
    }

    /// Topmost organization above (or equal to) the given one.
    pub fn root(&self, id: &ID) -> Result<&Organization<ID>, OrgIntegrityError<ID>> {
        let ancestors = self.ancestors(id)?;
        let root_id = ancestors.last().copied().unwrap_or(*id);
        self.get(&root_id)
            .ok_or(OrgIntegrityError::UnknownOrganization(root_id))
    }

    /// Company at the root of the tree the given organization belongs to.
    pub fn root_company(&self, id: &ID) -> Result<&Organization<ID>, OrgIntegrityError<ID>> {
        let root = self.root(id)?;
        if root.kind != OrgKind::Company {
            return Err(OrgIntegrityError::RootNotCompany(root.id, root.kind));
        }
        Ok(root)
    }

    /// Check every organization reaches a company root through known parents, without cycles and
    /// without companies nested under other organizations.
    pub fn validate(&self) -> Result<(), OrgIntegrityError<ID>> {
        let mut ids: Vec<ID> = self.organizations.keys().copied().collect();
        ids.sort();

        for id in ids {
            self.root_company(&id)?;

            if let Some(organization) = self.get(&id) {
                if let (OrgKind::Company, Some(parent_id)) =
                    (organization.kind, organization.parent_id)
                {
                    return Err(OrgIntegrityError::NestedCompany(id, parent_id));
                }
            }
        }

        Ok(())
    }

    /// Add a new organization as a leaf of the tree.
    pub fn insert(&mut self, organization: Organization<ID>) -> Result<(), OrgIntegrityError<ID>> {
        if self.contains(&organization.id) {
            return Err(OrgIntegrityError::DuplicateOrganization(organization.id));
        }

        match (organization.kind, organization.parent_id) {
            (_, Some(parent_id)) if parent_id == organization.id => {
                return Err(OrgIntegrityError::SelfParent(organization.id));
            }
            (OrgKind::Company, Some(parent_id)) => {
                return Err(OrgIntegrityError::NestedCompany(organization.id, parent_id));
            }
            (_, Some(parent_id)) if !self.contains(&parent_id) => {
                return Err(OrgIntegrityError::DanglingParent(
                    organization.id,
                    parent_id,
                ));
            }
            (kind, None) if kind != OrgKind::Company => {
                return Err(OrgIntegrityError::RootNotCompany(organization.id, kind));
            }
            _ => (),
        }

        if let Some(parent_id) = organization.parent_id {
            let siblings = self.children.entry(parent_id).or_default();
            siblings.push(organization.id);
            siblings.sort();
        }
        self.organizations.insert(organization.id, organization);

        Ok(())
    }

    /// Move an organization (and everything below it) under a new parent.
    ///
    /// The tree is left untouched when the move would break an invariant.
    pub fn reparent(&mut self, id: &ID, new_parent_id: ID) -> Result<(), OrgIntegrityError<ID>> {
        let (kind, old_parent_id) = match self.get(id) {
            Some(organization) => (organization.kind, organization.parent_id),
            None => return Err(OrgIntegrityError::UnknownOrganization(*id)),
        };

        if *id == new_parent_id {
            return Err(OrgIntegrityError::SelfParent(*id));
        }
        if kind == OrgKind::Company {
            return Err(OrgIntegrityError::NestedCompany(*id, new_parent_id));
        }
        if !self.contains(&new_parent_id) {
            return Err(OrgIntegrityError::DanglingParent(*id, new_parent_id));
        }
        if self.is_ancestor_of(id, &new_parent_id) {
            return Err(OrgIntegrityError::ParentCycle(*id));
        }

        if let Some(old_parent_id) = old_parent_id {
            if let Some(siblings) = self.children.get_mut(&old_parent_id) {
                siblings.retain(|child| child != id);
            }
        }
        let siblings = self.children.entry(new_parent_id).or_default();
        siblings.push(*id);
        siblings.sort();

        if let Some(organization) = self.organizations.get_mut(id) {
            organization.parent_id = Some(new_parent_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use crate::test_utils::{ACME, ENG, GLOBEX, PLATFORM, SALES, acme_orgs, acme_tree};

    use super::{OrgIntegrityError, OrgKind, OrgTree, Organization};

    #[test]
    fn self_and_descendants() {
        let tree = acme_tree();

        let acme = tree.self_and_descendants(&ACME);
        assert_eq!(acme.len(), 4);
        for id in [ACME, ENG, PLATFORM, SALES] {
            assert!(acme.contains(&id));
        }

        let eng = tree.self_and_descendants(&ENG);
        assert_eq!(eng.len(), 2);
        assert!(eng.contains(&ENG));
        assert!(eng.contains(&PLATFORM));

        // Company -> Department -> Team: the company set strictly contains the department set.
        assert!(acme.len() >= eng.len() + 1);
        assert!(eng.is_subset(&acme));

        let platform = tree.self_and_descendants(&PLATFORM);
        assert_eq!(platform.len(), 1);
        assert!(platform.contains(&PLATFORM));

        assert!(tree.self_and_descendants(&GLOBEX).is_empty());
        assert!(tree.descendants(&PLATFORM).is_empty());
    }

    #[test]
    fn ancestors_and_roots() {
        let tree = acme_tree();

        assert_eq!(tree.ancestors(&PLATFORM), Ok(vec![ENG, ACME]));
        assert_eq!(tree.ancestors(&ACME), Ok(vec![]));
        assert_eq!(tree.root_company(&PLATFORM).unwrap().id, ACME);
        assert_eq!(tree.root_company(&ACME).unwrap().id, ACME);

        assert!(tree.is_ancestor_of(&ACME, &PLATFORM));
        assert!(tree.is_ancestor_of(&ENG, &PLATFORM));
        assert!(!tree.is_ancestor_of(&PLATFORM, &ENG));
        assert!(!tree.is_ancestor_of(&SALES, &PLATFORM));
        assert!(!tree.is_ancestor_of(&ACME, &ACME));

        assert_eq!(
            tree.root_company(&GLOBEX),
            Err(OrgIntegrityError::UnknownOrganization(GLOBEX))
        );
    }

    #[test]
    fn parent_cycle_is_detected() {
        // Department and team point at each other, neither reaches the company.
        let tree = OrgTree::from_organizations([
            Organization::company(ACME, "Acme"),
            Organization::department(ENG, PLATFORM, "Engineering"),
            Organization::team(PLATFORM, ENG, "Platform"),
        ]);

        assert_eq!(
            tree.root_company(&PLATFORM),
            Err(OrgIntegrityError::ParentCycle(PLATFORM))
        );
        assert!(!tree.is_ancestor_of(&ACME, &PLATFORM));

        // Downward walks still terminate.
        assert_eq!(tree.self_and_descendants(&ENG).len(), 2);

        assert_matches!(tree.validate(), Err(OrgIntegrityError::ParentCycle(_)));
    }

    #[test]
    fn malformed_parents() {
        let tree = OrgTree::from_organizations([
            Organization::company(ACME, "Acme"),
            Organization::department(ENG, ENG, "Engineering"),
        ]);
        assert_eq!(
            tree.root_company(&ENG),
            Err(OrgIntegrityError::SelfParent(ENG))
        );

        let tree = OrgTree::from_organizations([Organization::team(PLATFORM, ENG, "Platform")]);
        assert_eq!(
            tree.root_company(&PLATFORM),
            Err(OrgIntegrityError::DanglingParent(PLATFORM, ENG))
        );

        let tree = OrgTree::from_organizations([Organization {
            id: ENG,
            parent_id: None,
            kind: OrgKind::Department,
            name: "Engineering".into(),
            archived_at: None,
        }]);
        assert_eq!(
            tree.validate(),
            Err(OrgIntegrityError::RootNotCompany(ENG, OrgKind::Department))
        );

        let tree = OrgTree::from_organizations([
            Organization::company(ACME, "Acme"),
            Organization {
                id: GLOBEX,
                parent_id: Some(ACME),
                kind: OrgKind::Company,
                name: "Globex".into(),
                archived_at: None,
            },
        ]);
        assert_eq!(
            tree.validate(),
            Err(OrgIntegrityError::NestedCompany(GLOBEX, ACME))
        );
    }

    #[test]
    fn insert_keeps_invariants() {
        let mut tree = acme_tree();

        assert_eq!(
            tree.insert(Organization::company(ACME, "Acme again")),
            Err(OrgIntegrityError::DuplicateOrganization(ACME))
        );
        assert_eq!(
            tree.insert(Organization::team('x', 'x', "Loop")),
            Err(OrgIntegrityError::SelfParent('x'))
        );
        assert_eq!(
            tree.insert(Organization::team('x', 'y', "Orphan")),
            Err(OrgIntegrityError::DanglingParent('x', 'y'))
        );
        assert_eq!(tree.len(), 4);

        tree.insert(Organization::team('x', SALES, "Field sales"))
            .unwrap();
        assert_eq!(tree.children(&SALES), &['x']);
        assert_eq!(tree.root_company(&'x').unwrap().id, ACME);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = acme_tree();

        // Moving a department below its own team would close a loop.
        assert_eq!(
            tree.reparent(&ENG, PLATFORM),
            Err(OrgIntegrityError::ParentCycle(ENG))
        );
        assert_eq!(
            tree.reparent(&ACME, SALES),
            Err(OrgIntegrityError::NestedCompany(ACME, SALES))
        );
        assert_eq!(tree.get(&ENG).unwrap().parent_id, Some(ACME));
        assert!(tree.validate().is_ok());

        tree.reparent(&PLATFORM, SALES).unwrap();
        assert_eq!(tree.get(&PLATFORM).unwrap().parent_id, Some(SALES));
        assert!(tree.children(&ENG).is_empty());
        assert_eq!(tree.children(&SALES), &[PLATFORM]);
        assert!(tree.self_and_descendants(&SALES).contains(&PLATFORM));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn validated_snapshot() {
        assert!(OrgTree::validated(acme_orgs()).is_ok());
    }
}
