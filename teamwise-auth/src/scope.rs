// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authorized subsets of record collections.
//!
//! Facts about the viewer (employment, capabilities, the set of persons they manage) are computed
//! once per collection, records are then admitted with set lookups. Records which are only
//! admitted because the viewer manages one of their subjects are confirmed with
//! [`decide`](crate::policy::decide), a scope never contains a record the single-record decision
//! denies.
use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::context::PolicyContext;
use crate::policy::{Action, ProtectedRecord, RecordFacts, ResourceKind, decide, precondition};
use crate::traits::IdentityHandle;
use crate::viewer::Viewer;

/// Viewer facts prepared for filtering many records.
#[derive(Debug)]
pub struct PolicyScope<'a, ID>
where
    ID: IdentityHandle,
{
    ctx: &'a PolicyContext<ID>,
    viewer: &'a Viewer<ID>,
    action: Action,
    person: Option<ID>,
    employed: bool,
    can_manage_employment: bool,
    can_manage_maap: bool,

    /// Persons directly or transitively reporting to the viewer.
    reports: HashSet<ID>,
}

impl<'a, ID> PolicyScope<'a, ID>
where
    ID: IdentityHandle,
{
    pub fn new(ctx: &'a PolicyContext<ID>, viewer: &'a Viewer<ID>, action: Action) -> Self {
        let person = viewer.person;
        let (employed, can_manage_employment, can_manage_maap, reports) = match &person {
            Some(person) => (
                ctx.is_employed(person),
                ctx.can_manage_employment(person),
                ctx.can_manage_maap(person),
                ctx.managers()
                    .reports_of(person)
                    .into_iter()
                    .map(|entry| entry.person)
                    .collect(),
            ),
            None => (false, false, false, HashSet::new()),
        };

        Self {
            ctx,
            viewer,
            action,
            person,
            employed,
            can_manage_employment,
            can_manage_maap,
            reports,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    fn is_author(&self, facts: &RecordFacts<ID>) -> bool {
        self.person.is_some() && facts.author == self.person
    }

    fn overrides(&self) -> bool {
        self.viewer.is_global_admin
            || (self.action == Action::View && self.can_manage_employment)
    }

    /// Return `true` if the viewer may perform the scope's action on the record.
    pub fn admits<R>(&self, record: &R) -> bool
    where
        R: ProtectedRecord<ID>,
    {
        let facts = record.facts();

        if !precondition(self.ctx, &facts) {
            return false;
        }

        if !facts.published {
            return self.is_author(&facts);
        }

        if self.overrides() {
            return true;
        }

        let Some(person) = self.person else {
            return matches!(facts.kind, ResourceKind::Observation | ResourceKind::Goal)
                && self.action == Action::View
                && facts.privacy.is_public();
        };

        match (facts.kind, self.action) {
            (ResourceKind::Observation | ResourceKind::Goal, Action::Update) => {
                self.is_author(&facts)
            }
            (ResourceKind::Observation | ResourceKind::Goal, Action::View) => {
                if facts.privacy.is_public() || self.is_author(&facts) {
                    return true;
                }
                if facts.privacy.includes_company() {
                    return self.employed;
                }
                self.admits_subjects(
                    &facts,
                    person,
                    facts.privacy.includes_subjects(),
                    facts.privacy.includes_managers(),
                )
            }
            (ResourceKind::EmploymentTenure, Action::View) => {
                self.admits_subjects(&facts, person, true, true)
            }
            (ResourceKind::EmploymentTenure, Action::Update) => self.can_manage_employment,
            (_, Action::View) => self.employed,
            (_, Action::Update) => self.can_manage_maap,
        }
    }

    fn admits_subjects(
        &self,
        facts: &RecordFacts<ID>,
        person: ID,
        subjects: bool,
        managers: bool,
    ) -> bool {
        let resolved: Vec<ID> = facts
            .subjects
            .iter()
            .filter_map(|subject| self.ctx.resolve_subject(subject))
            .collect();

        if subjects && resolved.contains(&person) {
            return true;
        }

        // Confirm management with the single-record decision, traversal limits may make the two
        // views of the hierarchy disagree.
        managers
            && resolved.iter().any(|subject| self.reports.contains(subject))
            && decide(self.ctx, self.viewer, facts, self.action)
    }

    /// Keep the records the viewer is allowed to act on, in their original order.
    pub fn filter<R>(&self, records: impl IntoIterator<Item = R>) -> Vec<R>
    where
        R: ProtectedRecord<ID>,
    {
        let mut total = 0;
        let admitted: Vec<R> = records
            .into_iter()
            .inspect(|_| total += 1)
            .filter(|record| self.admits(record))
            .collect();

        debug!(
            viewer = ?self.person,
            action = %self.action,
            total,
            admitted = admitted.len(),
            "scoped records"
        );
        admitted
    }
}

/// Records the viewer may view.
pub fn scope<ID, R>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    records: impl IntoIterator<Item = R>,
) -> Vec<R>
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID>,
{
    PolicyScope::new(ctx, viewer, Action::View).filter(records)
}

/// Records the viewer may perform the given action on.
pub fn scope_action<ID, R>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    records: impl IntoIterator<Item = R>,
    action: Action,
) -> Vec<R>
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID>,
{
    PolicyScope::new(ctx, viewer, action).filter(records)
}

/// Ids of the records the viewer may view.
pub fn visible_ids<'r, ID, R>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    records: impl IntoIterator<Item = &'r R>,
) -> BTreeSet<ID>
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID> + 'r,
{
    let scope = PolicyScope::new(ctx, viewer, Action::View);
    records
        .into_iter()
        .map(|record| record.facts())
        .filter(|facts| scope.admits(facts))
        .map(|facts| facts.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::managerial::TraversalLimits;
    use crate::policy::{
        Action, CompanyRecord, Goal, Observation, ProtectedRecord, RecordFacts, ResourceKind,
        Subject, TenureRecord, decide,
    };
    use crate::privacy::PrivacyLevel;
    use crate::test_utils::{
        CEO, ENG, EX, GLOBEX, HR, M1, M2, OUTSIDER, PEER, PLATFORM, R, SALES, SALLY, T_M1, T_R,
        T_SALLY, acme_context, setup_logging, viewer,
    };
    use crate::viewer::Viewer;

    use super::{PolicyScope, scope, scope_action, visible_ids};

    fn viewers() -> Vec<Viewer<char>> {
        let mut viewers: Vec<Viewer<char>> = [CEO, M2, M1, R, PEER, SALLY, HR, EX, OUTSIDER]
            .into_iter()
            .map(viewer)
            .collect();
        viewers.push(Viewer::anonymous());
        viewers.push(viewer(OUTSIDER).global_admin());
        viewers
    }

    /// Every kind of record in every state. Record ids are taken from a range which does not
    /// clash with the fixture ids.
    fn records() -> Vec<RecordFacts<char>> {
        let mut records = Vec::new();
        let mut ids = '\u{100}'..;
        let mut next_id = move || ids.next().unwrap_or('?');

        for privacy in PrivacyLevel::ALL {
            for (author, observee, organization) in [
                (PEER, T_R, PLATFORM),
                (SALLY, T_M1, SALES),
                (M1, T_SALLY, ENG),
            ] {
                let draft = Observation::draft(next_id(), organization, author, privacy)
                    .observing(observee);
                records.push(draft.facts());
                records.push(draft.clone().published(1).facts());

                let mut deleted = draft.published(1);
                deleted.id = next_id();
                deleted.deleted_at = Some(2);
                records.push(deleted.facts());
            }

            records.push(
                Goal::draft(next_id(), ENG, M2, privacy)
                    .owned_by(Subject::Person(R))
                    .published(1)
                    .facts(),
            );
            records.push(
                Goal::draft(next_id(), GLOBEX, OUTSIDER, privacy)
                    .published(1)
                    .facts(),
            );
        }

        for person in [R, M1, SALLY, EX] {
            records.push(
                TenureRecord {
                    id: next_id(),
                    organization: Some(ENG),
                    person,
                }
                .facts(),
            );
        }

        for kind in [ResourceKind::Ability, ResourceKind::Position] {
            records.push(CompanyRecord::new(next_id(), kind, SALES).facts());
        }

        records
    }

    #[test]
    fn scope_matches_single_record_decisions() {
        setup_logging();
        let ctx = acme_context();
        let records = records();

        for action in [Action::View, Action::Update] {
            for viewer in viewers() {
                let expected: Vec<char> = records
                    .iter()
                    .filter(|facts| decide(&ctx, &viewer, facts, action))
                    .map(|facts| facts.id)
                    .collect();
                let scoped: Vec<char> = scope_action(&ctx, &viewer, records.clone(), action)
                    .into_iter()
                    .map(|facts| facts.id)
                    .collect();

                assert_eq!(scoped, expected, "{:?} {action}", viewer.person);
            }
        }
    }

    #[test]
    fn scope_is_restricted_under_traversal_limits() {
        let ctx = acme_context().with_limits(TraversalLimits::unbounded().max_depth(1));
        let records = records();

        for viewer in viewers() {
            for facts in scope(&ctx, &viewer, records.clone()) {
                assert!(decide(&ctx, &viewer, &facts, Action::View));
            }
        }

        // M2 only reaches M1 directly, observations about R are out of reach.
        let about_r = Observation::draft('o', PLATFORM, PEER, PrivacyLevel::ManagersOnly)
            .observing(T_R)
            .published(1);
        assert!(scope(&ctx, &viewer(M2), [about_r.clone()]).is_empty());
        assert_eq!(scope(&ctx, &viewer(M1), [about_r]).len(), 1);
    }

    #[test]
    fn visible_ids_of_observations() {
        let ctx = acme_context();
        let observations = [
            Observation::draft('a', PLATFORM, PEER, PrivacyLevel::ObserverOnly).published(1),
            Observation::draft('b', PLATFORM, PEER, PrivacyLevel::ManagersOnly)
                .observing(T_R)
                .published(1),
            Observation::draft('c', PLATFORM, PEER, PrivacyLevel::PublicToWorld),
            Observation::draft('d', SALES, SALLY, PrivacyLevel::PublicToCompany).published(1),
        ];

        assert_eq!(
            visible_ids(&ctx, &viewer(M1), &observations),
            ['b', 'd'].into()
        );
        assert_eq!(
            visible_ids(&ctx, &viewer(PEER), &observations),
            ['a', 'b', 'c', 'd'].into()
        );
        assert!(visible_ids(&ctx, &Viewer::anonymous(), &observations).is_empty());

        let hr = viewer(HR);
        let scope = PolicyScope::new(&ctx, &hr, Action::View);
        assert_eq!(scope.action(), Action::View);
        assert_eq!(scope.filter(&observations).len(), 3);
    }
}
