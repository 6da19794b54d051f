// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-record authorization decisions.
//!
//! Every resource kind is decided by the same template:
//!
//! 1. Archived or deleted records, and records of archived organizations, are denied to everyone.
//! 2. Records without an organization, or with an organization outside of the loaded company, are
//!    denied.
//! 3. Unpublished records are only visible to their author.
//! 4. The rule registered for the resource kind is asked.
//! 5. Global admins may do anything, employment managers of the company may view anything.
//!
//! Decisions are booleans, denials are logged with their reason.
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::PolicyContext;
use crate::org::Organization;
use crate::privacy::PrivacyLevel;
use crate::traits::IdentityHandle;
use crate::viewer::Viewer;

mod ratings;
mod records;
mod rules;

pub use ratings::{ObservationRating, Rating, can_view_negative_ratings, visible_ratings};
pub use records::{CompanyRecord, Goal, Observation, ObserveeEdge, TenureRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResourceKind {
    Observation,
    Goal,
    EmploymentTenure,
    Assignment,
    Ability,
    Title,
    Position,
}

impl ResourceKind {
    /// Catalogue entries shared by the whole company.
    pub fn is_company_scoped(&self) -> bool {
        matches!(
            self,
            ResourceKind::Assignment
                | ResourceKind::Ability
                | ResourceKind::Title
                | ResourceKind::Position
        )
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceKind::Observation => "observation",
            ResourceKind::Goal => "goal",
            ResourceKind::EmploymentTenure => "employment_tenure",
            ResourceKind::Assignment => "assignment",
            ResourceKind::Ability => "ability",
            ResourceKind::Title => "title",
            ResourceKind::Position => "position",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Action {
    View,
    Update,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::View => "view",
            Action::Update => "update",
        };
        write!(f, "{s}")
    }
}

/// Who a record is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Subject<ID> {
    Person(ID),

    /// Membership of a person, resolved to the person through the policy context.
    Teammate(ID),
}

/// Normalized view on a protected record, all decisions are taken on these facts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFacts<ID> {
    pub id: ID,
    pub kind: ResourceKind,
    pub organization: Option<ID>,

    /// Neither archived nor deleted.
    pub live: bool,

    pub published: bool,
    pub privacy: PrivacyLevel,

    /// Person who created the record, if it has one.
    pub author: Option<ID>,

    pub subjects: Vec<Subject<ID>>,
}

/// Record which can be protected by the policy.
pub trait ProtectedRecord<ID> {
    fn facts(&self) -> RecordFacts<ID>;
}

impl<ID> ProtectedRecord<ID> for RecordFacts<ID>
where
    ID: Clone,
{
    fn facts(&self) -> RecordFacts<ID> {
        self.clone()
    }
}

impl<ID, R> ProtectedRecord<ID> for &R
where
    R: ProtectedRecord<ID> + ?Sized,
{
    fn facts(&self) -> RecordFacts<ID> {
        (**self).facts()
    }
}

/// Decision function of a resource kind, asked after the shared preconditions passed.
pub(crate) type Rule<ID> = fn(&PolicyContext<ID>, &Viewer<ID>, &RecordFacts<ID>, Action) -> bool;

pub(crate) fn rule_for<ID>(kind: ResourceKind) -> Rule<ID>
where
    ID: IdentityHandle,
{
    match kind {
        ResourceKind::Observation | ResourceKind::Goal => rules::authored,
        ResourceKind::EmploymentTenure => rules::tenure,
        ResourceKind::Assignment
        | ResourceKind::Ability
        | ResourceKind::Title
        | ResourceKind::Position => rules::company,
    }
}

/// Liveness and organization context of a record, checked before anything else.
pub(crate) fn precondition<ID>(ctx: &PolicyContext<ID>, facts: &RecordFacts<ID>) -> bool
where
    ID: IdentityHandle,
{
    if !facts.live {
        debug!(record = %facts.id, kind = %facts.kind, "denied: record is archived or deleted");
        return false;
    }

    let Some(organization) = facts.organization else {
        debug!(record = %facts.id, kind = %facts.kind, "denied: record has no organization");
        return false;
    };

    if !ctx.contains_organization(&organization) {
        debug!(
            record = %facts.id,
            %organization,
            company = %ctx.company(),
            "denied: organization is not part of the company"
        );
        return false;
    }

    if ctx
        .tree()
        .get(&organization)
        .is_some_and(Organization::is_archived)
    {
        debug!(record = %facts.id, %organization, "denied: organization is archived");
        return false;
    }

    true
}

/// Grants which hold regardless of the resource kind's rule.
pub(crate) fn overrides<ID>(ctx: &PolicyContext<ID>, viewer: &Viewer<ID>, action: Action) -> bool
where
    ID: IdentityHandle,
{
    if viewer.is_global_admin {
        return true;
    }

    action == Action::View
        && viewer
            .person
            .is_some_and(|person| ctx.can_manage_employment(&person))
}

/// Decide if the viewer may perform the action on a record with the given facts.
pub fn decide<ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    facts: &RecordFacts<ID>,
    action: Action,
) -> bool
where
    ID: IdentityHandle,
{
    if !precondition(ctx, facts) {
        return false;
    }

    if !facts.published {
        let is_author = facts.author.is_some() && facts.author == viewer.person;
        if !is_author {
            debug!(record = %facts.id, kind = %facts.kind, "denied: unpublished record");
        }
        return is_author;
    }

    let rule = rule_for(facts.kind);
    if rule(ctx, viewer, facts, action) || overrides(ctx, viewer, action) {
        return true;
    }

    debug!(
        record = %facts.id,
        kind = %facts.kind,
        %action,
        privacy = %facts.privacy,
        viewer = ?viewer.person,
        "denied"
    );
    false
}

pub fn can<ID, R>(ctx: &PolicyContext<ID>, viewer: &Viewer<ID>, record: &R, action: Action) -> bool
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID>,
{
    decide(ctx, viewer, &record.facts(), action)
}

pub fn can_view<ID, R>(ctx: &PolicyContext<ID>, viewer: &Viewer<ID>, record: &R) -> bool
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID>,
{
    can(ctx, viewer, record, Action::View)
}

pub fn can_update<ID, R>(ctx: &PolicyContext<ID>, viewer: &Viewer<ID>, record: &R) -> bool
where
    ID: IdentityHandle,
    R: ProtectedRecord<ID>,
{
    can(ctx, viewer, record, Action::Update)
}
