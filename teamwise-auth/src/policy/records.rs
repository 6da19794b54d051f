// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protected record types and their normalized facts.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::employment::Timestamp;
use crate::policy::ratings::ObservationRating;
use crate::policy::{ProtectedRecord, RecordFacts, ResourceKind, Subject};
use crate::privacy::PrivacyLevel;

/// Observee relation between an observation and a teammate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ObserveeEdge<ID> {
    pub observation: ID,
    pub teammate: ID,
}

/// Feedback an observer wrote about one or more teammates.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Observation<ID> {
    pub id: ID,
    pub organization: Option<ID>,

    /// Person who wrote the observation.
    pub observer: ID,

    /// Teammates the observation is about.
    pub observees: Vec<ID>,

    pub privacy: PrivacyLevel,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub ratings: Vec<ObservationRating<ID>>,
}

impl<ID> Observation<ID>
where
    ID: Copy + PartialEq,
{
    /// Unpublished observation without observees or ratings.
    pub fn draft(id: ID, organization: ID, observer: ID, privacy: PrivacyLevel) -> Self {
        Self {
            id,
            organization: Some(organization),
            observer,
            observees: Vec::new(),
            privacy,
            published_at: None,
            deleted_at: None,
            ratings: Vec::new(),
        }
    }

    pub fn published(mut self, at: Timestamp) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn observing(mut self, teammate: ID) -> Self {
        self.observees.push(teammate);
        self
    }

    pub fn rated(mut self, rating: ObservationRating<ID>) -> Self {
        self.ratings.push(rating);
        self
    }

    /// Take over the observees listed for this observation in a batch of observee edges.
    pub fn attach_observees(&mut self, edges: &[ObserveeEdge<ID>]) {
        for edge in edges {
            if edge.observation == self.id && !self.observees.contains(&edge.teammate) {
                self.observees.push(edge.teammate);
            }
        }
    }
}

impl<ID> ProtectedRecord<ID> for Observation<ID>
where
    ID: Copy,
{
    fn facts(&self) -> RecordFacts<ID> {
        RecordFacts {
            id: self.id,
            kind: ResourceKind::Observation,
            organization: self.organization,
            live: self.deleted_at.is_none(),
            published: self.published_at.is_some(),
            privacy: self.privacy,
            author: Some(self.observer),
            subjects: self.observees.iter().copied().map(Subject::Teammate).collect(),
        }
    }
}

/// Goal created by a person and owned by a person or teammate.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Goal<ID> {
    pub id: ID,
    pub organization: Option<ID>,
    pub creator: ID,
    pub owner: Option<Subject<ID>>,
    pub privacy: PrivacyLevel,
    pub published_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
}

impl<ID> Goal<ID> {
    pub fn draft(id: ID, organization: ID, creator: ID, privacy: PrivacyLevel) -> Self {
        Self {
            id,
            organization: Some(organization),
            creator,
            owner: None,
            privacy,
            published_at: None,
            deleted_at: None,
        }
    }

    pub fn published(mut self, at: Timestamp) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn owned_by(mut self, owner: Subject<ID>) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl<ID> ProtectedRecord<ID> for Goal<ID>
where
    ID: Copy,
{
    fn facts(&self) -> RecordFacts<ID> {
        RecordFacts {
            id: self.id,
            kind: ResourceKind::Goal,
            organization: self.organization,
            live: self.deleted_at.is_none(),
            published: self.published_at.is_some(),
            privacy: self.privacy,
            author: Some(self.creator),
            subjects: self.owner.into_iter().collect(),
        }
    }
}

/// Employment tenure of a person, as shown on their profile.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TenureRecord<ID> {
    pub id: ID,
    pub organization: Option<ID>,
    pub person: ID,
}

impl<ID> ProtectedRecord<ID> for TenureRecord<ID>
where
    ID: Copy,
{
    fn facts(&self) -> RecordFacts<ID> {
        RecordFacts {
            id: self.id,
            kind: ResourceKind::EmploymentTenure,
            organization: self.organization,
            live: true,
            published: true,
            privacy: PrivacyLevel::ObservedAndManagers,
            author: None,
            subjects: vec![Subject::Person(self.person)],
        }
    }
}

/// Company-wide catalogue entry: assignment, ability, title or position.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct CompanyRecord<ID> {
    pub id: ID,
    pub kind: ResourceKind,
    pub organization: Option<ID>,
    pub archived_at: Option<Timestamp>,
}

impl<ID> CompanyRecord<ID> {
    pub fn new(id: ID, kind: ResourceKind, organization: ID) -> Self {
        Self {
            id,
            kind,
            organization: Some(organization),
            archived_at: None,
        }
    }
}

impl<ID> ProtectedRecord<ID> for CompanyRecord<ID>
where
    ID: Copy,
{
    fn facts(&self) -> RecordFacts<ID> {
        RecordFacts {
            id: self.id,
            kind: self.kind,
            organization: self.organization,
            live: self.archived_at.is_none(),
            published: true,
            privacy: PrivacyLevel::PublicToCompany,
            author: None,
            subjects: Vec::new(),
        }
    }
}
