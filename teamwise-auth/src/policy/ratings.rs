// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finer-grained decisions on the ratings contained in an observation.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::PolicyContext;
use crate::policy::records::Observation;
use crate::policy::{Action, ProtectedRecord, decide};
use crate::traits::IdentityHandle;
use crate::viewer::Viewer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Rating {
    StronglyDisagree,
    Disagree,
    NotApplicable,
    Agree,
    StronglyAgree,
}

impl Rating {
    pub fn is_negative(&self) -> bool {
        *self < Rating::NotApplicable
    }
}

/// Rating of one ability or assignment inside an observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ObservationRating<ID> {
    pub rateable: ID,
    pub rating: Rating,
}

/// Return `true` if the viewer may see the negative ratings of an observation.
///
/// Requires view access to the observation itself. On top of that only the observer, managers
/// of an observee, employment managers and global admins see negative ratings, observees and
/// company-wide audiences only see the positive ones.
pub fn can_view_negative_ratings<ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    observation: &Observation<ID>,
) -> bool
where
    ID: IdentityHandle,
{
    let facts = observation.facts();
    if !decide(ctx, viewer, &facts, Action::View) {
        return false;
    }

    if viewer.is_global_admin {
        return true;
    }

    let Some(person) = viewer.person else {
        return false;
    };

    if person == observation.observer || ctx.can_manage_employment(&person) {
        return true;
    }

    facts
        .subjects
        .iter()
        .filter_map(|subject| ctx.resolve_subject(subject))
        .any(|observee| ctx.manages(&person, &observee))
}

/// Ratings of an observation the viewer may see. Empty if the observation is not visible.
pub fn visible_ratings<'a, ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    observation: &'a Observation<ID>,
) -> Vec<&'a ObservationRating<ID>>
where
    ID: IdentityHandle,
{
    if !decide(ctx, viewer, &observation.facts(), Action::View) {
        return Vec::new();
    }

    let negatives = can_view_negative_ratings(ctx, viewer, observation);
    observation
        .ratings
        .iter()
        .filter(|rating| negatives || !rating.rating.is_negative())
        .collect()
}
