// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rules of the dispatch table. They only run for live, published records of the loaded company.
use crate::context::PolicyContext;
use crate::policy::{Action, RecordFacts};
use crate::traits::IdentityHandle;
use crate::viewer::Viewer;

/// Records written by an author about subjects: observations and goals.
///
/// The author plays the observer's role, the subjects play the observees' role.
pub(crate) fn authored<ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    facts: &RecordFacts<ID>,
    action: Action,
) -> bool
where
    ID: IdentityHandle,
{
    let is_author = viewer.person.is_some() && viewer.person == facts.author;

    if action == Action::Update {
        return is_author;
    }

    if facts.privacy.is_public() || is_author {
        return true;
    }

    let Some(person) = viewer.person else {
        return false;
    };

    if facts.privacy.includes_company() {
        return ctx.is_employed(&person);
    }

    let check_subjects = facts.privacy.includes_subjects();
    let check_managers = facts.privacy.includes_managers();
    if !check_subjects && !check_managers {
        return false;
    }

    facts
        .subjects
        .iter()
        .filter_map(|subject| ctx.resolve_subject(subject))
        .any(|subject| {
            (check_subjects && subject == person)
                || (check_managers && ctx.manages(&person, &subject))
        })
}

/// Employment tenures: visible to the tenured person and their managers.
pub(crate) fn tenure<ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    facts: &RecordFacts<ID>,
    action: Action,
) -> bool
where
    ID: IdentityHandle,
{
    let Some(person) = viewer.person else {
        return false;
    };

    match action {
        Action::View => facts
            .subjects
            .iter()
            .filter_map(|subject| ctx.resolve_subject(subject))
            .any(|subject| subject == person || ctx.manages(&person, &subject)),
        Action::Update => ctx.can_manage_employment(&person),
    }
}

/// Company catalogue entries: assignments, abilities, titles and positions.
pub(crate) fn company<ID>(
    ctx: &PolicyContext<ID>,
    viewer: &Viewer<ID>,
    _facts: &RecordFacts<ID>,
    action: Action,
) -> bool
where
    ID: IdentityHandle,
{
    let Some(person) = viewer.person else {
        return false;
    };

    match action {
        Action::View => ctx.is_employed(&person),
        Action::Update => ctx.can_manage_maap(&person),
    }
}
