// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::employment::Teammate;

/// Principal asking for access.
///
/// Constructed per request and passed explicitly into every decision, there is no ambient
/// "current viewer". A viewer without a person is an unauthenticated visitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Viewer<ID> {
    pub person: Option<ID>,

    /// Membership the person is currently acting through.
    pub teammate: Option<Teammate<ID>>,

    /// Organization the person is currently acting in.
    pub organization: Option<ID>,

    pub is_global_admin: bool,
}

impl<ID> Viewer<ID>
where
    ID: Copy,
{
    pub fn anonymous() -> Self {
        Self {
            person: None,
            teammate: None,
            organization: None,
            is_global_admin: false,
        }
    }

    pub fn person(person: ID) -> Self {
        Self {
            person: Some(person),
            ..Self::anonymous()
        }
    }

    /// Viewer acting through the given membership.
    pub fn teammate(teammate: Teammate<ID>) -> Self {
        Self {
            person: Some(teammate.person),
            organization: Some(teammate.organization),
            teammate: Some(teammate),
            is_global_admin: false,
        }
    }

    pub fn global_admin(mut self) -> Self {
        self.is_global_admin = true;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.person.is_some()
    }
}
