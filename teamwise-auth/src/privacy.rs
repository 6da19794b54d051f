// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown privacy level \"{0}\"")]
pub struct UnknownPrivacyLevel(pub String);

/// Audience of a protected record. Levels are ordered by increasing audience size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PrivacyLevel {
    /// Only the author.
    ObserverOnly,

    /// The author and the persons the record is about.
    ObservedOnly,

    /// The author and everyone managing (directly or transitively) a person the record is about.
    ManagersOnly,

    /// Union of `ObservedOnly` and `ManagersOnly`.
    ObservedAndManagers,

    /// Every employed teammate of the record's company.
    PublicToCompany,

    /// Everybody, unauthenticated visitors included.
    PublicToWorld,
}

impl PrivacyLevel {
    pub const ALL: [PrivacyLevel; 6] = [
        PrivacyLevel::ObserverOnly,
        PrivacyLevel::ObservedOnly,
        PrivacyLevel::ManagersOnly,
        PrivacyLevel::ObservedAndManagers,
        PrivacyLevel::PublicToCompany,
        PrivacyLevel::PublicToWorld,
    ];

    /// Persons the record is about are named in the audience. Public levels do not name anyone.
    pub fn includes_subjects(&self) -> bool {
        matches!(
            self,
            PrivacyLevel::ObservedOnly | PrivacyLevel::ObservedAndManagers
        )
    }

    /// Managers of the persons the record is about are part of the audience.
    pub fn includes_managers(&self) -> bool {
        matches!(
            self,
            PrivacyLevel::ManagersOnly | PrivacyLevel::ObservedAndManagers
        )
    }

    pub fn includes_company(&self) -> bool {
        *self >= PrivacyLevel::PublicToCompany
    }

    pub fn is_public(&self) -> bool {
        matches!(self, PrivacyLevel::PublicToWorld)
    }
}

impl Display for PrivacyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PrivacyLevel::ObserverOnly => "observer_only",
            PrivacyLevel::ObservedOnly => "observed_only",
            PrivacyLevel::ManagersOnly => "managers_only",
            PrivacyLevel::ObservedAndManagers => "observed_and_managers",
            PrivacyLevel::PublicToCompany => "public_to_company",
            PrivacyLevel::PublicToWorld => "public_to_world",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for PrivacyLevel {
    type Err = UnknownPrivacyLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrivacyLevel::ALL
            .into_iter()
            .find(|level| level.to_string() == s)
            .ok_or_else(|| UnknownPrivacyLevel(s.to_string()))
    }
}
