// SPDX-License-Identifier: MIT OR Apache-2.0

mod identity;
mod store;

pub use identity::IdentityHandle;
pub use store::{EmploymentStore, GoalLinkStore, OrganizationStore};
