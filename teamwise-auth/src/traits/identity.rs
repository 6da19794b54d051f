// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Handle used to identify people, organizations, teammates, goals and records.
///
/// The engine never inspects identifiers beyond comparing and hashing them. `Ord` is required so
/// that traversals can break ties deterministically.
pub trait IdentityHandle: Copy + Debug + Display + Eq + Hash + Ord {}

impl IdentityHandle for u64 {}
