// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
//!
//! The "Acme" fixture:
//!
//! ```text
//! Acme (company)                 CEO, HR (manage employment)
//! ├── Engineering (department)   M2 reports to CEO, M1 reports to M2
//! │   └── Platform (team)        R and PEER report to M1
//! └── Sales (department)         SALLY reports to CEO, EX left
//!
//! Globex (company)               OUTSIDER
//! ```
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::context::PolicyContext;
use crate::employment::{EmploymentEdge, Permissions, Teammate};
use crate::memory_store::MemoryStore;
use crate::org::{OrgTree, Organization};
use crate::traits::IdentityHandle;
use crate::viewer::Viewer;

impl IdentityHandle for char {}

pub const ACME: char = 'a';
pub const ENG: char = 'e';
pub const PLATFORM: char = 'p';
pub const SALES: char = 's';
pub const GLOBEX: char = 'g';

pub const CEO: char = 'C';
pub const M2: char = 'W';
pub const M1: char = 'M';
pub const R: char = 'R';
pub const PEER: char = 'P';
pub const SALLY: char = 'S';
pub const HR: char = 'H';
pub const EX: char = 'E';
pub const OUTSIDER: char = 'Z';

pub const T_CEO: char = '0';
pub const T_VP: char = '1';
pub const T_M1: char = '2';
pub const T_R: char = '3';
pub const T_PEER: char = '4';
pub const T_SALLY: char = '5';
pub const T_HR: char = '6';
pub const T_EX: char = '7';
pub const T_OUTSIDER: char = '8';

/// Organizations of the Acme company.
pub fn acme_orgs() -> Vec<Organization<char>> {
    vec![
        Organization::company(ACME, "Acme"),
        Organization::department(ENG, ACME, "Engineering"),
        Organization::team(PLATFORM, ENG, "Platform"),
        Organization::department(SALES, ACME, "Sales"),
    ]
}

pub fn acme_tree() -> OrgTree<char> {
    OrgTree::validated(acme_orgs()).expect("valid acme tree")
}

/// Active tenure without a manager.
pub fn tenure(person: char, organization: char) -> EmploymentEdge<char> {
    EmploymentEdge::new(person, organization, 0)
}

pub fn managed(person: char, organization: char, manager: char) -> EmploymentEdge<char> {
    tenure(person, organization).with_manager(manager)
}

/// Teammate employed since the beginning of time.
pub fn teammate(id: char, person: char, organization: char) -> Teammate<char> {
    Teammate::new(id, person, organization).employed_since(0)
}

pub fn acme_employment() -> Vec<EmploymentEdge<char>> {
    vec![
        tenure(CEO, ACME),
        managed(HR, ACME, CEO),
        managed(M2, ENG, CEO),
        managed(M1, ENG, M2),
        managed(R, PLATFORM, M1),
        managed(PEER, PLATFORM, M1),
        managed(SALLY, SALES, CEO),
        managed(EX, SALES, SALLY).ended(50),
        tenure(OUTSIDER, GLOBEX),
    ]
}

pub fn acme_teammates() -> Vec<Teammate<char>> {
    vec![
        teammate(T_CEO, CEO, ACME).with_permissions(Permissions::manage_maap()),
        teammate(T_HR, HR, ACME).with_permissions(Permissions::manage_employment()),
        teammate(T_VP, M2, ENG),
        teammate(T_M1, M1, ENG),
        teammate(T_R, R, PLATFORM),
        teammate(T_PEER, PEER, PLATFORM),
        teammate(T_SALLY, SALLY, SALES),
        teammate(T_EX, EX, SALES).terminated_at(50),
        teammate(T_OUTSIDER, OUTSIDER, GLOBEX),
    ]
}

/// Store holding Acme and Globex.
pub fn acme_store() -> MemoryStore<char> {
    let mut store = MemoryStore::new();
    for organization in acme_orgs() {
        store.insert_organization(organization).unwrap();
    }
    store
        .insert_organization(Organization::company(GLOBEX, "Globex"))
        .unwrap();
    for edge in acme_employment() {
        store.insert_employment(edge).unwrap();
    }
    for teammate in acme_teammates() {
        store.insert_teammate(teammate).unwrap();
    }
    store
}

pub fn acme_context() -> PolicyContext<char> {
    PolicyContext::load(&acme_store(), ACME).expect("acme context loads")
}

pub fn viewer(person: char) -> Viewer<char> {
    Viewer::person(person)
}

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}
