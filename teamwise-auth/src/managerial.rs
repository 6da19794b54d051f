// SPDX-License-Identifier: MIT OR Apache-2.0

//! Managerial hierarchy derived from active employment tenures.
//!
//! The "manages" relation is a free-form directed graph which is independent of the shape of the
//! organization tree. It is expected to be a forest but stored data can contain cycles (X manages
//! Y, Y manages X). Every traversal therefore walks an explicit worklist with a visited set and
//! can never visit more persons than the population in scope, cycles are detected and reported as
//! [`HierarchyAnomaly`] instead of failing.
use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::prelude::DiGraphMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::employment::EmploymentEdge;
use crate::org::OrgTree;
use crate::traits::{EmploymentStore, IdentityHandle};

/// Bounds on traversal cost for unexpectedly large hierarchies.
///
/// Unbounded by default. Traversals are always bounded by the population in scope regardless of
/// these settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct TraversalLimits {
    /// Deepest level to expand, direct reports (or managers) are level 1.
    pub max_depth: Option<usize>,

    /// Maximum number of persons returned by one traversal.
    pub max_nodes: Option<usize>,
}

impl TraversalLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = Some(nodes);
        self
    }
}

/// A person reached by a hierarchy traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct HierarchyEntry<ID> {
    pub person: ID,

    /// Distance from the traversal start, direct reports or managers are level 1.
    pub level: usize,

    pub position: Option<ID>,
    pub organization: ID,
}

/// Data integrity problems found in employment data.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HierarchyAnomaly<ID> {
    /// Persons managing each other in a loop, sorted by id.
    ManagerCycle(Vec<ID>),

    /// A tenure listing the person as their own manager. The manager reference is ignored.
    SelfManaged { person: ID, organization: ID },
}

/// Result of a single traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traversal<ID> {
    /// Reached persons sorted by level, ties broken by id.
    pub entries: Vec<HierarchyEntry<ID>>,

    /// `true` if configured [`TraversalLimits`] cut the walk short.
    pub truncated: bool,
}

#[derive(Clone, Copy, Debug)]
struct Tenure<ID> {
    organization: ID,
    position: Option<ID>,
}

impl<ID: Copy + Ord> Tenure<ID> {
    /// Keep one tenure per key, the one with the lowest organization id wins so that results do
    /// not depend on storage order.
    fn keep_lowest<K: std::hash::Hash + Eq>(map: &mut HashMap<K, Self>, key: K, tenure: Self) {
        map.entry(key)
            .and_modify(|current| {
                if tenure.organization < current.organization {
                    *current = tenure;
                }
            })
            .or_insert(tenure);
    }
}

/// "Manager → report" graph over the active tenures of one organization scope.
#[derive(Clone, Debug)]
pub struct ManagerialGraph<ID>
where
    ID: IdentityHandle,
{
    graph: DiGraphMap<ID, ()>,

    /// Report's tenure under a manager, keyed by (manager, report).
    links: HashMap<(ID, ID), Tenure<ID>>,

    /// Own tenure of every person in scope.
    tenures: HashMap<ID, Tenure<ID>>,

    anomalies: Vec<HierarchyAnomaly<ID>>,
    limits: TraversalLimits,
}

impl<ID> ManagerialGraph<ID>
where
    ID: IdentityHandle,
{
    /// Build the graph from employment edges, keeping only active edges whose organization is in
    /// `scope`.
    ///
    /// The population of the graph are all persons holding such a tenure plus the managers those
    /// tenures reference.
    pub fn build<'a>(
        edges: impl IntoIterator<Item = &'a EmploymentEdge<ID>>,
        scope: &HashSet<ID>,
    ) -> Self
    where
        ID: 'a,
    {
        let mut graph = DiGraphMap::new();
        let mut links = HashMap::new();
        let mut tenures = HashMap::new();
        let mut anomalies = Vec::new();

        for edge in edges {
            if !edge.is_active() || !scope.contains(&edge.organization) {
                continue;
            }

            let tenure = Tenure {
                organization: edge.organization,
                position: edge.position,
            };
            graph.add_node(edge.person);
            Tenure::keep_lowest(&mut tenures, edge.person, tenure);

            let Some(manager) = edge.manager else {
                continue;
            };

            if manager == edge.person {
                warn!(
                    person = %edge.person,
                    organization = %edge.organization,
                    "ignoring tenure which lists the person as their own manager"
                );
                anomalies.push(HierarchyAnomaly::SelfManaged {
                    person: edge.person,
                    organization: edge.organization,
                });
                continue;
            }

            graph.add_edge(manager, edge.person, ());
            Tenure::keep_lowest(&mut links, (manager, edge.person), tenure);
        }

        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                let mut members = component;
                members.sort();
                warn!(?members, "manager cycle detected in employment data");
                anomalies.push(HierarchyAnomaly::ManagerCycle(members));
            }
        }
        anomalies.sort();

        debug!(
            persons = graph.node_count(),
            edges = graph.edge_count(),
            anomalies = anomalies.len(),
            "built managerial graph"
        );

        Self {
            graph,
            links,
            tenures,
            anomalies,
            limits: TraversalLimits::default(),
        }
    }

    /// Fetch all active tenures below (and including) `organization` with one store query and
    /// build the graph from them.
    pub fn load<S>(store: &S, tree: &OrgTree<ID>, organization: &ID) -> Result<Self, S::Error>
    where
        S: EmploymentStore<ID>,
    {
        let scope = tree.self_and_descendants(organization);
        let edges = store.active_employment(&scope)?;
        Ok(Self::build(&edges, &scope))
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> TraversalLimits {
        self.limits
    }

    /// Number of persons in scope.
    pub fn population(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, person: &ID) -> bool {
        self.graph.contains_node(*person)
    }

    pub fn anomalies(&self) -> &[HierarchyAnomaly<ID>] {
        &self.anomalies
    }

    pub fn direct_reports(&self, manager: &ID) -> Vec<ID> {
        self.neighbors(manager, Direction::Outgoing)
    }

    pub fn direct_managers(&self, person: &ID) -> Vec<ID> {
        self.neighbors(person, Direction::Incoming)
    }

    /// All direct and transitive reports of a person.
    pub fn reports_of(&self, manager: &ID) -> Vec<HierarchyEntry<ID>> {
        self.traverse(manager, Direction::Outgoing).entries
    }

    /// All direct and transitive managers of a person.
    pub fn managers_of(&self, person: &ID) -> Vec<HierarchyEntry<ID>> {
        self.traverse(person, Direction::Incoming).entries
    }

    /// Return `true` if `report` appears anywhere below `manager`.
    pub fn is_in_hierarchy_of(&self, manager: &ID, report: &ID) -> bool {
        self.reports_of(manager)
            .iter()
            .any(|entry| entry.person == *report)
    }

    fn neighbors(&self, person: &ID, direction: Direction) -> Vec<ID> {
        if !self.contains(person) {
            return Vec::new();
        }
        let mut neighbors: Vec<ID> = self.graph.neighbors_directed(*person, direction).collect();
        neighbors.sort();
        neighbors
    }

    /// Breadth-first walk from `start` along manager edges in the given direction.
    ///
    /// `Outgoing` walks from managers to reports, `Incoming` from reports to managers.
    pub fn traverse(&self, start: &ID, direction: Direction) -> Traversal<ID> {
        let mut entries = Vec::new();
        let mut truncated = false;

        if !self.contains(start) {
            return Traversal { entries, truncated };
        }

        // Nobody but the start can be visited more than once, the population minus the start
        // person is a hard upper bound on the result size.
        let population = self.population();
        let budget = self
            .limits
            .max_nodes
            .unwrap_or(usize::MAX)
            .min(population.saturating_sub(1));

        let mut visited = HashSet::from([*start]);
        let mut queue = VecDeque::from([(*start, 0)]);

        'walk: while let Some((current, level)) = queue.pop_front() {
            let neighbors = self.neighbors(&current, direction);

            if self.limits.max_depth.is_some_and(|max| level >= max) {
                if neighbors.iter().any(|next| !visited.contains(next)) {
                    truncated = true;
                }
                continue;
            }

            for next in neighbors {
                if visited.contains(&next) {
                    continue;
                }

                if entries.len() >= budget {
                    truncated = true;
                    break 'walk;
                }

                visited.insert(next);
                queue.push_back((next, level + 1));
                if let Some(entry) = self.entry(current, next, level + 1, direction) {
                    entries.push(entry);
                }
            }
        }

        entries.sort_by(|a, b| a.level.cmp(&b.level).then(a.person.cmp(&b.person)));

        if truncated {
            warn!(
                start = %start,
                reached = entries.len(),
                population,
                "managerial traversal truncated by traversal limits"
            );
        }

        Traversal { entries, truncated }
    }

    fn entry(
        &self,
        current: ID,
        next: ID,
        level: usize,
        direction: Direction,
    ) -> Option<HierarchyEntry<ID>> {
        let tenure = match direction {
            // Report reached through their tenure under the current manager.
            Direction::Outgoing => self.links.get(&(current, next)).copied(),
            // Managers are described by their own tenure, if they hold one in scope.
            Direction::Incoming => self.tenures.get(&next).copied().or_else(|| {
                self.links.get(&(next, current)).map(|link| Tenure {
                    organization: link.organization,
                    position: None,
                })
            }),
        }?;

        Some(HierarchyEntry {
            person: next,
            level,
            position: tenure.position,
            organization: tenure.organization,
        })
    }
}

/// Hierarchy queries scoped by organization over a snapshot of employment edges.
#[derive(Clone, Debug)]
pub struct ManagerialHierarchy<'a, ID>
where
    ID: IdentityHandle,
{
    tree: &'a OrgTree<ID>,
    edges: &'a [EmploymentEdge<ID>],
    limits: TraversalLimits,
}

impl<'a, ID> ManagerialHierarchy<'a, ID>
where
    ID: IdentityHandle,
{
    pub fn new(tree: &'a OrgTree<ID>, edges: &'a [EmploymentEdge<ID>]) -> Self {
        Self {
            tree,
            edges,
            limits: TraversalLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Managerial graph restricted to the organization and all its descendants.
    pub fn graph(&self, organization: &ID) -> ManagerialGraph<ID> {
        let scope = self.tree.self_and_descendants(organization);
        ManagerialGraph::build(self.edges, &scope).with_limits(self.limits)
    }

    pub fn reports_of(&self, person: &ID, organization: &ID) -> Vec<HierarchyEntry<ID>> {
        self.graph(organization).reports_of(person)
    }

    pub fn managers_of(&self, person: &ID, organization: &ID) -> Vec<HierarchyEntry<ID>> {
        self.graph(organization).managers_of(person)
    }

    pub fn is_in_hierarchy_of(&self, manager: &ID, report: &ID, organization: &ID) -> bool {
        self.graph(organization).is_in_hierarchy_of(manager, report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use petgraph::prelude::DiGraphMap;
    use petgraph::visit::Bfs;
    use rand::Rng;

    use crate::employment::EmploymentEdge;
    use crate::test_utils::{
        ACME, ENG, PLATFORM, SALES, acme_tree, managed, seeded_rng, setup_logging, tenure,
    };

    use super::{HierarchyAnomaly, HierarchyEntry, ManagerialGraph, ManagerialHierarchy};
    use super::{Direction, TraversalLimits};

    const MAYA: char = 'M';
    const ROB: char = 'R';
    const MIA: char = 'N';
    const MAX: char = 'O';
    const SAM: char = 'S';
    const TOM: char = 'T';
    const XAVI: char = 'X';
    const YARA: char = 'Y';

    #[test]
    fn manager_and_report_in_department() {
        let tree = acme_tree();
        let edges = vec![tenure(MAYA, ENG), managed(ROB, ENG, MAYA)];
        let hierarchy = ManagerialHierarchy::new(&tree, &edges);

        assert!(hierarchy.is_in_hierarchy_of(&MAYA, &ROB, &ACME));
        assert!(!hierarchy.is_in_hierarchy_of(&ROB, &MAYA, &ACME));

        assert_eq!(
            hierarchy.reports_of(&MAYA, &ACME),
            vec![HierarchyEntry {
                person: ROB,
                level: 1,
                position: None,
                organization: ENG,
            }]
        );

        // Nothing is employed below the team.
        assert!(hierarchy.reports_of(&MAYA, &PLATFORM).is_empty());
    }

    #[test]
    fn levels_along_a_chain() {
        let tree = acme_tree();
        let edges = vec![
            tenure(MAX, ACME),
            managed(MIA, ENG, MAX),
            managed(ROB, PLATFORM, MIA).with_position('9'),
        ];
        let graph = ManagerialHierarchy::new(&tree, &edges).graph(&ACME);

        let reports: Vec<_> = graph
            .reports_of(&MAX)
            .into_iter()
            .map(|entry| (entry.person, entry.level))
            .collect();
        assert_eq!(reports, vec![(MIA, 1), (ROB, 2)]);

        let managers = graph.managers_of(&ROB);
        assert_eq!(
            managers,
            vec![
                HierarchyEntry {
                    person: MIA,
                    level: 1,
                    position: None,
                    organization: ENG,
                },
                HierarchyEntry {
                    person: MAX,
                    level: 2,
                    position: None,
                    organization: ACME,
                },
            ]
        );

        assert_eq!(graph.reports_of(&MIA)[0].position, Some('9'));
        assert_eq!(graph.direct_reports(&MAX), vec![MIA]);
        assert_eq!(graph.direct_managers(&ROB), vec![MIA]);
    }

    #[test]
    fn ties_are_broken_by_id() {
        let tree = acme_tree();
        let edges = vec![
            tenure(MAYA, ACME),
            managed(TOM, SALES, MAYA),
            managed(SAM, ENG, MAYA),
            managed(ROB, ENG, MAYA),
            managed(XAVI, ENG, ROB),
        ];
        let hierarchy = ManagerialHierarchy::new(&tree, &edges);

        let reports: Vec<_> = hierarchy
            .reports_of(&MAYA, &ACME)
            .into_iter()
            .map(|entry| entry.person)
            .collect();
        assert_eq!(reports, vec![ROB, SAM, TOM, XAVI]);
    }

    #[test]
    fn scope_and_inactive_tenures() {
        let tree = acme_tree();
        let edges = vec![
            tenure(MAYA, ACME),
            managed(ROB, ENG, MAYA),
            managed(SAM, SALES, MAYA),
            managed(TOM, ENG, MAYA).ended(100),
        ];
        let hierarchy = ManagerialHierarchy::new(&tree, &edges);

        let reports: Vec<_> = hierarchy
            .reports_of(&MAYA, &ENG)
            .into_iter()
            .map(|entry| entry.person)
            .collect();
        assert_eq!(reports, vec![ROB]);

        let reports: Vec<_> = hierarchy
            .reports_of(&MAYA, &ACME)
            .into_iter()
            .map(|entry| entry.person)
            .collect();
        assert_eq!(reports, vec![ROB, SAM]);

        // Without any tenure in scope the hierarchy is empty, not an error.
        assert!(hierarchy.reports_of(&TOM, &ACME).is_empty());
        assert!(hierarchy.managers_of(&TOM, &ACME).is_empty());
        assert!(hierarchy.reports_of(&MAYA, &PLATFORM).is_empty());

        // Managers referenced by tenures in scope are part of the hierarchy.
        let managers: Vec<_> = hierarchy
            .managers_of(&SAM, &SALES)
            .into_iter()
            .map(|entry| (entry.person, entry.organization))
            .collect();
        assert_eq!(managers, vec![(MAYA, SALES)]);
    }

    #[test]
    fn lowest_organization_wins() {
        let tree = acme_tree();

        // Storage order must not decide which tenure describes a person.
        for edges in [
            vec![managed(ROB, SALES, MAYA), managed(ROB, ENG, MAYA)],
            vec![managed(ROB, ENG, MAYA), managed(ROB, SALES, MAYA)],
        ] {
            let graph = ManagerialHierarchy::new(&tree, &edges).graph(&ACME);
            let reports = graph.reports_of(&MAYA);
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].person, ROB);
            assert_eq!(reports[0].organization, ENG);

            let managers = graph.managers_of(&ROB);
            assert_eq!(managers.len(), 1);
            assert_eq!(managers[0].organization, ENG);
        }
    }

    #[test]
    fn manager_cycle_terminates() {
        setup_logging();

        let tree = acme_tree();
        let edges = vec![managed(XAVI, ENG, YARA), managed(YARA, ENG, XAVI)];
        let graph = ManagerialHierarchy::new(&tree, &edges).graph(&ACME);

        let reports = graph.reports_of(&XAVI);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].person, YARA);

        let managers = graph.managers_of(&XAVI);
        assert_eq!(managers.len(), 1);
        assert_eq!(managers[0].person, YARA);

        assert_eq!(
            graph.anomalies(),
            &[HierarchyAnomaly::ManagerCycle(vec![XAVI, YARA])]
        );
    }

    #[test]
    fn self_managed_tenure_is_ignored() {
        let tree = acme_tree();
        let edges = vec![managed(ROB, ENG, ROB)];
        let graph = ManagerialHierarchy::new(&tree, &edges).graph(&ACME);

        assert!(graph.contains(&ROB));
        assert!(graph.reports_of(&ROB).is_empty());
        assert_eq!(
            graph.anomalies(),
            &[HierarchyAnomaly::SelfManaged {
                person: ROB,
                organization: ENG,
            }]
        );
    }

    #[test]
    fn traversal_limits() {
        let tree = acme_tree();
        let edges = vec![
            tenure(MAX, ACME),
            managed(MIA, ENG, MAX),
            managed(SAM, ENG, MAX),
            managed(ROB, PLATFORM, MIA),
        ];

        let graph = ManagerialHierarchy::new(&tree, &edges)
            .with_limits(TraversalLimits::unbounded().max_depth(1))
            .graph(&ACME);
        let traversal = graph.traverse(&MAX, Direction::Outgoing);
        assert!(traversal.truncated);
        assert_eq!(traversal.entries.len(), 2);
        assert!(!graph.is_in_hierarchy_of(&MAX, &ROB));

        let graph = graph.with_limits(TraversalLimits::unbounded().max_nodes(1));
        let traversal = graph.traverse(&MAX, Direction::Outgoing);
        assert!(traversal.truncated);
        assert_eq!(traversal.entries.len(), 1);

        let graph = graph.with_limits(TraversalLimits::unbounded());
        let traversal = graph.traverse(&MAX, Direction::Outgoing);
        assert!(!traversal.truncated);
        assert_eq!(traversal.entries.len(), 3);
    }

    /// Random manager assignments between a handful of persons, cycles included.
    fn random_edges(seed: u64, persons: &[char], count: usize) -> Vec<EmploymentEdge<char>> {
        let mut rng = seeded_rng(seed);
        let mut edges: Vec<_> = persons.iter().map(|person| tenure(*person, ACME)).collect();
        for _ in 0..count {
            let person = persons[rng.random_range(0..persons.len())];
            let manager = persons[rng.random_range(0..persons.len())];
            let org = [ENG, PLATFORM, SALES][rng.random_range(0..3)];
            edges.push(managed(person, org, manager));
        }
        edges
    }

    #[test]
    fn random_graphs_match_reachability() {
        let persons: Vec<char> = ('A'..='L').collect();
        let scope: HashSet<char> = acme_tree().self_and_descendants(&ACME);

        for seed in 0..32 {
            let edges = random_edges(seed, &persons, 20);
            let graph = ManagerialGraph::build(&edges, &scope);

            let mut expected_graph = DiGraphMap::<char, ()>::new();
            for edge in &edges {
                if let Some(manager) = edge.manager {
                    if manager != edge.person {
                        expected_graph.add_edge(manager, edge.person, ());
                    }
                }
            }

            for person in &persons {
                let reports = graph.reports_of(person);

                // Deduplicated and bounded by the population.
                let unique: HashSet<char> = reports.iter().map(|entry| entry.person).collect();
                assert_eq!(unique.len(), reports.len());
                assert!(reports.len() < graph.population());

                let mut expected = HashSet::new();
                if expected_graph.contains_node(*person) {
                    let mut bfs = Bfs::new(&expected_graph, *person);
                    while let Some(node) = bfs.next(&expected_graph) {
                        if node != *person {
                            expected.insert(node);
                        }
                    }
                }
                assert_eq!(unique, expected, "seed {seed}, person {person}");

                // Closest managers have their reports as direct reports.
                if let Some(first) = graph.managers_of(person).first() {
                    assert_eq!(first.level, 1);
                    assert!(graph.is_in_hierarchy_of(&first.person, person));
                }
            }
        }
    }
}
