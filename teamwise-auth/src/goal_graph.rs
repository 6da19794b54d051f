// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directed graph of goal links which must stay acyclic.
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::error::Error;
use std::fmt::Display;

use petgraph::Direction;
use petgraph::prelude::DiGraphMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::traits::{GoalLinkStore, IdentityHandle};

/// Validation failures when linking goals. These are user-facing and meant to be rendered as
/// form errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalLinkError<ID>
where
    ID: IdentityHandle,
{
    #[error("goal {0} can not be linked to itself")]
    SelfLink(ID),

    #[error("linking goal {parent} to {child} would create a circular dependency")]
    CircularDependency { parent: ID, child: ID },

    #[error("goal {parent} is already linked to {child} as {link_type}")]
    DuplicateLink {
        parent: ID,
        child: ID,
        link_type: LinkType,
    },
}

/// Error when linking goals through a store.
#[derive(Debug, Error)]
pub enum LinkGoalsError<ID, E>
where
    ID: IdentityHandle,
    E: Error,
{
    #[error(transparent)]
    Rejected(#[from] GoalLinkError<ID>),

    #[error("goal link store error: {0}")]
    Store(E),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LinkType {
    /// Child goal contributes to the parent.
    Supports,

    /// Parent can only be reached once the child is done.
    DependsOn,

    /// Child is a measurable key result of the parent.
    KeyResult,
}

impl Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkType::Supports => "supports",
            LinkType::DependsOn => "depends_on",
            LinkType::KeyResult => "key_result",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct GoalLink<ID> {
    pub parent: ID,
    pub child: ID,
    pub link_type: LinkType,
}

impl<ID> GoalLink<ID> {
    pub fn new(parent: ID, child: ID, link_type: LinkType) -> Self {
        Self {
            parent,
            child,
            link_type,
        }
    }
}

/// Goal link graph with cycle detection ahead of insertion.
///
/// Links of different types between the same pair of goals share one graph edge, the edge weight
/// counts them. Cycle detection ignores link types: no path may lead from a goal back to itself,
/// whatever kind of links it follows.
#[derive(Clone, Debug)]
pub struct GoalGraph<ID>
where
    ID: IdentityHandle,
{
    graph: DiGraphMap<ID, usize>,
    links: BTreeSet<GoalLink<ID>>,
}

impl<ID> Default for GoalGraph<ID>
where
    ID: IdentityHandle,
{
    fn default() -> Self {
        Self {
            graph: Default::default(),
            links: Default::default(),
        }
    }
}

impl<ID> GoalGraph<ID>
where
    ID: IdentityHandle,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from stored links as they are, without validating them.
    pub fn from_links(links: impl IntoIterator<Item = GoalLink<ID>>) -> Self {
        let mut graph = Self::new();
        for link in links {
            graph.insert_unchecked(link);
        }
        graph
    }

    /// Load all links with one store query.
    pub fn load<S>(store: &S) -> Result<Self, S::Error>
    where
        S: GoalLinkStore<ID>,
    {
        Ok(Self::from_links(store.goal_links()?))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, link: &GoalLink<ID>) -> bool {
        self.links.contains(link)
    }

    /// All links, ordered by (parent, child, link type).
    pub fn links(&self) -> impl Iterator<Item = &GoalLink<ID>> {
        self.links.iter()
    }

    pub fn children(&self, goal: &ID) -> Vec<ID> {
        self.neighbors(goal, Direction::Outgoing)
    }

    pub fn parents(&self, goal: &ID) -> Vec<ID> {
        self.neighbors(goal, Direction::Incoming)
    }

    fn neighbors(&self, goal: &ID, direction: Direction) -> Vec<ID> {
        if !self.graph.contains_node(*goal) {
            return Vec::new();
        }
        let mut neighbors: Vec<ID> = self.graph.neighbors_directed(*goal, direction).collect();
        neighbors.sort();
        neighbors
    }

    /// Every goal reachable from `goal` by following links downwards.
    pub fn descendants(&self, goal: &ID) -> HashSet<ID> {
        let mut descendants = HashSet::new();
        if !self.graph.contains_node(*goal) {
            return descendants;
        }

        let mut visited = HashSet::from([*goal]);
        let mut queue = VecDeque::from([*goal]);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if visited.insert(next) {
                    descendants.insert(next);
                    queue.push_back(next);
                }
            }
        }
        descendants
    }

    /// Return `true` if adding a `parent → child` link would close a cycle, that is if `child`
    /// already reaches `parent`.
    ///
    /// Linking a goal to itself is always a cycle.
    pub fn would_create_cycle(&self, parent: &ID, child: &ID) -> bool {
        if parent == child {
            return true;
        }
        if !self.graph.contains_node(*parent) || !self.graph.contains_node(*child) {
            return false;
        }

        let mut visited = HashSet::from([*child]);
        let mut queue = VecDeque::from([*child]);
        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if next == *parent {
                    trace!(%parent, %child, visited = visited.len(), "found path back to parent");
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Run all checks a new link needs to pass before it can be persisted.
    pub fn check_link(&self, link: &GoalLink<ID>) -> Result<(), GoalLinkError<ID>> {
        if link.parent == link.child {
            return Err(GoalLinkError::SelfLink(link.parent));
        }

        if self.links.contains(link) {
            return Err(GoalLinkError::DuplicateLink {
                parent: link.parent,
                child: link.child,
                link_type: link.link_type,
            });
        }

        if self.would_create_cycle(&link.parent, &link.child) {
            return Err(GoalLinkError::CircularDependency {
                parent: link.parent,
                child: link.child,
            });
        }

        Ok(())
    }

    /// Add a link after it passed [`GoalGraph::check_link`]. The graph stays unchanged otherwise.
    pub fn add_link(&mut self, link: GoalLink<ID>) -> Result<(), GoalLinkError<ID>> {
        if let Err(err) = self.check_link(&link) {
            debug!(parent = %link.parent, child = %link.child, %err, "rejected goal link");
            return Err(err);
        }
        self.insert_unchecked(link);
        Ok(())
    }

    /// Remove a link, returns `false` if it was not part of the graph.
    pub fn remove_link(&mut self, link: &GoalLink<ID>) -> bool {
        if !self.links.remove(link) {
            return false;
        }

        let remaining = match self.graph.edge_weight_mut(link.parent, link.child) {
            Some(count) => {
                *count = count.saturating_sub(1);
                *count
            }
            None => 0,
        };
        if remaining == 0 {
            self.graph.remove_edge(link.parent, link.child);
        }

        true
    }

    fn insert_unchecked(&mut self, link: GoalLink<ID>) {
        if !self.links.insert(link) {
            return;
        }

        match self.graph.edge_weight_mut(link.parent, link.child) {
            Some(count) => *count += 1,
            None => {
                self.graph.add_edge(link.parent, link.child, 1);
            }
        }
    }
}

/// Validate and persist a new goal link.
///
/// The current links are fetched with one query. The store is only written to when the link
/// passed both the uniqueness and the cycle check.
pub fn link_goals<ID, S>(
    store: &mut S,
    link: GoalLink<ID>,
) -> Result<(), LinkGoalsError<ID, S::Error>>
where
    ID: IdentityHandle,
    S: GoalLinkStore<ID>,
{
    let graph = GoalGraph::load(store).map_err(LinkGoalsError::Store)?;
    graph.check_link(&link)?;
    store.insert_goal_link(link).map_err(LinkGoalsError::Store)?;
    Ok(())
}
