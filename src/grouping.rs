/*
 * Flock Grouping Module
 *
 * Partitions the population into flocks: connected components of the
 * "senses" relation recorded by each boid during its last tick. The relation
 * is not symmetric (two boids evaluate their sensing radius at slightly
 * different moments), so grouping works on its symmetric closure: if A lists
 * B, A and B share a flock.
 *
 * Optimized for performance by:
 * - Iterative depth-first traversal with an explicit stack
 * - A visited array indexed by boid instead of list membership scans
 * - Reusing the adjacency and scratch buffers between passes
 */

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{FlockError, FlockResult};

pub type Group = Vec<usize>;

// Anything exposing the indices a boid sensed on its last tick
pub trait NeighborList {
    fn neighbor_indices(&self) -> &[usize];
}

impl NeighborList for Vec<usize> {
    fn neighbor_indices(&self) -> &[usize] {
        self
    }
}

impl NeighborList for &[usize] {
    fn neighbor_indices(&self) -> &[usize] {
        self
    }
}

// Whether a new grouping replaces the old one unconditionally or only on change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangePolicy {
    AlwaysPublish,
    #[default]
    CompareSets,
}

#[derive(Debug, Default)]
pub struct FlockGrouping {
    policy: ChangePolicy,
    groups: Vec<Group>,
    visited: Vec<bool>,
    stack: Vec<usize>,
    offsets: Vec<usize>,
    cursor: Vec<usize>,
    adjacency: Vec<usize>,
}

impl FlockGrouping {
    pub fn new(policy: ChangePolicy) -> Self {
        Self { policy, ..Default::default() }
    }

    pub fn policy(&self) -> ChangePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ChangePolicy) {
        self.policy = policy;
    }

    // Last published grouping
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    // Each group is sorted; groups are ordered by their smallest member
    pub fn compute<L: NeighborList>(&mut self, population: &[L]) -> FlockResult<Vec<Group>> {
        let count = population.len();
        self.build_adjacency(population)?;

        self.visited.clear();
        self.visited.resize(count, false);
        let mut groups = Vec::new();

        for start in 0..count {
            if self.visited[start] {
                continue;
            }

            let mut group = vec![start];
            self.visited[start] = true;
            self.stack.clear();
            self.stack.push(start);

            while let Some(current) = self.stack.pop() {
                for &next in &self.adjacency[self.offsets[current]..self.offsets[current + 1]] {
                    if !self.visited[next] {
                        self.visited[next] = true;
                        group.push(next);
                        self.stack.push(next);
                    }
                }
            }

            group.sort_unstable();
            groups.push(group);
        }

        Ok(groups)
    }

    // Recompute and publish; returns whether the published grouping changed
    pub fn update<L: NeighborList>(&mut self, population: &[L]) -> FlockResult<bool> {
        let groups = self.compute(population)?;
        let changed = match self.policy {
            ChangePolicy::AlwaysPublish => true,
            ChangePolicy::CompareSets => groups != self.groups,
        };

        trace!(groups = groups.len(), changed, "flock grouping pass");

        if changed {
            self.groups = groups;
        }
        Ok(changed)
    }

    // Undirected adjacency in compressed rows: neighbors of i are
    // adjacency[offsets[i]..offsets[i + 1]]
    fn build_adjacency<L: NeighborList>(&mut self, population: &[L]) -> FlockResult<()> {
        let count = population.len();
        self.offsets.clear();
        self.offsets.resize(count + 1, 0);

        for (from, boid) in population.iter().enumerate() {
            for &to in boid.neighbor_indices() {
                if to >= count {
                    return Err(FlockError::UnknownAgent { index: to, population: count });
                }
                if to != from {
                    self.offsets[from + 1] += 1;
                    self.offsets[to + 1] += 1;
                }
            }
        }

        for i in 0..count {
            self.offsets[i + 1] += self.offsets[i];
        }

        self.cursor.clear();
        self.cursor.extend_from_slice(&self.offsets[..count]);
        self.adjacency.clear();
        self.adjacency.resize(self.offsets[count], 0);

        for (from, boid) in population.iter().enumerate() {
            for &to in boid.neighbor_indices() {
                if to != from {
                    self.adjacency[self.cursor[from]] = to;
                    self.cursor[from] += 1;
                    self.adjacency[self.cursor[to]] = from;
                    self.cursor[to] += 1;
                }
            }
        }

        Ok(())
    }
}

// One-off grouping without keeping scratch buffers around
pub fn compute_groups<L: NeighborList>(population: &[L]) -> FlockResult<Vec<Group>> {
    FlockGrouping::default().compute(population)
}
