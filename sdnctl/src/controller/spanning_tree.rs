// sdnctl: Spanning-Tree Forwarding and Service Chaining for SDN Controllers
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Spanning Tree
//!
//! The spanning tree bounds flooding to a loop-free subset of the links, which prevents broadcast
//! storms in topologies containing cycles. It is computed by a breadth-first search over the
//! [`Topology`], and it is always rebuilt from scratch after the topology changes.

use crate::controller::{SwitchId, Topology};
use log::*;
use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Undirected graph containing only the tree links.
pub type TreeGraph = UnGraphMap<SwitchId, ()>;

/// Policy for choosing the root of the spanning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootPolicy {
    /// Use the switch with the lowest id.
    LowestId,
    /// Use the given switch. If it is not part of the topology, the lowest id is used instead.
    Fixed(SwitchId),
}

impl Default for RootPolicy {
    fn default() -> Self {
        Self::LowestId
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Black,
}

/// # Spanning Tree
///
/// Every switch of the topology is a node of the tree. The tree of the root switch spans all
/// switches reachable from it. If the topology is partitioned, every other partition gets its own
/// tree, rooted at its lowest switch id. Thus, the structure is a forest with exactly one tree per
/// connected component, and each tree has one link less than the component has switches.
#[derive(Debug, Clone)]
pub struct SpanningTree {
    tree: TreeGraph,
    roots: Vec<SwitchId>,
}

impl Default for SpanningTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl SpanningTree {
    /// Spanning tree without any switch.
    pub fn empty() -> Self {
        Self { tree: TreeGraph::new(), roots: Vec::new() }
    }

    /// Compute the spanning tree of the topology.
    pub fn build(topo: &Topology, policy: RootPolicy) -> Self {
        let mut tree = TreeGraph::with_capacity(topo.num_switches(), topo.num_switches());
        let mut color: HashMap<SwitchId, Color> = HashMap::new();
        for switch in topo.switches() {
            tree.add_node(*switch);
            color.insert(*switch, Color::White);
        }

        let root = match policy {
            RootPolicy::Fixed(r) if topo.contains_switch(r) => Some(r),
            RootPolicy::Fixed(r) => {
                let fallback = topo.switches().iter().next().copied();
                if let Some(f) = fallback {
                    warn!("Configured root {} is not part of the topology! Using {} instead", r, f);
                }
                fallback
            }
            RootPolicy::LowestId => topo.switches().iter().next().copied(),
        };

        let mut roots: Vec<SwitchId> = Vec::new();
        let mut queue: VecDeque<SwitchId> = VecDeque::new();
        for start in root.into_iter().chain(topo.switches().iter().copied()) {
            if color.get(&start) != Some(&Color::White) {
                continue;
            }
            roots.push(start);
            color.insert(start, Color::Black);
            queue.push_back(start);

            while let Some(u) = queue.pop_front() {
                let neighbors = match topo.neighbors(u) {
                    Some(n) => n,
                    None => continue,
                };
                for v in neighbors.keys() {
                    if color.get(v) == Some(&Color::White) {
                        tree.add_edge(u, *v, ());
                        color.insert(*v, Color::Black);
                        queue.push_back(*v);
                    }
                }
            }
        }

        debug!(
            "Spanning tree rebuilt: {} switches, {} tree links, roots: {:?}",
            tree.node_count(),
            tree.edge_count(),
            roots
        );

        Self { tree, roots }
    }

    /// Returns the root of the tree of the first partition (the one chosen by the root policy).
    pub fn root(&self) -> Option<SwitchId> {
        self.roots.first().copied()
    }

    /// Returns the root of every tree in the forest. The first one is chosen by the root policy.
    pub fn roots(&self) -> &[SwitchId] {
        &self.roots
    }

    /// Returns true if the switch is part of the spanning tree
    pub fn contains_switch(&self, switch: SwitchId) -> bool {
        self.tree.contains_node(switch)
    }

    /// Returns true if the link `a -- b` is a tree link.
    pub fn contains_link(&self, a: SwitchId, b: SwitchId) -> bool {
        self.tree.contains_edge(a, b)
    }

    /// Returns the tree neighbors of the switch in ascending order.
    pub fn neighbors(&self, switch: SwitchId) -> Vec<SwitchId> {
        let mut result: Vec<SwitchId> = self.tree.neighbors(switch).collect();
        result.sort();
        result
    }

    /// Returns the number of switches
    pub fn num_switches(&self) -> usize {
        self.tree.node_count()
    }

    /// Returns the number of tree links
    pub fn num_links(&self) -> usize {
        self.tree.edge_count()
    }

    /// Returns all tree links as `(a, b)` with `a < b`, in ascending order.
    pub fn links(&self) -> Vec<(SwitchId, SwitchId)> {
        let mut links: Vec<(SwitchId, SwitchId)> =
            self.tree.all_edges().map(|(a, b, _)| if a < b { (a, b) } else { (b, a) }).collect();
        links.sort();
        links
    }

    /// Returns all switches which can be reached from `start` by following tree links (including
    /// `start` itself).
    pub fn component(&self, start: SwitchId) -> BTreeSet<SwitchId> {
        let mut visited: BTreeSet<SwitchId> = BTreeSet::new();
        if !self.contains_switch(start) {
            return visited;
        }
        let mut stack = vec![start];
        while let Some(u) = stack.pop() {
            if visited.insert(u) {
                stack.extend(self.tree.neighbors(u).filter(|v| !visited.contains(v)));
            }
        }
        visited
    }

    /// Access the underlying graph
    pub fn graph(&self) -> &TreeGraph {
        &self.tree
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn s(id: u64) -> SwitchId {
        SwitchId(id)
    }

    fn topo(switches: &[u64], links: &[(u64, u64)]) -> Topology {
        let mut t = Topology::new(1);
        for sw in switches {
            t.add_switch(s(*sw));
        }
        for (i, (a, b)) in links.iter().enumerate() {
            t.add_link(s(*a), 10 + i as u32, s(*b), 20 + i as u32).unwrap();
        }
        t
    }

    #[test]
    fn empty_topology() {
        let tree = SpanningTree::build(&Topology::new(1), RootPolicy::LowestId);
        assert_eq!(tree.root(), None);
        assert_eq!(tree.num_switches(), 0);
        assert_eq!(tree.num_links(), 0);
    }

    #[test]
    fn ring() {
        let t = topo(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1)]);
        let tree = SpanningTree::build(&t, RootPolicy::LowestId);
        assert_eq!(tree.root(), Some(s(1)));
        assert_eq!(tree.links(), vec![(s(1), s(2)), (s(1), s(3))]);
        assert!(!tree.contains_link(s(2), s(3)));
        assert!(tree.contains_link(s(2), s(1)));
        assert_eq!(tree.neighbors(s(1)), vec![s(2), s(3)]);
    }

    #[test]
    fn fixed_root() {
        let t = topo(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1)]);
        let tree = SpanningTree::build(&t, RootPolicy::Fixed(s(2)));
        assert_eq!(tree.root(), Some(s(2)));
        assert_eq!(tree.links(), vec![(s(1), s(2)), (s(2), s(3))]);
    }

    #[test]
    fn fixed_root_missing() {
        let t = topo(&[2, 3], &[(2, 3)]);
        let tree = SpanningTree::build(&t, RootPolicy::Fixed(s(7)));
        assert_eq!(tree.root(), Some(s(2)));
        assert_eq!(tree.num_links(), 1);
    }

    #[test]
    fn partitioned() {
        // 1 - 2 - 3 - 1 and 4 - 5, plus the isolated switch 6
        let t = topo(&[1, 2, 3, 4, 5, 6], &[(1, 2), (2, 3), (3, 1), (4, 5)]);
        let tree = SpanningTree::build(&t, RootPolicy::LowestId);
        assert_eq!(tree.roots(), &[s(1), s(4), s(6)]);
        assert_eq!(tree.num_switches(), 6);
        assert_eq!(tree.num_links(), 3);
        assert!(tree.contains_link(s(4), s(5)));
        assert!(tree.neighbors(s(6)).is_empty());
        assert_eq!(tree.component(s(1)).len(), 3);
        assert_eq!(tree.component(s(5)).len(), 2);
        assert_eq!(tree.component(s(6)).len(), 1);
        assert_eq!(tree.component(s(9)).len(), 0);
    }

    #[test]
    fn full_mesh() {
        let t = topo(&[1, 2, 3, 4], &[(1, 2), (1, 3), (1, 4), (2, 3), (2, 4), (3, 4)]);
        let tree = SpanningTree::build(&t, RootPolicy::LowestId);
        assert_eq!(tree.num_links(), 3);
        assert_eq!(tree.links(), vec![(s(1), s(2)), (s(1), s(3)), (s(1), s(4))]);
    }

    #[test]
    fn breadth_first_order() {
        // line 1 - 2 - 3 - 4 with shortcut 1 - 4: BFS from 1 takes the shortcut
        let t = topo(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (1, 4)]);
        let tree = SpanningTree::build(&t, RootPolicy::LowestId);
        assert_eq!(tree.links(), vec![(s(1), s(2)), (s(1), s(4)), (s(2), s(3))]);
    }
}
