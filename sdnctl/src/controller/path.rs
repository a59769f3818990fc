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

//! # Path Resolver
//!
//! Resolves the path between two switches (or two hosts) along the links of the spanning tree. In
//! a tree, exactly one simple path exists between any two connected switches, so the depth-first
//! search always finds the same path regardless of the order in which neighbors are explored.

use crate::controller::{ControllerError, MacAddr, SpanningTree, SwitchId, Topology};
use log::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Black,
}

/// Find the path from `src` to `dst` along tree links. The result starts with `src` and ends with
/// `dst`. If both are the same switch, the path contains only this switch.
///
/// Returns `ControllerError::UnknownSwitch` if one of the switches is not part of the tree, and
/// `ControllerError::NoPath` if they are in different partitions.
pub fn resolve_path(
    tree: &SpanningTree,
    src: SwitchId,
    dst: SwitchId,
) -> Result<Vec<SwitchId>, ControllerError> {
    for s in [src, dst].iter() {
        if !tree.contains_switch(*s) {
            return Err(ControllerError::UnknownSwitch(*s));
        }
    }

    let mut color: HashMap<SwitchId, Color> = HashMap::new();
    let mut path: Vec<SwitchId> = Vec::new();
    if dfs(tree, src, dst, &mut color, &mut path) {
        trace!("path {} -> {}: {:?}", src, dst, path);
        Ok(path)
    } else {
        Err(ControllerError::NoPath(src, dst))
    }
}

/// Resolve both hosts to their switches, and find the path from the switch of `src` to the switch
/// of `dst`.
pub fn resolve_host_path(
    topo: &Topology,
    tree: &SpanningTree,
    src: MacAddr,
    dst: MacAddr,
) -> Result<Vec<SwitchId>, ControllerError> {
    let src_switch = topo.host_switch(src).ok_or(ControllerError::UnknownHost(src))?;
    let dst_switch = topo.host_switch(dst).ok_or(ControllerError::UnknownHost(dst))?;
    resolve_path(tree, src_switch, dst_switch)
}

fn dfs(
    tree: &SpanningTree,
    u: SwitchId,
    dst: SwitchId,
    color: &mut HashMap<SwitchId, Color>,
    path: &mut Vec<SwitchId>,
) -> bool {
    color.insert(u, Color::Black);
    path.push(u);
    if u == dst {
        return true;
    }
    for v in tree.neighbors(u) {
        if color.get(&v).copied().unwrap_or(Color::White) == Color::White
            && dfs(tree, v, dst, color, path)
        {
            return true;
        }
    }
    path.pop();
    false
}
