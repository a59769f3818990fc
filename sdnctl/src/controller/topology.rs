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

//! # Topology Graph
//!
//! This module keeps the controller's view of the physical network: the set of switches, the links
//! between them (together with the local port of each side), and the host attachment points. The
//! graph is only changed by topology notifications of the protocol stack.

use crate::controller::{ControllerError, MacAddr, PortNo, SwitchId};
use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Outcome of [`Topology::add_host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostUpdate {
    /// The host was attached to the switch
    Attached,
    /// The host was already attached to exactly this switch and port
    AlreadyKnown,
    /// The port is not the host-facing port of the switch. The host is ignored.
    IgnoredPort,
    /// The host is already attached to a different switch or port. The new location is ignored.
    AttachedElsewhere(SwitchId, PortNo),
}

/// # Topology Graph
///
/// All switch-to-switch links are stored symmetrically: if `a` knows `b` as a neighbor, then `b`
/// also knows `a`. Removing a switch removes both directions of all its links, such that no
/// reference to a removed switch remains.
///
/// Ordered maps are used throughout, such that every traversal of the graph is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    /// Port on which hosts are expected to be attached
    host_port: PortNo,
    /// Set of all known switches
    switches: BTreeSet<SwitchId>,
    /// `edges[a][b]` is the port on `a` leading to `b`.
    edges: BTreeMap<SwitchId, BTreeMap<SwitchId, PortNo>>,
    /// `hosts[s][mac]` is the port on `s` to which the host `mac` is attached.
    hosts: BTreeMap<SwitchId, BTreeMap<MacAddr, PortNo>>,
    /// Inverse index of `hosts`, used to resolve communicating hosts to switches.
    mac_to_switch: HashMap<MacAddr, SwitchId>,
}

impl Topology {
    /// Create an empty topology. Hosts are only learned if they are attached to `host_port`.
    pub fn new(host_port: PortNo) -> Self {
        Self {
            host_port,
            switches: BTreeSet::new(),
            edges: BTreeMap::new(),
            hosts: BTreeMap::new(),
            mac_to_switch: HashMap::new(),
        }
    }

    /// Returns the host-facing port
    pub fn host_port(&self) -> PortNo {
        self.host_port
    }

    /// Add a switch to the topology. Adding an existing switch does not change anything. Returns
    /// true if the switch was not yet known.
    pub fn add_switch(&mut self, switch: SwitchId) -> bool {
        if !self.switches.insert(switch) {
            return false;
        }
        self.edges.entry(switch).or_default();
        self.hosts.entry(switch).or_default();
        debug!("Switch {} added to the topology", switch);
        true
    }

    /// Remove the switch from the topology, together with all links pointing to it, and all hosts
    /// attached to it. The MAC addresses of the removed hosts are returned.
    pub fn remove_switch(&mut self, switch: SwitchId) -> Result<Vec<MacAddr>, ControllerError> {
        if !self.switches.remove(&switch) {
            return Err(ControllerError::UnknownSwitch(switch));
        }

        // remove both directions of every link
        if let Some(neighbors) = self.edges.remove(&switch) {
            for neighbor in neighbors.keys() {
                if let Some(n) = self.edges.get_mut(neighbor) {
                    n.remove(&switch);
                }
            }
        }
        // links which were only known in one direction
        for neighbors in self.edges.values_mut() {
            neighbors.remove(&switch);
        }

        let removed_hosts: Vec<MacAddr> = self
            .hosts
            .remove(&switch)
            .map(|h| h.into_iter().map(|(mac, _)| mac).collect())
            .unwrap_or_default();
        self.mac_to_switch.retain(|_, s| *s != switch);

        debug!("Switch {} removed ({} hosts purged)", switch, removed_hosts.len());
        Ok(removed_hosts)
    }

    /// Add a link between switch `a` (on port `port_a`) and `b` (on port `port_b`). Both switches
    /// must be part of the topology. If the link already exists, the ports are updated.
    pub fn add_link(
        &mut self,
        a: SwitchId,
        port_a: PortNo,
        b: SwitchId,
        port_b: PortNo,
    ) -> Result<(), ControllerError> {
        for s in [a, b].iter() {
            if !self.switches.contains(s) {
                return Err(ControllerError::UnknownSwitch(*s));
            }
        }
        self.edges.entry(a).or_default().insert(b, port_a);
        self.edges.entry(b).or_default().insert(a, port_b);
        debug!("Link added: {}:{} <-> {}:{}", a, port_a, b, port_b);
        Ok(())
    }

    /// Record the attachment of a host. The host is only recorded if `port` is the host-facing
    /// port, and if the host was not yet seen somewhere else.
    pub fn add_host(
        &mut self,
        switch: SwitchId,
        mac: MacAddr,
        port: PortNo,
    ) -> Result<HostUpdate, ControllerError> {
        if !self.switches.contains(&switch) {
            return Err(ControllerError::UnknownSwitch(switch));
        }
        if port != self.host_port {
            return Ok(HostUpdate::IgnoredPort);
        }
        if let Some((known_switch, known_port)) = self.host_location(mac) {
            return Ok(if known_switch == switch && known_port == port {
                HostUpdate::AlreadyKnown
            } else {
                HostUpdate::AttachedElsewhere(known_switch, known_port)
            });
        }
        self.hosts.entry(switch).or_default().insert(mac, port);
        self.mac_to_switch.insert(mac, switch);
        debug!("Host {} attached to {}:{}", mac, switch, port);
        Ok(HostUpdate::Attached)
    }

    /// Returns true if the switch is part of the topology
    pub fn contains_switch(&self, switch: SwitchId) -> bool {
        self.switches.contains(&switch)
    }

    /// Returns the set of all switches, in ascending order.
    pub fn switches(&self) -> &BTreeSet<SwitchId> {
        &self.switches
    }

    /// Returns the number of switches
    pub fn num_switches(&self) -> usize {
        self.switches.len()
    }

    /// Returns the number of (undirected) links
    pub fn num_links(&self) -> usize {
        self.edges.values().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Returns the neighbors of a switch, mapped to the local port leading to them. Returns `None`
    /// if the switch is not known.
    pub fn neighbors(&self, switch: SwitchId) -> Option<&BTreeMap<SwitchId, PortNo>> {
        self.edges.get(&switch)
    }

    /// Returns the port on `from` which leads to `to`.
    pub fn port_towards(&self, from: SwitchId, to: SwitchId) -> Option<PortNo> {
        self.edges.get(&from).and_then(|n| n.get(&to)).copied()
    }

    /// Returns all hosts attached to the switch, mapped to their port. Returns `None` if the switch
    /// is not known.
    pub fn hosts(&self, switch: SwitchId) -> Option<&BTreeMap<MacAddr, PortNo>> {
        self.hosts.get(&switch)
    }

    /// Returns the switch to which the host is attached.
    pub fn host_switch(&self, mac: MacAddr) -> Option<SwitchId> {
        self.mac_to_switch.get(&mac).copied()
    }

    /// Returns the switch and the port to which the host is attached.
    pub fn host_location(&self, mac: MacAddr) -> Option<(SwitchId, PortNo)> {
        let switch = self.host_switch(mac)?;
        let port = *self.hosts.get(&switch)?.get(&mac)?;
        Some((switch, port))
    }

    /// Check that every link is stored in both directions, that no link or host references an
    /// unknown switch, and that the host index matches the host table.
    pub fn is_consistent(&self) -> bool {
        let edges_ok = self.edges.iter().all(|(a, neighbors)| {
            self.switches.contains(a)
                && neighbors.keys().all(|b| {
                    self.switches.contains(b)
                        && self.edges.get(b).map(|n| n.contains_key(a)).unwrap_or(false)
                })
        });
        let hosts_ok = self.hosts.keys().all(|s| self.switches.contains(s))
            && self.mac_to_switch.iter().all(|(mac, s)| {
                self.hosts.get(s).map(|h| h.contains_key(mac)).unwrap_or(false)
            })
            && self.hosts.values().map(|h| h.len()).sum::<usize>() == self.mac_to_switch.len();
        edges_ok && hosts_ok
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use maplit::btreemap;

    fn s(id: u64) -> SwitchId {
        SwitchId(id)
    }

    #[test]
    fn add_switch_idempotent() {
        let mut t = Topology::new(1);
        assert!(t.add_switch(s(1)));
        let before = t.clone();
        assert!(!t.add_switch(s(1)));
        assert_eq!(t, before);
        assert_eq!(t.neighbors(s(1)), Some(&BTreeMap::new()));
        assert_eq!(t.hosts(s(1)), Some(&BTreeMap::new()));
    }

    #[test]
    fn add_link() {
        let mut t = Topology::new(1);
        t.add_switch(s(1));
        t.add_switch(s(2));
        t.add_link(s(1), 2, s(2), 1).unwrap();
        let before = t.clone();
        t.add_link(s(1), 2, s(2), 1).unwrap();
        assert_eq!(t, before);
        assert_eq!(t.neighbors(s(1)), Some(&btreemap! {s(2) => 2}));
        assert_eq!(t.neighbors(s(2)), Some(&btreemap! {s(1) => 1}));
        assert_eq!(t.port_towards(s(1), s(2)), Some(2));
        assert_eq!(t.num_links(), 1);
        assert!(t.is_consistent());
    }

    #[test]
    fn add_link_unknown_switch() {
        let mut t = Topology::new(1);
        t.add_switch(s(1));
        assert_eq!(t.add_link(s(1), 2, s(3), 1), Err(ControllerError::UnknownSwitch(s(3))));
        assert_eq!(t.add_link(s(4), 2, s(1), 1), Err(ControllerError::UnknownSwitch(s(4))));
        assert_eq!(t.num_links(), 0);
    }

    #[test]
    fn add_host() {
        let mut t = Topology::new(1);
        t.add_switch(s(1));
        t.add_switch(s(2));
        let h1 = MacAddr::from_host_id(1);
        let h2 = MacAddr::from_host_id(2);
        assert_eq!(t.add_host(s(1), h1, 1), Ok(HostUpdate::Attached));
        assert_eq!(t.add_host(s(1), h1, 1), Ok(HostUpdate::AlreadyKnown));
        assert_eq!(t.add_host(s(2), h1, 1), Ok(HostUpdate::AttachedElsewhere(s(1), 1)));
        assert_eq!(t.add_host(s(2), h2, 3), Ok(HostUpdate::IgnoredPort));
        assert_eq!(t.add_host(s(3), h2, 1), Err(ControllerError::UnknownSwitch(s(3))));
        assert_eq!(t.host_location(h1), Some((s(1), 1)));
        assert_eq!(t.host_switch(h2), None);
        assert_eq!(t.hosts(s(1)), Some(&btreemap! {h1 => 1}));
        assert!(t.is_consistent());
    }

    #[test]
    fn remove_switch() {
        let mut t = Topology::new(1);
        for i in 1..=3 {
            t.add_switch(s(i));
        }
        t.add_link(s(1), 2, s(2), 1).unwrap();
        t.add_link(s(2), 2, s(3), 1).unwrap();
        t.add_link(s(3), 2, s(1), 3).unwrap();
        let h2 = MacAddr::from_host_id(2);
        t.add_host(s(2), h2, 1).unwrap();

        assert_eq!(t.remove_switch(s(2)), Ok(vec![h2]));
        assert!(!t.contains_switch(s(2)));
        assert_eq!(t.neighbors(s(2)), None);
        assert_eq!(t.neighbors(s(1)), Some(&btreemap! {s(3) => 3}));
        assert_eq!(t.neighbors(s(3)), Some(&btreemap! {s(1) => 2}));
        assert_eq!(t.host_switch(h2), None);
        assert_eq!(t.hosts(s(2)), None);
        assert!(t.is_consistent());

        assert_eq!(t.remove_switch(s(2)), Err(ControllerError::UnknownSwitch(s(2))));
    }
}
