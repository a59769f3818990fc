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

//! # Forwarding Decision Engine
//!
//! This module contains the learning tables of all switches and decides how a frame sent to the
//! controller is forwarded. Frames for a learned destination are sent out on the learned port (and
//! a flow rule is generated, such that the switch can forward subsequent frames on its own). All
//! other frames are flooded, but only along the links of the spanning tree and towards the
//! attached hosts.

use crate::controller::flow::FlowRule;
use crate::controller::{ControllerError, MacAddr, PortNo, SpanningTree, SwitchId, Topology};
use log::*;
use std::collections::{BTreeSet, HashMap};

/// Decision of the forwarding engine for a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardingDecision {
    /// The destination is known. Send the frame out on `out_port`, and install `flow_rule` such
    /// that the switch forwards subsequent frames without asking the controller.
    Unicast {
        /// Port on which the destination was learned
        out_port: PortNo,
        /// Flow rule matching the ingress port and the destination
        flow_rule: FlowRule,
    },
    /// The destination is unknown. Send the frame out on all ports in `out_ports` (which may be
    /// empty).
    Flood {
        /// Tree ports and host ports, in ascending order and never containing the ingress port
        out_ports: Vec<PortNo>,
    },
}

impl ForwardingDecision {
    /// Returns all ports on which the frame is sent out.
    pub fn out_ports(&self) -> Vec<PortNo> {
        match self {
            Self::Unicast { out_port, .. } => vec![*out_port],
            Self::Flood { out_ports } => out_ports.clone(),
        }
    }

    /// Returns true if the decision is to flood the frame.
    pub fn is_flood(&self) -> bool {
        matches!(self, Self::Flood { .. })
    }
}

/// Per-switch learning tables, mapping MAC addresses to the port on which frames from this address
/// were last received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForwardingEngine {
    mac_to_port: HashMap<SwitchId, HashMap<MacAddr, PortNo>>,
}

impl ForwardingEngine {
    /// Create an engine with empty learning tables
    pub fn new() -> Self {
        Self { mac_to_port: HashMap::new() }
    }

    /// Remember that `mac` was seen on port `port` of `switch`.
    pub fn learn(&mut self, switch: SwitchId, mac: MacAddr, port: PortNo) {
        let old = self.mac_to_port.entry(switch).or_default().insert(mac, port);
        if old != Some(port) {
            trace!("{}: learned {} on port {}", switch, mac, port);
        }
    }

    /// Returns the port on which `mac` was last seen by `switch`.
    pub fn lookup(&self, switch: SwitchId, mac: MacAddr) -> Option<PortNo> {
        self.mac_to_port.get(&switch).and_then(|t| t.get(&mac)).copied()
    }

    /// Returns the learning table of the switch.
    pub fn table(&self, switch: SwitchId) -> Option<&HashMap<MacAddr, PortNo>> {
        self.mac_to_port.get(&switch)
    }

    /// Returns the number of switches for which a learning table exists.
    pub fn num_tables(&self) -> usize {
        self.mac_to_port.len()
    }

    /// Remove the learning table of the switch. Returns the number of entries removed.
    pub fn purge_switch(&mut self, switch: SwitchId) -> usize {
        self.mac_to_port.remove(&switch).map(|t| t.len()).unwrap_or(0)
    }

    /// Learn the source of the frame, and decide how the frame is forwarded. The switch must be
    /// part of the topology.
    pub fn decide(
        &mut self,
        topo: &Topology,
        tree: &SpanningTree,
        switch: SwitchId,
        in_port: PortNo,
        src: MacAddr,
        dst: MacAddr,
    ) -> Result<ForwardingDecision, ControllerError> {
        if !topo.contains_switch(switch) {
            return Err(ControllerError::UnknownSwitch(switch));
        }

        self.learn(switch, src, in_port);

        Ok(match self.lookup(switch, dst) {
            Some(out_port) => ForwardingDecision::Unicast {
                out_port,
                flow_rule: FlowRule::learned(in_port, dst, out_port),
            },
            None => ForwardingDecision::Flood {
                out_ports: Self::flood_ports(topo, tree, switch, in_port),
            },
        })
    }

    /// Returns all ports on which a frame received on `in_port` is flooded: every port of a link
    /// which is part of the spanning tree, and every port with an attached host. The ingress port
    /// is never part of the result.
    pub fn flood_ports(
        topo: &Topology,
        tree: &SpanningTree,
        switch: SwitchId,
        in_port: PortNo,
    ) -> Vec<PortNo> {
        let mut ports: BTreeSet<PortNo> = BTreeSet::new();

        if let Some(neighbors) = topo.neighbors(switch) {
            ports.extend(
                neighbors
                    .iter()
                    .filter(|(neighbor, _)| tree.contains_link(switch, **neighbor))
                    .map(|(_, port)| *port),
            );
        }
        if let Some(hosts) = topo.hosts(switch) {
            ports.extend(hosts.values().copied());
        }

        ports.remove(&in_port);
        ports.into_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::controller::RootPolicy;

    fn s(id: u64) -> SwitchId {
        SwitchId(id)
    }

    /// Ring of three switches, with host `i` on port 1 of switch `i`. Ports between switches:
    /// s1:2 - s2:3, s2:2 - s3:3, s3:2 - s1:3
    fn ring() -> (Topology, SpanningTree) {
        let mut t = Topology::new(1);
        for i in 1..=3 {
            t.add_switch(s(i));
            t.add_host(s(i), MacAddr::from_host_id(i as u8), 1).unwrap();
        }
        t.add_link(s(1), 2, s(2), 3).unwrap();
        t.add_link(s(2), 2, s(3), 3).unwrap();
        t.add_link(s(3), 2, s(1), 3).unwrap();
        let tree = SpanningTree::build(&t, RootPolicy::LowestId);
        (t, tree)
    }

    #[test]
    fn flood_on_tree_only() {
        let (t, tree) = ring();
        let h1 = MacAddr::from_host_id(1);
        let h3 = MacAddr::from_host_id(3);
        let mut engine = ForwardingEngine::new();

        // tree links: s1 - s2, s1 - s3. s2 - s3 is excluded.
        let decision = engine.decide(&t, &tree, s(1), 1, h1, h3).unwrap();
        assert_eq!(decision, ForwardingDecision::Flood { out_ports: vec![2, 3] });
        let decision = engine.decide(&t, &tree, s(2), 3, h1, h3).unwrap();
        assert_eq!(decision, ForwardingDecision::Flood { out_ports: vec![1] });
        let decision = engine.decide(&t, &tree, s(3), 2, h1, h3).unwrap();
        assert_eq!(decision, ForwardingDecision::Flood { out_ports: vec![1] });
        // a frame arriving over the excluded link is still flooded into the tree
        let decision = engine.decide(&t, &tree, s(3), 3, h1, h3).unwrap();
        assert_eq!(decision, ForwardingDecision::Flood { out_ports: vec![1, 2] });
    }

    #[test]
    fn flood_excludes_ingress() {
        let (t, tree) = ring();
        for i in 1..=3 {
            for in_port in 1..=4 {
                let ports = ForwardingEngine::flood_ports(&t, &tree, s(i), in_port);
                assert!(!ports.contains(&in_port));
            }
        }
    }

    #[test]
    fn unicast_after_learning() {
        let (t, tree) = ring();
        let h1 = MacAddr::from_host_id(1);
        let h2 = MacAddr::from_host_id(2);
        let mut engine = ForwardingEngine::new();

        // h1 -> h2 is flooded, but s1 learns h1
        assert!(engine.decide(&t, &tree, s(1), 1, h1, h2).unwrap().is_flood());
        assert_eq!(engine.lookup(s(1), h1), Some(1));
        // the answer h2 -> h1 arrives at s1 from s2
        let decision = engine.decide(&t, &tree, s(1), 2, h2, h1).unwrap();
        assert_eq!(
            decision,
            ForwardingDecision::Unicast { out_port: 1, flow_rule: FlowRule::learned(2, h1, 1) }
        );
        assert_eq!(engine.lookup(s(1), h2), Some(2));

        // deciding again yields the same decision, and the table does not change
        let table = engine.clone();
        assert_eq!(engine.decide(&t, &tree, s(1), 2, h2, h1).unwrap(), decision);
        assert_eq!(engine, table);
    }

    #[test]
    fn relearn_on_move() {
        let (t, tree) = ring();
        let h1 = MacAddr::from_host_id(1);
        let h2 = MacAddr::from_host_id(2);
        let mut engine = ForwardingEngine::new();
        engine.decide(&t, &tree, s(1), 1, h1, h2).unwrap();
        engine.decide(&t, &tree, s(1), 3, h1, h2).unwrap();
        assert_eq!(engine.lookup(s(1), h1), Some(3));
    }

    #[test]
    fn unknown_switch() {
        let (t, tree) = ring();
        let mut engine = ForwardingEngine::new();
        let h1 = MacAddr::from_host_id(1);
        assert_eq!(
            engine.decide(&t, &tree, s(9), 1, h1, h1),
            Err(ControllerError::UnknownSwitch(s(9)))
        );
        assert_eq!(engine.num_tables(), 0);
    }

    #[test]
    fn purge() {
        let mut engine = ForwardingEngine::new();
        engine.learn(s(1), MacAddr::from_host_id(1), 1);
        engine.learn(s(1), MacAddr::from_host_id(2), 2);
        engine.learn(s(2), MacAddr::from_host_id(1), 3);
        assert_eq!(engine.purge_switch(s(1)), 2);
        assert_eq!(engine.purge_switch(s(1)), 0);
        assert_eq!(engine.table(s(1)), None);
        assert_eq!(engine.lookup(s(2), MacAddr::from_host_id(1)), Some(3));
    }
}
