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

//! # Service Chain
//!
//! In service-chain mode, all traffic between two hosts is steered through a fixed sequence of
//! middleboxes before it is delivered. The stage a frame is currently in is encoded in its VLAN
//! tag:
//!
//! - *apply chain*: the frame was sent by a host and travels towards the head of the chain.
//! - *entry* / *exit*: the frame is sent to the first middlebox, or it has left the last one. The
//!   tags between these two are rewritten by the pre-seeded [`ServiceChainTable`].
//! - *policy complete*: the frame has traversed all middleboxes, and travels to its destination.
//!
//! The head of the chain is the middlebox-bearing switch on which the chain starts and ends. Hosts
//! attached to a different switch must reach the head along the spanning tree. The pre-seeded
//! table is only responsible for the chain itself: it is the same for every host pair. The
//! per-host rules generated by [`ServiceChain::steering_rules`] connect the hosts to this chain.
//!
//! Only a single chain with a single head is supported. Traffic of hosts whose tree path does not
//! cross the head cannot be steered, and is reported as `ControllerError::ChainHeadNotOnPath`.

use crate::config::{ConfigError, ServiceChainConfig};
use crate::controller::flow::{FlowAction, FlowMatch, FlowRule, SERVICE_CHAIN_PRIORITY};
use crate::controller::path::resolve_host_path;
use crate::controller::{ControllerError, MacAddr, PortNo, SpanningTree, SwitchId, Topology, VlanId};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Role of a switch in the service chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainRole {
    /// The switch has middleboxes attached. Its table entries rewrite the tag to the one of the
    /// next stage.
    Middlebox,
    /// The switch only connects middlebox-bearing switches. Its table entries forward tagged
    /// frames unchanged.
    Tunnel,
}

/// Single entry of the pre-seeded chain table: frames received on `in_port` with tag `in_vlan`
/// are sent out on `out_port` with tag `out_vlan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Ingress port
    pub in_port: PortNo,
    /// Tag of the received frame
    pub in_vlan: VlanId,
    /// Egress port
    pub out_port: PortNo,
    /// Tag of the frame when it is sent out. Tunnel entries must not change the tag.
    pub out_vlan: VlanId,
}

impl ChainEntry {
    /// Create a new entry
    pub fn new(in_port: PortNo, in_vlan: VlanId, out_port: PortNo, out_vlan: VlanId) -> Self {
        Self { in_port, in_vlan, out_port, out_vlan }
    }

    /// Returns the flow rule which implements this entry on a switch with the given role.
    pub fn flow_rule(&self, role: ChainRole) -> FlowRule {
        let flow_match = FlowMatch::any().in_port(self.in_port).vlan(self.in_vlan);
        let actions = match role {
            ChainRole::Middlebox => {
                vec![FlowAction::SetVlan(self.out_vlan), FlowAction::Output(self.out_port)]
            }
            ChainRole::Tunnel => vec![FlowAction::Output(self.out_port)],
        };
        FlowRule::new(SERVICE_CHAIN_PRIORITY, flow_match, actions)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ChainSwitch {
    role: ChainRole,
    entries: BTreeMap<(PortNo, VlanId), ChainEntry>,
}

/// # Service Chain Table
///
/// The pre-seeded chain table of all middlebox-bearing and tunnel switches. Entries are indexed by
/// their match, i.e., `(in_port, in_vlan)`, which must be unique per switch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceChainTable {
    switches: BTreeMap<SwitchId, ChainSwitch>,
}

impl ServiceChainTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self { switches: BTreeMap::new() }
    }

    /// Build the table from the deployment description. Every switch must be declared only once.
    pub fn from_config(config: &ServiceChainConfig) -> Result<Self, ConfigError> {
        let mut table = Self::new();
        for switch in config.switches.iter() {
            if table.switches.contains_key(&switch.id) {
                return Err(ConfigError::DuplicateSwitch(switch.id));
            }
            table
                .switches
                .insert(switch.id, ChainSwitch { role: switch.role, entries: BTreeMap::new() });
            for entry in switch.table.iter() {
                table.add(switch.id, switch.role, *entry)?;
            }
        }
        Ok(table)
    }

    /// Add a single entry to the table of a switch. This fails if an entry with the same match
    /// already exists, if the switch was added with a different role before, or if a tunnel
    /// entry would rewrite the tag.
    pub fn add(
        &mut self,
        switch: SwitchId,
        role: ChainRole,
        entry: ChainEntry,
    ) -> Result<(), ConfigError> {
        if role == ChainRole::Tunnel && entry.in_vlan != entry.out_vlan {
            return Err(ConfigError::TunnelRewrite(switch, entry));
        }
        let chain_switch = self
            .switches
            .entry(switch)
            .or_insert_with(|| ChainSwitch { role, entries: BTreeMap::new() });
        if chain_switch.role != role {
            return Err(ConfigError::RoleConflict(switch));
        }
        let key = (entry.in_port, entry.in_vlan);
        if chain_switch.entries.contains_key(&key) {
            return Err(ConfigError::TableEntryOverload(switch, entry.in_port, entry.in_vlan));
        }
        chain_switch.entries.insert(key, entry);
        Ok(())
    }

    /// Returns the role of the switch, or `None` if it is not part of the chain.
    pub fn role(&self, switch: SwitchId) -> Option<ChainRole> {
        self.switches.get(&switch).map(|s| s.role)
    }

    /// Returns the entry matching frames received on `in_port` with tag `in_vlan`.
    pub fn lookup(&self, switch: SwitchId, in_port: PortNo, in_vlan: VlanId) -> Option<ChainEntry> {
        self.switches.get(&switch).and_then(|s| s.entries.get(&(in_port, in_vlan))).copied()
    }

    /// Returns all entries of the switch, ordered by their match.
    pub fn entries(&self, switch: SwitchId) -> Vec<ChainEntry> {
        self.switches
            .get(&switch)
            .map(|s| s.entries.values().copied().collect())
            .unwrap_or_default()
    }

    /// Returns all switches which are part of the chain, in ascending order.
    pub fn switches(&self) -> Vec<SwitchId> {
        self.switches.keys().copied().collect()
    }

    /// Returns the total number of entries
    pub fn len(&self) -> usize {
        self.switches.values().map(|s| s.entries.len()).sum()
    }

    /// Returns true if the table contains no entry
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the flow rules implementing the table of the switch. If the switch is not part of
    /// the chain, the result is empty.
    pub fn seed_rules(&self, switch: SwitchId) -> Vec<FlowRule> {
        match self.switches.get(&switch) {
            Some(s) => s.entries.values().map(|e| e.flow_rule(s.role)).collect(),
            None => Vec::new(),
        }
    }
}

/// # Service Chain
///
/// Deployment of a single service chain: the VLAN tags of every stage, the head, the MAC
/// addresses of the middleboxes, and the pre-seeded table.
#[derive(Debug, Clone)]
pub struct ServiceChain {
    head: SwitchId,
    apply_chain_vlan: VlanId,
    policy_complete_vlan: VlanId,
    entry_port: PortNo,
    entry_vlan: VlanId,
    exit_vlan: VlanId,
    middleboxes: HashSet<MacAddr>,
    table: ServiceChainTable,
}

impl ServiceChain {
    /// Validate the deployment description and build the service chain from it.
    pub fn new(config: &ServiceChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            head: config.head,
            apply_chain_vlan: config.apply_chain_vlan,
            policy_complete_vlan: config.policy_complete_vlan,
            entry_port: config.entry.port,
            entry_vlan: config.entry.vlan,
            exit_vlan: config.exit_vlan,
            middleboxes: config.middleboxes.iter().copied().collect(),
            table: ServiceChainTable::from_config(config)?,
        })
    }

    /// Returns the head of the chain
    pub fn head(&self) -> SwitchId {
        self.head
    }

    /// Returns the pre-seeded table
    pub fn table(&self) -> &ServiceChainTable {
        &self.table
    }

    /// Returns true if the address belongs to a middlebox. Middleboxes are never learned as
    /// hosts.
    pub fn is_middlebox(&self, mac: MacAddr) -> bool {
        self.middleboxes.contains(&mac)
    }

    /// Resolve the tree path between both hosts, and generate the steering rules for both of
    /// them. Nothing is returned unless the rules of both hosts can be generated.
    pub fn pair_rules(
        &self,
        topo: &Topology,
        tree: &SpanningTree,
        src: MacAddr,
        dst: MacAddr,
    ) -> Result<Vec<(SwitchId, FlowRule)>, ControllerError> {
        let mut path = resolve_host_path(topo, tree, src, dst)?;
        let mut rules = self.steering_rules(topo, src, &path)?;
        path.reverse();
        rules.extend(self.steering_rules(topo, dst, &path)?);
        Ok(rules)
    }

    /// Generate the steering rules for a single host. The path must start at the switch of the
    /// host, and end at the switch of its peer. All rules match on the MAC address of `host`,
    /// either as source or as destination, such that the rules of different hosts never
    /// overlap.
    ///
    /// The rules are returned in the following order:
    ///
    /// 1. Delivery on the switch of the host: pop the tag of frames which completed the chain.
    /// 2. Injection on the switch of the host (unless it is the head): tag frames of the host with
    ///    the *apply chain* tag, and send them towards the head.
    /// 3. Relay on every switch strictly between the host and the head: forward tagged frames of
    ///    the host towards the head, and completed frames for the host towards the host.
    /// 4. Entry on the head: send frames of the host to the first middlebox.
    /// 5. Exit on the head (unless the host is attached to it): tag frames for the host leaving
    ///    the last middlebox as *policy complete*, and send them towards the host.
    pub fn steering_rules(
        &self,
        topo: &Topology,
        host: MacAddr,
        path: &[SwitchId],
    ) -> Result<Vec<(SwitchId, FlowRule)>, ControllerError> {
        let (switch, host_port) =
            topo.host_location(host).ok_or(ControllerError::UnknownHost(host))?;
        let at_head = switch == self.head;
        let head_pos = path.iter().position(|s| *s == self.head);
        if !at_head && head_pos.is_none() {
            return Err(ControllerError::ChainHeadNotOnPath(path.to_vec()));
        }
        let port = |a: SwitchId, b: SwitchId| {
            topo.port_towards(a, b).ok_or(ControllerError::IncompletePathResolution(a, b))
        };
        let rule = |flow_match: FlowMatch, actions: Vec<FlowAction>| {
            FlowRule::new(SERVICE_CHAIN_PRIORITY, flow_match, actions)
        };

        let mut rules: Vec<(SwitchId, FlowRule)> = Vec::new();

        // delivery
        let delivery_vlan = if at_head { self.exit_vlan } else { self.policy_complete_vlan };
        rules.push((
            switch,
            rule(
                FlowMatch::any().eth_dst(host).vlan(delivery_vlan),
                vec![FlowAction::PopVlan, FlowAction::Output(host_port)],
            ),
        ));

        if !at_head {
            // injection
            let next =
                *path.get(1).ok_or_else(|| ControllerError::ChainHeadNotOnPath(path.to_vec()))?;
            rules.push((
                switch,
                rule(
                    FlowMatch::any().eth_src(host).in_port(host_port),
                    vec![
                        FlowAction::PushVlan,
                        FlowAction::SetVlan(self.apply_chain_vlan),
                        FlowAction::Output(port(switch, next)?),
                    ],
                ),
            ));

            // relay
            for i in 1..path.len().saturating_sub(1) {
                let hop = path[i];
                if hop == self.head {
                    break;
                }
                rules.push((
                    hop,
                    rule(
                        FlowMatch::any().eth_src(host).vlan(self.apply_chain_vlan),
                        vec![FlowAction::Output(port(hop, path[i + 1])?)],
                    ),
                ));
                rules.push((
                    hop,
                    rule(
                        FlowMatch::any().eth_dst(host).vlan(self.policy_complete_vlan),
                        vec![FlowAction::Output(port(hop, path[i - 1])?)],
                    ),
                ));
            }
        }

        // entry
        let entry_actions =
            vec![FlowAction::SetVlan(self.entry_vlan), FlowAction::Output(self.entry_port)];
        if at_head {
            let mut actions = vec![FlowAction::PushVlan];
            actions.extend(entry_actions);
            rules.push((
                self.head,
                rule(FlowMatch::any().eth_src(host).in_port(host_port), actions),
            ));
        } else {
            rules.push((
                self.head,
                rule(FlowMatch::any().eth_src(host).vlan(self.apply_chain_vlan), entry_actions),
            ));
        }

        // exit: the hop before the head on the path is the next hop towards the host
        if !at_head {
            let towards_host = head_pos
                .and_then(|pos| pos.checked_sub(1))
                .map(|pos| path[pos])
                .ok_or_else(|| ControllerError::ChainHeadNotOnPath(path.to_vec()))?;
            rules.push((
                self.head,
                rule(
                    FlowMatch::any().eth_dst(host).vlan(self.exit_vlan),
                    vec![
                        FlowAction::SetVlan(self.policy_complete_vlan),
                        FlowAction::Output(port(self.head, towards_host)?),
                    ],
                ),
            ));
        }

        debug!("{} steering rules generated for {} at {}", rules.len(), host, switch);
        Ok(rules)
    }
}
