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

//! # Flow Rules
//!
//! This module describes the flow rules installed on the switches. A flow rule consists of a
//! [`FlowMatch`] (a predicate over the header fields of a frame) and an ordered list of
//! [`FlowAction`]s which are applied to every matching frame.

use crate::controller::{MacAddr, PortNo, VlanId};
use serde::{Deserialize, Serialize};

/// Priority of the rules installed by the learning switch (the OpenFlow default priority).
pub const DEFAULT_PRIORITY: u16 = 0x8000;
/// Priority of all rules installed for the service chain, including the pre-seeded chain table.
pub const SERVICE_CHAIN_PRIORITY: u16 = 0;

/// Match predicate of a flow rule. Every field set to `None` acts as a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowMatch {
    /// Port on which the frame was received
    pub in_port: Option<PortNo>,
    /// Source MAC address
    pub eth_src: Option<MacAddr>,
    /// Destination MAC address
    pub eth_dst: Option<MacAddr>,
    /// VLAN id of the outermost tag. `Some` only matches tagged frames.
    pub vlan: Option<VlanId>,
}

impl FlowMatch {
    /// Match which accepts every frame
    pub fn any() -> Self {
        Self::default()
    }

    /// Restrict the match to frames received on `port`.
    pub fn in_port(mut self, port: PortNo) -> Self {
        self.in_port = Some(port);
        self
    }

    /// Restrict the match to frames sent by `mac`.
    pub fn eth_src(mut self, mac: MacAddr) -> Self {
        self.eth_src = Some(mac);
        self
    }

    /// Restrict the match to frames destined to `mac`.
    pub fn eth_dst(mut self, mac: MacAddr) -> Self {
        self.eth_dst = Some(mac);
        self
    }

    /// Restrict the match to frames tagged with `vlan`.
    pub fn vlan(mut self, vlan: VlanId) -> Self {
        self.vlan = Some(vlan);
        self
    }

    /// Number of fields which are not wildcards.
    pub fn num_fields(&self) -> usize {
        self.in_port.is_some() as usize
            + self.eth_src.is_some() as usize
            + self.eth_dst.is_some() as usize
            + self.vlan.is_some() as usize
    }
}

/// Action applied to a matching frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowAction {
    /// Send the frame out on the given port
    Output(PortNo),
    /// Push a new (empty) 802.1Q tag. It is always followed by `SetVlan`.
    PushVlan,
    /// Rewrite the VLAN id of the outermost tag
    SetVlan(VlanId),
    /// Remove the outermost tag
    PopVlan,
}

/// A complete flow rule, consisting of the priority, the match and the actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRule {
    /// Priority of the rule. Switches replace a rule with the same priority and match.
    pub priority: u16,
    /// Match predicate
    pub flow_match: FlowMatch,
    /// Ordered list of actions
    pub actions: Vec<FlowAction>,
}

impl FlowRule {
    /// Create a new flow rule
    pub fn new(priority: u16, flow_match: FlowMatch, actions: Vec<FlowAction>) -> Self {
        Self { priority, flow_match, actions }
    }

    /// Rule installed by the learning switch, sending frames for `dst` received on `in_port` out
    /// on `out_port`.
    pub fn learned(in_port: PortNo, dst: MacAddr, out_port: PortNo) -> Self {
        Self::new(
            DEFAULT_PRIORITY,
            FlowMatch::any().in_port(in_port).eth_dst(dst),
            vec![FlowAction::Output(out_port)],
        )
    }

    /// Returns all ports on which the rule sends out frames, in the order of the actions.
    pub fn out_ports(&self) -> Vec<PortNo> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                FlowAction::Output(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}
