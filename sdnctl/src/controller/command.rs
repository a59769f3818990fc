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

//! Module for defining the commands sent to the protocol stack

use crate::controller::flow::{FlowAction, FlowRule};
use crate::controller::{PortNo, SwitchId};
use serde::{Deserialize, Serialize};

/// Reference to the frame which triggered a packet-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketBuffer {
    /// The switch buffered the frame with the given buffer id.
    Buffered(u32),
    /// The switch sent the entire frame to the controller.
    Payload(Vec<u8>),
}

/// Command sent to a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Install (or replace) a flow rule
    InstallFlowRule {
        /// Switch on which the rule is installed
        switch: SwitchId,
        /// The rule itself
        rule: FlowRule,
    },
    /// Forward a single frame
    PacketOut {
        /// Switch which sends the frame
        switch: SwitchId,
        /// The frame (or the buffer containing it)
        buffer: PacketBuffer,
        /// Port on which the frame was received
        in_port: PortNo,
        /// Actions applied to the frame
        actions: Vec<FlowAction>,
    },
}

impl Command {
    /// Returns the switch to which the command is sent.
    pub fn switch(&self) -> SwitchId {
        match self {
            Self::InstallFlowRule { switch, .. } => *switch,
            Self::PacketOut { switch, .. } => *switch,
        }
    }

    /// Returns true if the command installs a flow rule
    pub fn is_flow_rule(&self) -> bool {
        matches!(self, Self::InstallFlowRule { .. })
    }
}

/// Receiver of all commands generated by the controller. Commands are one-way: the controller
/// never waits for an answer, and delivery failures are the concern of the protocol stack.
pub trait CommandSink {
    /// Install (or replace) a flow rule on the switch.
    fn install_flow_rule(&mut self, switch: SwitchId, rule: FlowRule);

    /// Forward the frame referenced by `buffer` with the given actions.
    fn packet_out(
        &mut self,
        switch: SwitchId,
        buffer: PacketBuffer,
        in_port: PortNo,
        actions: Vec<FlowAction>,
    );
}

impl CommandSink for Vec<Command> {
    fn install_flow_rule(&mut self, switch: SwitchId, rule: FlowRule) {
        self.push(Command::InstallFlowRule { switch, rule })
    }

    fn packet_out(
        &mut self,
        switch: SwitchId,
        buffer: PacketBuffer,
        in_port: PortNo,
        actions: Vec<FlowAction>,
    ) {
        self.push(Command::PacketOut { switch, buffer, in_port, actions })
    }
}
