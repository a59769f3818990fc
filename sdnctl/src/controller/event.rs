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

//! Module for defining events

use crate::controller::command::PacketBuffer;
use crate::controller::{MacAddr, PortNo, SwitchId};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Event delivered by the protocol stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// A switch connected to the controller
    SwitchEnter(SwitchId),
    /// A switch disconnected from the controller
    SwitchLeave(SwitchId),
    /// A link between two switches was discovered. `src_port` is the port on `src`, and `dst_port`
    /// is the port on `dst`.
    LinkAdd {
        /// First switch
        src: SwitchId,
        /// Port of the link on `src`
        src_port: PortNo,
        /// Second switch
        dst: SwitchId,
        /// Port of the link on `dst`
        dst_port: PortNo,
    },
    /// A host was discovered on a switch port
    HostAdd {
        /// MAC address of the host
        mac: MacAddr,
        /// Switch to which the host is attached
        switch: SwitchId,
        /// Port of the switch to which the host is attached
        port: PortNo,
    },
    /// A frame was sent to the controller
    PacketIn {
        /// Switch which received the frame
        switch: SwitchId,
        /// Port on which the frame was received
        in_port: PortNo,
        /// Source MAC address
        src: MacAddr,
        /// Destination MAC address
        dst: MacAddr,
        /// The frame belongs to link-layer discovery (LLDP), and must not be forwarded.
        #[serde(default)]
        control_frame: bool,
        /// Reference to the frame
        buffer: PacketBuffer,
    },
}

impl Event {
    /// Returns true if the event may change the topology (and thus the spanning tree).
    pub fn is_topology_event(&self) -> bool {
        !matches!(self, Event::PacketIn { .. })
    }

    /// Returns the switch which caused the event. For links, this is the `src` switch.
    pub fn switch(&self) -> SwitchId {
        match self {
            Event::SwitchEnter(s) | Event::SwitchLeave(s) => *s,
            Event::LinkAdd { src, .. } => *src,
            Event::HostAdd { switch, .. } | Event::PacketIn { switch, .. } => *switch,
        }
    }

    /// Create a packet-in event of a regular frame, received without buffering.
    pub fn packet_in(switch: SwitchId, in_port: PortNo, src: MacAddr, dst: MacAddr) -> Self {
        Event::PacketIn {
            switch,
            in_port,
            src,
            dst,
            control_frame: false,
            buffer: PacketBuffer::Payload(Vec::new()),
        }
    }
}

/// Read a trace of events from a JSON file, containing a list of events.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Vec<Event>, Error> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
