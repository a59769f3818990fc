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

//! # Example Topologies
//!
//! Topologies used to exercise the controller. Every topology is given as its configuration and
//! the topology notifications a protocol stack would deliver, in the order they arrive.

use crate::config::ControllerConfig;
use crate::controller::{Command, Controller, Event, MacAddr, PortNo, SwitchId};
use crate::Error;

mod ring;
pub use ring::RingNet;

mod service_chain;
pub use service_chain::{ExtendedServiceChainNet, ServiceChainNet};

mod random;
pub use random::RandomNet;

/// Trait describing an example topology
pub trait ExampleTopology {
    /// Get the configuration of the controller
    fn config() -> ControllerConfig;

    /// Get all topology notifications
    fn events() -> Vec<Event>;

    /// Create the controller and process all topology notifications. Returns the controller, and
    /// all commands it generated.
    fn controller() -> Result<(Controller, Vec<Command>), Error> {
        let mut controller = Controller::new(Self::config())?;
        let mut commands: Vec<Command> = Vec::new();
        for event in Self::events() {
            controller.handle_event(event, &mut commands)?;
        }
        Ok((controller, commands))
    }
}

fn switch(id: u64) -> Event {
    Event::SwitchEnter(SwitchId(id))
}

fn link(a: u64, port_a: PortNo, b: u64, port_b: PortNo) -> Event {
    Event::LinkAdd { src: SwitchId(a), src_port: port_a, dst: SwitchId(b), dst_port: port_b }
}

fn host(id: u8, switch: u64, port: PortNo) -> Event {
    Event::HostAdd { mac: MacAddr::from_host_id(id), switch: SwitchId(switch), port }
}
