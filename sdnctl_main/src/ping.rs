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

use sdnctl::controller::{
    Command, Controller, ControllerError, Event, FlowAction, MacAddr, PortNo, SwitchId,
};

use log::*;
use std::collections::VecDeque;

/// Frames are dropped after this many packet-ins.
const MAX_PACKET_IN: usize = 1000;

/// Outcome of a single frame sent through the network
#[derive(Debug, Clone, PartialEq)]
pub struct PingOutcome {
    /// All commands generated by the controller
    pub commands: Vec<Command>,
    /// Number of copies of the frame which reached the destination
    pub delivered: usize,
}

/// Where a frame sent out on a switch port ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hop {
    Switch(SwitchId, PortNo),
    Delivered,
    Dropped,
}

/// Send a single frame from `src` to `dst`, where every switch asks the controller how to forward
/// it. Copies of the frame are followed along all links until they reach a host.
pub fn ping(
    controller: &mut Controller,
    src: MacAddr,
    dst: MacAddr,
) -> Result<PingOutcome, ControllerError> {
    let start = controller.topology().host_location(src).ok_or(ControllerError::UnknownHost(src))?;
    let mut queue: VecDeque<(SwitchId, PortNo)> = VecDeque::new();
    queue.push_back(start);

    let mut outcome = PingOutcome { commands: Vec::new(), delivered: 0 };
    let mut num_packet_in: usize = 0;
    while let Some((switch, in_port)) = queue.pop_front() {
        num_packet_in += 1;
        if num_packet_in > MAX_PACKET_IN {
            warn!("Frame {} -> {} dropped after {} packet-ins", src, dst, MAX_PACKET_IN);
            break;
        }

        let mut generated: Vec<Command> = Vec::new();
        let event = Event::packet_in(switch, in_port, src, dst);
        if let Err(e) = controller.handle_event(event, &mut generated) {
            warn!("{}: frame {} -> {}: {}", switch, src, dst, e);
        }
        for c in generated.iter() {
            if let Command::PacketOut { actions, .. } = c {
                for action in actions {
                    if let FlowAction::Output(port) = action {
                        match next_hop(controller, switch, *port, dst) {
                            Hop::Switch(s, p) => queue.push_back((s, p)),
                            Hop::Delivered => outcome.delivered += 1,
                            Hop::Dropped => {}
                        }
                    }
                }
            }
        }
        outcome.commands.extend(generated);
    }

    Ok(outcome)
}

/// Returns where the frame sent out on `port` is received.
fn next_hop(controller: &Controller, switch: SwitchId, port: PortNo, dst: MacAddr) -> Hop {
    let topo = controller.topology();
    if topo.host_location(dst) == Some((switch, port)) {
        info!("Frame delivered to {} at {}:{}", dst, switch, port);
        return Hop::Delivered;
    }
    let neighbor = topo
        .neighbors(switch)
        .and_then(|n| n.iter().find(|(_, p)| **p == port).map(|(s, _)| *s));
    match neighbor.and_then(|n| topo.port_towards(n, switch).map(|p| (n, p))) {
        Some((n, p)) => Hop::Switch(n, p),
        None => Hop::Dropped,
    }
}
