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

//! Module containing helper functions to get formatted strings and print information about the
//! controller.

use crate::controller::command::{Command, PacketBuffer};
use crate::controller::flow::{FlowAction, FlowMatch, FlowRule};
use crate::controller::forwarding::ForwardingDecision;
use crate::controller::{Event, SpanningTree};
use itertools::Itertools;

/// Get the string of a flow match, e.g. `in_port=1, eth_dst=00:00:00:00:00:01`. A match without
/// any field is written as `*`.
pub fn flow_match(m: &FlowMatch) -> String {
    let mut fields: Vec<String> = Vec::new();
    if let Some(p) = m.in_port {
        fields.push(format!("in_port={}", p));
    }
    if let Some(mac) = m.eth_src {
        fields.push(format!("eth_src={}", mac));
    }
    if let Some(mac) = m.eth_dst {
        fields.push(format!("eth_dst={}", mac));
    }
    if let Some(vlan) = m.vlan {
        fields.push(format!("vlan={}", vlan.0));
    }
    if fields.is_empty() {
        String::from("*")
    } else {
        fields.join(", ")
    }
}

/// Get the string of a single action
pub fn action(a: &FlowAction) -> String {
    match a {
        FlowAction::Output(p) => format!("output:{}", p),
        FlowAction::PushVlan => String::from("push_vlan"),
        FlowAction::SetVlan(vlan) => format!("set_vlan:{}", vlan.0),
        FlowAction::PopVlan => String::from("pop_vlan"),
    }
}

/// Get the string of an action list, or `drop` if it is empty.
pub fn actions(actions: &[FlowAction]) -> String {
    if actions.is_empty() {
        String::from("drop")
    } else {
        actions.iter().map(action).join(", ")
    }
}

/// Get the string of a flow rule
pub fn flow_rule(rule: &FlowRule) -> String {
    format!(
        "priority={} [{}] -> [{}]",
        rule.priority,
        flow_match(&rule.flow_match),
        actions(&rule.actions)
    )
}

/// Get the string of a command
pub fn command(c: &Command) -> String {
    match c {
        Command::InstallFlowRule { switch, rule } => {
            format!("{}: install {}", switch, flow_rule(rule))
        }
        Command::PacketOut { switch, buffer, in_port, actions: a } => format!(
            "{}: packet out ({}, in_port={}) -> [{}]",
            switch,
            match buffer {
                PacketBuffer::Buffered(id) => format!("buffer {}", id),
                PacketBuffer::Payload(data) => format!("{} bytes", data.len()),
            },
            in_port,
            actions(a)
        ),
    }
}

/// Get the string of a forwarding decision
pub fn decision(d: &ForwardingDecision) -> String {
    match d {
        ForwardingDecision::Unicast { out_port, .. } => format!("unicast to port {}", out_port),
        ForwardingDecision::Flood { out_ports } => {
            format!("flood to ports [{}]", out_ports.iter().join(", "))
        }
    }
}

/// Get the string of an event
pub fn event(e: &Event) -> String {
    match e {
        Event::SwitchEnter(s) => format!("switch enter: {}", s),
        Event::SwitchLeave(s) => format!("switch leave: {}", s),
        Event::LinkAdd { src, src_port, dst, dst_port } => {
            format!("link add: {}:{} <-> {}:{}", src, src_port, dst, dst_port)
        }
        Event::HostAdd { mac, switch, port } => format!("host add: {} at {}:{}", mac, switch, port),
        Event::PacketIn { switch, in_port, src, dst, control_frame, .. } => format!(
            "packet in: {}:{}, {} -> {}{}",
            switch,
            in_port,
            src,
            dst,
            if *control_frame { " (control)" } else { "" }
        ),
    }
}

/// Get the lines describing the spanning tree, one line per switch, e.g. `s1 <-> {s2, s3}`.
pub fn spanning_tree(tree: &SpanningTree) -> String {
    let mut switches: Vec<_> = tree.graph().nodes().collect();
    switches.sort();
    switches
        .into_iter()
        .map(|s| format!("{} <-> {{{}}}", s, tree.neighbors(s).iter().join(", ")))
        .join("\n")
}

/// Print the spanning tree to stdout
pub fn print_spanning_tree(tree: &SpanningTree) {
    println!("{}", spanning_tree(tree));
}
