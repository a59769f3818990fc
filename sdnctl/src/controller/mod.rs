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

#![deny(missing_docs, missing_debug_implementations)]

//! # Controller
//!
//! This is the control-plane logic of an SDN controller. It keeps a view of the switches, links
//! and hosts of the network, computes a spanning tree to bound flooding, decides how frames are
//! forwarded, and (in service-chain mode) installs flow rules which steer traffic between two hosts
//! through a sequence of middleboxes.
//!
//! The controller does not speak OpenFlow itself. The protocol stack delivers [`Event`]s, and
//! receives all commands through a [`CommandSink`].
//!
//! ## Example usage
//!
//! The following example builds a ring of three switches, each with a single host on port 1, and
//! shows that a frame for an unknown destination is only flooded along the spanning tree.
//!
//! ```rust
//! use sdnctl::config::ControllerConfig;
//! use sdnctl::controller::{Command, Controller, Event, MacAddr, SwitchId};
//! use sdnctl::controller::flow::FlowAction;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut c = Controller::new(ControllerConfig::default())?;
//!     let mut commands: Vec<Command> = Vec::new();
//!
//!     let (s1, s2, s3) = (SwitchId(1), SwitchId(2), SwitchId(3));
//!     let h1 = MacAddr::from_host_id(1);
//!     let h2 = MacAddr::from_host_id(2);
//!
//!     for s in [s1, s2, s3].iter() {
//!         c.handle_event(Event::SwitchEnter(*s), &mut commands)?;
//!     }
//!     for (a, port_a, b, port_b) in [(s1, 2, s2, 3), (s2, 2, s3, 3), (s3, 2, s1, 3)].iter() {
//!         let link = Event::LinkAdd { src: *a, src_port: *port_a, dst: *b, dst_port: *port_b };
//!         c.handle_event(link, &mut commands)?;
//!     }
//!     c.handle_event(Event::HostAdd { mac: h1, switch: s1, port: 1 }, &mut commands)?;
//!
//!     // the link s2 - s3 is not part of the tree
//!     assert_eq!(c.spanning_tree().num_links(), 2);
//!     assert!(!c.spanning_tree().contains_link(s2, s3));
//!
//!     // h1 sends a frame to h2, which is not yet known
//!     c.handle_event(Event::packet_in(s1, 1, h1, h2), &mut commands)?;
//!     match commands.last() {
//!         Some(Command::PacketOut { actions, .. }) => {
//!             assert_eq!(actions, &vec![FlowAction::Output(2), FlowAction::Output(3)])
//!         }
//!         c => panic!("unexpected command: {:?}", c),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod command;
#[allow(clippy::module_inception)]
mod controller;
pub mod event;
pub mod flow;
pub mod forwarding;
pub mod path;
pub mod printer;
pub mod service_chain;
pub mod spanning_tree;
pub mod topology;
pub(crate) mod types;

pub use command::{Command, CommandSink, PacketBuffer};
pub use controller::{Controller, SharedController};
pub use event::Event;
pub use flow::{FlowAction, FlowMatch, FlowRule};
pub use forwarding::{ForwardingDecision, ForwardingEngine};
pub use service_chain::{ChainEntry, ChainRole, ServiceChain, ServiceChainTable};
pub use spanning_tree::{RootPolicy, SpanningTree};
pub use topology::{HostUpdate, Topology};
pub use types::{ControllerError, MacAddr, MacParseError, PortNo, SwitchId, VlanId};
