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

#![deny(missing_docs)]

//! # sdnctl: Spanning-Tree Forwarding and Service Chaining for SDN Controllers
//! This is the control-plane core of a software-defined network controller. It keeps a live view of
//! the switches, links and hosts, bounds flooding to a spanning tree, and makes the forwarding
//! decisions of a learning switch. In service-chain mode, it additionally installs VLAN-tag based
//! flow rules which steer all traffic between two hosts through a fixed sequence of middleboxes.
//!
//! ## Structure
//!
//! This library is structured in the following way:
//!
//! - **[`Controller`](controller)**: The controller and all of its components. See the main
//!   structure [`Controller`](controller::Controller), which processes all
//!   [`Event`](controller::Event)s delivered by the protocol stack.
//!
//! - **[`Config`](config)**: The configuration of the controller, which selects the operating mode
//!   and describes the deployment of the service chain.
//!
//! - **[`Example Topologies`](example_topologies)**: Topologies used to exercise the controller,
//!   given as the sequence of events a protocol stack would deliver.
//!
//! The wire encoding of OpenFlow messages and the connection handling are not part of this
//! library. They belong to the protocol stack, which translates its messages to
//! [`Event`](controller::Event)s, and which receives all
//! [`Command`](controller::Command)s through a [`CommandSink`](controller::CommandSink).

pub mod config;
pub mod controller;
mod error;
pub mod example_topologies;
mod test;

pub use error::Error;
