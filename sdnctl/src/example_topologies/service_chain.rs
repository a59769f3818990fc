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

use super::{host, link, switch, ExampleTopology};
use crate::config::{ChainPort, ChainSwitchConfig, ControllerConfig, ServiceChainConfig};
use crate::controller::{ChainEntry, ChainRole, Event, MacAddr, PortNo, SwitchId, VlanId};

/// Tag of frames sent to the first middlebox `m1`
const VLAN_M1: u16 = 1;
/// Tag of frames sent to the second middlebox `m3`
const VLAN_M3: u16 = 2;
/// Tag of frames sent to the last middlebox `m2`
const VLAN_M2: u16 = 3;
/// Tag of frames in the tunnel between `s1` and `s3` through `s2`
const VLAN_TUNNEL: u16 = 4;
const VLAN_POLICY_COMPLETE: u16 = 5;
const VLAN_APPLY_CHAIN: u16 = 7;

fn entry(in_port: PortNo, in_vlan: u16, out_port: PortNo, out_vlan: u16) -> ChainEntry {
    ChainEntry::new(in_port, VlanId(in_vlan), out_port, VlanId(out_vlan))
}

/// Chain `m1 -> m3 -> m2` with the head on `s1`.
fn chain_config() -> ServiceChainConfig {
    ServiceChainConfig {
        head: SwitchId(1),
        apply_chain_vlan: VlanId(VLAN_APPLY_CHAIN),
        policy_complete_vlan: VlanId(VLAN_POLICY_COMPLETE),
        entry: ChainPort { port: 3, vlan: VlanId(VLAN_M1) },
        exit_vlan: VlanId(VLAN_M2),
        middleboxes: (0x21..=0x23).map(MacAddr::from_host_id).collect(),
        switches: vec![
            ChainSwitchConfig {
                id: SwitchId(1),
                role: ChainRole::Middlebox,
                table: vec![
                    entry(4, VLAN_M1, 2, VLAN_TUNNEL),
                    entry(2, VLAN_TUNNEL, 5, VLAN_M2),
                ],
            },
            ChainSwitchConfig {
                id: SwitchId(2),
                role: ChainRole::Tunnel,
                table: vec![
                    entry(1, VLAN_TUNNEL, 2, VLAN_TUNNEL),
                    entry(2, VLAN_TUNNEL, 1, VLAN_TUNNEL),
                ],
            },
            ChainSwitchConfig {
                id: SwitchId(3),
                role: ChainRole::Middlebox,
                table: vec![
                    entry(2, VLAN_TUNNEL, 3, VLAN_M3),
                    entry(4, VLAN_M3, 2, VLAN_TUNNEL),
                ],
            },
        ],
    }
}

/// # Service Chain
///
/// Line of three switches. Host `h1` is attached to `s1`, and `h3` to `s3`. The middleboxes `m1`
/// and `m2` are attached to `s1`, and `m3` to `s3`, each with a separate port for both directions.
/// `s2` only tunnels tagged frames between `s1` and `s3`. All traffic traverses the middleboxes
/// in the order `m1`, `m3`, `m2`.
///
/// ```text
///          m1  m2                 m3
///         3|4 5|6                3|4
///   h1 --1-- s1 --2------1-- s2 --2------2-- s3 --1-- h3
/// ```
#[derive(Debug)]
pub struct ServiceChainNet {}

impl ExampleTopology for ServiceChainNet {
    fn config() -> ControllerConfig {
        ControllerConfig { service_chain: Some(chain_config()), ..Default::default() }
    }

    fn events() -> Vec<Event> {
        vec![
            switch(1),
            switch(2),
            switch(3),
            link(1, 2, 2, 1),
            link(2, 2, 3, 2),
            host(1, 1, 1),
            host(3, 3, 1),
            host(0x21, 1, 3),
            host(0x22, 1, 5),
            host(0x23, 3, 3),
        ]
    }
}

/// # Extended Service Chain
///
/// Same as [`ServiceChainNet`], with two additional switches: `s4` (with host `h4`) is attached to
/// port 5 of `s3`, and `s5` (with host `h5`) to port 7 of `s1`. Both use port 2 towards the rest of
/// the network. Traffic between `h4` and `h5` crosses the whole network, and traverses the same
/// chain.
#[derive(Debug)]
pub struct ExtendedServiceChainNet {}

impl ExampleTopology for ExtendedServiceChainNet {
    fn config() -> ControllerConfig {
        ServiceChainNet::config()
    }

    fn events() -> Vec<Event> {
        let mut events = ServiceChainNet::events();
        events.extend(vec![
            switch(4),
            switch(5),
            link(3, 5, 4, 2),
            link(1, 7, 5, 2),
            host(4, 4, 1),
            host(5, 5, 1),
        ]);
        events
    }
}
