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

use super::{host, link, switch};
use crate::controller::{Event, PortNo};
use rand::prelude::*;

/// # Random Topology
///
/// Random graph with `n` switches, where every pair of switches is connected with probability
/// `p`. The topology may contain cycles, and it may be partitioned. Host `hi` is attached to port
/// 1 of switch `si`, and the links of every switch use the ports from 2 upwards. There are at most
/// 255 switches, such that every host has a distinct address.
#[derive(Debug)]
pub struct RandomNet {}

impl RandomNet {
    /// Generate the topology notifications. All switches enter first, then the links are added in
    /// random order, and the hosts are added last. The same seed always results in the same
    /// events. `p` is clamped to `0.0..=1.0`, and `NaN` is treated as `0.0`.
    pub fn events(n: u8, p: f64, seed: u64) -> Vec<Event> {
        let p = if p.is_nan() { 0.0 } else { p.max(0.0).min(1.0) };
        let n = n as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut next_port: Vec<PortNo> = vec![2; n as usize + 1];

        let mut links: Vec<Event> = Vec::new();
        for a in 1..=n {
            for b in (a + 1)..=n {
                if rng.gen_bool(p) {
                    links.push(link(a, next_port[a as usize], b, next_port[b as usize]));
                    next_port[a as usize] += 1;
                    next_port[b as usize] += 1;
                }
            }
        }
        links.shuffle(&mut rng);

        let mut events: Vec<Event> = (1..=n).map(switch).collect();
        events.extend(links);
        events.extend((1..=n).map(|i| host(i as u8, i, 1)));
        events
    }
}
