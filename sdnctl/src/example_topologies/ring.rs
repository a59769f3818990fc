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
use crate::config::ControllerConfig;
use crate::controller::Event;

/// # Ring
///
/// Three switches connected in a ring. Host `hi` is attached to port 1 of switch `si`.
///
/// ```text
///        h1
///        |1
///        s1
///     2/    \3
///    3/      \2
///   s2 ------ s3
///   |1 2    3 |1
///   h2        h3
/// ```
#[derive(Debug)]
pub struct RingNet {}

impl ExampleTopology for RingNet {
    fn config() -> ControllerConfig {
        ControllerConfig::default()
    }

    fn events() -> Vec<Event> {
        vec![
            switch(1),
            switch(2),
            switch(3),
            link(1, 2, 2, 3),
            link(2, 2, 3, 3),
            link(3, 2, 1, 3),
            host(1, 1, 1),
            host(2, 2, 1),
            host(3, 3, 1),
        ]
    }
}
