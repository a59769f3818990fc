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

//! # Controller Configuration
//!
//! The configuration selects the operating mode of the controller and describes the deployment of
//! the service chain. It is loaded from JSON:
//!
//! ```json
//! {
//!   "host_port": 1,
//!   "root": "LowestId",
//!   "service_chain": {
//!     "head": 1,
//!     "apply_chain_vlan": 7,
//!     "policy_complete_vlan": 5,
//!     "entry": { "port": 3, "vlan": 1 },
//!     "exit_vlan": 3,
//!     "middleboxes": ["00:00:00:00:00:21"],
//!     "switches": [
//!       { "id": 2, "role": "tunnel", "table": [
//!         { "in_port": 1, "in_vlan": 4, "out_port": 2, "out_vlan": 4 }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Without `service_chain`, the controller operates as a learning switch on top of the spanning
//! tree.

use crate::controller::service_chain::{ChainEntry, ChainRole, ServiceChainTable};
use crate::controller::{MacAddr, PortNo, RootPolicy, SwitchId, VlanId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration of the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Port to which hosts are attached on every switch. Hosts discovered on other ports are
    /// ignored.
    #[serde(default = "default_host_port")]
    pub host_port: PortNo,
    /// Policy for choosing the root of the spanning tree
    #[serde(default)]
    pub root: RootPolicy,
    /// Deployment of the service chain. If set, the controller operates in service-chain mode.
    #[serde(default)]
    pub service_chain: Option<ServiceChainConfig>,
}

fn default_host_port() -> PortNo {
    1
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self { host_port: default_host_port(), root: RootPolicy::default(), service_chain: None }
    }
}

impl ControllerConfig {
    /// Configuration of a plain learning switch with the given root policy.
    pub fn spanning_tree(root: RootPolicy) -> Self {
        Self { root, ..Default::default() }
    }

    /// Parse and validate the configuration.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Check that the configuration is consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.service_chain.as_ref() {
            Some(chain) => chain.validate(),
            None => Ok(()),
        }
    }

    /// Returns true if the controller operates in service-chain mode.
    pub fn is_service_chain(&self) -> bool {
        self.service_chain.is_some()
    }
}

/// Port and tag on which frames are sent to the first middlebox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPort {
    /// Port on the head to which the first middlebox is attached
    pub port: PortNo,
    /// Tag of frames sent to the first middlebox
    pub vlan: VlanId,
}

/// Description of a single switch in the service chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSwitchConfig {
    /// Datapath id of the switch
    pub id: SwitchId,
    /// Role of the switch
    pub role: ChainRole,
    /// Entries of the pre-seeded table
    #[serde(default)]
    pub table: Vec<ChainEntry>,
}

/// Deployment of the service chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceChainConfig {
    /// Middlebox-bearing switch on which the chain begins and ends
    pub head: SwitchId,
    /// Tag of frames travelling from the sender towards the head
    pub apply_chain_vlan: VlanId,
    /// Tag of frames travelling from the head towards the receiver
    pub policy_complete_vlan: VlanId,
    /// Port and tag of the first middlebox
    pub entry: ChainPort,
    /// Tag of frames leaving the last middlebox
    pub exit_vlan: VlanId,
    /// MAC addresses of all middleboxes. They are never learned as hosts.
    #[serde(default)]
    pub middleboxes: Vec<MacAddr>,
    /// All middlebox-bearing and tunnel switches, together with their table
    #[serde(default)]
    pub switches: Vec<ChainSwitchConfig>,
}

impl ServiceChainConfig {
    /// Check that all tags are assignable, that the stage tags are distinct, that the head is a
    /// middlebox-bearing switch, and that the table is well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let table_tags = self.switches.iter().flat_map(|s| s.table.iter()).flat_map(|e| {
            std::iter::once(e.in_vlan).chain(std::iter::once(e.out_vlan))
        });
        let stage_tags =
            [self.apply_chain_vlan, self.policy_complete_vlan, self.exit_vlan, self.entry.vlan];
        for vlan in stage_tags.iter().copied().chain(table_tags) {
            if !vlan.is_assignable() {
                return Err(ConfigError::InvalidVlan(vlan));
            }
        }

        let mut seen: HashSet<VlanId> = HashSet::new();
        for vlan in stage_tags[..3].iter() {
            if !seen.insert(*vlan) {
                return Err(ConfigError::VlanConflict(*vlan));
            }
        }

        match self.switches.iter().find(|s| s.id == self.head) {
            Some(s) if s.role == ChainRole::Middlebox => {}
            _ => return Err(ConfigError::HeadNotMiddlebox(self.head)),
        }

        ServiceChainTable::from_config(self).map(|_| ())
    }
}

/// Configuration Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tag is outside of the assignable range
    #[error("VLAN id is not within 1..=4094: {0:?}")]
    InvalidVlan(VlanId),
    /// The apply-chain, policy-complete and exit tags must be distinct.
    #[error("VLAN id is used for multiple stages of the chain: {0:?}")]
    VlanConflict(VlanId),
    /// The head is not declared as a middlebox-bearing switch
    #[error("Head of the service chain is not a middlebox-bearing switch: {0:?}")]
    HeadNotMiddlebox(SwitchId),
    /// A tunnel entry would rewrite the tag
    #[error("Tunnel switch {0:?} must not rewrite the tag: {1:?}")]
    TunnelRewrite(SwitchId, ChainEntry),
    /// The switch was declared with a different role before
    #[error("Switch is declared with two different roles: {0:?}")]
    RoleConflict(SwitchId),
    /// The new entry would overwrite an existing one
    #[error("Table entry of {0:?} for port {1} and {2:?} already exists")]
    TableEntryOverload(SwitchId, PortNo, VlanId),
    /// The switch is declared twice
    #[error("Switch is declared twice: {0:?}")]
    DuplicateSwitch(SwitchId),
    /// The configuration file cannot be read
    #[error("Cannot read the configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON
    #[error("Cannot parse the configuration: {0}")]
    Json(#[from] serde_json::Error),
}
