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

//! Module containing all type definitions

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Switch Identification (the OpenFlow datapath id)
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SwitchId(pub u64);

impl From<u64> for SwitchId {
    fn from(dpid: u64) -> Self {
        Self(dpid)
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Port number local to a switch
pub type PortNo = u32;

/// VLAN identifier, carried in the 802.1Q tag of a frame.
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VlanId(pub u16);

impl VlanId {
    /// Lowest VLAN id that may be assigned to traffic.
    pub const MIN: u16 = 1;
    /// Highest VLAN id that may be assigned to traffic.
    pub const MAX: u16 = 4094;

    /// Returns true if the id can be used as a tag (i.e., it is neither the priority tag `0`, nor
    /// the reserved id `4095`).
    pub fn is_assignable(&self) -> bool {
        (Self::MIN..=Self::MAX).contains(&self.0)
    }
}

/// Ethernet MAC address. It is parsed from and written as the usual colon separated notation
/// (`00:00:00:00:00:01`), which is also its serialized form.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Generate the address `00:00:00:00:00:xx`, as assigned by the emulated test networks.
    pub fn from_host_id(id: u8) -> Self {
        Self([0, 0, 0, 0, 0, id])
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", b[0], b[1], b[2], b[3], b[4], b[5])
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({})", self)
    }
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut num_parts = 0;
        for (i, part) in s.split(':').enumerate() {
            if i >= 6 {
                return Err(MacParseError::InvalidLength(s.to_string()));
            }
            if part.len() != 2 {
                return Err(MacParseError::InvalidOctet(part.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::InvalidOctet(part.to_string()))?;
            num_parts += 1;
        }
        if num_parts != 6 {
            return Err(MacParseError::InvalidLength(s.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for MacAddr {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddr> for String {
    fn from(mac: MacAddr) -> Self {
        mac.to_string()
    }
}

/// Error while parsing a MAC address
#[derive(Error, Debug, PartialEq)]
pub enum MacParseError {
    /// The address does not consist of exactly six octets
    #[error("MAC address must consist of six octets: {0}")]
    InvalidLength(String),
    /// One of the octets is not a two-digit hexadecimal number
    #[error("Invalid octet in MAC address: {0}")]
    InvalidOctet(String),
}

/// Controller Errors
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ControllerError {
    /// The operation references a switch which is not part of the topology
    #[error("Switch is not known in the topology: {0:?}")]
    UnknownSwitch(SwitchId),
    /// The two switches are not connected by the spanning tree
    #[error("No path through the spanning tree: {0:?} -> {1:?}")]
    NoPath(SwitchId, SwitchId),
    /// A path contains a hop for which no link is known. The spanning tree and the topology are
    /// inconsistent.
    #[error("Path hop has no known link: {0:?} -> {1:?}")]
    IncompletePathResolution(SwitchId, SwitchId),
    /// The host was never attached to any switch
    #[error("Host is not attached to any known switch: {0}")]
    UnknownHost(MacAddr),
    /// The path between two hosts does not traverse the head of the service chain.
    #[error("Path does not cross the head of the service chain: {0:?}")]
    ChainHeadNotOnPath(Vec<SwitchId>),
}

impl ControllerError {
    /// Returns true if the error is expected while the topology has not yet converged. The event
    /// which caused it can be dropped, and the operation will succeed once a later event arrives.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoPath(_, _) | Self::UnknownHost(_))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mac_parse() {
        let mac: MacAddr = "00:00:00:00:00:21".parse().unwrap();
        assert_eq!(mac, MacAddr::from_host_id(0x21));
        assert_eq!(mac.to_string(), "00:00:00:00:00:21");
        let mac: MacAddr = "DE:ad:BE:ef:00:ff".parse().unwrap();
        assert_eq!(mac, MacAddr([0xde, 0xad, 0xbe, 0xef, 0x00, 0xff]));
    }

    #[test]
    fn mac_parse_invalid() {
        assert_eq!(
            "00:00:00:00:00".parse::<MacAddr>(),
            Err(MacParseError::InvalidLength("00:00:00:00:00".to_string()))
        );
        assert_eq!(
            "00:00:00:00:00:00:00".parse::<MacAddr>(),
            Err(MacParseError::InvalidLength("00:00:00:00:00:00:00".to_string()))
        );
        assert_eq!(
            "00:00:00:00:0g:00".parse::<MacAddr>(),
            Err(MacParseError::InvalidOctet("0g".to_string()))
        );
        assert_eq!(
            "00:00:00:00:000:0".parse::<MacAddr>(),
            Err(MacParseError::InvalidOctet("000".to_string()))
        );
    }

    #[test]
    fn mac_serde() {
        let mac = MacAddr::from_host_id(3);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"00:00:00:00:00:03\"");
        assert_eq!(serde_json::from_str::<MacAddr>(&json).unwrap(), mac);
        assert!(serde_json::from_str::<MacAddr>("\"00:00\"").is_err());
    }

    #[test]
    fn vlan_range() {
        assert!(!VlanId(0).is_assignable());
        assert!(VlanId(1).is_assignable());
        assert!(VlanId(4094).is_assignable());
        assert!(!VlanId(4095).is_assignable());
    }

    #[test]
    fn recoverable_errors() {
        assert!(ControllerError::NoPath(1.into(), 2.into()).is_recoverable());
        assert!(ControllerError::UnknownHost(MacAddr::from_host_id(1)).is_recoverable());
        assert!(!ControllerError::UnknownSwitch(1.into()).is_recoverable());
        assert!(!ControllerError::IncompletePathResolution(1.into(), 2.into()).is_recoverable());
        assert!(!ControllerError::ChainHeadNotOnPath(vec![]).is_recoverable());
    }
}
