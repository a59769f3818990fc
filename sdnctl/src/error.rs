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

//! Module containing the crate-level error type

use crate::config::ConfigError;
use crate::controller::{ControllerError, MacParseError};
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error propagated from the controller
    #[error("Controller Error: {0}")]
    ControllerError(#[from] ControllerError),
    /// The configuration is invalid
    #[error("Configuration Error: {0}")]
    ConfigError(#[from] ConfigError),
    /// A MAC address cannot be parsed
    #[error("Invalid MAC address: {0}")]
    MacParseError(#[from] MacParseError),
    /// The event trace cannot be parsed
    #[error("Invalid event trace: {0}")]
    EventTraceError(#[from] serde_json::Error),
    /// The event trace cannot be read
    #[error("Cannot read the event trace: {0}")]
    IoError(#[from] std::io::Error),
}
