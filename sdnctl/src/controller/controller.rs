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

//! # Controller
//!
//! The controller owns the entire state: the topology, the spanning tree, the learning tables and
//! the service chain. [`Controller::handle_event`] is the only way to change it. Events must be
//! delivered one after the other; use [`SharedController`] if they originate from multiple
//! threads.

use crate::config::{ConfigError, ControllerConfig};
use crate::controller::command::{Command, CommandSink, PacketBuffer};
use crate::controller::flow::FlowAction;
use crate::controller::forwarding::{ForwardingDecision, ForwardingEngine};
use crate::controller::printer;
use crate::controller::service_chain::ServiceChain;
use crate::controller::topology::HostUpdate;
use crate::controller::{
    ControllerError, Event, MacAddr, PortNo, SpanningTree, SwitchId, Topology,
};
use log::*;
use std::sync::{Arc, Mutex, PoisonError};

/// # SDN Controller
///
/// Without a service chain, the controller behaves as a learning switch, which floods frames for
/// unknown destinations along the spanning tree. With a service chain, it additionally steers all
/// traffic between two hosts through the middleboxes, once the destination was learned.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ControllerConfig,
    topo: Topology,
    tree: SpanningTree,
    engine: ForwardingEngine,
    chain: Option<ServiceChain>,
}

impl Controller {
    /// Create a new controller without any switch. The configuration is validated first.
    pub fn new(config: ControllerConfig) -> Result<Self, ConfigError> {
        let chain = match config.service_chain.as_ref() {
            Some(c) => Some(ServiceChain::new(c)?),
            None => None,
        };
        Ok(Self {
            topo: Topology::new(config.host_port),
            tree: SpanningTree::empty(),
            engine: ForwardingEngine::new(),
            chain,
            config,
        })
    }

    /// Process a single event. All commands are sent to `sink`.
    ///
    /// If an error is returned, the event was dropped, with one exception: if the path between
    /// two hosts does not cross the head of the service chain (`ChainHeadNotOnPath`), no steering
    /// rules are installed, but the frame is still forwarded before the error is returned. Other
    /// recoverable steering errors are only logged.
    pub fn handle_event<S: CommandSink>(
        &mut self,
        event: Event,
        sink: &mut S,
    ) -> Result<(), ControllerError> {
        trace!("Handle event: {:?}", event);
        let result = match event {
            Event::SwitchEnter(switch) => self.switch_enter(switch, sink),
            Event::SwitchLeave(switch) => self.switch_leave(switch),
            Event::LinkAdd { src, src_port, dst, dst_port } => {
                self.topo.add_link(src, src_port, dst, dst_port).map(|_| self.rebuild_tree())
            }
            Event::HostAdd { mac, switch, port } => self.host_add(mac, switch, port),
            Event::PacketIn { switch, in_port, src, dst, control_frame, buffer } => {
                if control_frame {
                    trace!("{}: ignoring control frame from {}", switch, src);
                    Ok(())
                } else {
                    self.packet_in(switch, in_port, src, dst, buffer, sink)
                }
            }
        };
        match result.as_ref() {
            Err(e) if matches!(e, ControllerError::ChainHeadNotOnPath(_)) => {
                error!("Cannot steer traffic into the service chain: {}", e)
            }
            Err(e) if !e.is_recoverable() => error!("Event dropped: {}", e),
            _ => {}
        }
        result
    }

    fn switch_enter<S: CommandSink>(
        &mut self,
        switch: SwitchId,
        sink: &mut S,
    ) -> Result<(), ControllerError> {
        self.topo.add_switch(switch);
        // the switch might have lost its table, so it is seeded on every connect
        if let Some(chain) = self.chain.as_ref() {
            let rules = chain.table().seed_rules(switch);
            if !rules.is_empty() {
                debug!("{}: seeding {} chain table entries", switch, rules.len());
            }
            for rule in rules {
                sink.install_flow_rule(switch, rule);
            }
        }
        self.rebuild_tree();
        Ok(())
    }

    fn switch_leave(&mut self, switch: SwitchId) -> Result<(), ControllerError> {
        let hosts = self.topo.remove_switch(switch)?;
        let entries = self.engine.purge_switch(switch);
        debug!(
            "{} left: {} hosts and {} learning table entries removed",
            switch,
            hosts.len(),
            entries
        );
        self.rebuild_tree();
        Ok(())
    }

    fn host_add(
        &mut self,
        mac: MacAddr,
        switch: SwitchId,
        port: PortNo,
    ) -> Result<(), ControllerError> {
        if self.chain.as_ref().map(|c| c.is_middlebox(mac)).unwrap_or(false) {
            warn!("Ignoring middlebox {} at {}:{}", mac, switch, port);
            return Ok(());
        }
        match self.topo.add_host(switch, mac, port)? {
            HostUpdate::Attached | HostUpdate::AlreadyKnown => {}
            HostUpdate::IgnoredPort => {
                warn!("Ignoring host {} at {}:{} (not a host port)", mac, switch, port)
            }
            HostUpdate::AttachedElsewhere(s, p) => {
                warn!("Ignoring host {} at {}:{}, it is attached to {}:{}", mac, switch, port, s, p)
            }
        }
        self.rebuild_tree();
        Ok(())
    }

    fn packet_in<S: CommandSink>(
        &mut self,
        switch: SwitchId,
        in_port: PortNo,
        src: MacAddr,
        dst: MacAddr,
        buffer: PacketBuffer,
        sink: &mut S,
    ) -> Result<(), ControllerError> {
        let decision = self.engine.decide(&self.topo, &self.tree, switch, in_port, src, dst)?;
        trace!("{}: {} -> {}: {}", switch, src, dst, printer::decision(&decision));

        let mut steering_error: Option<ControllerError> = None;
        if let ForwardingDecision::Unicast { flow_rule, .. } = &decision {
            match self.chain.as_ref() {
                None => sink.install_flow_rule(switch, flow_rule.clone()),
                Some(chain) if self.topo.host_switch(dst) == Some(switch) => {
                    match chain.pair_rules(&self.topo, &self.tree, src, dst) {
                        Ok(rules) => {
                            debug!("Steering {} <-> {}: {} rules", src, dst, rules.len());
                            for (s, rule) in rules {
                                sink.install_flow_rule(s, rule);
                            }
                        }
                        Err(e) if e.is_recoverable() => {
                            debug!("Cannot steer {} <-> {} yet: {}", src, dst, e)
                        }
                        Err(e) if matches!(e, ControllerError::ChainHeadNotOnPath(_)) => {
                            steering_error = Some(e)
                        }
                        Err(e) => return Err(e),
                    }
                }
                Some(_) => {}
            }
        }

        let out_ports = decision.out_ports();
        if !out_ports.is_empty() {
            let actions = out_ports.into_iter().map(FlowAction::Output).collect();
            sink.packet_out(switch, buffer, in_port, actions);
        }
        match steering_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn rebuild_tree(&mut self) {
        self.tree = SpanningTree::build(&self.topo, self.config.root);
        trace!("Spanning tree:\n{}", printer::spanning_tree(&self.tree));
    }

    /// Returns the configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the current topology
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// Returns the current spanning tree
    pub fn spanning_tree(&self) -> &SpanningTree {
        &self.tree
    }

    /// Returns the learning tables
    pub fn forwarding_engine(&self) -> &ForwardingEngine {
        &self.engine
    }

    /// Returns the service chain, if the controller operates in service-chain mode.
    pub fn service_chain(&self) -> Option<&ServiceChain> {
        self.chain.as_ref()
    }
}

/// Controller which can be shared between threads. All events are serialized by a single lock,
/// such that no event observes the partial update of another one. Cloning the handle shares the
/// same controller.
#[derive(Debug, Clone)]
pub struct SharedController {
    inner: Arc<Mutex<Controller>>,
}

impl SharedController {
    /// Share the controller
    pub fn new(controller: Controller) -> Self {
        Self { inner: Arc::new(Mutex::new(controller)) }
    }

    /// Process a single event, and return all commands generated while processing it.
    pub fn handle_event(&self, event: Event) -> Result<Vec<Command>, ControllerError> {
        let mut commands: Vec<Command> = Vec::new();
        let mut controller = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        controller.handle_event(event, &mut commands)?;
        Ok(commands)
    }

    /// Access the controller while holding the lock.
    pub fn with<R, F: FnOnce(&Controller) -> R>(&self, f: F) -> R {
        let controller = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&controller)
    }
}
