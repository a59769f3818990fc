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

use super::dataplane::{DataPlane, Frame};
use crate::config::ControllerConfig;
use crate::controller::event::read_trace;
use crate::controller::path::resolve_host_path;
use crate::controller::{
    Command, Controller, ControllerError, Event, FlowAction, MacAddr, PacketBuffer, PortNo,
    SwitchId,
};
use crate::example_topologies::{ExampleTopology, ExtendedServiceChainNet, ServiceChainNet};
use lazy_static::lazy_static;
use maplit::btreemap;

lazy_static! {
    static ref S1: SwitchId = 1.into();
    static ref S2: SwitchId = 2.into();
    static ref S3: SwitchId = 3.into();
    static ref S4: SwitchId = 4.into();
    static ref S5: SwitchId = 5.into();
    static ref H1: MacAddr = MacAddr::from_host_id(1);
    static ref H3: MacAddr = MacAddr::from_host_id(3);
    static ref H4: MacAddr = MacAddr::from_host_id(4);
    static ref H5: MacAddr = MacAddr::from_host_id(5);
    static ref M1: MacAddr = MacAddr::from_host_id(0x21);
    static ref M2: MacAddr = MacAddr::from_host_id(0x22);
    static ref M3: MacAddr = MacAddr::from_host_id(0x23);
}

/// Wire the data plane of the topology, including the middleboxes.
fn data_plane(events: &[Event], seeded: &[Command]) -> DataPlane {
    let mut dp = DataPlane::from_events(events);
    dp.add_middlebox(*M1, *S1, 3, 4);
    dp.add_middlebox(*M2, *S1, 5, 6);
    dp.add_middlebox(*M3, *S3, 3, 4);
    dp.install(seeded);
    dp
}

/// Let the switch of `dst` learn `dst`, and then send a frame from `src` to `dst` into this
/// switch, on a port different from the one of `dst`. Returns the commands of the second event.
fn trigger(
    c: &mut Controller,
    switch: SwitchId,
    in_port: PortNo,
    src: MacAddr,
    dst: MacAddr,
) -> Result<Vec<Command>, ControllerError> {
    let mut commands: Vec<Command> = Vec::new();
    c.handle_event(Event::packet_in(switch, 1, dst, src), &mut commands)?;
    commands.clear();
    c.handle_event(Event::packet_in(switch, in_port, src, dst), &mut commands)?;
    Ok(commands)
}

fn num_installed(commands: &[Command]) -> usize {
    commands.iter().filter(|c| c.is_flow_rule()).count()
}

#[test]
fn seeded_on_connect() {
    let (c, commands) = ServiceChainNet::controller().unwrap();
    let chain = c.service_chain().unwrap();
    assert_eq!(chain.head(), *S1);
    assert_eq!(commands.len(), 6);
    for s in [*S1, *S2, *S3].iter() {
        let rules: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                Command::InstallFlowRule { switch, rule } if switch == s => Some(rule.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(rules, chain.table().seed_rules(*s));
        assert_eq!(rules.len(), 2);
    }

    // a reconnecting switch is seeded again
    let mut c = c;
    let mut commands: Vec<Command> = Vec::new();
    c.handle_event(Event::SwitchEnter(*S2), &mut commands).unwrap();
    assert_eq!(num_installed(&commands), 2);
    assert!(commands.iter().all(|c| c.switch() == *S2));
}

#[test]
fn middleboxes_are_no_hosts() {
    let (c, _) = ServiceChainNet::controller().unwrap();
    let t = c.topology();
    for m in [*M1, *M2, *M3].iter() {
        assert_eq!(t.host_switch(*m), None);
    }
    assert_eq!(t.hosts(*S1), Some(&btreemap! {*H1 => 1}));
    assert_eq!(t.hosts(*S3), Some(&btreemap! {*H3 => 1}));
    assert_eq!(resolve_host_path(t, c.spanning_tree(), *H1, *H3), Ok(vec![*S1, *S2, *S3]));
}

#[test]
fn steer_through_chain() {
    let (mut c, seeded) = ServiceChainNet::controller().unwrap();
    let mut dp = data_plane(&ServiceChainNet::events(), &seeded);

    // nothing is steered before the destination was learned
    assert!(dp.send(*S1, 1, Frame::new(*H1, *H3)).is_err());

    let commands = trigger(&mut c, *S3, 2, *H1, *H3).unwrap();
    // h1 is attached to the head: delivery and entry. h3: delivery, injection, two relay
    // rules on s2, entry and exit.
    assert_eq!(num_installed(&commands), 8);
    assert_eq!(dp.num_rules(*S2), 2);
    // the frame which triggered the rules is still forwarded
    assert_eq!(
        commands.last(),
        Some(&Command::PacketOut {
            switch: *S3,
            buffer: PacketBuffer::Payload(vec![]),
            in_port: 2,
            actions: vec![FlowAction::Output(1)],
        })
    );
    // no learned rule is installed in service-chain mode
    assert!(commands
        .iter()
        .all(|c| !matches!(c, Command::InstallFlowRule { rule, .. } if rule.priority != 0)));

    dp.install(&commands);
    assert_eq!(dp.num_rules(*S1), 6);
    assert_eq!(dp.num_rules(*S2), 4);
    assert_eq!(dp.num_rules(*S3), 4);

    let trace = dp.send(*S1, 1, Frame::new(*H1, *H3)).unwrap();
    assert_eq!(trace.receiver, *H3);
    assert_eq!(trace.frame, Frame::new(*H1, *H3));
    assert_eq!(trace.middleboxes, vec![*M1, *M3, *M2]);
    assert_eq!(trace.switches.first(), Some(&*S1));
    assert_eq!(trace.switches.last(), Some(&*S3));

    let trace = dp.send(*S3, 1, Frame::new(*H3, *H1)).unwrap();
    assert_eq!(trace.receiver, *H1);
    assert!(trace.frame.vlan.is_empty());
    assert_eq!(trace.middleboxes, vec![*M1, *M3, *M2]);
    assert_eq!(trace.switches.last(), Some(&*S1));
}

#[test]
fn steering_is_repeatable() {
    let (mut c, seeded) = ServiceChainNet::controller().unwrap();
    let first = trigger(&mut c, *S3, 2, *H1, *H3).unwrap();
    let second = trigger(&mut c, *S3, 2, *H1, *H3).unwrap();
    assert_eq!(first, second);

    let mut dp = data_plane(&ServiceChainNet::events(), &seeded);
    dp.install(&first);
    dp.install(&second);
    assert_eq!(dp.num_rules(*S1), 6);
    assert_eq!(dp.send(*S1, 1, Frame::new(*H1, *H3)).unwrap().receiver, *H3);
}

#[test]
fn steer_across_network() {
    let (mut c, seeded) = ExtendedServiceChainNet::controller().unwrap();
    assert_eq!(
        resolve_host_path(c.topology(), c.spanning_tree(), *H4, *H5),
        Ok(vec![*S4, *S3, *S2, *S1, *S5])
    );
    let mut dp = data_plane(&ExtendedServiceChainNet::events(), &seeded);

    let commands = trigger(&mut c, *S5, 2, *H4, *H5).unwrap();
    // h4: delivery, injection, four relay rules, entry and exit. h5: delivery, injection, entry
    // and exit.
    assert_eq!(num_installed(&commands), 12);
    dp.install(&commands);

    let trace = dp.send(*S4, 1, Frame::new(*H4, *H5)).unwrap();
    assert_eq!(trace.receiver, *H5);
    assert!(trace.frame.vlan.is_empty());
    assert_eq!(trace.middleboxes, vec![*M1, *M3, *M2]);
    assert_eq!(trace.switches.first(), Some(&*S4));
    assert_eq!(trace.switches.last(), Some(&*S5));

    let trace = dp.send(*S5, 1, Frame::new(*H5, *H4)).unwrap();
    assert_eq!(trace.receiver, *H4);
    assert!(trace.frame.vlan.is_empty());
    assert_eq!(trace.middleboxes, vec![*M1, *M3, *M2]);
}

fn packet_out(switch: SwitchId, in_port: PortNo, out_port: PortNo) -> Command {
    Command::PacketOut {
        switch,
        buffer: PacketBuffer::Payload(vec![]),
        in_port,
        actions: vec![FlowAction::Output(out_port)],
    }
}

#[test]
fn head_not_on_path() {
    let (mut c, _) = ExtendedServiceChainNet::controller().unwrap();
    let mut commands: Vec<Command> = Vec::new();
    c.handle_event(Event::packet_in(*S4, 1, *H4, *H3), &mut commands).unwrap();
    commands.clear();

    // no steering rules, but the frame still reaches h4
    assert_eq!(
        c.handle_event(Event::packet_in(*S4, 2, *H3, *H4), &mut commands),
        Err(ControllerError::ChainHeadNotOnPath(vec![*S3, *S4]))
    );
    assert_eq!(commands, vec![packet_out(*S4, 2, 1)]);
}

#[test]
fn head_not_on_path_every_frame_is_forwarded() {
    let (mut c, _) = ExtendedServiceChainNet::controller().unwrap();
    let mut commands: Vec<Command> = Vec::new();
    c.handle_event(Event::packet_in(*S3, 1, *H3, *H4), &mut commands).unwrap();
    c.handle_event(Event::packet_in(*S4, 1, *H4, *H3), &mut commands).unwrap();
    commands.clear();

    for _ in 0..2 {
        assert_eq!(
            c.handle_event(Event::packet_in(*S3, 5, *H4, *H3), &mut commands),
            Err(ControllerError::ChainHeadNotOnPath(vec![*S4, *S3]))
        );
        assert_eq!(commands, vec![packet_out(*S3, 5, 1)]);
        commands.clear();
    }
    assert_eq!(c.forwarding_engine().lookup(*S3, *H4), Some(5));
}

#[test]
fn unknown_host_is_still_forwarded() {
    let (mut c, _) = ServiceChainNet::controller().unwrap();
    let h9 = MacAddr::from_host_id(9);
    let commands = trigger(&mut c, *S3, 2, h9, *H3).unwrap();
    assert_eq!(commands, vec![packet_out(*S3, 2, 1)]);
}

#[test]
fn flood_in_chain_mode() {
    let (mut c, _) = ServiceChainNet::controller().unwrap();
    let mut commands: Vec<Command> = Vec::new();
    c.handle_event(Event::packet_in(*S2, 1, *H1, *H3), &mut commands).unwrap();
    // s2 has no hosts, the frame continues along the tree only
    assert_eq!(
        commands,
        vec![Command::PacketOut {
            switch: *S2,
            buffer: PacketBuffer::Payload(vec![]),
            in_port: 1,
            actions: vec![FlowAction::Output(2)],
        }]
    );
}

#[test]
fn demo_trace() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../demos");
    let config = ControllerConfig::from_json_file(format!("{}/service_chain_config.json", dir));
    let config = config.unwrap();
    assert_eq!(config, ServiceChainNet::config());

    let events = read_trace(format!("{}/service_chain_events.json", dir)).unwrap();
    assert_eq!(&events[..10], ServiceChainNet::events().as_slice());

    let mut c = Controller::new(config).unwrap();
    let mut commands: Vec<Command> = Vec::new();
    for e in events {
        c.handle_event(e, &mut commands).unwrap();
    }
    // seeded table, the flooded frame, the steering rules and the buffered frame
    assert_eq!(num_installed(&commands), 14);
    assert_eq!(commands.len(), 16);
    assert!(matches!(
        commands.last(),
        Some(Command::PacketOut { buffer: PacketBuffer::Buffered(12), .. })
    ));
}
