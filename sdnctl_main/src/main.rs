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

use sdnctl::config::ControllerConfig;
use sdnctl::controller::event::read_trace;
use sdnctl::controller::{printer, Command, Controller, Event, MacAddr};
use sdnctl::example_topologies::*;

use clap::{Parser, Subcommand, ValueEnum};
use log::*;
use std::error::Error;
use std::path::PathBuf;

mod ping;
use ping::ping;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    match args.cmd {
        MainCommand::Replay { config, events } => {
            let config = match config {
                Some(path) => ControllerConfig::from_json_file(path)?,
                None => ControllerConfig::default(),
            };
            let mut controller = Controller::new(config)?;
            let events = read_trace(events)?;
            info!("Replaying {} events", events.len());

            let mut commands: Vec<Command> = Vec::new();
            for event in events {
                let description = printer::event(&event);
                if let Err(e) = controller.handle_event(event, &mut commands) {
                    warn!("{}: {}", description, e);
                }
            }
            print_commands(&commands, args.json)?;
            printer::print_spanning_tree(controller.spanning_tree());
        }
        MainCommand::Example { topology, ping: hosts } => {
            let (mut controller, mut commands) = match topology {
                ExampleSelection::Ring => RingNet::controller()?,
                ExampleSelection::ServiceChain => ServiceChainNet::controller()?,
                ExampleSelection::ExtendedServiceChain => ExtendedServiceChainNet::controller()?,
            };
            if let [src, dst] = hosts.as_slice() {
                for (a, b) in [(*src, *dst), (*dst, *src)].iter() {
                    let outcome = ping(&mut controller, *a, *b)?;
                    info!("{} -> {}: {} copies delivered", a, b, outcome.delivered);
                    commands.extend(outcome.commands);
                }
            }
            print_commands(&commands, args.json)?;
            printer::print_spanning_tree(controller.spanning_tree());
        }
        MainCommand::Events { topology } => {
            let events: Vec<Event> = match topology {
                ExampleSelection::Ring => RingNet::events(),
                ExampleSelection::ServiceChain => ServiceChainNet::events(),
                ExampleSelection::ExtendedServiceChain => ExtendedServiceChainNet::events(),
            };
            println!("{}", serde_json::to_string_pretty(&events)?);
        }
    }

    Ok(())
}

fn print_commands(commands: &[Command], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(commands)?);
    } else {
        for c in commands {
            println!("{}", printer::command(c));
        }
    }
    Ok(())
}

#[derive(Parser, Debug)]
#[clap(name = "SDN Controller (Binary)", author = "Tibor Schneider")]
struct CommandLineArguments {
    /// Print all commands as JSON
    #[clap(long)]
    json: bool,
    /// Main Command
    #[clap(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Replay a trace of events, and print all generated commands and the final spanning tree
    #[clap(name = "replay")]
    Replay {
        /// Controller configuration (JSON). Without it, the controller runs in spanning-tree mode.
        #[clap(short = 'c', long)]
        config: Option<PathBuf>,
        /// Trace of events (JSON)
        #[clap(short = 'e', long)]
        events: PathBuf,
    },
    /// Build one of the example topologies
    #[clap(name = "example")]
    Example {
        /// Topology to build
        #[clap(value_enum)]
        topology: ExampleSelection,
        /// Send a frame from the first to the second host, and the answer back, e.g.,
        /// `--ping 00:00:00:00:00:01 00:00:00:00:00:03`.
        #[clap(short = 'p', long, number_of_values = 2, value_names = &["SRC", "DST"])]
        ping: Vec<MacAddr>,
    },
    /// Print the events of one of the example topologies as JSON
    #[clap(name = "events")]
    Events {
        /// Topology to print
        #[clap(value_enum)]
        topology: ExampleSelection,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum ExampleSelection {
    Ring,
    ServiceChain,
    ExtendedServiceChain,
}
