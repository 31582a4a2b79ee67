// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

mod client_main;
mod host_config;
mod host_main;
mod network;
mod tui;

use anyhow::Context;
use clap::{Command, arg};
use host_config::HostConfig;


fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Undercover")
        .version(clap::crate_version!())
        .about("Undercover word game: host a session or join one")
        .subcommand_required(true)
        .subcommand(
            Command::new("host")
                .about("Host a session and play in it")
                .arg(arg!(<player_name> "Your name"))
                .arg(arg!(-c --config <config_file> "Path to the configuration file: yaml-serialized HostConfig")),
        )
        .subcommand(
            Command::new("join")
                .about("Join a session hosted by somebody else")
                .arg(arg!(<host_address> "Host address, e.g. 192.168.0.2:38617"))
                .arg(arg!(<join_code> "Join code shown by the host"))
                .arg(arg!(<player_name> "Your name")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("host", sub_matches)) => {
            let config = match sub_matches.get_one::<String>("config") {
                Some(filename) => read_config_file(filename)?,
                None => HostConfig::default(),
            };
            host_main::run(
                config,
                sub_matches.get_one::<String>("player_name").unwrap().clone(),
            )
        }
        Some(("join", sub_matches)) => client_main::run(client_main::ClientConfig {
            host_address: sub_matches.get_one::<String>("host_address").unwrap().clone(),
            join_code: sub_matches.get_one::<String>("join_code").unwrap().clone(),
            player_name: sub_matches.get_one::<String>("player_name").unwrap().clone(),
        }),
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}

fn read_config_file(filename: &str) -> anyhow::Result<HostConfig> {
    let contents = std::fs::read_to_string(filename)
        .with_context(|| format!("Cannot read config file '{filename}'"))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Cannot parse config file '{filename}'"))
}
