#![allow(clippy::all)]
use clap::{Parser, Subcommand};
use clap_markdown;

use roiferry_cli::{inspect, transfer};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Transfer(transfer::TransferArgs),
    Inspect(inspect::InspectArgs),
}

fn main() {
    clap_markdown::print_help_markdown::<Cli>();
}
