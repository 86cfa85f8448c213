// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::{Parser, Subcommand};
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
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Transfer(transfer_args)) => transfer::transfer(transfer_args),
        Some(Commands::Inspect(inspect_args)) => inspect::inspect(inspect_args),
        None => {}
    }
}
