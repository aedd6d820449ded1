mod cli;
mod command_handler;
mod commands;

use clap::Parser;
use cli::Cli;
use command_handler::handle_command;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    handle_command(cli.command)
}
