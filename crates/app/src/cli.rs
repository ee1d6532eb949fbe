//! Command-line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Single-room TCP chat", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat server
    Server(ServerArgs),
    /// Connect to a server and chat from the terminal
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServerArgs {
    /// Port to listen on [default: 14001]
    #[arg(long, visible_alias = "csp")]
    pub port: Option<u16>,

    /// Address to bind [default: localhost]
    #[arg(long)]
    pub address: Option<String>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Server host [default: localhost]
    #[arg(long, visible_alias = "cca")]
    pub address: Option<String>,

    /// Server port [default: 14001]
    #[arg(long, visible_alias = "ccp")]
    pub port: Option<u16>,

    /// Display name; prompted for when absent
    #[arg(long)]
    pub name: Option<String>,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
