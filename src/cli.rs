use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "teamster")]
#[command(about = "Custom background image server for Teams", long_about = None)]
pub struct Cli {
    /// Path to the config file (TOML or JSON)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print the manifest JSON, generating missing thumbnails
    Manifest,
    /// Point the teams-for-linux config at this server and exit
    TeamsConfig,
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to, overriding the config
    #[arg(long)]
    pub address: Option<SocketAddr>,
}
