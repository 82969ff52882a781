//! CLI module for the Graforest gateway.
//!
//! Subcommands:
//! - `mcp`: Run the gateway over stdio (local IDE integration)
//! - `serve`: Run the gateway over streamable HTTP (cloud deployment)

mod mcp;
mod serve;

pub use serve::{build_router, AuthState};

use clap::{Parser, Subcommand};

/// Graforest - Knowledge Graph Gateway
#[derive(Parser)]
#[command(name = "graforest")]
#[command(about = "Knowledge graph gateway - MCP server for Graforest graph operations")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway over stdio (local IDE integration)
    Mcp,

    /// Run the gateway over streamable HTTP (cloud deployment)
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Mcp => self.run_mcp().await,
            Command::Serve { ref host, port } => self.run_serve(host, port).await,
        }
    }
}
