use std::path::PathBuf;

use clap::Parser;

use bookswap_config::BookswapConfig;

/// Book Swap server: HTTP API host with the community chat.
#[derive(Parser, Debug)]
#[command(name = "bookswap-server", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on (overrides PORT and the config file).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply(&self, config: &mut BookswapConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
