use crate::services::ServiceName;
use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the domain resolver
#[derive(Parser, Debug)]
#[command(name = "resolve", about = "Resolve UNS, ENS and ZNS domains")]
pub struct Cli {
    /// JSON contract directory. Mainnet deployments are used when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ethereum mainnet JSON-RPC provider (UNS L1 and ENS).
    #[arg(long, global = true, env = "ETH_RPC_URL")]
    pub eth_rpc: Option<String>,

    /// Polygon JSON-RPC provider (UNS L2).
    #[arg(long, global = true, env = "POLYGON_RPC_URL")]
    pub polygon_rpc: Option<String>,

    /// Zilliqa JSON-RPC provider.
    #[arg(long, global = true, env = "ZIL_RPC_URL")]
    pub zil_rpc: Option<String>,

    /// Bearer token for the Ethereum provider only.
    #[arg(long, global = true, env = "ETH_API_KEY")]
    pub eth_api_key: Option<String>,

    /// Bearer token for the Polygon provider only.
    #[arg(long, global = true, env = "POLYGON_API_KEY")]
    pub polygon_api_key: Option<String>,

    /// Bearer token for the Zilliqa provider only.
    #[arg(long, global = true, env = "ZIL_API_KEY")]
    pub zil_api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout_secs: u64,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the token id of a domain
    Namehash { domain: String },

    /// Check whether a domain is served by any naming service
    Supported { domain: String },

    /// Print the owner of a domain
    Owner { domain: String },

    /// Print the owners of several domains of one naming service
    Owners {
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Print the resolver contract of a domain
    Resolver { domain: String },

    /// Print one record value
    Record { domain: String, key: String },

    /// Print several record values
    Records {
        domain: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Print the address a domain holds for a currency
    Addr {
        domain: String,
        #[arg(default_value = "ETH")]
        ticker: String,
    },

    /// Print the token URI of a domain, optionally with its metadata
    TokenUri {
        domain: String,
        #[arg(long)]
        metadata: bool,
    },

    /// List the domains an address owns
    OwnedBy { owner: Address },

    /// Print where several domains live
    Locations {
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Recover a domain name from its token id
    Unhash {
        token_id: String,
        #[arg(long, value_parser = parse_service, default_value = "UNS")]
        service: ServiceName,
    },

    /// Print the primary domain an address configured for itself
    Reverse { address: Address },

    /// Serve the `resolution_*` JSON-RPC namespace
    Serve {
        /// HTTP RPC listen address
        #[arg(long, default_value = "127.0.0.1")]
        addr: String,

        /// HTTP RPC port
        #[arg(long, default_value = "8547")]
        port: u16,
    },
}

fn parse_service(s: &str) -> Result<ServiceName, String> {
    match s.to_ascii_uppercase().as_str() {
        "UNS" => Ok(ServiceName::Uns),
        "ENS" => Ok(ServiceName::Ens),
        "ZNS" => Ok(ServiceName::Zns),
        other => Err(format!("unknown naming service {other}")),
    }
}
