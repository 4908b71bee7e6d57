use domain_resolution::cli::{Cli, Command};
use domain_resolution::config::ResolutionConfig;
use domain_resolution::errors::ResolutionError;
use domain_resolution::namehash::TokenId;
use domain_resolution::onchain::HttpTransport;
use domain_resolution::output;
use domain_resolution::resolution::{normalize, Resolution};
use domain_resolution::rpc::{ResolutionApiServer, ResolutionRpc};
use domain_resolution::services::ServiceName;

use clap::Parser;
use jsonrpsee::server::Server;
use std::{sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Lookups log warnings only; the server logs requests at info.
fn init_tracing(json: bool, default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Main entry point for the resolver
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let serving = matches!(cli.command, Command::Serve { .. });
    init_tracing(cli.log_json, if serving { "info" } else { "warn" });

    let config = match &cli.config {
        Some(path) => ResolutionConfig::from_file(path)?,
        None => ResolutionConfig::mainnet(),
    }
    .with_providers(cli.eth_rpc.clone(), cli.polygon_rpc.clone(), cli.zil_rpc.clone())
    .with_api_keys(cli.eth_api_key.clone(), cli.polygon_api_key.clone(), cli.zil_api_key.clone());

    let transport =
        HttpTransport::new(Duration::from_secs(cli.timeout_secs))?.with_api_keys(config.api_keys());
    let resolution = Arc::new(config.build(Arc::new(transport))?);

    if let Command::Serve { addr, port } = &cli.command {
        return serve(resolution, addr, *port).await;
    }

    if let Err(err) = run(&resolution, cli.command).await {
        output::print_error(&err);
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(resolution: Arc<Resolution>, addr: &str, port: u16) -> eyre::Result<()> {
    let services: Vec<ServiceName> = resolution.services().collect();
    let server = Server::builder().build(format!("{addr}:{port}")).await?;
    let local_addr = server.local_addr()?;
    let handle = server.start(ResolutionRpc::new(resolution).into_rpc());

    output::print_serving(&local_addr.to_string(), &services);
    info!(target: "resolution::rpc", %local_addr, "resolution_* namespace registered");

    tokio::select! {
        _ = handle.clone().stopped() => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "resolution::rpc", "shutting down");
            handle.stop()?;
            handle.stopped().await;
        }
    }
    Ok(())
}

async fn run(resolution: &Resolution, command: Command) -> Result<(), ResolutionError> {
    match command {
        Command::Namehash { domain } => {
            let domain = normalize(&domain);
            let namehash = resolution.namehash(&domain).to_hex();
            output::print_namehash(&domain, ServiceName::classify(&domain), &namehash);
        }
        Command::Supported { domain } => {
            output::print_supported(&domain, resolution.is_supported(&domain).await?);
        }
        Command::Owner { domain } => {
            let owner = resolution.owner(&domain).await?;
            output::print_header("Owner", &domain);
            output::print_address("Owner", &owner);
        }
        Command::Owners { domains } => {
            output::print_owners(&resolution.batch_owners(&domains).await?);
        }
        Command::Resolver { domain } => {
            let resolver = resolution.resolver(&domain).await?;
            output::print_header("Resolver", &domain);
            output::print_address("Resolver", &resolver);
        }
        Command::Record { domain, key } => {
            let value = resolution.record(&domain, &key).await?;
            output::print_header("Record", &domain);
            output::print_value(&key, &value);
        }
        Command::Records { domain, keys } => {
            output::print_records(&domain, &resolution.records(&domain, &keys).await?);
        }
        Command::Addr { domain, ticker } => {
            let address = resolution.addr(&domain, &ticker).await?;
            output::print_header("Address", &domain);
            output::print_value(&ticker.to_uppercase(), &address);
        }
        Command::TokenUri { domain, metadata } => {
            let uri = resolution.token_uri(&domain).await?;
            output::print_header("Token URI", &domain);
            output::print_value("URI", &uri);
            if metadata {
                output::print_metadata(&resolution.token_uri_metadata(&domain).await?);
            }
        }
        Command::OwnedBy { owner } => {
            output::print_domains(&owner, &resolution.domains_owned_by(owner).await?);
        }
        Command::Locations { domains } => {
            output::print_locations(&resolution.locations(&domains).await?);
        }
        Command::Unhash { token_id, service } => {
            let token = TokenId::from_hex(&token_id).ok_or_else(|| {
                ResolutionError::BadRequestOrResponse(format!("invalid token id {token_id}"))
            })?;
            let domain = resolution.unhash(token, service).await?;
            output::print_header("Unhash", &token.to_hex());
            output::print_value("Domain", &domain);
        }
        Command::Reverse { address } => {
            let domain = resolution.reverse(address).await?;
            output::print_header("Reverse", &address.to_checksum(None));
            output::print_value("Domain", &domain);
        }
        Command::Serve { .. } => {}
    }
    Ok(())
}
