//! Colored console output for the `resolve` binary.
//!
//! Color scheme: blue+bold headers, cyan values, green success,
//! yellow warnings and misses, dimmed secondary text.

use crate::errors::ResolutionError;
use crate::services::{Location, ServiceName, TokenMetadata};
use alloy_primitives::Address;
use colored::Colorize;
use std::collections::BTreeMap;

// ── Helpers ────────────────────────────────────────────────────────

/// Render an optional value, dimming the gap when it is absent.
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// Width of the widest key, for aligned key/value listings.
fn key_width<'a>(keys: impl Iterator<Item = &'a String>) -> usize {
    keys.map(String::len).max().unwrap_or(0)
}

// ── Single Values ──────────────────────────────────────────────────

/// Print a header naming the domain and the service that resolved it.
pub fn print_header(title: &str, subject: &str) {
    println!("{} {}", format!("=== {title} ===").blue().bold(), subject.cyan());
}

pub fn print_value(label: &str, value: &str) {
    println!("  {} {}", format!("{label}:").dimmed(), value.cyan());
}

pub fn print_address(label: &str, address: &Address) {
    print_value(label, &address.to_checksum(None));
}

pub fn print_namehash(domain: &str, service: ServiceName, namehash: &str) {
    print_header("Namehash", domain);
    print_value("Service", service.as_str());
    print_value("Token id", namehash);
}

pub fn print_supported(domain: &str, supported: bool) {
    if supported {
        println!("  {} {} is supported", "OK".green().bold(), domain.cyan());
    } else {
        println!("  {} {} is not supported", "NO".yellow().bold(), domain.cyan());
    }
}

// ── Listings ───────────────────────────────────────────────────────

/// Print record values; empty values are shown as missing.
pub fn print_records(domain: &str, records: &BTreeMap<String, String>) {
    print_header("Records", domain);
    let width = key_width(records.keys());
    for (key, value) in records {
        let value = if value.is_empty() { "(not set)".dimmed() } else { value.cyan() };
        println!("  {:width$} {}", key.dimmed(), value);
    }
}

/// Print per-domain owners; unregistered domains are marked.
pub fn print_owners(owners: &BTreeMap<String, Option<Address>>) {
    print_header("Owners", &owners.len().to_string());
    let width = key_width(owners.keys());
    for (domain, owner) in owners {
        match owner {
            Some(owner) => println!("  {:width$} {}", domain, owner.to_checksum(None).cyan()),
            None => println!("  {:width$} {}", domain, "unregistered".yellow()),
        }
    }
}

pub fn print_domains(owner: &Address, domains: &[String]) {
    print_header("Domains owned by", &owner.to_checksum(None));
    if domains.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for (i, domain) in domains.iter().enumerate() {
        println!("    {}. {}", (i + 1).to_string().dimmed(), domain.cyan());
    }
}

pub fn print_locations(locations: &BTreeMap<String, Option<Location>>) {
    print_header("Locations", &locations.len().to_string());
    for (domain, location) in locations {
        println!("  {}", domain.bold());
        let Some(location) = location else {
            println!("    {}", "unregistered".yellow());
            continue;
        };
        println!("    {} {} ({})", "Chain:   ".dimmed(), location.blockchain.cyan(), location.network_id);
        println!("    {} {}", "Registry:".dimmed(), location.registry_address.to_checksum(None).cyan());
        println!("    {} {}", "Resolver:".dimmed(), or_dash(location.resolver_address).cyan());
        println!("    {} {}", "Owner:   ".dimmed(), location.owner_address.to_checksum(None).cyan());
        println!("    {} {}", "Provider:".dimmed(), location.blockchain_provider_url.dimmed());
    }
}

pub fn print_metadata(metadata: &TokenMetadata) {
    print_value("Name", &or_dash(metadata.name.as_deref()));
    print_value("Description", &or_dash(metadata.description.as_deref()));
    print_value("Image", &or_dash(metadata.image.as_deref()));
    print_value("External URL", &or_dash(metadata.external_url.as_deref()));
    println!("  {} {}", "Attributes:".dimmed(), metadata.attributes.len().to_string().cyan());
}

// ── Server & Errors ────────────────────────────────────────────────

/// Print the RPC endpoint and the services behind it.
pub fn print_serving(addr: &str, services: &[ServiceName]) {
    println!();
    println!("{}", "=== Domain Resolution RPC ===".blue().bold());
    println!("  {} {}", "Listening:".dimmed(), format!("http://{addr}").cyan());
    let names: Vec<&str> = services.iter().map(ServiceName::as_str).collect();
    println!("  {} {}", "Services: ".dimmed(), names.join(", ").cyan());
    println!("  {} {}", "Namespace:".dimmed(), "resolution_*".cyan());
}

/// Print a failed lookup. Expected misses are warnings, the rest errors.
pub fn print_error(err: &ResolutionError) {
    match err {
        ResolutionError::UnregisteredDomain(_)
        | ResolutionError::RecordNotFound { .. }
        | ResolutionError::UnspecifiedResolver(_)
        | ResolutionError::ReverseResolutionNotSpecified(_) => {
            eprintln!("  {} {err}", "WARNING:".yellow().bold());
        }
        _ => eprintln!("  {} {err}", "ERROR:".red().bold()),
    }
}
