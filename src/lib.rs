//! # Domain Resolution - Multi-Chain Naming Service Library
//!
//! Resolves blockchain domain names to owners, resolvers, records and
//! addresses across Unstoppable Domains (Ethereum and Polygon), ENS and
//! Zilliqa. UNS lookups read both layers concurrently and prefer Polygon
//! unless the domain is unregistered there.

pub mod abi;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod namehash;
pub mod onchain;
pub mod orchestrator;
pub mod output;
pub mod resolution;
pub mod reverse;
pub mod rpc;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
