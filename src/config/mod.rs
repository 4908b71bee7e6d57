//! Contract directory
//!
//! Where every naming service lives: provider URL, network id, registry and
//! ProxyReader addresses, and the block each registry was deployed at. Loaded
//! from JSON or taken from the public mainnet deployments, then turned into a
//! [`Resolution`] with [`ResolutionConfig::build`].

use crate::abi::ContractAbis;
use crate::errors::{ResolutionError, Result};
use crate::onchain::{Contract, RpcProvider, Transport};
use crate::orchestrator::Layer;
use crate::resolution::Resolution;
use crate::reverse::RegistrySource;
use crate::services::{Ens, NamingService, Uns, UnsLayer, Zns};
use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A deployed contract and, for registries, its deployment block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractLocation {
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_block: Option<u64>,
}

impl ContractLocation {
    pub const fn new(address: Address, deployment_block: Option<u64>) -> Self {
        Self { address, deployment_block }
    }
}

/// UNS contracts on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsLayerConfig {
    pub network_id: u64,
    /// `ETH` or `MATIC`, reported in locations
    pub blockchain: String,
    pub provider_url: String,
    /// Bearer token sent to this provider only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub proxy_reader: Option<ContractLocation>,
    pub uns_registry: ContractLocation,
    /// Legacy registry, L1 only
    #[serde(default)]
    pub cns_registry: Option<ContractLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsConfig {
    pub l1: UnsLayerConfig,
    pub l2: UnsLayerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsConfig {
    pub network_id: u64,
    pub provider_url: String,
    /// Bearer token sent to this provider only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub registry: ContractLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZnsConfig {
    pub network_id: u64,
    pub provider_url: String,
    /// Bearer token sent to this provider only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub registry: Address,
}

/// Which naming services to run and where their contracts are.
///
/// A missing section disables that service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionConfig {
    #[serde(default)]
    pub uns: Option<UnsConfig>,
    #[serde(default)]
    pub ens: Option<EnsConfig>,
    #[serde(default)]
    pub zns: Option<ZnsConfig>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ResolutionConfig {
    /// Public deployments on Ethereum mainnet, Polygon and Zilliqa.
    pub fn mainnet() -> Self {
        Self {
            uns: Some(UnsConfig {
                l1: UnsLayerConfig {
                    network_id: 1,
                    blockchain: "ETH".into(),
                    provider_url: "https://ethereum-rpc.publicnode.com".into(),
                    api_key: None,
                    proxy_reader: Some(ContractLocation::new(
                        address!("578853aa776Eef10CeE6c4dd2B5862bdcE767A8B"),
                        None,
                    )),
                    uns_registry: ContractLocation::new(
                        address!("049aba7510f45BA5b64ea9E658E342F904DB358D"),
                        Some(12_779_230),
                    ),
                    cns_registry: Some(ContractLocation::new(
                        address!("D1E5b0FF1287aA9f9A268759062E4Ab08b9Dacbe"),
                        Some(9_082_251),
                    )),
                },
                l2: UnsLayerConfig {
                    network_id: 137,
                    blockchain: "MATIC".into(),
                    provider_url: "https://polygon-bor-rpc.publicnode.com".into(),
                    api_key: None,
                    proxy_reader: Some(ContractLocation::new(
                        address!("423F2531bd5d3C3D4EF7C318c2D1d9BEDE67c680"),
                        None,
                    )),
                    uns_registry: ContractLocation::new(
                        address!("a9a6A3626993D487d2Dbda3173cf58cA1a9D9e9f"),
                        Some(19_345_077),
                    ),
                    cns_registry: None,
                },
            }),
            ens: Some(EnsConfig {
                network_id: 1,
                provider_url: "https://ethereum-rpc.publicnode.com".into(),
                api_key: None,
                registry: ContractLocation::new(address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e"), None),
            }),
            zns: Some(ZnsConfig {
                network_id: 1,
                provider_url: "https://api.zilliqa.com".into(),
                api_key: None,
                registry: address!("9611c53BE6d1b32058b2747bdeCECed7e1216793"),
            }),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
    }

    /// Point the Ethereum, Polygon and Zilliqa sections at other providers.
    pub fn with_providers(
        mut self,
        eth: Option<String>,
        polygon: Option<String>,
        zil: Option<String>,
    ) -> Self {
        if let Some(url) = eth {
            if let Some(uns) = &mut self.uns {
                uns.l1.provider_url = url.clone();
            }
            if let Some(ens) = &mut self.ens {
                ens.provider_url = url;
            }
        }
        if let (Some(url), Some(uns)) = (polygon, &mut self.uns) {
            uns.l2.provider_url = url;
        }
        if let (Some(url), Some(zns)) = (zil, &mut self.zns) {
            zns.provider_url = url;
        }
        self
    }

    /// Set the bearer tokens of the Ethereum, Polygon and Zilliqa providers.
    pub fn with_api_keys(
        mut self,
        eth: Option<String>,
        polygon: Option<String>,
        zil: Option<String>,
    ) -> Self {
        if let Some(key) = eth {
            if let Some(uns) = &mut self.uns {
                uns.l1.api_key = Some(key.clone());
            }
            if let Some(ens) = &mut self.ens {
                ens.api_key = Some(key);
            }
        }
        if let (Some(key), Some(uns)) = (polygon, &mut self.uns) {
            uns.l2.api_key = Some(key);
        }
        if let (Some(key), Some(zns)) = (zil, &mut self.zns) {
            zns.api_key = Some(key);
        }
        self
    }

    /// `(provider_url, api_key)` of every section that carries a key.
    pub fn api_keys(&self) -> Vec<(String, String)> {
        let uns = self.uns.iter().flat_map(|uns| [&uns.l1, &uns.l2]);
        uns.map(|l| (&l.provider_url, &l.api_key))
            .chain(self.ens.iter().map(|e| (&e.provider_url, &e.api_key)))
            .chain(self.zns.iter().map(|z| (&z.provider_url, &z.api_key)))
            .filter_map(|(url, key)| key.as_ref().map(|key| (url.clone(), key.clone())))
            .collect()
    }

    /// Build every configured service over `transport`.
    pub fn build(&self, transport: Arc<dyn Transport>) -> Result<Resolution> {
        let abis = ContractAbis::bundled()?;
        let mut services: Vec<Arc<dyn NamingService>> = Vec::new();

        if let Some(uns) = &self.uns {
            let l1 = build_uns_layer(Layer::L1, &uns.l1, &abis, &transport);
            let l2 = build_uns_layer(Layer::L2, &uns.l2, &abis, &transport);
            services.push(Arc::new(Uns::new(l1, l2, transport.clone())));
        }
        if let Some(ens) = &self.ens {
            let provider = Arc::new(RpcProvider::new(transport.clone(), ens.provider_url.clone()));
            let registry = Contract::new(ens.registry.address, abis.ens_registry.clone(), provider);
            services.push(Arc::new(Ens::new(registry, abis.ens_resolver.clone())));
        }
        if let Some(zns) = &self.zns {
            let provider = Arc::new(RpcProvider::new(transport.clone(), zns.provider_url.clone()));
            services.push(Arc::new(Zns::new(provider, zns.registry)));
        }
        if services.is_empty() {
            return Err(ResolutionError::UnsupportedNetwork("no naming service configured".into()));
        }

        let resolution = Resolution::new(services);
        info!(target: "resolution::config", services = ?resolution.services().collect::<Vec<_>>(), "resolution ready");
        Ok(resolution)
    }
}

fn build_uns_layer(
    layer: Layer,
    config: &UnsLayerConfig,
    abis: &ContractAbis,
    transport: &Arc<dyn Transport>,
) -> UnsLayer {
    let provider = Arc::new(RpcProvider::new(transport.clone(), config.provider_url.clone()));
    let registry = |location: &ContractLocation| {
        RegistrySource::new(
            Contract::new(location.address, abis.registry.clone(), provider.clone()),
            location.deployment_block,
        )
    };
    let mut registries = vec![registry(&config.uns_registry)];
    registries.extend(config.cns_registry.as_ref().map(registry));
    let proxy_reader = config
        .proxy_reader
        .as_ref()
        .map(|p| Contract::new(p.address, abis.proxy_reader.clone(), provider.clone()));
    UnsLayer::new(
        layer,
        config.network_id,
        config.blockchain.clone(),
        provider.clone(),
        proxy_reader,
        registries,
    )
}
