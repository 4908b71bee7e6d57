//! Reverse index: address → owned domains
//!
//! Registries only store token ids. The plain-text names exist only in the
//! `NewURI` events emitted at mint time, so the index is rebuilt from logs:
//!
//!   Transfer(_, owner, id) logs → candidate token ids
//!     → first NewURI(id, uri) log → candidate domain
//!       → batch ownerOf on the ProxyReader → domains still owned

use crate::abi::AbiValue;
use crate::constants::MAX_CONCURRENT_URI_LOOKUPS;
use crate::errors::{ResolutionError, Result};
use crate::namehash::{namehash, HashChain, TokenId};
use crate::onchain::{encode_address, BlockTag, Contract, LogEntry};
use alloy_primitives::{Address, B256};
use futures_util::future::join_all;
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A registry whose history is replayed, scanned from its deployment block.
#[derive(Debug, Clone)]
pub struct RegistrySource {
    pub contract: Contract,
    pub from_block: BlockTag,
}

impl RegistrySource {
    pub fn new(contract: Contract, deployment_block: Option<u64>) -> Self {
        let from_block = deployment_block.map_or(BlockTag::Earliest, BlockTag::Number);
        Self { contract, from_block }
    }

    /// Plain-text name of `token`, from the first `NewURI` log.
    async fn uri_of(&self, token: B256) -> Result<Option<String>> {
        let logs = self.contract.logs(self.from_block, "NewURI", &[Some(token)]).await?;
        let Some(first) = logs.first() else {
            return Ok(None);
        };
        let decoded = self.contract.abi().decode_event_data("NewURI", &first.data)?;
        Ok(decoded.get("uri").and_then(AbiValue::as_str).map(str::to_owned))
    }

    /// Domains ever transferred to `owner` in this registry.
    async fn candidates(&self, owner: Address) -> Result<BTreeSet<String>> {
        let transfers = self
            .contract
            .logs(self.from_block, "Transfer", &[None, Some(encode_address(owner))])
            .await?;
        let tokens: BTreeSet<B256> = transfers.iter().filter_map(last_topic).collect();
        debug!(
            target: "resolution::reverse",
            registry = %self.contract.address(),
            transfers = transfers.len(),
            tokens = tokens.len(),
            "scanned transfers"
        );

        let uris: Vec<Option<String>> = stream::iter(tokens)
            .map(|token| self.uri_of(token))
            .buffered(MAX_CONCURRENT_URI_LOOKUPS)
            .try_collect()
            .await?;
        Ok(uris.into_iter().flatten().collect())
    }
}

fn last_topic(log: &LogEntry) -> Option<B256> {
    log.topics.last().copied()
}

/// Rebuilds address → domains from registry logs of one layer.
#[derive(Debug, Clone)]
pub struct ReverseIndex {
    registries: Vec<RegistrySource>,
    proxy_reader: Option<Contract>,
}

impl ReverseIndex {
    pub fn new(registries: Vec<RegistrySource>, proxy_reader: Option<Contract>) -> Self {
        Self { registries, proxy_reader }
    }

    /// Union of candidate domains over every registry, scanned concurrently.
    ///
    /// A registry whose scan fails contributes nothing.
    pub async fn candidates(&self, owner: Address) -> BTreeSet<String> {
        let scans = join_all(self.registries.iter().map(|r| r.candidates(owner))).await;
        let mut union = BTreeSet::new();
        for (registry, scan) in self.registries.iter().zip(scans) {
            match scan {
                Ok(names) => union.extend(names),
                Err(err) => warn!(
                    target: "resolution::reverse",
                    registry = %registry.contract.address(),
                    error = %err,
                    "registry log scan failed, skipping"
                ),
            }
        }
        union
    }

    /// Domains currently owned by `owner`.
    pub async fn domains_owned_by(&self, owner: Address) -> Result<BTreeSet<String>> {
        let proxy_reader = self.proxy_reader.as_ref().ok_or(ResolutionError::ProxyReaderNotInitialized)?;
        let candidates: Vec<String> = self.candidates(owner).await.into_iter().collect();
        if candidates.is_empty() {
            return Ok(BTreeSet::new());
        }

        let args: Vec<Vec<AbiValue>> = candidates
            .iter()
            .map(|name| vec![AbiValue::Uint(namehash(name, HashChain::Keccak).as_u256())])
            .collect();
        let owners = proxy_reader.call_batch("ownerOf", &args).await?;

        let owned: BTreeSet<String> = candidates
            .into_iter()
            .zip(owners)
            .filter(|(_, (_, decoded))| {
                decoded.as_ref().and_then(|d| d.at(0)).and_then(AbiValue::as_address) == Some(owner)
            })
            .map(|(name, _)| name)
            .collect();
        debug!(target: "resolution::reverse", %owner, owned = owned.len(), "verified ownership");
        Ok(owned)
    }

    /// Plain-text name of `token`, looked up in each registry in order.
    ///
    /// Fails only when every registry failed.
    pub async fn unhash(&self, token: TokenId) -> Result<Option<String>> {
        let lookups = join_all(self.registries.iter().map(|r| r.uri_of(token.as_b256()))).await;
        let mut errors = Vec::new();
        for lookup in lookups {
            match lookup {
                Ok(Some(name)) => return Ok(Some(name)),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }
        if !errors.is_empty() && errors.len() == self.registries.len() {
            return Err(errors.swap_remove(0));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::ContractAbis;
    use crate::onchain::{RpcProvider, Transport};
    use crate::testing::{fake_transport, FakeChain, MockTransport};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const PROXY: Address = Address::repeat_byte(0x70);
    const UNS: Address = Address::repeat_byte(0x55);
    const CNS: Address = Address::repeat_byte(0xc5);
    const RESOLVER: Address = Address::repeat_byte(0x0e);
    const TARGET: Address = Address::repeat_byte(0xaa);
    const OTHER: Address = Address::repeat_byte(0xbb);

    fn index(chain: FakeChain, registries: &[Address]) -> ReverseIndex {
        index_over(Arc::new(fake_transport(vec![("http://l1", chain)])), registries)
    }

    fn index_over(transport: Arc<dyn Transport>, registries: &[Address]) -> ReverseIndex {
        let abis = ContractAbis::bundled().unwrap();
        let provider = Arc::new(RpcProvider::new(transport, "http://l1"));
        let sources = registries
            .iter()
            .map(|a| RegistrySource::new(Contract::new(*a, abis.registry.clone(), provider.clone()), Some(1)))
            .collect();
        ReverseIndex::new(sources, Some(Contract::new(PROXY, abis.proxy_reader.clone(), provider)))
    }

    /// Delays every request and records the most requests seen in flight.
    struct InFlight {
        inner: MockTransport,
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Transport for InFlight {
        async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2)).await;
            let response = self.inner.post(endpoint, body).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            response
        }

        async fn get(&self, url: &str) -> Result<Value> {
            self.inner.get(url).await
        }
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn test_transferred_away_candidates_are_dropped() {
        let chain = FakeChain::new(PROXY)
            .with_domain("a.crypto", TARGET, RESOLVER, UNS, &[])
            .with_domain("b.crypto", TARGET, RESOLVER, UNS, &[])
            .with_transfer("b.crypto", OTHER);
        let index = index(chain, &[UNS]);

        assert_eq!(index.candidates(TARGET).await, set(&["a.crypto", "b.crypto"]));
        assert_eq!(index.domains_owned_by(TARGET).await.unwrap(), set(&["a.crypto"]));
        assert_eq!(index.domains_owned_by(OTHER).await.unwrap(), set(&["b.crypto"]));
    }

    #[tokio::test]
    async fn test_registries_are_unioned() {
        let chain = FakeChain::new(PROXY)
            .with_domain("new.wallet", TARGET, RESOLVER, UNS, &[])
            .with_domain("old.crypto", TARGET, RESOLVER, CNS, &[]);
        let index = index(chain, &[UNS, CNS]);
        assert_eq!(
            index.domains_owned_by(TARGET).await.unwrap(),
            set(&["new.wallet", "old.crypto"])
        );
    }

    #[tokio::test]
    async fn test_failing_registry_contributes_nothing() {
        let chain = FakeChain::new(PROXY)
            .with_domain("new.wallet", TARGET, RESOLVER, UNS, &[])
            .with_domain("old.crypto", TARGET, RESOLVER, CNS, &[])
            .with_failing_logs(CNS);
        let index = index(chain, &[UNS, CNS]);
        assert_eq!(index.domains_owned_by(TARGET).await.unwrap(), set(&["new.wallet"]));
    }

    #[tokio::test]
    async fn test_uri_lookups_are_bounded() {
        let names: Vec<String> = (0..40).map(|i| format!("d{i}.crypto")).collect();
        let chain = names
            .iter()
            .fold(FakeChain::new(PROXY), |chain, name| chain.with_domain(name, TARGET, RESOLVER, UNS, &[]));
        let transport = Arc::new(InFlight {
            inner: fake_transport(vec![("http://l1", chain)]),
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let index = index_over(transport.clone(), &[UNS]);

        let expected: BTreeSet<String> = names.iter().cloned().collect();
        assert_eq!(index.domains_owned_by(TARGET).await.unwrap(), expected);
        let peak = transport.peak.load(Ordering::SeqCst);
        assert!(peak > 1, "lookups ran sequentially");
        assert!(peak <= MAX_CONCURRENT_URI_LOOKUPS, "{peak} requests in flight");
    }

    #[tokio::test]
    async fn test_malformed_owner_entry_is_dropped() {
        let chain = FakeChain::new(PROXY)
            .with_domain("a.crypto", TARGET, RESOLVER, UNS, &[])
            .with_domain("b.crypto", TARGET, RESOLVER, UNS, &[])
            .with_malformed_owner("b.crypto");
        let index = index(chain, &[UNS]);
        assert_eq!(index.domains_owned_by(TARGET).await.unwrap(), set(&["a.crypto"]));
    }

    #[tokio::test]
    async fn test_no_candidates_skips_verification() {
        let index = index(FakeChain::new(PROXY), &[UNS]);
        assert!(index.domains_owned_by(TARGET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_proxy_reader_is_fatal() {
        let index = ReverseIndex::new(Vec::new(), None);
        assert_eq!(
            index.domains_owned_by(TARGET).await.unwrap_err(),
            ResolutionError::ProxyReaderNotInitialized
        );
    }

    #[tokio::test]
    async fn test_unhash_recovers_minted_name() {
        let chain = FakeChain::new(PROXY).with_domain("brad.crypto", TARGET, RESOLVER, CNS, &[]);
        let index = index(chain, &[UNS, CNS]);
        let token = namehash("brad.crypto", HashChain::Keccak);
        assert_eq!(index.unhash(token).await.unwrap(), Some("brad.crypto".to_string()));
        assert_eq!(index.unhash(namehash("nope.crypto", HashChain::Keccak)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unhash_fails_when_every_registry_fails() {
        let chain = FakeChain::new(PROXY).with_failing_logs(UNS);
        let index = index(chain, &[UNS]);
        let err = index.unhash(namehash("brad.crypto", HashChain::Keccak)).await.unwrap_err();
        assert_eq!(err, ResolutionError::RateLimited("http://l1".into()));
    }
}
