//! L1/L2 layer orchestration
//!
//! Every UNS operation runs against both layers at once. Both legs always
//! complete before the outcomes are merged; there is no early return.
//!
//! Merge precedence:
//!   1. L2 failed with anything but `UnregisteredDomain` → that error
//!   2. L2 produced a value → the value
//!   3. otherwise → whatever L1 produced

use crate::errors::{ResolutionError, Result};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use tracing::debug;

/// Network layer a leg ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Layer {
    L1,
    L2,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::L1 => write!(f, "L1"),
            Layer::L2 => write!(f, "L2"),
        }
    }
}

/// Outcome of one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOutcome<T> {
    pub layer: Layer,
    pub result: Result<T>,
}

impl<T> LayerOutcome<T> {
    pub fn new(layer: Layer, result: Result<T>) -> Self {
        Self { layer, result }
    }
}

/// Merge the outcomes of the two legs of one operation.
pub fn merge<T>(l1: LayerOutcome<T>, l2: LayerOutcome<T>) -> Result<T> {
    match l2.result {
        Err(err) if !err.is_unregistered() => {
            debug!(target: "resolution::orchestrator", error = %err, "L2 failure wins");
            Err(err)
        }
        Ok(value) => Ok(value),
        Err(_) => l1.result,
    }
}

/// Run the L1 and L2 legs concurrently and merge them.
pub async fn run_layers<T, F1, F2>(l1: F1, l2: F2) -> Result<T>
where
    F1: Future<Output = Result<T>>,
    F2: Future<Output = Result<T>>,
{
    let (l1, l2) = join_layers(l1, l2).await;
    merge(l1, l2)
}

/// Run the L1 and L2 legs concurrently and return both outcomes unmerged.
pub async fn join_layers<T, F1, F2>(l1: F1, l2: F2) -> (LayerOutcome<T>, LayerOutcome<T>)
where
    F1: Future<Output = Result<T>>,
    F2: Future<Output = Result<T>>,
{
    let (l1, l2) = futures_util::join!(l1, l2);
    (LayerOutcome::new(Layer::L1, l1), LayerOutcome::new(Layer::L2, l2))
}

/// Run every keyed leg concurrently and collect the outcomes once all have
/// completed.
///
/// Each leg owns its slot until the join, so no locking is needed.
pub async fn join_keyed<K, T, F, I>(legs: I) -> BTreeMap<K, Result<T>>
where
    K: Ord,
    F: Future<Output = Result<T>>,
    I: IntoIterator<Item = (K, F)>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = legs.into_iter().unzip();
    keys.into_iter().zip(join_all(futures).await).collect()
}

/// Merge per-key outcomes of the two layers, key by key.
///
/// A key missing from one layer counts as unregistered there.
pub fn merge_keyed<K, T>(
    l1: BTreeMap<K, Result<T>>,
    mut l2: BTreeMap<K, Result<T>>,
    unregistered: impl Fn(&K) -> ResolutionError,
) -> BTreeMap<K, Result<T>>
where
    K: Ord + Clone,
{
    let mut merged = BTreeMap::new();
    for (key, l1_result) in l1 {
        let l2_result = l2.remove(&key).unwrap_or_else(|| Err(unregistered(&key)));
        let value = merge(LayerOutcome::new(Layer::L1, l1_result), LayerOutcome::new(Layer::L2, l2_result));
        merged.insert(key, value);
    }
    for (key, l2_result) in l2 {
        let value = merge(
            LayerOutcome::new(Layer::L1, Err(unregistered(&key))),
            LayerOutcome::new(Layer::L2, l2_result),
        );
        merged.insert(key, value);
    }
    merged
}
