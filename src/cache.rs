use crate::core::cached_route::CachedRoute;
use crate::core::errors::CacheError;
use crate::core::types::{amount_to_usd, GasOption};
use lru::LruCache;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheOptions {
    pub enabled: bool,
    // Width of one USD bucket, in percent of its lower bound
    pub bucket_percent: f64,
    // Amounts worth less than this are keyed by their raw amount instead of USD
    pub min_amount_in_usd: f64,
    // Routes kept before the least recently used one is evicted
    pub capacity: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket_percent: 1.0,
            min_amount_in_usd: 1.0,
            capacity: 10_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AmountKey {
    // Index of the geometric USD bucket the amount falls in
    UsdBucket(i64),
    Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteCacheKey {
    pub token_in: String,
    pub token_out: String,
    pub amount: AmountKey,
    pub save_gas: bool,
    // Gas unit price the route was ranked with, only set when gas is included
    pub gas_price: Option<u64>,
}

impl RouteCacheKey {
    /// Requests whose USD value lands in the same bucket share a key, so a cached
    /// route can be rescaled to the exact amount later.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        options: &CacheOptions,
        token_in: &str,
        token_out: &str,
        amount_in: &BigUint,
        price_in_usd: f64,
        decimals_in: u8,
        save_gas: bool,
        gas_option: &GasOption,
    ) -> Self {
        let amount_usd = amount_to_usd(amount_in, decimals_in, price_in_usd);
        let amount = if amount_usd > options.min_amount_in_usd && options.bucket_percent > 0.0 {
            let base = 1.0 + options.bucket_percent / 100.0;
            AmountKey::UsdBucket((amount_usd.ln() / base.ln()).floor() as i64)
        } else {
            AmountKey::Raw(amount_in.to_string())
        };
        let gas_price = gas_option
            .include_gas
            .then(|| gas_option.gas_price.max(0.0).round() as u64);
        Self {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount,
            save_gas,
            gas_price,
        }
    }
}

impl fmt::Display for RouteCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = match &self.amount {
            AmountKey::UsdBucket(bucket) => format!("usd:{}", bucket),
            AmountKey::Raw(amount) => format!("raw:{}", amount),
        };
        let gas = match self.gas_price {
            Some(price) => format!("gas:{}", price),
            None => "nogas".to_string(),
        };
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.token_in, self.token_out, amount, self.save_gas as u8, gas
        )
    }
}

/// In memory store of serialized routes, bounded by `CacheOptions::capacity`.
#[derive(Debug)]
pub struct RouteCache {
    entries: Mutex<LruCache<String, String>>,
}

impl RouteCache {
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::InvalidCapacity)?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
        })
    }

    pub fn get(&self, key: &RouteCacheKey) -> Option<CachedRoute> {
        let key = key.to_string();
        let mut entries = self.entries.lock().ok()?;
        let json = entries.get(&key)?;
        match serde_json::from_str(json) {
            Ok(route) => {
                debug!(%key, "route cache hit");
                Some(route)
            }
            Err(e) => {
                warn!(%key, error = %e, "dropping unreadable cached route");
                entries.pop(&key);
                None
            }
        }
    }

    pub fn set(&self, key: &RouteCacheKey, route: &CachedRoute) {
        let key = key.to_string();
        let json = match serde_json::to_string(route) {
            Ok(json) => json,
            Err(e) => {
                warn!(%key, error = %e, "could not serialize route for cache");
                return;
            }
        };
        match self.entries.lock() {
            Ok(mut entries) => {
                if let Some((evicted, _)) = entries.push(key.clone(), json) {
                    if evicted != key {
                        debug!(%evicted, "route cache full, evicted least recent entry");
                    }
                }
            }
            Err(_) => warn!(%key, "route cache lock poisoned"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
