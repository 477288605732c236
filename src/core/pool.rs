use super::errors::{PathError, PoolError};
use super::types::TokenAmount;
use num_bigint::BigUint;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Everything a pool needs to apply a simulated swap to its own state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwapInfo {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: BigUint,
    pub amount_out: BigUint,
    // Fee retained inside the pool, in token_in
    pub fee: BigUint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalcAmountOutResult {
    pub token_amount_out: TokenAmount,
    pub fee: TokenAmount,
    pub gas: i64,
    pub swap_info: SwapInfo,
}

/// Uniform surface every AMM simulator implements. Routing code only talks to pools
/// through this trait and never looks at the concrete type.
pub trait PoolSimulator: Debug + Send + Sync {
    /// Simulates a swap without touching the pool state.
    fn calc_amount_out(
        &self,
        token_amount_in: &TokenAmount,
        token_out: &str,
    ) -> Result<CalcAmountOutResult, PoolError>;

    /// Applies a previously simulated swap. Not idempotent.
    fn update_balance(&mut self, swap_info: &SwapInfo);

    /// Slippage free quote of `base` units of token_in, in token_out.
    fn calc_exact_quote(&self, token_in: &str, token_out: &str, base: &BigUint) -> Option<BigUint>;

    fn get_address(&self) -> &str;

    fn get_exchange(&self) -> &str;

    fn get_type(&self) -> &str;

    fn get_tokens(&self) -> &[String];

    fn get_reserves(&self) -> &[BigUint];

    fn clone_box(&self) -> Box<dyn PoolSimulator>;

    fn get_meta_info(&self, _token_in: &str, _token_out: &str) -> serde_json::Value {
        serde_json::Value::Null
    }

    fn get_token_index(&self, token: &str) -> Option<usize> {
        self.get_tokens().iter().position(|t| t == token)
    }

    /// Tokens that can be swapped into `token` through this pool.
    fn can_swap_to(&self, token: &str) -> Vec<String> {
        other_tokens(self.get_tokens(), token)
    }

    /// Tokens that `token` can be swapped into through this pool.
    fn can_swap_from(&self, token: &str) -> Vec<String> {
        other_tokens(self.get_tokens(), token)
    }

    fn equals(&self, other: &dyn PoolSimulator) -> bool {
        self.get_address() == other.get_address()
    }
}

// Every other listed token, or nothing when `token` is not listed
fn other_tokens(tokens: &[String], token: &str) -> Vec<String> {
    if !tokens.iter().any(|t| t == token) {
        return vec![];
    }
    tokens.iter().filter(|t| t.as_str() != token).cloned().collect()
}

impl Clone for Box<dyn PoolSimulator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Read access to pool state by address.
pub trait PoolLookup {
    fn get_pool(&self, address: &str) -> Option<&dyn PoolSimulator>;

    /// Addresses of the pools listing `token`, in insertion order.
    fn pools_of_token(&self, token: &str) -> &[String];

    fn is_empty(&self) -> bool;
}

/// Arena of pools keyed by address, with a token -> pools adjacency.
#[derive(Clone, Debug, Default)]
pub struct PoolSet {
    pools: HashMap<String, Box<dyn PoolSimulator>>,
    token_to_pools: HashMap<String, Vec<String>>,
}

impl PoolSet {
    pub fn new(pools: Vec<Box<dyn PoolSimulator>>) -> Self {
        let mut pool_set = Self::default();
        for pool in pools {
            pool_set.insert(pool);
        }
        pool_set
    }

    pub fn insert(&mut self, pool: Box<dyn PoolSimulator>) {
        let address = pool.get_address().to_string();
        if !self.pools.contains_key(&address) {
            for token in pool.get_tokens() {
                self.token_to_pools
                    .entry(token.clone())
                    .or_default()
                    .push(address.clone());
            }
        }
        self.pools.insert(address, pool);
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.pools.contains_key(address)
    }

    /// Copies the listed pools into a new set. Unknown addresses are skipped.
    pub fn subset<S: AsRef<str>>(&self, addresses: &[S]) -> PoolSet {
        let pools = addresses
            .iter()
            .filter_map(|address| self.pools.get(address.as_ref()))
            .map(|pool| pool.clone_box())
            .collect();
        PoolSet::new(pools)
    }
}

impl PoolLookup for PoolSet {
    fn get_pool(&self, address: &str) -> Option<&dyn PoolSimulator> {
        self.pools.get(address).map(|pool| pool.as_ref())
    }

    fn pools_of_token(&self, token: &str) -> &[String] {
        self.token_to_pools
            .get(token)
            .map(|addresses| addresses.as_slice())
            .unwrap_or(&[])
    }

    fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Request private view over a shared `PoolSet`. A pool is copied out of the base set
/// the first time it is written, so the base is never mutated and concurrent requests
/// can share it.
#[derive(Clone, Debug)]
pub struct PoolOverlay {
    base: Arc<PoolSet>,
    touched: HashMap<String, Box<dyn PoolSimulator>>,
}

impl PoolOverlay {
    pub fn new(base: Arc<PoolSet>) -> Self {
        Self {
            base,
            touched: HashMap::new(),
        }
    }

    pub fn base(&self) -> &Arc<PoolSet> {
        &self.base
    }

    /// Replaces pool state with already advanced copies.
    pub fn commit(&mut self, pools: HashMap<String, Box<dyn PoolSimulator>>) {
        self.touched.extend(pools);
    }
}

impl PoolLookup for PoolOverlay {
    fn get_pool(&self, address: &str) -> Option<&dyn PoolSimulator> {
        match self.touched.get(address) {
            Some(pool) => Some(pool.as_ref()),
            None => self.base.get_pool(address),
        }
    }

    fn pools_of_token(&self, token: &str) -> &[String] {
        self.base.pools_of_token(token)
    }

    fn is_empty(&self) -> bool {
        self.base.is_empty()
    }
}

/// Outcome of swapping an amount through a chain of pools on scratch copies.
#[derive(Debug)]
pub struct ChainSimulation {
    pub hops: Vec<CalcAmountOutResult>,
    pub advanced: HashMap<String, Box<dyn PoolSimulator>>,
}

impl ChainSimulation {
    pub fn amount_out(&self) -> Option<&BigUint> {
        self.hops.last().map(|hop| &hop.token_amount_out.amount)
    }

    pub fn total_gas(&self) -> i64 {
        self.hops.iter().map(|hop| hop.gas).sum()
    }
}

/// Swaps `amount_in` through `pools` hop by hop, advancing a scratch copy of every pool
/// it crosses. A pool crossed twice sees its own earlier swap. Nothing in `lookup` is
/// modified; callers commit `advanced` when they accept the result.
pub fn simulate_chain<L: PoolLookup + ?Sized>(
    lookup: &L,
    pools: &[String],
    tokens: &[String],
    amount_in: &BigUint,
) -> Result<ChainSimulation, PathError> {
    if tokens.len() != pools.len() + 1 {
        return Err(PathError::InvalidPoolLength);
    }
    let mut advanced: HashMap<String, Box<dyn PoolSimulator>> = HashMap::new();
    let mut hops = Vec::with_capacity(pools.len());
    let mut current = amount_in.clone();

    for (i, address) in pools.iter().enumerate() {
        if !advanced.contains_key(address) {
            let pool = lookup
                .get_pool(address)
                .ok_or_else(|| PathError::PoolNotFound(address.clone()))?;
            advanced.insert(address.clone(), pool.clone_box());
        }
        let pool = advanced
            .get_mut(address)
            .ok_or_else(|| PathError::PoolNotFound(address.clone()))?;

        let token_amount_in = TokenAmount::new(&tokens[i], current.clone(), 0.0);
        let result = pool
            .calc_amount_out(&token_amount_in, &tokens[i + 1])
            .map_err(|e| PathError::SwapFailed {
                pool: address.clone(),
                reason: e.to_string(),
            })?;
        if !result.token_amount_out.is_positive() {
            return Err(PathError::SwapFailed {
                pool: address.clone(),
                reason: "zero amount out".to_string(),
            });
        }
        pool.update_balance(&result.swap_info);
        current = result.token_amount_out.amount.clone();
        hops.push(result);
    }

    Ok(ChainSimulation { hops, advanced })
}
