use super::errors::RouteError;
use super::path::{validate_chain, Path};
use super::pool::{simulate_chain, PoolLookup, PoolOverlay, PoolSet};
use super::types::{decimal_string, TokenAmount};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

/// Accepted paths for one swap request, together with the pool state they left behind.
///
/// Every accepted path has been simulated against `pools`, which is a private overlay of
/// the shared snapshot, so later paths see the reserves earlier paths consumed.
#[derive(Clone, Debug)]
pub struct Route {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub paths: Vec<Path>,
    pub total_gas: i64,
    pools: PoolOverlay,
}

/// One swap of the compiled plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwapStep {
    pub path_index: usize,
    pub pool: String,
    pub exchange: String,
    pub pool_type: String,
    pub token_in: String,
    pub token_out: String,
    #[serde(with = "decimal_string")]
    pub amount_in: BigUint,
    #[serde(with = "decimal_string")]
    pub amount_out: BigUint,
    pub fee: TokenAmount,
    pub extra: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub token_in: String,
    #[serde(with = "decimal_string")]
    pub amount_in: BigUint,
    pub token_out: String,
    #[serde(with = "decimal_string")]
    pub amount_out: BigUint,
    pub total_gas: i64,
    pub steps: Vec<SwapStep>,
}

impl Route {
    pub fn new(token_in: &str, token_out: &str, pools: Arc<PoolSet>) -> Self {
        Self {
            input: TokenAmount::zero(token_in),
            output: TokenAmount::zero(token_out),
            paths: vec![],
            total_gas: 0,
            pools: PoolOverlay::new(pools),
        }
    }

    /// Route with already known paths and untouched pool state, as rebuilt from cache.
    pub(crate) fn from_paths(
        input: TokenAmount,
        output: TokenAmount,
        paths: Vec<Path>,
        total_gas: i64,
        pools: Arc<PoolSet>,
    ) -> Self {
        Self {
            input,
            output,
            paths,
            total_gas,
            pools: PoolOverlay::new(pools),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Live pool state, including every swap of the accepted paths.
    pub fn pools(&self) -> &PoolOverlay {
        &self.pools
    }

    /// Pool state before any path was accepted.
    pub fn original_pools(&self) -> &Arc<PoolSet> {
        self.pools.base()
    }

    /// Accepts a path, re-simulating it against the live pool state.
    ///
    /// The stored output is the re-simulated amount. Pool state only advances when every
    /// hop succeeds; on error the route is left as it was.
    pub fn add_path(&mut self, mut path: Path) -> Result<(), RouteError> {
        if path.input.token != self.input.token || path.output.token != self.output.token {
            return Err(RouteError::TokenMismatch {
                route_in: self.input.token.clone(),
                route_out: self.output.token.clone(),
                path_in: path.input.token,
                path_out: path.output.token,
            });
        }

        validate_chain(&path.pools, &path.tokens, &path.input.token, &path.output.token)?;

        let simulation = simulate_chain(&self.pools, &path.pools, &path.tokens, &path.input.amount)?;
        path.output.amount = simulation.amount_out().cloned().unwrap_or_default();
        path.total_gas = simulation.total_gas();
        self.pools.commit(simulation.advanced);

        self.input.amount += &path.input.amount;
        self.input.amount_usd += path.input.amount_usd;
        self.output.amount += &path.output.amount;
        self.output.amount_usd += path.output.amount_usd;

        match self.paths.iter_mut().find(|existing| existing.equals(&path)) {
            Some(existing) => {
                existing.merge(&path);
            }
            None => {
                self.total_gas += path.total_gas;
                self.paths.push(path);
            }
        }
        Ok(())
    }

    /// Compiles the route into a swap by swap plan against a fresh pool snapshot.
    ///
    /// Paths are replayed in order and each one sees the state left by the previous
    /// ones, so amounts can differ from the ones captured while building.
    pub fn summarize(&self, fresh: Arc<PoolSet>) -> Result<RouteSummary, RouteError> {
        let mut pools = PoolOverlay::new(fresh);
        let mut steps = vec![];
        let mut amount_out = BigUint::default();
        let mut total_gas = 0;

        for (path_index, path) in self.paths.iter().enumerate() {
            let simulation = simulate_chain(&pools, &path.pools, &path.tokens, &path.input.amount)?;
            for (i, hop) in simulation.hops.iter().enumerate() {
                let address = &path.pools[i];
                let pool = pools
                    .get_pool(address)
                    .ok_or_else(|| RouteError::PoolNotFound(address.clone()))?;
                steps.push(SwapStep {
                    path_index,
                    pool: address.clone(),
                    exchange: pool.get_exchange().to_string(),
                    pool_type: pool.get_type().to_string(),
                    token_in: hop.swap_info.token_in.clone(),
                    token_out: hop.swap_info.token_out.clone(),
                    amount_in: hop.swap_info.amount_in.clone(),
                    amount_out: hop.token_amount_out.amount.clone(),
                    fee: hop.fee.clone(),
                    extra: pool.get_meta_info(&hop.swap_info.token_in, &hop.swap_info.token_out),
                });
            }
            if let Some(out) = simulation.amount_out() {
                amount_out += out;
            }
            total_gas += simulation.total_gas();
            pools.commit(simulation.advanced);
        }

        Ok(RouteSummary {
            token_in: self.input.token.clone(),
            amount_in: self.input.amount.clone(),
            token_out: self.output.token.clone(),
            amount_out,
            total_gas,
            steps,
        })
    }

    /// Ranks two routes. `Greater` means `self` is better.
    pub fn compare_to(&self, other: Option<&Route>, gas_inclusive: bool) -> Ordering {
        let Some(other) = other else {
            return Ordering::Greater;
        };
        if gas_inclusive && self.output.amount_usd > 0.0 && other.output.amount_usd > 0.0 {
            match self.output.amount_usd.partial_cmp(&other.output.amount_usd) {
                Some(Ordering::Equal) | None => {}
                Some(ordering) => return ordering,
            }
        }
        self.output.amount.cmp(&other.output.amount)
    }

    /// Addresses of every pool used by the route, each listed once in first use order.
    pub fn extract_pool_addresses(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.paths
            .iter()
            .flat_map(|path| path.pools.iter())
            .filter(|address| seen.insert(address.as_str()))
            .cloned()
            .collect()
    }
}
