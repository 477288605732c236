use super::errors::{CacheError, RouteError};
use super::path::{validate_chain, Path};
use super::pool::PoolSet;
use super::route::Route;
use super::types::{amount_to_usd, decimal_string, TokenAmount};
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedPath {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub pools: Vec<String>,
    pub tokens: Vec<String>,
    pub total_gas: i64,
    #[serde(with = "decimal_string")]
    pub price_impact: BigInt,
}

/// Route stripped of pool state, as stored in the route cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedRoute {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub paths: Vec<CachedPath>,
    pub total_gas: i64,
}

impl From<&Path> for CachedPath {
    fn from(path: &Path) -> Self {
        Self {
            input: path.input.clone(),
            output: path.output.clone(),
            pools: path.pools.clone(),
            tokens: path.tokens.clone(),
            total_gas: path.total_gas,
            price_impact: path.price_impact.clone(),
        }
    }
}

impl From<&CachedPath> for Path {
    fn from(path: &CachedPath) -> Self {
        Self {
            input: path.input.clone(),
            output: path.output.clone(),
            pools: path.pools.clone(),
            tokens: path.tokens.clone(),
            total_gas: path.total_gas,
            price_impact: path.price_impact.clone(),
        }
    }
}

impl Route {
    pub fn to_cached_route(&self) -> CachedRoute {
        CachedRoute {
            input: self.input.clone(),
            output: self.output.clone(),
            paths: self.paths.iter().map(CachedPath::from).collect(),
            total_gas: self.total_gas,
        }
    }
}

impl CachedRoute {
    /// Rebuilds a route over `pools`. Every path must be a well formed chain between the
    /// route's tokens, and every referenced pool must be present.
    pub fn to_route(&self, pools: Arc<PoolSet>) -> Result<Route, RouteError> {
        for path in &self.paths {
            if path.input.token != self.input.token || path.output.token != self.output.token {
                return Err(RouteError::TokenMismatch {
                    route_in: self.input.token.clone(),
                    route_out: self.output.token.clone(),
                    path_in: path.input.token.clone(),
                    path_out: path.output.token.clone(),
                });
            }
            validate_chain(&path.pools, &path.tokens, &path.input.token, &path.output.token)?;
        }
        if let Some(missing) = self
            .paths
            .iter()
            .flat_map(|path| path.pools.iter())
            .find(|address| !pools.contains(address))
        {
            return Err(RouteError::PoolNotFound(missing.clone()));
        }

        Ok(Route::from_paths(
            self.input.clone(),
            self.output.clone(),
            self.paths.iter().map(Path::from).collect(),
            self.total_gas,
            pools,
        ))
    }

    /// Rescales the path inputs to a new total, keeping each path's share of the cached
    /// input. The last path takes whatever integer division left over, so the inputs
    /// always add up to `amount_in`. Outputs keep their cached values until the route is
    /// summarized again.
    pub fn redistribute_input_amount(
        &mut self,
        amount_in: &BigUint,
        price_usd: f64,
        decimals: u8,
    ) -> Result<(), CacheError> {
        if self.input.amount.is_zero() {
            return Err(CacheError::ZeroInputAmount);
        }

        let cached_total = self.input.amount.clone();
        let mut assigned = BigUint::zero();
        let last = self.paths.len().saturating_sub(1);
        for (i, path) in self.paths.iter_mut().enumerate() {
            let amount = if i == last {
                if amount_in > &assigned {
                    amount_in - &assigned
                } else {
                    BigUint::zero()
                }
            } else {
                amount_in * &path.input.amount / &cached_total
            };
            assigned += &amount;
            path.input.amount_usd = amount_to_usd(&amount, decimals, price_usd);
            path.input.amount = amount;
        }

        self.input.amount = amount_in.clone();
        self.input.amount_usd = amount_to_usd(amount_in, decimals, price_usd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amm::ConstantProductPool;
    use crate::core::errors::PathError;
    use crate::core::pool::PoolSimulator;
    use crate::core::types::GasOption;

    fn pools() -> Arc<PoolSet> {
        let pools: Vec<Box<dyn PoolSimulator>> = vec![
            Box::new(ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 0)),
            Box::new(ConstantProductPool::new("pool2", ["token1", "token2"], [20000, 20000], 0)),
        ];
        Arc::new(PoolSet::new(pools))
    }

    fn route_with_shares(first: u64, second: u64) -> Route {
        let mut route = Route::new("token1", "token2", pools());
        for (pool, amount) in [("pool1", first), ("pool2", second)] {
            let path = Path::new(
                route.pools(),
                vec![pool.to_string()],
                vec!["token1".to_string(), "token2".to_string()],
                &TokenAmount::new("token1", BigUint::from(amount), amount as f64),
                "token2",
                1.0,
                0,
                GasOption::default(),
            )
            .unwrap();
            route.add_path(path).unwrap();
        }
        route
    }

    #[test]
    fn cached_route_round_trips_through_json() {
        let route = route_with_shares(333, 667);
        let cached = route.to_cached_route();

        let json = serde_json::to_string(&cached).unwrap();
        let back: CachedRoute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cached);

        let rebuilt = back.to_route(pools()).unwrap();
        assert_eq!(rebuilt.paths, route.paths);
        assert_eq!(rebuilt.input, route.input);
        assert_eq!(rebuilt.output, route.output);
        assert_eq!(rebuilt.total_gas, route.total_gas);
    }

    #[test]
    fn to_route_fails_on_missing_pool() {
        let cached = route_with_shares(333, 667).to_cached_route();
        let partial = Arc::new(pools().subset(&["pool1"]));

        assert_eq!(
            cached.to_route(partial).unwrap_err(),
            RouteError::PoolNotFound("pool2".to_string())
        );
    }

    #[test]
    fn to_route_rejects_malformed_paths() {
        let mut cached = route_with_shares(333, 667).to_cached_route();
        cached.paths[0].pools.push("pool2".to_string());
        assert_eq!(
            cached.to_route(pools()).unwrap_err(),
            RouteError::InvalidPath(PathError::InvalidPoolLength)
        );

        let mut cached = route_with_shares(333, 667).to_cached_route();
        cached.paths[1].tokens[1] = "token1".to_string();
        assert_eq!(
            cached.to_route(pools()).unwrap_err(),
            RouteError::InvalidPath(PathError::InvalidTokenOut)
        );

        let mut cached = route_with_shares(333, 667).to_cached_route();
        cached.paths[1].output.token = "token3".to_string();
        assert!(matches!(
            cached.to_route(pools()),
            Err(RouteError::TokenMismatch { .. })
        ));
    }

    #[test]
    fn redistribute_keeps_shares_and_exact_total() {
        let mut cached = route_with_shares(333, 667).to_cached_route();
        let amount_in = BigUint::from(1001u32);
        cached.redistribute_input_amount(&amount_in, 2.0, 0).unwrap();

        // 1001 * 333 / 1000 rounds down, the last path takes the rest
        assert_eq!(cached.paths[0].input.amount, BigUint::from(333u32));
        assert_eq!(cached.paths[1].input.amount, BigUint::from(668u32));
        let sum: BigUint = cached.paths.iter().map(|p| &p.input.amount).sum();
        assert_eq!(sum, amount_in);
        assert_eq!(cached.input.amount, amount_in);
        assert!((cached.paths[1].input.amount_usd - 1336.0).abs() < 1e-9);
    }

    #[test]
    fn redistribute_rejects_zero_cached_input() {
        let mut cached = CachedRoute {
            input: TokenAmount::zero("token1"),
            output: TokenAmount::zero("token2"),
            paths: vec![],
            total_gas: 0,
        };

        assert_eq!(
            cached.redistribute_input_amount(&BigUint::from(100u32), 1.0, 0),
            Err(CacheError::ZeroInputAmount)
        );
    }
}
