use super::constants::{
    DEFAULT_DISTRIBUTION_PERCENT, DEFAULT_MAX_HOPS, DEFAULT_MAX_PATHS_IN_ROUTE,
    DEFAULT_MAX_POOLS_TO_VISIT, DEFAULT_MIN_PART_USD,
};
use super::errors::RouteError;
use super::path_finder::{FinderInput, PathFinder};
use super::pool::{PoolLookup, PoolSet};
use super::route::Route;
use super::token_graph::HopIndex;
use super::types::{amount_to_usd, GasOption, TokenAmount, TokenInfoMap};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Search and split tuning shared by every request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinderOptions {
    pub max_hops: u32,
    // Size of one split part, in percent of the total amount
    pub distribution_percent: u32,
    pub min_part_usd: f64,
    pub max_paths_in_route: usize,
    pub max_pools_to_visit: usize,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            distribution_percent: DEFAULT_DISTRIBUTION_PERCENT,
            min_part_usd: DEFAULT_MIN_PART_USD,
            max_paths_in_route: DEFAULT_MAX_PATHS_IN_ROUTE,
            max_pools_to_visit: DEFAULT_MAX_POOLS_TO_VISIT,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RouteRequest<'a> {
    pub token_amount_in: TokenAmount,
    pub token_out: &'a str,
    pub tokens: &'a TokenInfoMap,
    pub gas_option: GasOption,
    // Route the whole amount through a single path
    pub save_gas: bool,
    pub deadline: Option<Instant>,
}

pub struct RouteBuilder {
    pub options: FinderOptions,
}

impl RouteBuilder {
    pub fn new(options: FinderOptions) -> Self {
        Self { options }
    }

    /// Builds a route for the request on a private copy of `pools`.
    ///
    /// With `save_gas` the whole amount goes through one path. Otherwise the amount is
    /// also routed fragment by fragment, every accepted path advancing the pools it
    /// crosses, and the better of the split route and the single path route is kept.
    /// A route whose fragments do not all find a path is empty.
    pub fn build(&self, pools: Arc<PoolSet>, request: &RouteRequest) -> Result<Route, RouteError> {
        if pools.is_empty() {
            return Err(RouteError::EmptyPoolSet);
        }
        let (price_in, decimals_in) = valuation(request.tokens, &request.token_amount_in.token);
        let hop_index = HopIndex::build(pools.as_ref(), request.token_out, request.tokens);

        let whole = vec![request.token_amount_in.amount.clone()];
        let single = self.route_fragments(&pools, request, &hop_index, whole, price_in, decimals_in)?;
        if request.save_gas {
            return Ok(single);
        }

        let fragments = self.split_amount_in(&request.token_amount_in.amount, price_in, decimals_in);
        if fragments.len() < 2 {
            return Ok(single);
        }
        let split = self.route_fragments(&pools, request, &hop_index, fragments, price_in, decimals_in)?;

        let gas_inclusive = request.gas_option.include_gas
            && valuation(request.tokens, request.token_out).0 > 0.0;
        if split.compare_to(Some(&single), gas_inclusive) == Ordering::Greater {
            Ok(split)
        } else {
            Ok(single)
        }
    }

    fn route_fragments(
        &self,
        pools: &Arc<PoolSet>,
        request: &RouteRequest,
        hop_index: &HopIndex,
        fragments: Vec<BigUint>,
        price_in: f64,
        decimals_in: u8,
    ) -> Result<Route, RouteError> {
        let token_in = request.token_amount_in.token.as_str();
        let token_out = request.token_out;
        let empty = || Route::new(token_in, token_out, pools.clone());
        let finder = PathFinder::new(self.options.max_hops, self.options.max_pools_to_visit);
        let mut route = empty();

        for fragment in fragments {
            if let Some(deadline) = request.deadline {
                if Instant::now() >= deadline {
                    return Err(RouteError::DeadlineExceeded);
                }
            }

            let amount_usd = amount_to_usd(&fragment, decimals_in, price_in);
            let input = FinderInput {
                token_amount_in: TokenAmount::new(token_in, fragment, amount_usd),
                token_out,
                tokens: request.tokens,
                gas_option: request.gas_option,
            };
            let reuse_only = route.paths.len() >= self.options.max_paths_in_route;
            let best =
                finder.best_path_exact_in(route.pools(), hop_index, &input, &route.paths, reuse_only)?;

            let Some(path) = best else {
                return Ok(empty());
            };
            if route.add_path(path).is_err() {
                return Ok(empty());
            }
        }

        Ok(route)
    }

    /// Cuts `total` into parts of `distribution_percent`, merging consecutive parts until
    /// each fragment is worth at least `min_part_usd`. A remainder worth less than that is
    /// folded into the last fragment, and the fragments always sum to `total`.
    pub fn split_amount_in(&self, total: &BigUint, price_usd: f64, decimals: u8) -> Vec<BigUint> {
        let percent = self.options.distribution_percent.clamp(1, 100);
        let parts = 100 / percent;
        let part = total * BigUint::from(percent) / BigUint::from(100u32);
        if part.is_zero() {
            return vec![total.clone()];
        }
        let min_part_usd = self.options.min_part_usd;
        let usd = |amount: &BigUint| amount_to_usd(amount, decimals, price_usd);

        let mut fragments = vec![];
        let mut allocated = BigUint::zero();
        let mut pending = BigUint::zero();
        for i in 0..parts {
            pending += &part;
            let is_last = i + 1 == parts;
            if !is_last && usd(&pending) < min_part_usd {
                continue;
            }
            let remainder = total - &allocated - &pending;
            if is_last || usd(&remainder) < min_part_usd {
                fragments.push(total - &allocated);
                return fragments;
            }
            allocated += &pending;
            fragments.push(std::mem::take(&mut pending));
        }
        fragments
    }
}

fn valuation(tokens: &TokenInfoMap, token: &str) -> (f64, u8) {
    tokens
        .get(token)
        .map(|info| (info.price_usd, info.decimals))
        .unwrap_or((0.0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amm::ConstantProductPool;
    use crate::core::pool::PoolSimulator;
    use crate::core::types::TokenInfo;
    use std::time::Duration;
    use test_case::test_case;

    fn token_map(tokens: &[&str]) -> TokenInfoMap {
        tokens
            .iter()
            .map(|t| {
                (
                    t.to_string(),
                    TokenInfo {
                        address: t.to_string(),
                        symbol: t.to_uppercase(),
                        decimals: 0,
                        price_usd: 1.0,
                    },
                )
            })
            .collect()
    }

    fn parallel_pools() -> Arc<PoolSet> {
        let pools: Vec<Box<dyn PoolSimulator>> = vec![
            Box::new(ConstantProductPool::new("ab-1", ["a", "b"], [10000, 10000], 0)),
            Box::new(ConstantProductPool::new("ab-2", ["a", "b"], [10000, 10000], 0)),
        ];
        Arc::new(PoolSet::new(pools))
    }

    fn request<'a>(amount: u64, token_out: &'a str, tokens: &'a TokenInfoMap) -> RouteRequest<'a> {
        RouteRequest {
            token_amount_in: TokenAmount::new("a", BigUint::from(amount), amount as f64),
            token_out,
            tokens,
            gas_option: GasOption::default(),
            save_gas: false,
            deadline: None,
        }
    }

    #[test_case(1000, vec![500, 500] ; "two fragments")]
    #[test_case(900, vec![900] ; "remainder folded into single fragment")]
    #[test_case(1900, vec![570, 570, 760] ; "last fragment takes remainder")]
    fn split_amount_in_respects_min_part(total: u64, expected: Vec<u64>) {
        let builder = RouteBuilder::new(FinderOptions::default());
        let fragments = builder.split_amount_in(&BigUint::from(total), 1.0, 0);

        let expected: Vec<BigUint> = expected.into_iter().map(BigUint::from).collect();
        assert_eq!(fragments, expected);
    }

    #[test]
    fn split_amount_in_without_price_is_one_fragment() {
        let builder = RouteBuilder::new(FinderOptions::default());
        let fragments = builder.split_amount_in(&BigUint::from(123_456u32), 0.0, 6);

        assert_eq!(fragments, vec![BigUint::from(123_456u32)]);
    }

    #[test]
    fn split_amount_in_sums_to_total_when_not_divisible() {
        let builder = RouteBuilder::new(FinderOptions {
            min_part_usd: 0.0,
            ..FinderOptions::default()
        });
        let total = BigUint::from(1013u32);
        let fragments = builder.split_amount_in(&total, 1.0, 0);

        assert_eq!(fragments.len(), 20);
        assert_eq!(fragments.iter().sum::<BigUint>(), total);
    }

    #[test]
    fn split_route_spreads_across_parallel_pools() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions::default());
        let route = builder
            .build(parallel_pools(), &request(1000, "b", &tokens))
            .unwrap();

        let used: Vec<&str> = route.paths.iter().map(|p| p.pools[0].as_str()).collect();
        assert_eq!(used, vec!["ab-1", "ab-2"]);
        assert_eq!(route.input.amount, BigUint::from(1000u32));
        // 476 out of each pool
        assert_eq!(route.output.amount, BigUint::from(952u32));
    }

    #[test]
    fn save_gas_uses_a_single_path() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions::default());
        let mut req = request(1000, "b", &tokens);
        req.save_gas = true;

        let route = builder.build(parallel_pools(), &req).unwrap();
        assert_eq!(route.paths.len(), 1);
        assert_eq!(route.output.amount, BigUint::from(909u32));
    }

    #[test]
    fn full_route_reuses_existing_paths() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions {
            max_paths_in_route: 1,
            ..FinderOptions::default()
        });
        let pools = parallel_pools();
        let req = request(1000, "b", &tokens);
        let hop_index = HopIndex::build(pools.as_ref(), "b", &tokens);
        let fragments = vec![BigUint::from(500u32), BigUint::from(500u32)];

        let route = builder
            .route_fragments(&pools, &req, &hop_index, fragments, 1.0, 0)
            .unwrap();
        assert_eq!(route.paths.len(), 1);
        // Second fragment goes through the already drained ab-1
        assert_eq!(route.output.amount, BigUint::from(476u32 + 432));

        // Sequential fragments through one pool lose to a single swap of the whole amount
        let best = builder.build(pools, &req).unwrap();
        assert_eq!(best.output.amount, BigUint::from(909u32));
    }

    #[test]
    fn single_path_wins_when_gas_outweighs_split_gain() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions::default());
        let mut req = request(1000, "b", &tokens);

        // Without gas the split route gets 952 against 909 for one swap
        let route = builder.build(parallel_pools(), &req).unwrap();
        assert_eq!(route.paths.len(), 2);

        // 43.5 USD per hop: split nets 2 * (476 - 43.5) = 865, one swap nets 909 - 43.5
        req.gas_option = GasOption {
            include_gas: true,
            gas_price: 1e9,
            gas_token_price_usd: 725_000.0,
        };
        let route = builder.build(parallel_pools(), &req).unwrap();
        assert_eq!(route.paths.len(), 1);
        assert_eq!(route.output.amount, BigUint::from(909u32));
        assert!((route.output.amount_usd - 865.5).abs() < 1e-9);
    }

    #[test]
    fn unreachable_output_gives_empty_route() {
        let tokens = token_map(&["a", "b", "c"]);
        let builder = RouteBuilder::new(FinderOptions::default());

        let route = builder
            .build(parallel_pools(), &request(1000, "c", &tokens))
            .unwrap();
        assert!(route.is_empty());
        assert_eq!(route.output.amount, BigUint::zero());
    }

    #[test]
    fn passed_deadline_aborts_build() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions::default());
        let mut req = request(1000, "b", &tokens);
        req.deadline = Some(Instant::now());

        assert_eq!(
            builder.build(parallel_pools(), &req).unwrap_err(),
            RouteError::DeadlineExceeded
        );

        req.deadline = Some(Instant::now() + Duration::from_secs(60));
        assert!(builder.build(parallel_pools(), &req).is_ok());
    }

    #[test]
    fn empty_pool_set_is_an_error() {
        let tokens = token_map(&["a", "b"]);
        let builder = RouteBuilder::new(FinderOptions::default());

        assert_eq!(
            builder
                .build(Arc::new(PoolSet::default()), &request(1000, "b", &tokens))
                .unwrap_err(),
            RouteError::EmptyPoolSet
        );
    }
}
