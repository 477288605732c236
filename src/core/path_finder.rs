use super::constants::{DEFAULT_MAX_HOPS, DEFAULT_MAX_POOLS_TO_VISIT};
use super::errors::FinderError;
use super::path::Path;
use super::pool::PoolLookup;
use super::token_graph::HopIndex;
use super::types::{amount_to_usd, GasOption, TokenAmount, TokenInfoMap};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

/// One best path search: route `token_amount_in` into `token_out`.
#[derive(Clone, Debug)]
pub struct FinderInput<'a> {
    pub token_amount_in: TokenAmount,
    pub token_out: &'a str,
    // Whitelisted tokens with their decimals and prices
    pub tokens: &'a TokenInfoMap,
    pub gas_option: GasOption,
}

impl FinderInput<'_> {
    fn token_out_valuation(&self) -> (f64, u8) {
        self.tokens
            .get(self.token_out)
            .map(|info| (info.price_usd, info.decimals))
            .unwrap_or((0.0, 0))
    }

    /// Gas only takes part in ranking when the output can be valued in USD.
    pub fn gas_inclusive(&self) -> bool {
        self.gas_option.include_gas && self.token_out_valuation().0 > 0.0
    }
}

#[derive(Clone, Debug)]
struct Label {
    amount: TokenAmount,
    hops: u32,
    gas: i64,
    // (previous token, pool used from it)
    prev: Option<(String, String)>,
}

/// Label correcting search for the best single path.
///
/// Tokens are processed from a FIFO queue. Each token keeps its best amount seen so far
/// and a back pointer; a token is queued again whenever its label improves. Chains never
/// revisit a token or a pool, and the hop index prunes states that cannot reach the
/// output within `max_hops`.
#[derive(Clone, Copy, Debug)]
pub struct PathFinder {
    pub max_hops: u32,
    // Upper bound on CalcAmountOut evaluations per search, 0 is unlimited
    pub max_pools_to_visit: usize,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            max_pools_to_visit: DEFAULT_MAX_POOLS_TO_VISIT,
        }
    }
}

impl PathFinder {
    pub fn new(max_hops: u32, max_pools_to_visit: usize) -> Self {
        Self {
            max_hops,
            max_pools_to_visit,
        }
    }

    /// Returns the best path for the input amount, or `None` when the output token is
    /// unreachable.
    ///
    /// `reuse` holds paths already accepted into the route. In gas inclusive mode they
    /// are repriced at the new amount and the best one becomes the starting incumbent.
    /// With `reuse_only` the graph search is skipped and only those paths compete.
    pub fn best_path_exact_in<L: PoolLookup + ?Sized>(
        &self,
        lookup: &L,
        hop_index: &HopIndex,
        input: &FinderInput,
        reuse: &[Path],
        reuse_only: bool,
    ) -> Result<Option<Path>, FinderError> {
        if lookup.is_empty() {
            return Err(FinderError::EmptyPoolSet);
        }
        let gas_inclusive = input.gas_inclusive();

        let mut best = None;
        if gas_inclusive || reuse_only {
            best = self.warm_start(lookup, input, reuse, gas_inclusive);
        }
        if reuse_only {
            return Ok(best);
        }

        let token_in = input.token_amount_in.token.clone();
        let token_out = input.token_out;
        let mut labels: HashMap<String, Label> = HashMap::new();
        let mut queue = VecDeque::new();
        let mut queued = HashSet::new();
        let mut visited = 0usize;

        labels.insert(
            token_in.clone(),
            Label {
                amount: input.token_amount_in.clone(),
                hops: 0,
                gas: 0,
                prev: None,
            },
        );
        queue.push_back(token_in.clone());
        queued.insert(token_in);

        'search: while let Some(token) = queue.pop_front() {
            queued.remove(&token);
            if token == token_out {
                self.consider_target(lookup, input, &labels, gas_inclusive, &mut best);
                continue;
            }

            let Some(label) = labels.get(&token).cloned() else {
                continue;
            };
            if label.hops >= self.max_hops {
                continue;
            }
            let Some((chain_tokens, chain_pools)) = chain_of(&labels, &token) else {
                continue;
            };
            let hops = label.hops + 1;

            for address in lookup.pools_of_token(&token) {
                if chain_pools.contains(address) {
                    continue;
                }
                let Some(pool) = lookup.get_pool(address) else {
                    continue;
                };
                for to in pool.can_swap_from(&token) {
                    let to_info = input.tokens.get(&to);
                    if (to_info.is_none() && to != token_out) || chain_tokens.contains(&to) {
                        continue;
                    }
                    if !hop_index.is_admissible(&to, hops, self.max_hops) {
                        continue;
                    }
                    if self.max_pools_to_visit > 0 && visited >= self.max_pools_to_visit {
                        break 'search;
                    }
                    visited += 1;

                    let Ok(result) = pool.calc_amount_out(&label.amount, &to) else {
                        continue;
                    };
                    if !result.token_amount_out.is_positive() {
                        continue;
                    }

                    let gas = label.gas + result.gas;
                    let (price_usd, decimals) = to_info
                        .map(|info| (info.price_usd, info.decimals))
                        .unwrap_or((0.0, 0));
                    let amount_usd =
                        amount_to_usd(&result.token_amount_out.amount, decimals, price_usd)
                            - input.gas_option.gas_usd(gas);
                    let candidate = Label {
                        amount: TokenAmount::new(
                            &to,
                            result.token_amount_out.amount,
                            amount_usd,
                        ),
                        hops,
                        gas,
                        prev: Some((token.clone(), address.clone())),
                    };

                    let use_usd = gas_inclusive && price_usd > 0.0;
                    if !improves(labels.get(&to), &candidate, use_usd) {
                        continue;
                    }
                    labels.insert(to.clone(), candidate);
                    if queued.insert(to.clone()) {
                        queue.push_back(to);
                    }
                }
            }
        }

        // The search may stop on the pool budget with the output still queued
        if queued.contains(token_out) {
            self.consider_target(lookup, input, &labels, gas_inclusive, &mut best);
        }

        Ok(best)
    }

    fn warm_start<L: PoolLookup + ?Sized>(
        &self,
        lookup: &L,
        input: &FinderInput,
        reuse: &[Path],
        gas_inclusive: bool,
    ) -> Option<Path> {
        let (price_usd, decimals) = input.token_out_valuation();
        let mut best: Option<Path> = None;
        for path in reuse {
            if path.input.token != input.token_amount_in.token || path.output.token != input.token_out
            {
                continue;
            }
            let Ok(candidate) = path.reprice(lookup, &input.token_amount_in, price_usd, decimals)
            else {
                continue;
            };
            if candidate.compare_to(best.as_ref(), gas_inclusive) == Ordering::Greater {
                best = Some(candidate);
            }
        }
        best
    }

    fn consider_target<L: PoolLookup + ?Sized>(
        &self,
        lookup: &L,
        input: &FinderInput,
        labels: &HashMap<String, Label>,
        gas_inclusive: bool,
        best: &mut Option<Path>,
    ) {
        let Some((pools, tokens)) = reconstruct(labels, input.token_out) else {
            return;
        };
        if pools.is_empty() || pools.len() > self.max_hops as usize {
            return;
        }
        let (price_usd, decimals) = input.token_out_valuation();
        let Ok(path) = Path::new(
            lookup,
            pools,
            tokens,
            &input.token_amount_in,
            input.token_out,
            price_usd,
            decimals,
            input.gas_option,
        ) else {
            return;
        };
        if path.compare_to(best.as_ref(), gas_inclusive) == Ordering::Greater {
            *best = Some(path);
        }
    }
}

fn improves(existing: Option<&Label>, candidate: &Label, use_usd: bool) -> bool {
    let Some(existing) = existing else {
        return true;
    };
    let ordering = if use_usd {
        candidate
            .amount
            .amount_usd
            .partial_cmp(&existing.amount.amount_usd)
            .unwrap_or(Ordering::Equal)
    } else {
        candidate.amount.amount.cmp(&existing.amount.amount)
    };
    match ordering {
        Ordering::Greater => true,
        Ordering::Equal => candidate.hops < existing.hops,
        Ordering::Less => false,
    }
}

/// Tokens and pools on the back pointer chain ending at `token`.
fn chain_of(
    labels: &HashMap<String, Label>,
    token: &str,
) -> Option<(HashSet<String>, HashSet<String>)> {
    let mut tokens = HashSet::new();
    let mut pools = HashSet::new();
    let mut current = token.to_string();
    loop {
        if !tokens.insert(current.clone()) {
            return None;
        }
        match &labels.get(&current)?.prev {
            Some((prev_token, pool)) => {
                pools.insert(pool.clone());
                current = prev_token.clone();
            }
            None => return Some((tokens, pools)),
        }
    }
}

/// Pool and token lists from the source to `token`, following back pointers.
fn reconstruct(
    labels: &HashMap<String, Label>,
    token: &str,
) -> Option<(Vec<String>, Vec<String>)> {
    let mut pools = Vec::new();
    let mut tokens = vec![token.to_string()];
    let mut current = token.to_string();
    while let Some((prev_token, pool)) = &labels.get(&current)?.prev {
        // A chain longer than the label count has looped
        if tokens.len() > labels.len() {
            return None;
        }
        pools.push(pool.clone());
        tokens.push(prev_token.clone());
        current = prev_token.clone();
    }
    pools.reverse();
    tokens.reverse();
    Some((pools, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amm::ConstantProductPool;
    use crate::core::pool::{PoolSet, PoolSimulator};
    use crate::core::types::TokenInfo;
    use num_bigint::BigUint;

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

    fn pool_set(pools: Vec<ConstantProductPool>) -> PoolSet {
        PoolSet::new(
            pools
                .into_iter()
                .map(|p| Box::new(p) as Box<dyn PoolSimulator>)
                .collect(),
        )
    }

    fn three_token_chain() -> PoolSet {
        pool_set(vec![
            ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 0),
            ConstantProductPool::new("pool2", ["token2", "token3"], [10000, 10000], 0),
        ])
    }

    fn search(
        finder: PathFinder,
        pools: &PoolSet,
        tokens: &TokenInfoMap,
        amount: u64,
        token_out: &str,
        gas_option: GasOption,
    ) -> Result<Option<Path>, FinderError> {
        let hop_index = HopIndex::build(pools, token_out, tokens);
        let input = FinderInput {
            token_amount_in: TokenAmount::new("token1", BigUint::from(amount), amount as f64),
            token_out,
            tokens,
            gas_option,
        };
        finder.best_path_exact_in(pools, &hop_index, &input, &[], false)
    }

    #[test]
    fn finds_two_hop_path_within_max_hops() {
        let pools = three_token_chain();
        let tokens = token_map(&["token1", "token2", "token3"]);

        let path = search(
            PathFinder::new(2, 0),
            &pools,
            &tokens,
            100,
            "token3",
            GasOption::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(path.pools, vec!["pool1", "pool2"]);
        assert_eq!(path.tokens, vec!["token1", "token2", "token3"]);
        assert_eq!(path.output.amount, BigUint::from(98u32));
    }

    #[test]
    fn no_path_when_max_hops_too_small() {
        let pools = three_token_chain();
        let tokens = token_map(&["token1", "token2", "token3"]);

        let path = search(
            PathFinder::new(1, 0),
            &pools,
            &tokens,
            100,
            "token3",
            GasOption::default(),
        )
        .unwrap();

        assert!(path.is_none());
    }

    #[test]
    fn unreachable_destination_is_not_an_error() {
        let pools = three_token_chain();
        let tokens = token_map(&["token1", "token2", "token3", "token4"]);

        let path = search(
            PathFinder::default(),
            &pools,
            &tokens,
            100,
            "token4",
            GasOption::default(),
        )
        .unwrap();

        assert!(path.is_none());
    }

    #[test]
    fn empty_pool_set_is_an_error() {
        let tokens = token_map(&["token1", "token3"]);
        let result = search(
            PathFinder::default(),
            &PoolSet::default(),
            &tokens,
            100,
            "token3",
            GasOption::default(),
        );

        assert_eq!(result.unwrap_err(), FinderError::EmptyPoolSet);
    }

    #[test]
    fn picks_deeper_pool_among_parallel_pools() {
        let pools = pool_set(vec![
            ConstantProductPool::new("shallow", ["token1", "token2"], [1000, 1000], 0),
            ConstantProductPool::new("deep", ["token1", "token2"], [1000, 2000], 0),
        ]);
        let tokens = token_map(&["token1", "token2"]);

        let path = search(PathFinder::default(), &pools, &tokens, 100, "token2", GasOption::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.pools, vec!["deep"]);

        // Budget of one evaluation only reaches the first listed pool
        let path = search(PathFinder::new(3, 1), &pools, &tokens, 100, "token2", GasOption::default())
            .unwrap()
            .unwrap();
        assert_eq!(path.pools, vec!["shallow"]);
    }

    #[test]
    fn prefers_direct_pool_over_longer_chain_with_gas() {
        // Two hop chain gives slightly more output, but not enough to pay for the extra hop
        let pools = pool_set(vec![
            ConstantProductPool::new("direct", ["token1", "token3"], [100000, 100000], 0),
            ConstantProductPool::new("pool1", ["token1", "token2"], [100000, 102000], 0),
            ConstantProductPool::new("pool2", ["token2", "token3"], [100000, 100000], 0),
        ]);
        let tokens = token_map(&["token1", "token2", "token3"]);
        let gas_option = GasOption {
            include_gas: true,
            gas_price: 1e9,
            gas_token_price_usd: 1_000_000.0,
        };

        // 990 out directly, 998 through token2, each hop costs 60 USD of gas
        let without_gas =
            search(PathFinder::default(), &pools, &tokens, 1000, "token3", GasOption::default())
                .unwrap()
                .unwrap();
        assert_eq!(without_gas.pools, vec!["pool1", "pool2"]);

        let with_gas = search(PathFinder::default(), &pools, &tokens, 1000, "token3", gas_option)
            .unwrap()
            .unwrap();
        assert_eq!(with_gas.pools, vec!["direct"]);
    }

    #[test]
    fn reuse_only_reprices_accepted_paths() {
        let pools = three_token_chain();
        let tokens = token_map(&["token1", "token2", "token3"]);
        let accepted = search(
            PathFinder::default(),
            &pools,
            &tokens,
            100,
            "token3",
            GasOption::default(),
        )
        .unwrap()
        .unwrap();

        let hop_index = HopIndex::build(&pools, "token3", &tokens);
        let input = FinderInput {
            token_amount_in: TokenAmount::new("token1", BigUint::from(200u32), 200.0),
            token_out: "token3",
            tokens: &tokens,
            gas_option: GasOption::default(),
        };
        let path = PathFinder::default()
            .best_path_exact_in(&pools, &hop_index, &input, &[accepted], true)
            .unwrap()
            .unwrap();

        assert_eq!(path.input.amount, BigUint::from(200u32));
        // 200 -> 196 -> 192
        assert_eq!(path.output.amount, BigUint::from(192u32));

        let none = PathFinder::default()
            .best_path_exact_in(&pools, &hop_index, &input, &[], true)
            .unwrap();
        assert!(none.is_none());
    }
}
