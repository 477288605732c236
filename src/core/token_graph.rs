use super::pool::PoolLookup;
use super::types::TokenInfoMap;
use std::collections::{HashMap, VecDeque};

/// Minimum number of hops from every whitelisted token to one destination token.
///
/// Built with a breadth first search walking backwards from the destination, so
/// `get(t)` is a lower bound on the hops any path from `t` still needs. An empty
/// index means the destination is not whitelisted and no extra pruning applies.
#[derive(Clone, Debug, Default)]
pub struct HopIndex {
    hops: HashMap<String, u32>,
}

impl HopIndex {
    pub fn build<L: PoolLookup + ?Sized>(
        lookup: &L,
        token_out: &str,
        whitelist: &TokenInfoMap,
    ) -> Self {
        let mut hops = HashMap::new();
        if !whitelist.contains_key(token_out) {
            return Self { hops };
        }

        let mut queue = VecDeque::new();
        hops.insert(token_out.to_string(), 0);
        queue.push_back(token_out.to_string());

        while let Some(token) = queue.pop_front() {
            let distance = hops[&token];
            for address in lookup.pools_of_token(&token) {
                let Some(pool) = lookup.get_pool(address) else {
                    continue;
                };
                for from in pool.can_swap_to(&token) {
                    if !whitelist.contains_key(&from) || hops.contains_key(&from) {
                        continue;
                    }
                    hops.insert(from.clone(), distance + 1);
                    queue.push_back(from);
                }
            }
        }

        Self { hops }
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.hops.get(token).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Whether a state reaching `token` after `hops` swaps can still finish within
    /// `max_hops`.
    pub fn is_admissible(&self, token: &str, hops: u32, max_hops: u32) -> bool {
        if hops > max_hops {
            return false;
        }
        if self.is_empty() {
            return true;
        }
        match self.get(token) {
            Some(remaining) => hops + remaining <= max_hops,
            None => false,
        }
    }
}
