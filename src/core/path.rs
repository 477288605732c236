use super::constants::{PRICE_IMPACT_FULL, PRICE_IMPACT_ONE};
use super::errors::PathError;
use super::pool::{simulate_chain, PoolLookup};
use super::types::{amount_to_usd, GasOption, TokenAmount};
use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use std::cmp::Ordering;

/// A validated chain of swaps from `input.token` to `output.token`.
///
/// `pools[i]` swaps `tokens[i]` into `tokens[i + 1]`, so there is always one more token
/// than pools. Pools are referenced by address and resolved through a `PoolLookup`.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub input: TokenAmount,
    pub output: TokenAmount,
    pub pools: Vec<String>,
    pub tokens: Vec<String>,
    pub total_gas: i64,
    // 18 decimal fraction, 10^18 is 100%
    pub price_impact: BigInt,
}

impl Path {
    /// Validates the shape of the chain, then simulates it against `lookup`.
    ///
    /// The output USD value is the value of the output amount at `price_usd` minus the
    /// gas cost of every hop.
    #[allow(clippy::too_many_arguments)]
    pub fn new<L: PoolLookup + ?Sized>(
        lookup: &L,
        pools: Vec<String>,
        tokens: Vec<String>,
        token_amount_in: &TokenAmount,
        token_out: &str,
        price_usd: f64,
        decimals: u8,
        gas_option: GasOption,
    ) -> Result<Self, PathError> {
        validate_chain(&pools, &tokens, &token_amount_in.token, token_out)?;

        let simulation = simulate_chain(lookup, &pools, &tokens, &token_amount_in.amount)?;
        let amount_out = simulation.amount_out().cloned().unwrap_or_default();
        let total_gas = simulation.total_gas();
        let amount_usd =
            amount_to_usd(&amount_out, decimals, price_usd) - gas_option.gas_usd(total_gas);
        let price_impact =
            calc_price_impact(lookup, &pools, &tokens, &token_amount_in.amount, &amount_out);

        Ok(Self {
            input: token_amount_in.clone(),
            output: TokenAmount::new(token_out, amount_out, amount_usd),
            pools,
            tokens,
            total_gas,
            price_impact,
        })
    }

    /// Re-simulates the chain for a different input amount without touching any pool.
    pub fn try_swap<L: PoolLookup + ?Sized>(
        &self,
        lookup: &L,
        amount_in: &BigUint,
    ) -> Result<BigUint, PathError> {
        let simulation = simulate_chain(lookup, &self.pools, &self.tokens, amount_in)?;
        Ok(simulation.amount_out().cloned().unwrap_or_default())
    }

    /// Same chain valued at a new input amount. The gas of a chain the route already
    /// pays for is not charged again, so the output USD carries no gas deduction.
    pub fn reprice<L: PoolLookup + ?Sized>(
        &self,
        lookup: &L,
        token_amount_in: &TokenAmount,
        price_usd: f64,
        decimals: u8,
    ) -> Result<Path, PathError> {
        let simulation =
            simulate_chain(lookup, &self.pools, &self.tokens, &token_amount_in.amount)?;
        let amount_out = simulation.amount_out().cloned().unwrap_or_default();
        let amount_usd = amount_to_usd(&amount_out, decimals, price_usd);
        let price_impact = calc_price_impact(
            lookup,
            &self.pools,
            &self.tokens,
            &token_amount_in.amount,
            &amount_out,
        );

        Ok(Path {
            input: token_amount_in.clone(),
            output: TokenAmount::new(&self.output.token, amount_out, amount_usd),
            pools: self.pools.clone(),
            tokens: self.tokens.clone(),
            total_gas: simulation.total_gas(),
            price_impact,
        })
    }

    pub fn equals(&self, other: &Path) -> bool {
        self.input.token == other.input.token
            && self.output.token == other.output.token
            && self.tokens == other.tokens
            && self.pools == other.pools
    }

    /// Adds `other`'s amounts into this path. Returns false, leaving `self` untouched,
    /// when the two paths are not the same chain.
    pub fn merge(&mut self, other: &Path) -> bool {
        if !self.equals(other) {
            return false;
        }
        self.input.amount += &other.input.amount;
        self.input.amount_usd += other.input.amount_usd;
        self.output.amount += &other.output.amount;
        self.output.amount_usd += other.output.amount_usd;
        true
    }

    /// Ranks two candidates. `Greater` means `self` is the better path.
    pub fn compare_to(&self, other: Option<&Path>, gas_inclusive: bool) -> Ordering {
        let Some(other) = other else {
            return Ordering::Greater;
        };

        if gas_inclusive {
            match self.output.amount_usd.partial_cmp(&other.output.amount_usd) {
                Some(Ordering::Equal) | None => {}
                Some(ordering) => return ordering,
            }
        }

        self.output
            .amount
            .cmp(&other.output.amount)
            // Less input for the same output is better
            .then_with(|| other.input.amount.cmp(&self.input.amount))
            .then_with(|| other.price_impact.cmp(&self.price_impact))
            .then_with(|| other.tokens.len().cmp(&self.tokens.len()))
    }
}

/// Shape rules every chain must satisfy before it is simulated, checked in order.
pub fn validate_chain(
    pools: &[String],
    tokens: &[String],
    token_in: &str,
    token_out: &str,
) -> Result<(), PathError> {
    if tokens.len() < 2 {
        return Err(PathError::InvalidTokenLength);
    }
    if pools.len() != tokens.len() - 1 {
        return Err(PathError::InvalidPoolLength);
    }
    if tokens[0] != token_in {
        return Err(PathError::InvalidTokenIn);
    }
    if tokens[tokens.len() - 1] != token_out {
        return Err(PathError::InvalidTokenOut);
    }
    Ok(())
}

/// `1 - amount_out / marginal_out`, where `marginal_out` chains every pool's slippage
/// free quote starting from `amount_in`.
fn calc_price_impact<L: PoolLookup + ?Sized>(
    lookup: &L,
    pools: &[String],
    tokens: &[String],
    amount_in: &BigUint,
    amount_out: &BigUint,
) -> BigInt {
    let mut marginal_out = amount_in.clone();
    for (i, address) in pools.iter().enumerate() {
        let quote = lookup
            .get_pool(address)
            .and_then(|pool| pool.calc_exact_quote(&tokens[i], &tokens[i + 1], &marginal_out));
        match quote {
            Some(quote) => marginal_out = quote,
            None => return PRICE_IMPACT_FULL(),
        }
    }
    if marginal_out.is_zero() {
        return PRICE_IMPACT_FULL();
    }

    let marginal_out = BigInt::from(marginal_out);
    (&marginal_out - BigInt::from(amount_out.clone())) * PRICE_IMPACT_ONE() / marginal_out
}
