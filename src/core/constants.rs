use num_bigint::BigInt;

// Price impact is a fixed point fraction with 18 decimals
pub const PRICE_IMPACT_DECIMALS: u32 = 18;

// Gas prices are quoted in the smallest unit of an 18 decimals gas token
pub const GAS_TOKEN_DECIMALS: i32 = 18;

pub const BPS: u32 = 10_000;

pub const DEFAULT_MAX_HOPS: u32 = 3;
pub const DEFAULT_DISTRIBUTION_PERCENT: u32 = 5;
pub const DEFAULT_MIN_PART_USD: f64 = 500.0;
pub const DEFAULT_MAX_PATHS_IN_ROUTE: usize = 20;
pub const DEFAULT_MAX_POOLS_TO_VISIT: usize = 0;

// Rough gas cost of one hop through a constant product pair
pub const CONSTANT_PRODUCT_SWAP_GAS: i64 = 60_000;
pub const FIXED_RATE_SWAP_GAS: i64 = 45_000;

#[allow(non_snake_case)]
pub fn PRICE_IMPACT_ONE() -> BigInt {
    BigInt::from(10u64).pow(PRICE_IMPACT_DECIMALS)
}

// Used when the marginal quote of a path cannot be computed
#[allow(non_snake_case)]
pub fn PRICE_IMPACT_FULL() -> BigInt {
    PRICE_IMPACT_ONE() * BigInt::from(100u32)
}
