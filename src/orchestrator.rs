use super::cache::{RouteCache, RouteCacheKey};
use super::core::indexer::pool::load_pool_set;
use super::core::indexer::token::read_token_infos;
use super::core::pool::PoolSet;
use super::core::route::{Route, RouteSummary};
use super::core::route_builder::{RouteBuilder, RouteRequest};
use super::core::types::{amount_to_usd, GasOption, TokenAmount, TokenInfoMap};
use super::types::{QuoteRequest, QuoteResponse, ResponseSwap, RouterConfig};
use anyhow::{anyhow, Context, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub fn validate_request(request: &QuoteRequest) -> Result<BigUint> {
    if request.token_in.trim().is_empty() || request.token_out.trim().is_empty() {
        return Err(anyhow!("Token in and token out addresses cannot be empty"));
    }
    if request.token_in == request.token_out {
        return Err(anyhow!("Token in and token out must differ"));
    }
    let amount_in = BigUint::from_str(request.amount_in.trim())
        .map_err(|_| anyhow!("Amount in must be a positive integer"))?;
    if amount_in.is_zero() {
        return Err(anyhow!("Amount in must be a positive integer"));
    }
    if request.gas_price.is_some_and(|price| price < 0.0) {
        return Err(anyhow!("Gas price cannot be negative"));
    }
    Ok(amount_in)
}

/// Pools and tokens of one request, read from the snapshot files.
pub struct MarketData {
    pub pools: Arc<PoolSet>,
    pub tokens: TokenInfoMap,
}

pub fn load_market_data(config: &RouterConfig) -> Result<MarketData> {
    let tokens = read_token_infos(config.token_file_path())?;
    let (pools, skipped) = load_pool_set(config.pool_file_path())?;
    if !skipped.is_empty() {
        warn!(count = skipped.len(), ?skipped, "skipped unsupported pools");
    }
    debug!(pools = pools.len(), tokens = tokens.len(), "market data loaded");
    Ok(MarketData {
        pools: Arc::new(pools),
        tokens,
    })
}

pub fn get_route_quote(
    config: &RouterConfig,
    cache: &RouteCache,
    request: QuoteRequest,
) -> Result<QuoteResponse> {
    let amount_in = validate_request(&request)?;
    let market = load_market_data(config)?;

    let (price_in, decimals_in) = valuation(&market.tokens, &request.token_in);
    let gas_option = GasOption {
        include_gas: request.gas_include,
        gas_price: request.gas_price.unwrap_or(config.gas_price),
        gas_token_price_usd: valuation(&market.tokens, &config.gas_token).0,
    };
    let key = RouteCacheKey::new(
        &config.cache,
        &request.token_in,
        &request.token_out,
        &amount_in,
        price_in,
        decimals_in,
        request.save_gas,
        &gas_option,
    );

    if config.cache.enabled {
        if let Some(summary) = summarize_cached(cache, &key, &market, &amount_in, price_in, decimals_in)
        {
            info!(%key, "route served from cache");
            return Ok(build_response(&market.tokens, &summary, gas_option, true));
        }
    }

    let deadline = (config.build_timeout_ms > 0)
        .then(|| Instant::now() + Duration::from_millis(config.build_timeout_ms));
    let route_request = RouteRequest {
        token_amount_in: TokenAmount::new(
            &request.token_in,
            amount_in.clone(),
            amount_to_usd(&amount_in, decimals_in, price_in),
        ),
        token_out: &request.token_out,
        tokens: &market.tokens,
        gas_option,
        save_gas: request.save_gas,
        deadline,
    };
    let started = Instant::now();
    let route = RouteBuilder::new(config.finder.clone())
        .build(market.pools.clone(), &route_request)
        .context("Route build failed")?;
    if route.is_empty() {
        return Err(anyhow!(
            "No route found from {} to {}",
            request.token_in,
            request.token_out
        ));
    }
    info!(
        paths = route.paths.len(),
        amount_out = %route.output.amount,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "route built"
    );

    let summary = summarize_fresh(&route, &market.pools)?;
    if config.cache.enabled {
        cache.set(&key, &route.to_cached_route());
    }
    Ok(build_response(&market.tokens, &summary, gas_option, false))
}

fn valuation(tokens: &TokenInfoMap, token: &str) -> (f64, u8) {
    tokens
        .get(token)
        .map(|info| (info.price_usd, info.decimals))
        .unwrap_or((0.0, 0))
}

/// Replays the route against the current state of the pools it touches.
fn summarize_fresh(route: &Route, pools: &PoolSet) -> Result<RouteSummary> {
    let fresh = Arc::new(pools.subset(&route.extract_pool_addresses()));
    let summary = route.summarize(fresh).context("Couldn't summarize route")?;
    Ok(summary)
}

fn summarize_cached(
    cache: &RouteCache,
    key: &RouteCacheKey,
    market: &MarketData,
    amount_in: &BigUint,
    price_in: f64,
    decimals_in: u8,
) -> Option<RouteSummary> {
    let mut cached = cache.get(key)?;
    let result = cached
        .redistribute_input_amount(amount_in, price_in, decimals_in)
        .map_err(anyhow::Error::from)
        .and_then(|_| {
            cached
                .to_route(market.pools.clone())
                .map_err(anyhow::Error::from)
        })
        .and_then(|route| summarize_fresh(&route, &market.pools));
    match result {
        Ok(summary) => Some(summary),
        Err(e) => {
            debug!(%key, error = %e, "cached route unusable, building a new one");
            None
        }
    }
}

fn build_response(
    tokens: &TokenInfoMap,
    summary: &RouteSummary,
    gas_option: GasOption,
    from_cache: bool,
) -> QuoteResponse {
    let (price_in, decimals_in) = valuation(tokens, &summary.token_in);
    let (price_out, decimals_out) = valuation(tokens, &summary.token_out);
    let path_count = summary
        .steps
        .last()
        .map(|step| step.path_index + 1)
        .unwrap_or(0);

    QuoteResponse {
        token_in: summary.token_in.clone(),
        token_out: summary.token_out.clone(),
        amount_in: summary.amount_in.to_string(),
        amount_in_usd: amount_to_usd(&summary.amount_in, decimals_in, price_in),
        amount_out: summary.amount_out.to_string(),
        amount_out_usd: amount_to_usd(&summary.amount_out, decimals_out, price_out),
        total_gas: summary.total_gas,
        gas_usd: gas_option.gas_usd(summary.total_gas),
        path_count,
        from_cache,
        swaps: summary.steps.iter().map(ResponseSwap::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn request(token_in: &str, token_out: &str, amount_in: &str) -> QuoteRequest {
        QuoteRequest {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in: amount_in.to_string(),
            save_gas: false,
            gas_include: false,
            gas_price: None,
        }
    }

    #[test_case("", "0xb", "100" ; "empty token in")]
    #[test_case("0xa", "0xa", "100" ; "same tokens")]
    #[test_case("0xa", "0xb", "0" ; "zero amount")]
    #[test_case("0xa", "0xb", "-5" ; "negative amount")]
    #[test_case("0xa", "0xb", "1e18" ; "not an integer")]
    fn validate_request_rejects(token_in: &str, token_out: &str, amount_in: &str) {
        assert!(validate_request(&request(token_in, token_out, amount_in)).is_err());
    }

    #[test]
    fn validate_request_parses_amount() {
        let amount = validate_request(&request("0xa", "0xb", " 1000000 ")).unwrap();
        assert_eq!(amount, BigUint::from(1_000_000u32));
    }
}
