use crate::cache::CacheOptions;
use crate::core::route::SwapStep;
use crate::core::route_builder::FinderOptions;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RouterConfig {
    pub working_dir: String,
    pub pool_file: String,
    pub token_file: String,
    pub listen_addr: String,
    // Token whose USD price values gas
    pub gas_token: String,
    // Default price of one gas unit, in the smallest unit of the gas token
    pub gas_price: f64,
    // Per request build budget, 0 disables it
    pub build_timeout_ms: u64,
    pub finder: FinderOptions,
    pub cache: CacheOptions,
}

#[derive(Serialize, Deserialize, ToSchema, IntoParams, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QuoteRequest {
    #[schema(example = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")]
    pub token_in: String,

    #[schema(example = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")]
    pub token_out: String,

    #[schema(example = "1000000000")]
    pub amount_in: String,

    #[serde(default)]
    pub save_gas: bool,

    #[serde(default)]
    pub gas_include: bool,

    #[schema(nullable = true)]
    #[serde(default)]
    pub gas_price: Option<f64>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSwap {
    pub path_index: usize,
    pub pool: String,
    pub exchange: String,
    pub pool_type: String,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_out: String,
    pub fee: String,
    #[schema(value_type = Object)]
    pub extra: serde_json::Value,
}

impl From<&SwapStep> for ResponseSwap {
    fn from(step: &SwapStep) -> Self {
        Self {
            path_index: step.path_index,
            pool: step.pool.clone(),
            exchange: step.exchange.clone(),
            pool_type: step.pool_type.clone(),
            token_in: step.token_in.clone(),
            token_out: step.token_out.clone(),
            amount_in: step.amount_in.to_string(),
            amount_out: step.amount_out.to_string(),
            fee: step.fee.amount.to_string(),
            extra: step.extra.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: String,
    pub amount_in_usd: f64,
    pub amount_out: String,
    pub amount_out_usd: f64,
    pub total_gas: i64,
    pub gas_usd: f64,
    pub path_count: usize,
    pub from_cache: bool,
    pub swaps: Vec<ResponseSwap>,
}
