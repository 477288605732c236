use super::super::constants::{BPS, FIXED_RATE_SWAP_GAS};
use super::super::errors::PoolError;
use super::super::pool::{CalcAmountOutResult, PoolSimulator, SwapInfo};
use super::super::types::TokenAmount;
use super::PoolEntity;
use num_bigint::BigUint;
use num_traits::Zero;

pub const POOL_TYPE: &str = "fixed-rate";

/// Pegged pool swapping any listed token 1:1 (wrappers, bridged copies), minus a fee.
/// Output is capped by the reserve of the token being bought.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedRatePool {
    pub address: String,
    pub exchange: String,
    pub tokens: Vec<String>,
    pub reserves: Vec<BigUint>,
    pub fee: u32, // Fee in basis points
}

impl FixedRatePool {
    pub fn from_entity(entity: &PoolEntity) -> Result<Self, PoolError> {
        let reserves = entity.parse_reserves()?;
        if entity.tokens.len() < 2 || reserves.len() != entity.tokens.len() {
            return Err(PoolError::InvalidEntity {
                address: entity.address.clone(),
                reason: "one reserve per token and at least two tokens are required".to_string(),
            });
        }
        Ok(Self {
            address: entity.address.clone(),
            exchange: entity.exchange.clone(),
            tokens: entity.tokens.clone(),
            reserves,
            fee: entity.fee.min(BPS),
        })
    }
}

impl PoolSimulator for FixedRatePool {
    fn calc_amount_out(
        &self,
        token_amount_in: &TokenAmount,
        token_out: &str,
    ) -> Result<CalcAmountOutResult, PoolError> {
        if token_amount_in.token == token_out {
            return Err(PoolError::SameToken);
        }
        self.get_token_index(&token_amount_in.token)
            .ok_or_else(|| PoolError::UnknownToken(token_amount_in.token.clone()))?;
        let index_out = self
            .get_token_index(token_out)
            .ok_or_else(|| PoolError::UnknownToken(token_out.to_string()))?;
        if token_amount_in.amount.is_zero() {
            return Err(PoolError::ZeroAmountIn);
        }

        let fee = &token_amount_in.amount * BigUint::from(self.fee) / BigUint::from(BPS);
        let amount_out = &token_amount_in.amount - &fee;
        if amount_out.is_zero() || amount_out > self.reserves[index_out] {
            return Err(PoolError::InsufficientLiquidity);
        }

        Ok(CalcAmountOutResult {
            token_amount_out: TokenAmount::new(token_out, amount_out.clone(), 0.0),
            fee: TokenAmount::new(&token_amount_in.token, fee.clone(), 0.0),
            gas: FIXED_RATE_SWAP_GAS,
            swap_info: SwapInfo {
                token_in: token_amount_in.token.clone(),
                token_out: token_out.to_string(),
                amount_in: token_amount_in.amount.clone(),
                amount_out,
                fee,
            },
        })
    }

    fn update_balance(&mut self, swap_info: &SwapInfo) {
        let (Some(index_in), Some(index_out)) = (
            self.get_token_index(&swap_info.token_in),
            self.get_token_index(&swap_info.token_out),
        ) else {
            return;
        };
        self.reserves[index_in] += &swap_info.amount_in;
        self.reserves[index_out] = if self.reserves[index_out] > swap_info.amount_out {
            &self.reserves[index_out] - &swap_info.amount_out
        } else {
            BigUint::zero()
        };
    }

    fn calc_exact_quote(&self, token_in: &str, token_out: &str, base: &BigUint) -> Option<BigUint> {
        self.get_token_index(token_in)?;
        self.get_token_index(token_out)?;
        Some(base.clone())
    }

    fn get_address(&self) -> &str {
        &self.address
    }

    fn get_exchange(&self) -> &str {
        &self.exchange
    }

    fn get_type(&self) -> &str {
        POOL_TYPE
    }

    fn get_tokens(&self) -> &[String] {
        &self.tokens
    }

    fn get_reserves(&self) -> &[BigUint] {
        &self.reserves
    }

    fn clone_box(&self) -> Box<dyn PoolSimulator> {
        Box::new(self.clone())
    }

    fn get_meta_info(&self, _token_in: &str, _token_out: &str) -> serde_json::Value {
        serde_json::json!({ "fee": self.fee })
    }
}
