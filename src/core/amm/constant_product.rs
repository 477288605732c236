use super::super::constants::{BPS, CONSTANT_PRODUCT_SWAP_GAS};
use super::super::errors::PoolError;
use super::super::pool::{CalcAmountOutResult, PoolSimulator, SwapInfo};
use super::super::types::TokenAmount;
use super::PoolEntity;
use num_bigint::BigUint;
use num_traits::Zero;

pub const POOL_TYPE: &str = "constant-product";

/// Two token x * y = k pair with a flat fee in basis points, charged on the input.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantProductPool {
    pub address: String,
    pub exchange: String,
    pub tokens: Vec<String>,
    pub reserves: Vec<BigUint>,
    pub fee: u32, // Fee in basis points
    pub gas: i64,
}

impl ConstantProductPool {
    pub fn new(address: &str, tokens: [&str; 2], reserves: [u64; 2], fee: u32) -> Self {
        Self {
            address: address.to_string(),
            exchange: "uniswap-v2".to_string(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            reserves: reserves.iter().map(|r| BigUint::from(*r)).collect(),
            fee,
            gas: CONSTANT_PRODUCT_SWAP_GAS,
        }
    }

    pub fn from_entity(entity: &PoolEntity) -> Result<Self, PoolError> {
        let reserves = entity.parse_reserves()?;
        if entity.tokens.len() != 2 || reserves.len() != 2 {
            return Err(PoolError::InvalidEntity {
                address: entity.address.clone(),
                reason: "constant product pools have exactly two tokens".to_string(),
            });
        }
        if entity.fee >= BPS {
            return Err(PoolError::InvalidEntity {
                address: entity.address.clone(),
                reason: format!("fee {} bps is not below {}", entity.fee, BPS),
            });
        }
        Ok(Self {
            address: entity.address.clone(),
            exchange: entity.exchange.clone(),
            tokens: entity.tokens.clone(),
            reserves,
            fee: entity.fee,
            gas: CONSTANT_PRODUCT_SWAP_GAS,
        })
    }

    fn indexes(&self, token_in: &str, token_out: &str) -> Result<(usize, usize), PoolError> {
        if token_in == token_out {
            return Err(PoolError::SameToken);
        }
        let index_in = self
            .get_token_index(token_in)
            .ok_or_else(|| PoolError::UnknownToken(token_in.to_string()))?;
        let index_out = self
            .get_token_index(token_out)
            .ok_or_else(|| PoolError::UnknownToken(token_out.to_string()))?;
        Ok((index_in, index_out))
    }

    pub fn get_amount_out(
        &self,
        amount_in: &BigUint,
        reserve_in: &BigUint,
        reserve_out: &BigUint,
    ) -> BigUint {
        let fee_denominator = BigUint::from(BPS);
        let amount_in_with_fee = amount_in * BigUint::from(BPS - self.fee);
        let numerator = &amount_in_with_fee * reserve_out;
        let denominator = (reserve_in * &fee_denominator) + &amount_in_with_fee;

        if denominator.is_zero() {
            return BigUint::zero();
        }
        numerator / denominator
    }
}

impl PoolSimulator for ConstantProductPool {
    fn calc_amount_out(
        &self,
        token_amount_in: &TokenAmount,
        token_out: &str,
    ) -> Result<CalcAmountOutResult, PoolError> {
        let (index_in, index_out) = self.indexes(&token_amount_in.token, token_out)?;
        if token_amount_in.amount.is_zero() {
            return Err(PoolError::ZeroAmountIn);
        }
        let reserve_in = &self.reserves[index_in];
        let reserve_out = &self.reserves[index_out];

        let amount_out = self.get_amount_out(&token_amount_in.amount, reserve_in, reserve_out);
        if amount_out.is_zero() || &amount_out >= reserve_out {
            return Err(PoolError::InsufficientLiquidity);
        }
        let fee = &token_amount_in.amount * BigUint::from(self.fee) / BigUint::from(BPS);

        Ok(CalcAmountOutResult {
            token_amount_out: TokenAmount::new(token_out, amount_out.clone(), 0.0),
            fee: TokenAmount::new(&token_amount_in.token, fee.clone(), 0.0),
            gas: self.gas,
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
        let Ok((index_in, index_out)) = self.indexes(&swap_info.token_in, &swap_info.token_out)
        else {
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
        let (index_in, index_out) = self.indexes(token_in, token_out).ok()?;
        let reserve_in = &self.reserves[index_in];
        if reserve_in.is_zero() {
            return None;
        }
        Some(base * &self.reserves[index_out] / reserve_in)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(token: &str, value: u64) -> TokenAmount {
        TokenAmount::new(token, BigUint::from(value), 0.0)
    }

    #[test]
    fn calc_amount_out_without_fee() {
        let pool = ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 0);
        let result = pool.calc_amount_out(&amount("token1", 100), "token2").unwrap();

        assert_eq!(result.token_amount_out.amount, BigUint::from(99u32));
        assert_eq!(result.token_amount_out.token, "token2");
        assert_eq!(result.gas, CONSTANT_PRODUCT_SWAP_GAS);
    }

    #[test]
    fn calc_amount_out_charges_fee_on_input() {
        let pool = ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 30);
        let result = pool.calc_amount_out(&amount("token1", 1000), "token2").unwrap();

        // 1000 * 9970 * 10000 / (10000 * 10000 + 1000 * 9970)
        assert_eq!(result.token_amount_out.amount, BigUint::from(906u32));
        assert_eq!(result.fee.amount, BigUint::from(3u32));
    }

    #[test]
    fn calc_amount_out_rejects_unknown_token_and_zero_input() {
        let pool = ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 0);

        assert_eq!(
            pool.calc_amount_out(&amount("token3", 100), "token2"),
            Err(PoolError::UnknownToken("token3".to_string()))
        );
        assert_eq!(
            pool.calc_amount_out(&amount("token1", 0), "token2"),
            Err(PoolError::ZeroAmountIn)
        );
        assert_eq!(
            pool.calc_amount_out(&amount("token1", 100), "token1"),
            Err(PoolError::SameToken)
        );
    }

    #[test]
    fn update_balance_moves_reserves() {
        let mut pool = ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 10000], 0);
        let result = pool.calc_amount_out(&amount("token2", 100), "token1").unwrap();
        pool.update_balance(&result.swap_info);

        assert_eq!(pool.reserves[0], BigUint::from(9901u32));
        assert_eq!(pool.reserves[1], BigUint::from(10100u32));

        // Second identical swap gets less
        let second = pool.calc_amount_out(&amount("token2", 100), "token1").unwrap();
        assert!(second.token_amount_out.amount < result.token_amount_out.amount);
    }

    #[test]
    fn exact_quote_ignores_slippage() {
        let pool = ConstantProductPool::new("pool1", ["token1", "token2"], [10000, 20000], 30);
        assert_eq!(
            pool.calc_exact_quote("token1", "token2", &BigUint::from(100u32)),
            Some(BigUint::from(200u32))
        );
        let empty = ConstantProductPool::new("pool2", ["token1", "token2"], [0, 20000], 30);
        assert_eq!(empty.calc_exact_quote("token1", "token2", &BigUint::from(100u32)), None);
    }
}
