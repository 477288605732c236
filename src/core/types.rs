use super::constants::GAS_TOKEN_DECIMALS;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TokenInfoMap = HashMap<String, TokenInfo>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAmount {
    pub token: String,
    #[serde(with = "decimal_string")]
    pub amount: BigUint,
    pub amount_usd: f64,
}

impl TokenAmount {
    pub fn new(token: &str, amount: BigUint, amount_usd: f64) -> Self {
        Self {
            token: token.to_string(),
            amount,
            amount_usd,
        }
    }

    pub fn zero(token: &str) -> Self {
        Self::new(token, BigUint::zero(), 0.0)
    }

    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
    pub price_usd: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GasOption {
    pub include_gas: bool,
    // Price of one gas unit, in the smallest unit of the gas token
    pub gas_price: f64,
    pub gas_token_price_usd: f64,
}

impl GasOption {
    pub fn gas_usd(&self, gas: i64) -> f64 {
        if gas <= 0 {
            return 0.0;
        }
        gas as f64 * self.gas_price * self.gas_token_price_usd / 10f64.powi(GAS_TOKEN_DECIMALS)
    }
}

pub fn amount_to_usd(amount: &BigUint, decimals: u8, price_usd: f64) -> f64 {
    if price_usd <= 0.0 {
        return 0.0;
    }
    let value = amount.to_f64().unwrap_or(0.0);
    value * price_usd / 10f64.powi(decimals as i32)
}

// Big integers are stored as decimal strings so snapshots stay readable
pub mod decimal_string {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        T::from_str(&value).map_err(D::Error::custom)
    }
}
