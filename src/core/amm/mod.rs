pub mod constant_product;
pub mod fixed_rate;

use super::errors::PoolError;
use super::pool::PoolSimulator;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use constant_product::ConstantProductPool;
pub use fixed_rate::FixedRatePool;

/// Serialized pool as found in a pool snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolEntity {
    pub address: String,
    pub exchange: String,
    #[serde(rename = "type")]
    pub pool_type: String,
    pub tokens: Vec<String>,
    // Decimal strings, one per token
    pub reserves: Vec<String>,
    #[serde(default)]
    pub fee: u32, // Fee in basis points
}

impl PoolEntity {
    pub fn parse_reserves(&self) -> Result<Vec<BigUint>, PoolError> {
        self.reserves
            .iter()
            .map(|reserve| {
                BigUint::from_str(reserve).map_err(|_| PoolError::InvalidEntity {
                    address: self.address.clone(),
                    reason: format!("invalid reserve {}", reserve),
                })
            })
            .collect()
    }
}

/// Builds the simulator matching the entity's pool type.
pub fn new_pool(entity: &PoolEntity) -> Result<Box<dyn PoolSimulator>, PoolError> {
    match entity.pool_type.as_str() {
        constant_product::POOL_TYPE => Ok(Box::new(ConstantProductPool::from_entity(entity)?)),
        fixed_rate::POOL_TYPE => Ok(Box::new(FixedRatePool::from_entity(entity)?)),
        other => Err(PoolError::UnsupportedPoolType(other.to_string())),
    }
}
