pub mod pool;
pub mod token;
pub use super::types;
pub use anyhow::{Context, Result};
