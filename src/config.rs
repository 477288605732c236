use super::cache::CacheOptions;
use super::core::route_builder::FinderOptions;
use super::types::RouterConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            working_dir: "working_dir".to_string(),
            pool_file: "pools.json".to_string(),
            token_file: "tokens.csv".to_string(),
            listen_addr: "127.0.0.1:3000".to_string(),
            gas_token: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
            gas_price: 20_000_000_000.0,
            build_timeout_ms: 2_000,
            finder: FinderOptions::default(),
            cache: CacheOptions::default(),
        }
    }
}

impl RouterConfig {
    // Helper method to load from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let config: Self = confy::load_path(&path)
            .with_context(|| format!("Couldn't load config {}", path.display()))?;
        Ok(config)
    }

    pub fn pool_file_path(&self) -> PathBuf {
        Path::new(&self.working_dir).join(&self.pool_file)
    }

    pub fn token_file_path(&self) -> PathBuf {
        Path::new(&self.working_dir).join(&self.token_file)
    }
}
