use crate::core::amm::{new_pool, PoolEntity};
use crate::core::pool::PoolSet;
use super::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PoolSnapshot {
    pub pools: Vec<PoolEntity>,
}

pub fn read_pool_snapshot_from_disk<P: AsRef<Path>>(snapshot_file_path: P) -> Result<PoolSnapshot> {
    let path = snapshot_file_path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Couldn't read pool snapshot {}", path.display()))?;
    let snapshot: PoolSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("Invalid pool snapshot {}", path.display()))?;
    Ok(snapshot)
}

/// Loads a snapshot into a pool set. Entities of an unknown type or with bad data are
/// skipped and returned by address, so one broken pool does not hide the others.
pub fn load_pool_set<P: AsRef<Path>>(snapshot_file_path: P) -> Result<(PoolSet, Vec<String>)> {
    let snapshot = read_pool_snapshot_from_disk(snapshot_file_path)?;
    let mut pool_set = PoolSet::default();
    let mut skipped = vec![];
    for entity in &snapshot.pools {
        match new_pool(entity) {
            Ok(pool) => pool_set.insert(pool),
            Err(_) => skipped.push(entity.address.clone()),
        }
    }
    Ok((pool_set, skipped))
}
