use super::types::{TokenInfo, TokenInfoMap};
use super::{Context, Result};
use csv::Reader;
use std::fs::File;
use std::path::Path;

// CSV columns: address,symbol,decimals,price_usd
pub fn read_token_infos<P: AsRef<Path>>(token_file_path: P) -> Result<TokenInfoMap> {
    let path = token_file_path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Couldn't open token file {}", path.display()))?;
    let mut reader = Reader::from_reader(file);

    let mut tokens = TokenInfoMap::new();
    for record in reader.deserialize() {
        let token: TokenInfo = record.context("Invalid token record")?;
        tokens.insert(token.address.clone(), token);
    }
    Ok(tokens)
}
