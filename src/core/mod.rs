pub mod amm;
pub mod cached_route;
pub mod constants;
pub mod errors;
pub mod indexer;
pub mod path;
pub mod path_finder;
pub mod pool;
pub mod route;
pub mod route_builder;
pub mod token_graph;
pub mod types;
pub use anyhow::{Context, Result};
