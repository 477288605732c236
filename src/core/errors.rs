use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("token {0} is not part of the pool")]
    UnknownToken(String),
    #[error("cannot swap a token into itself")]
    SameToken,
    #[error("amount in must be positive")]
    ZeroAmountIn,
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    #[error("unsupported pool type {0}")]
    UnsupportedPoolType(String),
    #[error("invalid pool entity {address}: {reason}")]
    InvalidEntity { address: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path must contain at least two tokens")]
    InvalidTokenLength,
    #[error("path must contain exactly one pool fewer than tokens")]
    InvalidPoolLength,
    #[error("first token of the path does not match the input token")]
    InvalidTokenIn,
    #[error("last token of the path does not match the output token")]
    InvalidTokenOut,
    #[error("pool {0} not found")]
    PoolNotFound(String),
    #[error("swap through pool {pool} failed: {reason}")]
    SwapFailed { pool: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FinderError {
    #[error("no pools available for routing")]
    EmptyPoolSet,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("path tokens {path_in} -> {path_out} do not match route {route_in} -> {route_out}")]
    TokenMismatch {
        route_in: String,
        route_out: String,
        path_in: String,
        path_out: String,
    },
    #[error("pool {0} not found")]
    PoolNotFound(String),
    #[error("swap through pool {pool} failed: {reason}")]
    SwapFailed { pool: String, reason: String },
    #[error("no pools available for routing")]
    EmptyPoolSet,
    #[error("deadline exceeded before the route was complete")]
    DeadlineExceeded,
    #[error("invalid path: {0}")]
    InvalidPath(PathError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cached route has zero input amount")]
    ZeroInputAmount,
    #[error("route cache capacity must be positive")]
    InvalidCapacity,
}

impl From<PathError> for RouteError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::PoolNotFound(address) => RouteError::PoolNotFound(address),
            PathError::SwapFailed { pool, reason } => RouteError::SwapFailed { pool, reason },
            other => RouteError::InvalidPath(other),
        }
    }
}

impl From<FinderError> for RouteError {
    fn from(err: FinderError) -> Self {
        match err {
            FinderError::EmptyPoolSet => RouteError::EmptyPoolSet,
        }
    }
}
