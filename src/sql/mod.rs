//! SQL composition: the QueryBuilder, its result cache, and the `:name`
//! placeholder rewrite used right before execution (spec §4.1).

pub mod builder;
pub mod cache;
pub mod placeholder;

pub use builder::{param, Connector, JoinKind, QueryBuilder};
pub use cache::{CacheStats, QueryCache};
