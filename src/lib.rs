//! citegraph-core: query construction, caching, table pagination and
//! co-author graph materialization over a citation/author database.
//!
//! See `SPEC_FULL.md` for the full module breakdown; this crate carries no
//! transport layer (HTTP/RPC) of its own — it's the backend a service would
//! embed and drive directly via [`pool`], [`queries`], [`controller`] and
//! [`graph`].

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod graph;
pub mod ident;
pub mod pool;
pub mod queries;
pub mod row;
pub mod sql;

pub use client::{GenericClient, PoolClient};
pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use sql::{QueryBuilder, QueryCache};
