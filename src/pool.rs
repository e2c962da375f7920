//! Connection Pool Adapter (spec §4.5).

use crate::client::PoolClient;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

/// Build a pool from a validated [`CoreConfig`].
///
/// Uses `NoTls` (suitable for trusted-network deployments, matching the
/// teacher's `create_pool` default); callers that need TLS should construct
/// their own `deadpool_postgres::Manager` with a TLS connector instead.
pub fn create_pool(config: &CoreConfig) -> CoreResult<Pool> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&config.db_url)
        .port(config.db_port)
        .dbname(&config.db_name)
        .user(&config.db_user)
        .password(&config.db_password);

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let manager = Manager::from_config(pg_config, NoTls, manager_config);

    Pool::builder(manager)
        .max_size(config.max_pool_transactions)
        .build()
        .map_err(CoreError::from)
}

/// Check out a connection from the pool.
///
/// This is a scoped acquisition: the returned [`PoolClient`] releases the
/// connection back to the pool on drop regardless of how the caller's scope
/// exits (early return, panic unwind, or normal completion).
pub async fn checkout(pool: &Pool) -> CoreResult<PoolClient> {
    let client = pool.get().await?;
    Ok(PoolClient::new(client))
}
