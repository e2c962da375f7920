//! Generic client trait unifying pooled connections and transactions.

use crate::error::CoreResult;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Connection Pool Adapter's querying surface (spec §4.5).
///
/// Unifies a checked-out pooled client and a `tokio_postgres::Transaction`
/// behind one interface, so query constructors and the controller don't care
/// which one they were handed.
pub trait GenericClient: Send + Sync {
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = CoreResult<Vec<Row>>> + Send;

    fn query_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = CoreResult<Row>> + Send;

    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = CoreResult<Option<Row>>> + Send;
}

/// Wrapper around `deadpool_postgres::Client` implementing [`GenericClient`].
pub struct PoolClient(deadpool_postgres::Client);

impl PoolClient {
    pub fn new(client: deadpool_postgres::Client) -> Self {
        Self(client)
    }

    pub fn inner(&self) -> &deadpool_postgres::Client {
        &self.0
    }
}

impl std::ops::Deref for PoolClient {
    type Target = deadpool_postgres::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl GenericClient for PoolClient {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Vec<Row>> {
        Ok(self.0.query(sql, params).await?)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Row> {
        Ok(self.0.query_one(sql, params).await?)
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Option<Row>> {
        Ok(self.0.query_opt(sql, params).await?)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Vec<Row>> {
        Ok(tokio_postgres::Transaction::query(self, sql, params).await?)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Row> {
        Ok(tokio_postgres::Transaction::query_one(self, sql, params).await?)
    }

    async fn query_opt(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CoreResult<Option<Row>> {
        Ok(tokio_postgres::Transaction::query_opt(self, sql, params).await?)
    }
}
