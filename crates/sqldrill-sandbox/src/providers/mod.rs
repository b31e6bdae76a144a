use crate::model::ResultTable;
use async_trait::async_trait;
use serde_json::Value;

/// One database connection owned by one execution for its full lifetime.
/// Parameters travel as JSON values; the provider binds them positionally.
#[async_trait]
pub trait SqlConnection: Send + Sync {
    /// Run a statement that returns no rows (DDL, INSERT). Returns the
    /// number of affected rows.
    async fn execute(&self, sql: &str, params: &[Value]) -> anyhow::Result<u64>;

    /// Run a query and return its full result set.
    async fn query(&self, sql: &str) -> anyhow::Result<ResultTable>;

    fn provider_name(&self) -> &'static str;
}

pub mod sqlite;
