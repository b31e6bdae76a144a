use crate::model::{Record, ResultTable};
use crate::providers::SqlConnection;
use anyhow::Context;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite-backed connection provider. Pairs with `SqliteDialect`:
/// namespaces are ATTACH'd in-memory databases, so a sandbox lives and
/// dies with this connection.
#[derive(Clone)]
pub struct SqliteConnection {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl SqlConnection for SqliteConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> anyhow::Result<u64> {
        let conn = self.conn.lock().unwrap();
        let bound = params
            .iter()
            .map(bind_value)
            .collect::<anyhow::Result<Vec<rusqlite::types::Value>>>()?;
        let affected = conn
            .execute(sql, rusqlite::params_from_iter(bound))
            .with_context(|| format!("statement failed: {}", first_keyword(sql)))?;
        Ok(affected as u64)
    }

    async fn query(&self, sql: &str) -> anyhow::Result<ResultTable> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut out = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.clone(), read_value(row.get_ref(i)?));
            }
            out.push(record);
        }

        Ok(ResultTable { columns, rows: out })
    }

    fn provider_name(&self) -> &'static str {
        "sqlite"
    }
}

fn bind_value(value: &Value) -> anyhow::Result<rusqlite::types::Value> {
    let bound = match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else if n.is_u64() {
                // Above i64::MAX; refuse rather than store a lossy float.
                anyhow::bail!("integer out of range for sqlite: {}", n);
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("unrepresentable number: {}", n))?;
                rusqlite::types::Value::Real(f)
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        // Nested JSON is stored as its text encoding.
        other => rusqlite::types::Value::Text(other.to_string()),
    };
    Ok(bound)
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
    }
}

fn first_keyword(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .unwrap_or("")
        .to_uppercase()
}
