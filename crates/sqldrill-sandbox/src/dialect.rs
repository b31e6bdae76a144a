//! Dialect adapter: the one seam that varies between target engines.
//!
//! A namespace is a schema on Postgres, a database on MySQL, and an
//! ATTACH'd in-memory database on SQLite. Everything else the executor
//! does is dialect-independent.

/// Base type keywords the mapper recognizes. A recognized token passes
/// through unchanged (parameters preserved); anything else degrades to the
/// dialect's generic text type.
const KNOWN_TYPES: &[&str] = &[
    "INTEGER",
    "BIGINT",
    "SMALLINT",
    "DECIMAL",
    "NUMERIC",
    "REAL",
    "DOUBLE",
    "FLOAT",
    "VARCHAR",
    "CHAR",
    "TEXT",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "BOOLEAN",
    "JSON",
];

const FLOAT_TYPES: &[&str] = &["REAL", "DOUBLE", "FLOAT"];

pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn create_namespace_sql(&self, namespace: &str) -> String;

    /// Drop statement with cascade/force semantics: a non-empty namespace
    /// must go away without manual table-drop ordering.
    fn drop_namespace_sql(&self, namespace: &str) -> String;

    /// Statement pointing the connection's working namespace at the
    /// sandbox, when the engine needs one.
    fn set_active_namespace_sql(&self, namespace: &str) -> Option<String>;

    fn generic_text_type(&self) -> &'static str {
        "TEXT"
    }

    /// Dialect spelling for a floating-point base keyword.
    fn float_type(&self, base: &str) -> String {
        base.to_string()
    }

    /// Positional bind marker for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    /// Translate a dialect-agnostic type token into a type expression this
    /// dialect accepts. Total: unknown tokens fall back to the generic
    /// text type instead of blocking schema creation.
    fn map_type(&self, token: &str) -> String {
        let trimmed = token.trim();
        let base = trimmed
            .split('(')
            .next()
            .unwrap_or(trimmed)
            .trim()
            .to_uppercase();
        if FLOAT_TYPES.contains(&base.as_str()) {
            return self.float_type(&base);
        }
        if KNOWN_TYPES.contains(&base.as_str()) {
            return trimmed.to_string();
        }
        self.generic_text_type().to_string()
    }
}

/// Postgres-style engine: one temporary schema per execution.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn create_namespace_sql(&self, namespace: &str) -> String {
        format!("CREATE SCHEMA {}", namespace)
    }

    fn drop_namespace_sql(&self, namespace: &str) -> String {
        format!("DROP SCHEMA IF EXISTS {} CASCADE", namespace)
    }

    fn set_active_namespace_sql(&self, namespace: &str) -> Option<String> {
        Some(format!("SET search_path TO {}", namespace))
    }

    fn float_type(&self, base: &str) -> String {
        match base {
            "DOUBLE" => "DOUBLE PRECISION".to_string(),
            _ => "REAL".to_string(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }
}

/// MySQL-style engine: one temporary database per execution.
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn create_namespace_sql(&self, namespace: &str) -> String {
        format!("CREATE DATABASE {}", namespace)
    }

    fn drop_namespace_sql(&self, namespace: &str) -> String {
        // DROP DATABASE removes contained tables on its own.
        format!("DROP DATABASE IF EXISTS {}", namespace)
    }

    fn set_active_namespace_sql(&self, namespace: &str) -> Option<String> {
        Some(format!("USE {}", namespace))
    }
}

/// SQLite: an attached in-memory database per execution. Unqualified table
/// names resolve into the attachment as long as one sandbox is live per
/// connection, which the one-connection-per-execution rule guarantees.
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn create_namespace_sql(&self, namespace: &str) -> String {
        format!("ATTACH DATABASE ':memory:' AS {}", namespace)
    }

    fn drop_namespace_sql(&self, namespace: &str) -> String {
        format!("DETACH DATABASE {}", namespace)
    }

    fn set_active_namespace_sql(&self, _namespace: &str) -> Option<String> {
        None
    }

    fn float_type(&self, _base: &str) -> String {
        "REAL".to_string()
    }
}
