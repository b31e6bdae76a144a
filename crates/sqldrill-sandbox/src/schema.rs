use crate::dialect::Dialect;
use crate::errors::SandboxError;
use crate::model::SchemaDescription;
use crate::providers::SqlConnection;
use serde_json::Value;

/// Identifiers are interpolated into DDL (standard binding APIs cannot
/// parameterize them), so they must stay inside a strict allow-list:
/// leading letter or underscore, then letters, digits, underscores.
pub fn validate_identifier(name: &str) -> Result<&str, SandboxError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid || name.len() > 63 {
        return Err(SandboxError::InvalidIdentifier {
            name: name.to_string(),
        });
    }
    Ok(name)
}

/// Stand up the described tables inside `namespace`, in declaration order:
/// one CREATE TABLE per table, then one bulk parameterized INSERT covering
/// all of its seed rows. Any rejection aborts immediately; the caller owns
/// tearing down the half-built namespace.
pub async fn materialize(
    conn: &dyn SqlConnection,
    dialect: &dyn Dialect,
    namespace: &str,
    schema: &SchemaDescription,
) -> Result<(), SandboxError> {
    for table in &schema.0 {
        if table.name.trim().is_empty() || table.columns.is_empty() {
            return Err(SandboxError::schema("missing table definition"));
        }
        let table_name = validate_identifier(&table.name)?;

        let mut clauses = Vec::with_capacity(table.columns.len());
        for col in &table.columns {
            let col_name = validate_identifier(&col.name)?;
            let mut clause = format!("{} {}", col_name, dialect.map_type(&col.column_type));
            if col.is_primary_key {
                clause.push_str(" PRIMARY KEY");
            }
            if col.is_not_null {
                clause.push_str(" NOT NULL");
            }
            if let Some(default) = &col.default_value {
                clause.push_str(" DEFAULT ");
                clause.push_str(&literal(default));
            }
            clauses.push(clause);
        }

        let create = format!(
            "CREATE TABLE {}.{} ({})",
            namespace,
            table_name,
            clauses.join(", ")
        );
        conn.execute(&create, &[])
            .await
            .map_err(|e| SandboxError::schema(e.to_string()))?;

        if table.rows.is_empty() {
            tracing::debug!(table = table_name, "table created, no seed rows");
            continue;
        }

        let column_names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let mut params: Vec<Value> = Vec::with_capacity(table.rows.len() * column_names.len());
        let mut tuples = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut markers = Vec::with_capacity(column_names.len());
            for name in &column_names {
                // Omitted cell implies SQL NULL.
                params.push(row.get(*name).cloned().unwrap_or(Value::Null));
                markers.push(dialect.placeholder(params.len()));
            }
            tuples.push(format!("({})", markers.join(", ")));
        }

        let insert = format!(
            "INSERT INTO {}.{} ({}) VALUES {}",
            namespace,
            table_name,
            column_names.join(", "),
            tuples.join(", ")
        );
        let inserted = conn
            .execute(&insert, &params)
            .await
            .map_err(|e| SandboxError::schema(e.to_string()))?;
        tracing::debug!(table = table_name, rows = inserted, "table materialized");
    }
    Ok(())
}

/// Render a column DEFAULT. Seed data is always bound parametrically, but
/// DEFAULT lives in DDL; strings get their quotes doubled.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
