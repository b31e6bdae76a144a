use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row, keyed by column name as the engine returned it.
pub type Record = serde_json::Map<String, Value>;

/// Declarative, dialect-agnostic description of the tables to stand up
/// inside a sandbox namespace. Tables are created in declaration order;
/// dependents go after their dependencies by convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDescription(pub Vec<TableSpec>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(alias = "tableName")]
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default, rename = "isPrimaryKey", alias = "primaryKey")]
    pub is_primary_key: bool,
    #[serde(default, rename = "isNotNull", alias = "notNull")]
    pub is_not_null: bool,
    #[serde(
        default,
        rename = "defaultValue",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,
}

/// Schema input as handed over by the UI layer: either a JSON-encoded
/// string or an already-parsed description. Parsed once per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaInput {
    Raw(String),
    Parsed(SchemaDescription),
}

impl SchemaInput {
    pub fn into_description(self) -> Result<SchemaDescription, serde_json::Error> {
        match self {
            SchemaInput::Raw(s) => serde_json::from_str(&s),
            SchemaInput::Parsed(d) => Ok(d),
        }
    }
}

impl From<SchemaDescription> for SchemaInput {
    fn from(d: SchemaDescription) -> Self {
        SchemaInput::Parsed(d)
    }
}

/// Input contract from the UI/glue layer for one verification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(rename = "candidateSQL", alias = "query")]
    pub candidate_sql: String,
    #[serde(rename = "schemaDescription")]
    pub schema: SchemaInput,
    #[serde(
        default,
        rename = "referenceSQL",
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_sql: Option<String>,
    #[serde(default, rename = "readOnlyMode")]
    pub read_only: bool,
}

/// Tabular result of one query as returned by a connection provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

/// Outcome of running one query inside the sandbox. Columns and rows are
/// empty when the query failed; `error` carries the engine's message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
}

impl ExecutionOutcome {
    pub fn from_table(table: ResultTable, execution_time_ms: u64) -> Self {
        Self {
            columns: table.columns,
            rows: table.rows,
            error: None,
            execution_time_ms,
        }
    }

    pub fn failed(message: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            error: Some(message.into()),
            execution_time_ms,
        }
    }
}

/// What one verification call produced. Immutable after construction; the
/// engine keeps no state between calls besides the namespace sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub is_correct: bool,
    pub candidate: ExecutionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ExecutionOutcome>,
}

impl VerificationVerdict {
    pub fn incorrect(candidate: ExecutionOutcome) -> Self {
        Self {
            is_correct: false,
            candidate,
            reference: None,
        }
    }

    /// UI response payload. The reference rows are withheld when the
    /// candidate was already correct so the answer is not leaked.
    pub fn into_response(self) -> Value {
        let mut body = serde_json::json!({
            "isCorrect": self.is_correct,
            "result": self.candidate.rows,
            "executionTime": self.candidate.execution_time_ms,
        });
        if let Some(err) = self.candidate.error {
            body["error"] = Value::String(err);
        }
        if !self.is_correct {
            if let Some(reference) = self.reference {
                body["expectedResult"] = Value::Array(
                    reference.rows.into_iter().map(Value::Object).collect(),
                );
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_description_parses_camel_case_wire_form() {
        let raw = r#"[{
            "name": "employees",
            "columns": [
                {"name": "id", "type": "INT", "isPrimaryKey": true},
                {"name": "name", "type": "VARCHAR(100)", "isNotNull": true},
                {"name": "rank", "type": "INTEGER", "defaultValue": 1}
            ],
            "rows": [{"id": 1, "name": "Ann"}]
        }]"#;
        let desc: SchemaDescription = serde_json::from_str(raw).unwrap();
        assert_eq!(desc.0.len(), 1);
        let table = &desc.0[0];
        assert_eq!(table.name, "employees");
        assert!(table.columns[0].is_primary_key);
        assert!(table.columns[1].is_not_null);
        assert_eq!(table.columns[2].default_value, Some(serde_json::json!(1)));
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn schema_input_accepts_raw_and_parsed() {
        let raw = SchemaInput::Raw(r#"[{"name":"t","columns":[{"name":"c","type":"INT"}]}]"#.into());
        assert_eq!(raw.into_description().unwrap().0[0].name, "t");

        let parsed: SchemaInput = serde_json::from_str(
            r#"[{"name":"t","columns":[{"name":"c","type":"INT"}]}]"#,
        )
        .unwrap();
        assert!(matches!(parsed, SchemaInput::Parsed(_)));
    }

    #[test]
    fn response_withholds_expected_result_when_correct() {
        let outcome = ExecutionOutcome {
            columns: vec!["name".into()],
            rows: vec![serde_json::json!({"name": "Ann"})
                .as_object()
                .cloned()
                .unwrap()],
            error: None,
            execution_time_ms: 3,
        };
        let verdict = VerificationVerdict {
            is_correct: true,
            candidate: outcome.clone(),
            reference: Some(outcome),
        };
        let body = verdict.into_response();
        assert_eq!(body["isCorrect"], serde_json::json!(true));
        assert!(body.get("expectedResult").is_none());
    }

    #[test]
    fn response_includes_expected_result_when_incorrect() {
        let reference = ExecutionOutcome {
            columns: vec!["name".into()],
            rows: vec![serde_json::json!({"name": "Ann"})
                .as_object()
                .cloned()
                .unwrap()],
            error: None,
            execution_time_ms: 2,
        };
        let verdict = VerificationVerdict {
            is_correct: false,
            candidate: ExecutionOutcome::failed("no such table: employes", 1),
            reference: Some(reference),
        };
        let body = verdict.into_response();
        assert_eq!(body["isCorrect"], serde_json::json!(false));
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("no such table"));
        assert_eq!(body["expectedResult"].as_array().unwrap().len(), 1);
    }
}
