use crate::errors::SandboxError;
use regex::Regex;
use std::sync::OnceLock;

/// Write/DDL verbs rejected in read-only ("practice") mode.
///
/// Deliberately a coarse lexical gate, not a parser: it can reject a
/// legitimate query that carries one of these words inside a string
/// literal. Acceptable for short practice queries.
const WRITE_VERBS: &str = r"(?i)\b(insert|update|delete|drop|alter|create|truncate)\b";

fn write_verb_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WRITE_VERBS).unwrap())
}

/// Reject the statement if it contains a write/DDL verb anywhere.
pub fn ensure_read_only(sql: &str) -> Result<(), SandboxError> {
    if let Some(m) = write_verb_pattern().find(sql) {
        return Err(SandboxError::Forbidden {
            keyword: m.as_str().to_lowercase(),
        });
    }
    Ok(())
}
