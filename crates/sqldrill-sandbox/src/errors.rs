use std::fmt;

/// Failure modes of the sandbox engine. Only `Allocation` is allowed to
/// escape `execute_in_sandbox`; everything else is folded into the verdict
/// or, for release failures, logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// The namespace could not be created. Fatal to the call.
    Allocation { message: String },
    /// Malformed schema description, or DDL/DML rejected by the engine.
    Schema { message: String },
    /// A write/DDL verb was found while in read-only mode.
    Forbidden { keyword: String },
    /// A table or column name fell outside the allow-listed character set.
    InvalidIdentifier { name: String },
}

impl SandboxError {
    pub fn schema(message: impl Into<String>) -> Self {
        SandboxError::Schema {
            message: message.into(),
        }
    }

    pub fn allocation(message: impl Into<String>) -> Self {
        SandboxError::Allocation {
            message: message.into(),
        }
    }
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::Allocation { message } => {
                write!(f, "namespace allocation failed: {}", message)
            }
            SandboxError::Schema { message } => write!(f, "schema error: {}", message),
            SandboxError::Forbidden { keyword } => write!(
                f,
                "operation not allowed in read-only mode: {}",
                keyword.to_uppercase()
            ),
            SandboxError::InvalidIdentifier { name } => {
                write!(f, "invalid identifier: {:?}", name)
            }
        }
    }
}

impl std::error::Error for SandboxError {}
