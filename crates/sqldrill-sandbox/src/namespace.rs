use crate::dialect::Dialect;
use crate::errors::SandboxError;
use crate::providers::SqlConnection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An allocated, exclusively-owned sandbox namespace. Never outlives one
/// `execute_in_sandbox` call; never reused or shared.
#[derive(Debug)]
pub struct NamespaceHandle {
    name: String,
}

impl NamespaceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Generates collision-free namespace names and owns creation/teardown.
///
/// The sequence is the only state shared across concurrent executions;
/// `fetch_add` keeps two calls from ever minting the same name even when
/// their timestamps collide at millisecond granularity.
pub struct NamespaceAllocator {
    sequence: Arc<AtomicU64>,
}

impl NamespaceAllocator {
    pub fn new() -> Self {
        Self::with_sequence(Arc::new(AtomicU64::new(0)))
    }

    /// Share one sequence between allocators serving concurrent calls.
    pub fn with_sequence(sequence: Arc<AtomicU64>) -> Self {
        Self { sequence }
    }

    pub fn next_name(&self) -> String {
        let counter = self.sequence.fetch_add(1, Ordering::SeqCst);
        let millis = chrono::Utc::now().timestamp_millis();
        format!("sandbox_{}_{}", counter, millis)
    }

    pub async fn allocate(
        &self,
        conn: &dyn SqlConnection,
        dialect: &dyn Dialect,
    ) -> Result<NamespaceHandle, SandboxError> {
        let name = self.next_name();
        conn.execute(&dialect.create_namespace_sql(&name), &[])
            .await
            .map_err(|e| SandboxError::allocation(e.to_string()))?;

        if let Some(sql) = dialect.set_active_namespace_sql(&name) {
            if let Err(e) = conn.execute(&sql, &[]).await {
                // The namespace exists but is unusable; tear it down
                // best-effort before failing the allocation.
                self.drop_namespace(conn, dialect, &name).await;
                return Err(SandboxError::allocation(e.to_string()));
            }
        }

        tracing::debug!(namespace = %name, dialect = dialect.name(), "namespace allocated");
        Ok(NamespaceHandle { name })
    }

    /// Drop the namespace. Failure is logged and swallowed: a leaked
    /// namespace is preferable to crashing the caller, and leaks are swept
    /// externally.
    pub async fn release(
        &self,
        conn: &dyn SqlConnection,
        dialect: &dyn Dialect,
        handle: NamespaceHandle,
    ) {
        self.drop_namespace(conn, dialect, &handle.name).await;
    }

    async fn drop_namespace(&self, conn: &dyn SqlConnection, dialect: &dyn Dialect, name: &str) {
        match conn.execute(&dialect.drop_namespace_sql(name), &[]).await {
            Ok(_) => tracing::debug!(namespace = %name, "namespace released"),
            Err(e) => {
                tracing::warn!(namespace = %name, error = %e, "failed to drop sandbox namespace")
            }
        }
    }
}

impl Default for NamespaceAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_carry_counter_and_timestamp() {
        let alloc = NamespaceAllocator::new();
        let name = alloc.next_name();
        let parts: Vec<&str> = name.split('_').collect();
        assert_eq!(parts[0], "sandbox");
        assert_eq!(parts[1], "0");
        assert!(parts[2].parse::<i64>().unwrap() > 0);
        assert!(alloc.next_name().starts_with("sandbox_1_"));
    }

    #[test]
    fn shared_sequence_never_repeats_across_allocators() {
        let seq = Arc::new(AtomicU64::new(0));
        let a = NamespaceAllocator::with_sequence(seq.clone());
        let b = NamespaceAllocator::with_sequence(seq);
        let mut names = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(names.insert(a.next_name()));
            assert!(names.insert(b.next_name()));
        }
    }
}
