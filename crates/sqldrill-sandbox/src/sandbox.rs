use crate::compare::compare_result_sets;
use crate::dialect::Dialect;
use crate::errors::SandboxError;
use crate::model::{ExecutionOutcome, ExecuteRequest, SchemaDescription, VerificationVerdict};
use crate::namespace::{NamespaceAllocator, NamespaceHandle};
use crate::providers::SqlConnection;
use crate::schema;
use crate::validate::ensure_read_only;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

/// Coordinates one verification call: allocate namespace, materialize
/// schema, run candidate and reference, compare, release.
///
/// Constructed per call (or per request handler) around one connection;
/// the connection is never shared between concurrent executions. The only
/// cross-call state is the namespace sequence, which callers share via
/// `with_sequence`.
pub struct SandboxExecutor {
    conn: Arc<dyn SqlConnection>,
    dialect: Arc<dyn Dialect>,
    allocator: NamespaceAllocator,
}

impl SandboxExecutor {
    pub fn new(conn: Arc<dyn SqlConnection>, dialect: Arc<dyn Dialect>) -> Self {
        Self::with_sequence(conn, dialect, Arc::new(AtomicU64::new(0)))
    }

    pub fn with_sequence(
        conn: Arc<dyn SqlConnection>,
        dialect: Arc<dyn Dialect>,
        sequence: Arc<AtomicU64>,
    ) -> Self {
        Self {
            conn,
            dialect,
            allocator: NamespaceAllocator::with_sequence(sequence),
        }
    }

    /// Run one verification. The returned error is always
    /// `SandboxError::Allocation`; every other failure mode is folded into
    /// the verdict so the UI can render a per-call diagnostic. The
    /// namespace is dropped on every path after a successful allocation.
    pub async fn execute_in_sandbox(
        &self,
        request: ExecuteRequest,
    ) -> Result<VerificationVerdict, SandboxError> {
        if request.candidate_sql.trim().is_empty() {
            return Ok(VerificationVerdict::incorrect(ExecutionOutcome::failed(
                "candidate query must not be empty",
                0,
            )));
        }

        let schema = match request.schema.clone().into_description() {
            Ok(schema) => schema,
            Err(e) => {
                return Ok(VerificationVerdict::incorrect(ExecutionOutcome::failed(
                    format!("invalid schema description: {}", e),
                    0,
                )))
            }
        };

        if request.read_only {
            if let Err(e) = ensure_read_only(&request.candidate_sql) {
                return Ok(VerificationVerdict::incorrect(ExecutionOutcome::failed(
                    e.to_string(),
                    0,
                )));
            }
        }

        let started = Instant::now();
        let handle = self
            .allocator
            .allocate(self.conn.as_ref(), self.dialect.as_ref())
            .await?;

        let verdict = self.run_phases(&request, &schema, &handle, started).await;

        self.allocator
            .release(self.conn.as_ref(), self.dialect.as_ref(), handle)
            .await;

        Ok(verdict)
    }

    async fn run_phases(
        &self,
        request: &ExecuteRequest,
        schema: &SchemaDescription,
        handle: &NamespaceHandle,
        started: Instant,
    ) -> VerificationVerdict {
        if let Err(e) = schema::materialize(
            self.conn.as_ref(),
            self.dialect.as_ref(),
            handle.name(),
            schema,
        )
        .await
        {
            tracing::debug!(namespace = handle.name(), error = %e, "materialization failed");
            return VerificationVerdict::incorrect(ExecutionOutcome::failed(
                e.to_string(),
                elapsed_ms(started),
            ));
        }

        // A candidate failure is captured, not thrown: the reference still
        // runs and the namespace still comes down.
        let candidate = self.run_query(&request.candidate_sql, started).await;
        let reference = match &request.reference_sql {
            Some(sql) => Some(self.run_query(sql, started).await),
            None => None,
        };

        // A failing candidate is never correct, even if the reference also
        // failed. Without a reference there is nothing to verify against.
        let is_correct = match (&candidate.error, &reference) {
            (None, Some(r)) if r.error.is_none() => compare_result_sets(&candidate.rows, &r.rows),
            _ => false,
        };

        VerificationVerdict {
            is_correct,
            candidate,
            reference,
        }
    }

    async fn run_query(&self, sql: &str, started: Instant) -> ExecutionOutcome {
        match self.conn.query(sql).await {
            Ok(table) => ExecutionOutcome::from_table(table, elapsed_ms(started)),
            Err(e) => ExecutionOutcome::failed(e.to_string(), elapsed_ms(started)),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
