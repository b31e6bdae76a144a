use sqldrill_sandbox::dialect::SqliteDialect;
use sqldrill_sandbox::model::{ExecuteRequest, SchemaInput};
use sqldrill_sandbox::namespace::NamespaceAllocator;
use sqldrill_sandbox::providers::sqlite::SqliteConnection;
use sqldrill_sandbox::sandbox::SandboxExecutor;
use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

const CONCURRENT_CALLS: usize = 50;

#[test]
fn shared_sequence_yields_distinct_names_across_threads() {
    let sequence = Arc::new(AtomicU64::new(0));
    let names = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..CONCURRENT_CALLS)
        .map(|_| {
            let sequence = sequence.clone();
            let names = names.clone();
            std::thread::spawn(move || {
                let alloc = NamespaceAllocator::with_sequence(sequence);
                for _ in 0..20 {
                    let name = alloc.next_name();
                    assert!(
                        names.lock().unwrap().insert(name.clone()),
                        "duplicate namespace name: {}",
                        name
                    );
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(names.lock().unwrap().len(), CONCURRENT_CALLS * 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn fifty_concurrent_executions_all_verify_and_clean_up() -> anyhow::Result<()> {
    let sequence = Arc::new(AtomicU64::new(0));

    let mut handles = Vec::new();
    for i in 0..CONCURRENT_CALLS {
        let sequence = sequence.clone();
        handles.push(tokio::spawn(async move {
            // One connection per execution, as the contract requires.
            let conn = SqliteConnection::open_in_memory()?;
            let executor = SandboxExecutor::with_sequence(
                Arc::new(conn.clone()),
                Arc::new(SqliteDialect),
                sequence,
            );

            let schema = SchemaInput::Raw(format!(
                r#"[{{
                    "name": "scores",
                    "columns": [
                        {{"name": "id", "type": "INT"}},
                        {{"name": "points", "type": "INTEGER"}}
                    ],
                    "rows": [{{"id": 1, "points": {}}}]
                }}]"#,
                i
            ));
            let verdict = executor
                .execute_in_sandbox(ExecuteRequest {
                    candidate_sql: "SELECT points FROM scores".into(),
                    schema,
                    reference_sql: Some("SELECT points FROM scores".into()),
                    read_only: false,
                })
                .await?;

            use sqldrill_sandbox::providers::SqlConnection;
            let dbs = conn.query("PRAGMA database_list").await?;
            anyhow::ensure!(dbs.rows.len() == 1, "namespace leaked");
            anyhow::ensure!(verdict.is_correct, "verdict not correct");
            Ok::<_, anyhow::Error>(())
        }));
    }

    for h in handles {
        h.await??;
    }
    Ok(())
}
