//! End-to-end engine flows against in-process DuckDB.
//!
//! The warehouse is an in-memory DuckDB instance (catalog `memory`, schema
//! `main`) and the metadata store is a DuckDB file in a temp dir. The job
//! scheduler and experiment tracker are in-test fakes.

use async_trait::async_trait;
use mf_core::{Dataset, DatasetSpec, Dialect, GitConfig, Project, ProjectSpec, TrackingConfig};
use mf_db::DuckDbWarehouse;
use mf_engine::{Materializer, OrchestrationError, RunResolver, TrainingJobManager};
use mf_meta::store::{datasets, projects};
use mf_meta::{MetaDb, MetadataStore};
use mf_remote::{
    ExperimentTracker, JobDefinition, JobScheduler, ModelVersion, RemoteResult, RunRecord,
    JOB_ID_TAG, JOB_RUN_ID_TAG,
};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    meta: MetaDb,
    warehouse: DuckDbWarehouse,
    project: Project,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let meta = MetaDb::open(&dir.path().join("meta.duckdb")).unwrap();
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    warehouse
        .execute_batch(
            "CREATE TABLE sales AS
             SELECT i AS id,
                    i % 2 AS label,
                    TIMESTAMP '2024-01-01 00:00:00' + INTERVAL (i) HOUR AS event_ts
             FROM range(0, 500) t(i);",
        )
        .unwrap();
    let project = projects::create_project(
        meta.conn(),
        &ProjectSpec {
            name: "churn".to_string(),
            catalog: "memory".to_string(),
            schema: "main".to_string(),
            git_url: "https://github.com/acme/churn".to_string(),
            training_notebook: "train.py".to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    Fixture {
        _dir: dir,
        meta,
        warehouse,
        project,
    }
}

fn add_dataset(f: &Fixture, spec: DatasetSpec) -> Dataset {
    datasets::create_dataset(f.meta.conn(), f.project.id, &spec).unwrap()
}

fn random_dataset() -> DatasetSpec {
    DatasetSpec {
        name: "orders".to_string(),
        target: "label".to_string(),
        source_type: "static_table".to_string(),
        evaluation_type: "random".to_string(),
        source_table: Some("sales".to_string()),
        percentage: Some(0.2),
        ..Default::default()
    }
}

fn rows(f: &Fixture, table: &str) -> usize {
    f.warehouse
        .query_count(&format!("SELECT * FROM {table}"))
        .unwrap()
}

#[derive(Default)]
struct FakeScheduler {
    jobs: Mutex<Vec<JobDefinition>>,
    runs: Mutex<Vec<i64>>,
}

#[async_trait]
impl JobScheduler for FakeScheduler {
    async fn create_job(&self, job: &JobDefinition) -> RemoteResult<i64> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(job.clone());
        Ok(1000 + jobs.len() as i64)
    }

    async fn run_job(&self, job_id: i64) -> RemoteResult<i64> {
        let mut runs = self.runs.lock().unwrap();
        runs.push(job_id);
        Ok(9000 + runs.len() as i64)
    }
}

/// Tracker whose experiment holds one run per scheduler run.
struct FakeTracker {
    runs: Vec<RunRecord>,
}

#[async_trait]
impl ExperimentTracker for FakeTracker {
    async fn get_experiment_by_name(&self, _name: &str) -> RemoteResult<String> {
        Ok("1".to_string())
    }

    async fn list_runs(&self, _experiment_id: &str) -> RemoteResult<Vec<RunRecord>> {
        Ok(self.runs.clone())
    }

    async fn register_model_version(
        &self,
        model_name: &str,
        _source_uri: &str,
        _run_id: &str,
    ) -> RemoteResult<ModelVersion> {
        Ok(ModelVersion {
            name: model_name.to_string(),
            version: "1".to_string(),
            status: Some("READY".to_string()),
            status_message: None,
        })
    }
}

#[tokio::test]
async fn materialize_random_split_into_duckdb() {
    let f = fixture();
    let dataset = add_dataset(&f, random_dataset());

    let result = Materializer::new(&f.meta, &f.warehouse, Dialect::DuckDb)
        .materialize(dataset.id, None, 1_700_000_000)
        .await
        .unwrap();

    assert_eq!(result.training_table, "memory.main.orders_training_1700000000");
    assert_eq!(result.eval_table, "memory.main.orders_eval_1700000000");
    assert_eq!(result.statements_executed, 4);
    assert!(result.warnings.is_empty());
    assert_eq!(
        rows(&f, &result.training_table) + rows(&f, &result.eval_table),
        500
    );
    assert!(!f
        .warehouse
        .relation_exists("memory.main.orders_split_tmp_1700000000")
        .unwrap());

    let stored = f.meta.get_dataset(dataset.id).unwrap().unwrap();
    assert_eq!(
        stored.materialized_tables(),
        Some((
            "memory.main.orders_training_1700000000",
            "memory.main.orders_eval_1700000000"
        ))
    );
}

#[tokio::test]
async fn rematerializing_points_dataset_at_new_tables() {
    let f = fixture();
    let dataset = add_dataset(&f, random_dataset());
    let materializer = Materializer::new(&f.meta, &f.warehouse, Dialect::DuckDb);

    let first = materializer.materialize(dataset.id, None, 1).await.unwrap();
    let second = materializer.materialize(dataset.id, None, 2).await.unwrap();

    assert_ne!(first.training_table, second.training_table);
    assert!(f.warehouse.relation_exists(&first.training_table).unwrap());
    assert!(f.warehouse.relation_exists(&second.eval_table).unwrap());
    let stored = f.meta.get_dataset(dataset.id).unwrap().unwrap();
    assert_eq!(
        stored.training_table_name.as_deref(),
        Some(second.training_table.as_str())
    );
}

#[tokio::test]
async fn materialize_timestamp_split() {
    let f = fixture();
    let dataset = add_dataset(
        &f,
        DatasetSpec {
            evaluation_type: "timestamp".to_string(),
            percentage: None,
            timestamp_col: Some("event_ts".to_string()),
            ..random_dataset()
        },
    );
    let materializer = Materializer::new(&f.meta, &f.warehouse, Dialect::DuckDb);

    let err = materializer.materialize(dataset.id, None, 3).await.unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));

    let result = materializer
        .materialize(dataset.id, Some("2024-01-05 00:00:00"), 3)
        .await
        .unwrap();
    assert_eq!(result.statements_executed, 2);
    assert_eq!(rows(&f, &result.training_table), 96);
    assert_eq!(rows(&f, &result.eval_table), 404);
}

#[tokio::test]
async fn failing_statement_leaves_dataset_unmaterialized() {
    let f = fixture();
    let dataset = add_dataset(
        &f,
        DatasetSpec {
            source_table: Some("no_such_table".to_string()),
            ..random_dataset()
        },
    );
    let err = Materializer::new(&f.meta, &f.warehouse, Dialect::DuckDb)
        .materialize(dataset.id, None, 4)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::WarehouseExecution {
            statement_index: 1,
            ..
        }
    ));
    assert!(!f.meta.get_dataset(dataset.id).unwrap().unwrap().materialized);
}

#[tokio::test]
async fn train_then_list_and_register() {
    let f = fixture();
    let dataset = add_dataset(&f, random_dataset());
    Materializer::new(&f.meta, &f.warehouse, Dialect::DuckDb)
        .materialize(dataset.id, None, 7)
        .await
        .unwrap();
    let dataset = f.meta.get_dataset(dataset.id).unwrap().unwrap();

    let scheduler = FakeScheduler::default();
    let manager = TrainingJobManager::new(&f.meta, &scheduler, GitConfig::default());
    let params = serde_json::json!({"max_depth": 4});
    let first = manager
        .ensure_job_and_run(&f.project, &dataset, &params)
        .await
        .unwrap();
    let second = manager
        .ensure_job_and_run(&f.project, &dataset, &params)
        .await
        .unwrap();

    assert_eq!(first.job_id, 1001);
    assert_eq!(second.job_id, 1001);
    assert_eq!(scheduler.jobs.lock().unwrap().len(), 1);
    assert_eq!(*scheduler.runs.lock().unwrap(), vec![1001, 1001]);
    let job = scheduler.jobs.lock().unwrap()[0].clone();
    assert_eq!(job.notebook_path, "notebooks/train");
    assert_eq!(
        job.parameters["training_table_name"],
        "memory.main.orders_training_7"
    );

    let run = |run_id: &str, job: &str| RunRecord {
        run_id: run_id.to_string(),
        tags: BTreeMap::from([
            (JOB_ID_TAG.to_string(), job.to_string()),
            (JOB_RUN_ID_TAG.to_string(), "9002".to_string()),
        ]),
        ..Default::default()
    };
    let tracker = FakeTracker {
        runs: vec![run("latest", "1001"), run("stray", "42")],
    };
    let resolver = RunResolver::new(
        &f.meta,
        &tracker,
        TrackingConfig::default(),
        Some("https://workspace.example.com".to_string()),
    );
    let views = resolver.list_runs_for_project(&f.project).await.unwrap();
    assert_eq!(views[0].dataset_label, "orders");
    assert_eq!(
        views[0].run_url.as_deref(),
        Some("https://workspace.example.com/jobs/1001/runs/9002")
    );
    assert_eq!(views[1].dataset_label, mf_engine::JOB_ID_NOT_IN_DB);

    let version = resolver
        .register_model(&views[0].run_id, &views[0].dataset_label, None, &f.project)
        .await
        .unwrap();
    assert_eq!(version.name, "memory.main.orders");
    let err = resolver
        .register_model(&views[1].run_id, &views[1].dataset_label, None, &f.project)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::RegistrationRejected { .. }
    ));
}
