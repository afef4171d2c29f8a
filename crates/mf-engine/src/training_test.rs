use super::*;
use async_trait::async_trait;
use mf_core::{DatasetSpec, ProjectSpec, TrainingJob};
use mf_meta::store::{datasets, projects};
use mf_meta::{MetaDb, MetaResult};
use mf_remote::{RemoteError, RemoteResult};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scheduler that counts calls and hands out increasing ids.
#[derive(Default)]
struct CountingScheduler {
    create_calls: AtomicUsize,
    run_calls: AtomicUsize,
    next_id: AtomicI64,
    fail_runs: bool,
    last_definition: Mutex<Option<JobDefinition>>,
}

#[async_trait]
impl JobScheduler for CountingScheduler {
    async fn create_job(&self, job: &JobDefinition) -> RemoteResult<i64> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_definition.lock().unwrap() = Some(job.clone());
        Ok(100 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn run_job(&self, _job_id: i64) -> RemoteResult<i64> {
        if self.fail_runs {
            return Err(RemoteError::NotFound("job".to_string()));
        }
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        Ok(500 + self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn seeded(materialized: bool) -> (MetaDb, Project, Dataset) {
    let db = MetaDb::open_memory().unwrap();
    let project = projects::create_project(
        db.conn(),
        &ProjectSpec {
            name: "churn".to_string(),
            catalog: "cat".to_string(),
            schema: "sch".to_string(),
            git_url: "https://github.com/acme/churn".to_string(),
            training_notebook: "/xgb/train.py".to_string(),
            ..Default::default()
        },
    )
    .unwrap();
    let dataset = datasets::create_dataset(
        db.conn(),
        project.id,
        &DatasetSpec {
            name: "orders".to_string(),
            target: "label".to_string(),
            source_type: "static_table".to_string(),
            evaluation_type: "random".to_string(),
            source_table: Some("sales".to_string()),
            percentage: Some(0.2),
            ..Default::default()
        },
    )
    .unwrap();
    if materialized {
        datasets::mark_materialized(
            db.conn(),
            dataset.id,
            "cat.sch.orders_training_1",
            "cat.sch.orders_eval_1",
        )
        .unwrap();
    }
    let dataset = db.get_dataset(dataset.id).unwrap().unwrap();
    (db, project, dataset)
}

fn manager<'a>(
    store: &'a dyn MetadataStore,
    scheduler: &'a CountingScheduler,
) -> TrainingJobManager<'a> {
    TrainingJobManager::new(store, scheduler, GitConfig::default())
}

#[tokio::test]
async fn test_two_runs_create_one_job() {
    let (db, project, dataset) = seeded(true);
    let scheduler = CountingScheduler::default();
    let params = serde_json::json!({});

    let first = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &params)
        .await
        .unwrap();
    let second = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &params)
        .await
        .unwrap();

    assert_eq!(scheduler.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.run_calls.load(Ordering::SeqCst), 2);
    assert!(first.created_job);
    assert!(!second.created_job);
    assert_eq!(first.job_id, second.job_id);
    assert_ne!(first.run_id, second.run_id);
    assert!(first.warnings.is_empty());
    assert_eq!(
        db.get_training_job(project.id, dataset.id)
            .unwrap()
            .unwrap()
            .job_id,
        Some(first.job_id)
    );
}

#[tokio::test]
async fn test_unmaterialized_dataset_is_rejected() {
    let (db, project, dataset) = seeded(false);
    let scheduler = CountingScheduler::default();
    let err = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::DatasetNotMaterialized { .. }
    ));
    assert_eq!(scheduler.create_calls.load(Ordering::SeqCst), 0);
    assert!(db.get_training_job(project.id, dataset.id).unwrap().is_none());
}

#[tokio::test]
async fn test_job_definition_parameters() {
    let (db, project, dataset) = seeded(true);
    let scheduler = CountingScheduler::default();
    let params = serde_json::json!({
        "max_depth": 6,
        "objective": "binary",
        "early_stop": true,
        "target": "hijacked",
        "grid": [1, 2],
        "notes": null
    });
    manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &params)
        .await
        .unwrap();

    let definition = scheduler.last_definition.lock().unwrap().clone().unwrap();
    assert_eq!(definition.name, "churn_orders_training");
    assert_eq!(definition.notebook_path, "notebooks/xgb/train");
    assert_eq!(definition.git_url, "https://github.com/acme/churn");
    assert_eq!(definition.git_provider, "gitHub");
    assert_eq!(definition.git_branch, "main");

    let p = &definition.parameters;
    assert_eq!(p["target"], "label");
    assert_eq!(p["training_table_name"], "cat.sch.orders_training_1");
    assert_eq!(p["eval_table_name"], "cat.sch.orders_eval_1");
    assert_eq!(p["experiment_name"], "churn");
    assert_eq!(p["max_depth"], "6");
    assert_eq!(p["objective"], "binary");
    assert_eq!(p["early_stop"], "true");
    assert!(!p.contains_key("grid"));
    assert!(!p.contains_key("notes"));

    let stored = db.get_training_job(project.id, dataset.id).unwrap().unwrap();
    assert_eq!(stored.parameters, params);
}

#[tokio::test]
async fn test_missing_git_source_is_validation_error() {
    let (db, mut project, dataset) = seeded(true);
    project.spec.git_url = String::new();
    let scheduler = CountingScheduler::default();
    let err = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));
    assert_eq!(scheduler.create_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_row_without_job_id_gets_filled() {
    let (db, project, dataset) = seeded(true);
    let record = db
        .create_training_job_record(project.id, dataset.id, &serde_json::json!({"a": 1}))
        .unwrap();
    let scheduler = CountingScheduler::default();
    let handle = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap();
    assert!(handle.created_job);
    let stored = db.get_training_job(project.id, dataset.id).unwrap().unwrap();
    assert_eq!(stored.id, record.id);
    assert_eq!(stored.job_id, Some(handle.job_id));
}

#[tokio::test]
async fn test_run_failure_names_the_job() {
    let (db, project, dataset) = seeded(true);
    let scheduler = CountingScheduler {
        fail_runs: true,
        ..Default::default()
    };
    let err = manager(&db, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap_err();
    match err {
        OrchestrationError::Scheduler { job_id, .. } => assert_eq!(job_id, Some(100)),
        other => panic!("unexpected error {other}"),
    }
    // The job was recorded before the run was attempted.
    assert_eq!(
        db.get_training_job(project.id, dataset.id)
            .unwrap()
            .unwrap()
            .job_id,
        Some(100)
    );
}

/// Store where another caller records job `winner` between our lookup and
/// our insert.
struct RacingStore {
    inner: MetaDb,
    winner: i64,
}

impl MetadataStore for RacingStore {
    fn get_project(&self, project_id: i64) -> MetaResult<Option<Project>> {
        self.inner.get_project(project_id)
    }

    fn get_dataset(&self, dataset_id: i64) -> MetaResult<Option<Dataset>> {
        self.inner.get_dataset(dataset_id)
    }

    fn mark_materialized(&self, dataset_id: i64, training: &str, eval: &str) -> MetaResult<()> {
        self.inner.mark_materialized(dataset_id, training, eval)
    }

    fn get_training_job(
        &self,
        project_id: i64,
        dataset_id: i64,
    ) -> MetaResult<Option<TrainingJob>> {
        self.inner.get_training_job(project_id, dataset_id)
    }

    fn create_training_job_record(
        &self,
        project_id: i64,
        dataset_id: i64,
        parameters: &serde_json::Value,
    ) -> MetaResult<TrainingJob> {
        let other = self
            .inner
            .create_training_job_record(project_id, dataset_id, parameters)?;
        self.inner.update_training_job_id(other.id, self.winner)?;
        self.inner
            .create_training_job_record(project_id, dataset_id, parameters)
    }

    fn update_training_job_id(&self, training_id: i64, job_id: i64) -> MetaResult<bool> {
        self.inner.update_training_job_id(training_id, job_id)
    }

    fn get_training_job_by_job_id(&self, job_id: i64) -> MetaResult<Option<TrainingJob>> {
        self.inner.get_training_job_by_job_id(job_id)
    }

    fn dataset_name_by_id(&self, dataset_id: i64) -> MetaResult<Option<String>> {
        self.inner.dataset_name_by_id(dataset_id)
    }
}

#[tokio::test]
async fn test_lost_race_reuses_winner_job() {
    let (db, project, dataset) = seeded(true);
    let store = RacingStore {
        inner: db,
        winner: 42,
    };
    let scheduler = CountingScheduler::default();
    let handle = manager(&store, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap();

    assert_eq!(handle.job_id, 42);
    assert!(!handle.created_job);
    assert_eq!(handle.warnings.len(), 1);
    assert!(handle.warnings[0].contains("orphaned"));
    assert_eq!(scheduler.create_calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.run_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store
            .get_training_job(project.id, dataset.id)
            .unwrap()
            .unwrap()
            .job_id,
        Some(42)
    );
}

/// Store whose job-id write always fails.
struct BrokenWrites(MetaDb);

impl MetadataStore for BrokenWrites {
    fn get_project(&self, project_id: i64) -> MetaResult<Option<Project>> {
        self.0.get_project(project_id)
    }

    fn get_dataset(&self, dataset_id: i64) -> MetaResult<Option<Dataset>> {
        self.0.get_dataset(dataset_id)
    }

    fn mark_materialized(&self, dataset_id: i64, training: &str, eval: &str) -> MetaResult<()> {
        self.0.mark_materialized(dataset_id, training, eval)
    }

    fn get_training_job(
        &self,
        project_id: i64,
        dataset_id: i64,
    ) -> MetaResult<Option<TrainingJob>> {
        self.0.get_training_job(project_id, dataset_id)
    }

    fn create_training_job_record(
        &self,
        project_id: i64,
        dataset_id: i64,
        parameters: &serde_json::Value,
    ) -> MetaResult<TrainingJob> {
        self.0
            .create_training_job_record(project_id, dataset_id, parameters)
    }

    fn update_training_job_id(&self, _training_id: i64, _job_id: i64) -> MetaResult<bool> {
        Err(MetaError::QueryError("disk full".to_string()))
    }

    fn get_training_job_by_job_id(&self, job_id: i64) -> MetaResult<Option<TrainingJob>> {
        self.0.get_training_job_by_job_id(job_id)
    }

    fn dataset_name_by_id(&self, dataset_id: i64) -> MetaResult<Option<String>> {
        self.0.dataset_name_by_id(dataset_id)
    }
}

#[tokio::test]
async fn test_persistence_failure_still_runs_and_warns() {
    let (db, project, dataset) = seeded(true);
    let store = BrokenWrites(db);
    let scheduler = CountingScheduler::default();
    let handle = manager(&store, &scheduler)
        .ensure_job_and_run(&project, &dataset, &serde_json::json!({}))
        .await
        .unwrap();

    assert_eq!(handle.job_id, 100);
    assert!(handle.created_job);
    assert_eq!(scheduler.run_calls.load(Ordering::SeqCst), 1);
    assert_eq!(handle.warnings.len(), 1);
    assert!(handle.warnings[0].contains("not tracked locally"));
    assert!(handle.warnings[0].contains("disk full"));
}
