//! Integration tests for the metadata store record operations.
//!
//! These tests go through the public mf-meta API against an in-memory
//! database and verify the records that come back.

use mf_core::{DatasetSpec, ProjectSpec};
use mf_meta::store::{datasets, projects, training_jobs};
use mf_meta::{MetaDb, MetaError, MetadataStore};

// ── Helpers ────────────────────────────────────────────────────────────

fn project_spec(name: &str) -> ProjectSpec {
    ProjectSpec {
        name: name.to_string(),
        description: "Churn model".to_string(),
        catalog: "cat".to_string(),
        schema: "sch".to_string(),
        git_url: "https://github.com/acme/churn".to_string(),
        training_notebook: "train.py".to_string(),
    }
}

fn dataset_spec(name: &str) -> DatasetSpec {
    DatasetSpec {
        name: name.to_string(),
        target: "label".to_string(),
        source_type: "static_table".to_string(),
        evaluation_type: "random".to_string(),
        source_table: Some("sales".to_string()),
        percentage: Some(0.2),
        eol_definition: vec!["eol_a".to_string(), "eol_b".to_string()],
        ..Default::default()
    }
}

fn seeded() -> (MetaDb, i64, i64) {
    let db = MetaDb::open_memory().unwrap();
    let project = projects::create_project(db.conn(), &project_spec("churn")).unwrap();
    let dataset = datasets::create_dataset(db.conn(), project.id, &dataset_spec("orders")).unwrap();
    (db, project.id, dataset.id)
}

// ── Projects ───────────────────────────────────────────────────────────

#[test]
fn project_crud() {
    let db = MetaDb::open_memory().unwrap();
    let created = projects::create_project(db.conn(), &project_spec("churn")).unwrap();

    let fetched = projects::get_project(db.conn(), created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
    let by_name = projects::get_project_by_name(db.conn(), "churn")
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, created.id);

    let mut spec = project_spec("churn");
    spec.description = "Updated".to_string();
    let updated = projects::update_project(db.conn(), created.id, &spec).unwrap();
    assert_eq!(updated.spec.description, "Updated");
    assert_eq!(
        projects::get_project(db.conn(), created.id)
            .unwrap()
            .unwrap()
            .spec
            .description,
        "Updated"
    );

    db.transaction(|conn| projects::delete_project(conn, created.id))
        .unwrap();
    assert!(projects::get_project(db.conn(), created.id).unwrap().is_none());
}

#[test]
fn duplicate_project_name_is_conflict() {
    let db = MetaDb::open_memory().unwrap();
    projects::create_project(db.conn(), &project_spec("churn")).unwrap();
    let err = projects::create_project(db.conn(), &project_spec("churn")).unwrap_err();
    assert!(matches!(err, MetaError::Conflict(_)), "got {err}");
}

#[test]
fn list_projects_sorted_by_name() {
    let db = MetaDb::open_memory().unwrap();
    for name in ["zeta", "alpha", "mid"] {
        projects::create_project(db.conn(), &project_spec(name)).unwrap();
    }
    let names: Vec<String> = projects::list_projects(db.conn())
        .unwrap()
        .into_iter()
        .map(|p| p.spec.name)
        .collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
}

#[test]
fn missing_project_update_and_delete_are_not_found() {
    let db = MetaDb::open_memory().unwrap();
    assert!(matches!(
        projects::update_project(db.conn(), 42, &project_spec("x")),
        Err(MetaError::NotFound { entity: "project", .. })
    ));
    assert!(matches!(
        projects::delete_project(db.conn(), 42),
        Err(MetaError::NotFound { entity: "project", .. })
    ));
}

#[test]
fn delete_project_removes_children() {
    let (db, project_id, dataset_id) = seeded();
    training_jobs::create_training_job_record(
        db.conn(),
        project_id,
        dataset_id,
        &serde_json::json!({}),
    )
    .unwrap();

    db.transaction(|conn| projects::delete_project(conn, project_id))
        .unwrap();
    assert!(datasets::get_dataset(db.conn(), dataset_id).unwrap().is_none());
    assert!(
        training_jobs::get_training_job(db.conn(), project_id, dataset_id)
            .unwrap()
            .is_none()
    );
}

// ── Datasets ───────────────────────────────────────────────────────────

#[test]
fn dataset_round_trips_list_columns() {
    let (db, _, dataset_id) = seeded();
    let dataset = datasets::get_dataset(db.conn(), dataset_id).unwrap().unwrap();
    assert_eq!(dataset.spec.eol_definition, vec!["eol_a", "eol_b"]);
    assert!(dataset.spec.feature_lookup_definition.is_empty());
    assert_eq!(dataset.spec.percentage, Some(0.2));
    assert!(!dataset.materialized);
    assert!(dataset.materialized_tables().is_none());
}

#[test]
fn dataset_requires_existing_project() {
    let db = MetaDb::open_memory().unwrap();
    let err = datasets::create_dataset(db.conn(), 7, &dataset_spec("orders")).unwrap_err();
    assert!(matches!(err, MetaError::NotFound { entity: "project", .. }));
}

#[test]
fn dataset_lookup_by_name_is_scoped_to_project() {
    let (db, project_id, dataset_id) = seeded();
    let other = projects::create_project(db.conn(), &project_spec("fraud")).unwrap();

    let found = datasets::get_dataset_by_name(db.conn(), project_id, "orders")
        .unwrap()
        .unwrap();
    assert_eq!(found.id, dataset_id);
    assert!(datasets::get_dataset_by_name(db.conn(), other.id, "orders")
        .unwrap()
        .is_none());
}

#[test]
fn list_all_datasets_carries_project_name() {
    let (db, project_id, _) = seeded();
    datasets::create_dataset(db.conn(), project_id, &dataset_spec("returns")).unwrap();

    let listing = datasets::list_all_datasets(db.conn()).unwrap();
    assert_eq!(listing.len(), 2);
    assert!(listing.iter().all(|l| l.project_name == "churn"));

    let names: Vec<String> = datasets::list_datasets(db.conn(), project_id)
        .unwrap()
        .into_iter()
        .map(|d| d.spec.name)
        .collect();
    assert_eq!(names, vec!["orders", "returns"]);
}

#[test]
fn update_dataset_keeps_materialization() {
    let (db, _, dataset_id) = seeded();
    datasets::mark_materialized(db.conn(), dataset_id, "cat.sch.t_training_1", "cat.sch.t_eval_1")
        .unwrap();

    let mut spec = dataset_spec("orders");
    spec.percentage = Some(0.3);
    let updated = datasets::update_dataset(db.conn(), dataset_id, &spec).unwrap();
    assert_eq!(updated.spec.percentage, Some(0.3));
    assert!(updated.materialized);
    assert_eq!(
        updated.materialized_tables(),
        Some(("cat.sch.t_training_1", "cat.sch.t_eval_1"))
    );
}

#[test]
fn mark_materialized_overwrites_table_names() {
    let (db, _, dataset_id) = seeded();
    datasets::mark_materialized(db.conn(), dataset_id, "a_training_1", "a_eval_1").unwrap();
    datasets::mark_materialized(db.conn(), dataset_id, "a_training_2", "a_eval_2").unwrap();

    let dataset = datasets::get_dataset(db.conn(), dataset_id).unwrap().unwrap();
    assert_eq!(dataset.training_table_name.as_deref(), Some("a_training_2"));
    assert_eq!(
        datasets::dataset_name_by_training_table(db.conn(), "a_training_2")
            .unwrap()
            .as_deref(),
        Some("orders")
    );
    assert!(datasets::dataset_name_by_training_table(db.conn(), "a_training_1")
        .unwrap()
        .is_none());
}

#[test]
fn mark_materialized_unknown_dataset() {
    let db = MetaDb::open_memory().unwrap();
    assert!(matches!(
        datasets::mark_materialized(db.conn(), 99, "a", "b"),
        Err(MetaError::NotFound { entity: "dataset", .. })
    ));
}

#[test]
fn delete_dataset_removes_training_job() {
    let (db, project_id, dataset_id) = seeded();
    training_jobs::create_training_job_record(
        db.conn(),
        project_id,
        dataset_id,
        &serde_json::json!({}),
    )
    .unwrap();
    datasets::delete_dataset(db.conn(), dataset_id).unwrap();
    assert!(
        training_jobs::get_training_job(db.conn(), project_id, dataset_id)
            .unwrap()
            .is_none()
    );
    assert!(matches!(
        datasets::delete_dataset(db.conn(), dataset_id),
        Err(MetaError::NotFound { .. })
    ));
}

// ── Training jobs ──────────────────────────────────────────────────────

#[test]
fn training_job_record_lifecycle() {
    let (db, project_id, dataset_id) = seeded();
    let params = serde_json::json!({"max_depth": 6, "objective": "binary"});

    let record = db
        .create_training_job_record(project_id, dataset_id, &params)
        .unwrap();
    assert_eq!(record.job_id, None);
    assert_eq!(record.parameters, params);

    assert!(db.update_training_job_id(record.id, 555).unwrap());
    let stored = db.get_training_job(project_id, dataset_id).unwrap().unwrap();
    assert_eq!(stored.job_id, Some(555));

    let by_job = db.get_training_job_by_job_id(555).unwrap().unwrap();
    assert_eq!(by_job.dataset_id, dataset_id);
    assert_eq!(
        training_jobs::dataset_name_by_job_id(db.conn(), 555)
            .unwrap()
            .as_deref(),
        Some("orders")
    );
}

#[test]
fn second_training_job_record_is_conflict() {
    let (db, project_id, dataset_id) = seeded();
    db.create_training_job_record(project_id, dataset_id, &serde_json::json!({}))
        .unwrap();
    let err = db
        .create_training_job_record(project_id, dataset_id, &serde_json::json!({}))
        .unwrap_err();
    assert!(matches!(err, MetaError::Conflict(_)), "got {err}");
}

#[test]
fn job_id_is_set_at_most_once() {
    let (db, project_id, dataset_id) = seeded();
    let record = db
        .create_training_job_record(project_id, dataset_id, &serde_json::json!({}))
        .unwrap();

    assert!(db.update_training_job_id(record.id, 1).unwrap());
    assert!(!db.update_training_job_id(record.id, 2).unwrap());
    assert_eq!(
        db.get_training_job(project_id, dataset_id)
            .unwrap()
            .unwrap()
            .job_id,
        Some(1)
    );
}

#[test]
fn update_job_id_on_missing_record() {
    let db = MetaDb::open_memory().unwrap();
    assert!(matches!(
        db.update_training_job_id(3, 1),
        Err(MetaError::NotFound { .. })
    ));
}

#[test]
fn unknown_job_id_lookups_are_empty() {
    let (db, _, dataset_id) = seeded();
    assert!(db.get_training_job_by_job_id(123).unwrap().is_none());
    assert!(training_jobs::dataset_name_by_job_id(db.conn(), 123)
        .unwrap()
        .is_none());
    assert_eq!(
        db.dataset_name_by_id(dataset_id).unwrap().as_deref(),
        Some("orders")
    );
    assert!(db.dataset_name_by_id(dataset_id + 100).unwrap().is_none());
}
