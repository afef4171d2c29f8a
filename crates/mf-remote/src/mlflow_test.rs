use super::*;
use crate::traits::{JOB_ID_TAG, JOB_RUN_ID_TAG};
use mockito::Matcher;

async fn tracker() -> (mockito::ServerGuard, MlflowTracker) {
    let server = mockito::Server::new_async().await;
    let tracker = MlflowTracker::new(server.url(), "tok").unwrap();
    (server, tracker)
}

#[tokio::test]
async fn test_get_experiment_by_name() {
    let (mut server, tracker) = tracker().await;
    let mock = server
        .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
        .match_query(Matcher::UrlEncoded(
            "experiment_name".into(),
            "/Users/someone/churn".into(),
        ))
        .match_header("authorization", "Bearer tok")
        .with_status(200)
        .with_body(r#"{"experiment": {"experiment_id": "42", "name": "/Users/someone/churn"}}"#)
        .create_async()
        .await;

    let id = tracker
        .get_experiment_by_name("/Users/someone/churn")
        .await
        .unwrap();
    assert_eq!(id, "42");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_experiment_is_not_found() {
    let (mut server, tracker) = tracker().await;
    server
        .mock("GET", "/api/2.0/mlflow/experiments/get-by-name")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "No experiment"}"#)
        .create_async()
        .await;

    let err = tracker.get_experiment_by_name("nope").await.unwrap_err();
    assert!(matches!(err, RemoteError::NotFound(_)), "got {err}");
}

#[tokio::test]
async fn test_list_runs_maps_tags_and_metrics() {
    let (mut server, tracker) = tracker().await;
    let mock = server
        .mock("POST", "/api/2.0/mlflow/runs/search")
        .match_body(Matcher::Json(serde_json::json!({
            "experiment_ids": ["42"],
            "max_results": 1000,
            "order_by": ["attributes.start_time DESC"]
        })))
        .with_status(200)
        .with_body(
            r#"{"runs": [
                {"info": {"run_id": "r2", "status": "FINISHED", "start_time": 2000},
                 "data": {"metrics": [{"key": "auc", "value": 0.91, "step": 0}],
                          "tags": [{"key": "mlflow.databricks.jobID", "value": "12"},
                                   {"key": "mlflow.databricks.jobRunID", "value": "34"},
                                   {"key": "mlforge.registered_model_name", "value": "cat.sch.orders"},
                                   {"key": "mlforge.registered_model_version", "value": "3"}]}},
                {"info": {"run_id": "r1", "status": "FAILED", "start_time": 1000}}
            ]}"#,
        )
        .create_async()
        .await;

    let runs = tracker.list_runs("42").await.unwrap();
    mock.assert_async().await;

    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, "r2");
    assert_eq!(runs[0].tag(JOB_ID_TAG), Some("12"));
    assert_eq!(runs[0].tag(JOB_RUN_ID_TAG), Some("34"));
    assert_eq!(runs[0].metrics.get("auc"), Some(&0.91));
    assert_eq!(runs[0].registered_model_name.as_deref(), Some("cat.sch.orders"));
    assert_eq!(runs[0].registered_model_version.as_deref(), Some("3"));
    assert_eq!(runs[1].run_id, "r1");
    assert!(runs[1].tags.is_empty());
}

#[tokio::test]
async fn test_list_runs_empty_experiment() {
    let (mut server, tracker) = tracker().await;
    server
        .mock("POST", "/api/2.0/mlflow/runs/search")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    assert!(tracker.list_runs("42").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_model_version_tolerates_existing_model() {
    let (mut server, tracker) = tracker().await;
    let create_model = server
        .mock("POST", "/api/2.0/mlflow/registered-models/create")
        .match_body(Matcher::Json(serde_json::json!({"name": "cat.sch.orders"})))
        .with_status(400)
        .with_body(r#"{"error_code": "RESOURCE_ALREADY_EXISTS", "message": "exists"}"#)
        .create_async()
        .await;
    let create_version = server
        .mock("POST", "/api/2.0/mlflow/model-versions/create")
        .match_body(Matcher::Json(serde_json::json!({
            "name": "cat.sch.orders",
            "source": "runs:/r2/model",
            "run_id": "r2"
        })))
        .with_status(200)
        .with_body(
            r#"{"model_version": {"name": "cat.sch.orders", "version": "4",
                "status": "PENDING_REGISTRATION", "status_message": "queued"}}"#,
        )
        .create_async()
        .await;
    let tags = server
        .mock("POST", "/api/2.0/mlflow/runs/set-tag")
        .with_status(200)
        .with_body("{}")
        .expect(2)
        .create_async()
        .await;

    let version = tracker
        .register_model_version("cat.sch.orders", "runs:/r2/model", "r2")
        .await
        .unwrap();
    assert_eq!(version.version, "4");
    assert_eq!(version.status.as_deref(), Some("PENDING_REGISTRATION"));
    assert_eq!(version.status_message.as_deref(), Some("queued"));
    create_model.assert_async().await;
    create_version.assert_async().await;
    tags.assert_async().await;
}

#[tokio::test]
async fn test_register_fails_when_model_creation_fails() {
    let (mut server, tracker) = tracker().await;
    server
        .mock("POST", "/api/2.0/mlflow/registered-models/create")
        .with_status(403)
        .with_body(r#"{"error_code": "PERMISSION_DENIED", "message": "no"}"#)
        .create_async()
        .await;
    let create_version = server
        .mock("POST", "/api/2.0/mlflow/model-versions/create")
        .expect(0)
        .create_async()
        .await;

    let err = tracker
        .register_model_version("cat.sch.orders", "runs:/r2/model", "r2")
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), Some("PERMISSION_DENIED"));
    create_version.assert_async().await;
}

#[tokio::test]
async fn test_tag_failure_does_not_fail_registration() {
    let (mut server, tracker) = tracker().await;
    server
        .mock("POST", "/api/2.0/mlflow/registered-models/create")
        .with_status(200)
        .with_body(r#"{"registered_model": {"name": "m"}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/2.0/mlflow/model-versions/create")
        .with_status(200)
        .with_body(r#"{"model_version": {"name": "m", "version": "1"}}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/api/2.0/mlflow/runs/set-tag")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let version = tracker
        .register_model_version("m", "runs:/r/model", "r")
        .await
        .unwrap();
    assert_eq!(version.version, "1");
    assert_eq!(version.status, None);
}
