//! Databricks SQL warehouse backend over the statement execution API.

use crate::error::{DbError, DbResult};
use crate::traits::{Warehouse, WarehouseConnection};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// How long the server holds a statement request before answering with a
/// pending state.
const WAIT_TIMEOUT: &str = "30s";

/// Databricks SQL warehouse reached with a personal access token.
pub struct DatabricksSqlWarehouse {
    inner: Arc<Endpoint>,
}

struct Endpoint {
    client: Client,
    base_url: String,
    token: String,
    warehouse_id: String,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: String,
    status: StatementStatus,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: String,
    #[serde(default)]
    error: Option<StatementError>,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WarehouseInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl DatabricksSqlWarehouse {
    /// Create a backend for `warehouse_id` on the workspace at `base_url`
    /// (scheme included, no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        warehouse_id: impl Into<String>,
        poll_interval: Duration,
    ) -> DbResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DbError::ConnectionError(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            inner: Arc::new(Endpoint {
                client,
                base_url: base_url.into(),
                token: token.into(),
                warehouse_id: warehouse_id.into(),
                poll_interval,
            }),
        })
    }
}

impl Endpoint {
    async fn submit(&self, sql: &str) -> DbResult<StatementResponse> {
        let url = format!("{}/api/2.0/sql/statements", self.base_url);
        let body = serde_json::json!({
            "warehouse_id": self.warehouse_id,
            "statement": sql,
            "wait_timeout": WAIT_TIMEOUT,
            "on_wait_timeout": "CONTINUE",
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn poll(&self, statement_id: &str) -> DbResult<StatementResponse> {
        let url = format!("{}/api/2.0/sql/statements/{}", self.base_url, statement_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> DbResult<StatementResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::ExecutionError(format!("HTTP {status}: {body}")));
        }
        response
            .json::<StatementResponse>()
            .await
            .map_err(|e| DbError::UnexpectedResponse(e.to_string()))
    }
}

#[async_trait]
impl Warehouse for DatabricksSqlWarehouse {
    async fn connect(&self) -> DbResult<Box<dyn WarehouseConnection>> {
        let endpoint = &self.inner;
        let url = format!(
            "{}/api/2.0/sql/warehouses/{}",
            endpoint.base_url, endpoint.warehouse_id
        );
        let response = endpoint
            .client
            .get(&url)
            .bearer_auth(&endpoint.token)
            .send()
            .await
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::ConnectionError(format!(
                "warehouse {} unavailable (HTTP {status}): {body}",
                endpoint.warehouse_id
            )));
        }
        let info: WarehouseInfo = response
            .json()
            .await
            .map_err(|e| DbError::UnexpectedResponse(e.to_string()))?;
        log::info!(
            "Connected to SQL warehouse {} ({}, state {})",
            endpoint.warehouse_id,
            info.name.as_deref().unwrap_or("unnamed"),
            info.state.as_deref().unwrap_or("unknown")
        );

        Ok(Box::new(DatabricksConnection {
            endpoint: Arc::clone(&self.inner),
        }))
    }

    fn db_type(&self) -> &'static str {
        "databricks"
    }
}

/// A statement session against one SQL warehouse
pub struct DatabricksConnection {
    endpoint: Arc<Endpoint>,
}

#[async_trait]
impl WarehouseConnection for DatabricksConnection {
    async fn execute(&mut self, sql: &str) -> DbResult<()> {
        let mut response = self.endpoint.submit(sql).await?;
        loop {
            match response.status.state.as_str() {
                "SUCCEEDED" => return Ok(()),
                "PENDING" | "RUNNING" => {
                    log::debug!(
                        "Statement {} still {}, polling",
                        response.statement_id,
                        response.status.state
                    );
                    tokio::time::sleep(self.endpoint.poll_interval).await;
                    response = self.endpoint.poll(&response.statement_id).await?;
                }
                state => {
                    let detail = response
                        .status
                        .error
                        .as_ref()
                        .map(|e| {
                            format!(
                                "{}: {}",
                                e.error_code.as_deref().unwrap_or("ERROR"),
                                e.message.as_deref().unwrap_or("no message")
                            )
                        })
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(DbError::ExecutionError(format!(
                        "statement {} {state} ({detail}): {sql}",
                        response.statement_id
                    )));
                }
            }
        }
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        log::debug!(
            "Released SQL warehouse session for {}",
            self.endpoint.warehouse_id
        );
        Ok(())
    }
}
