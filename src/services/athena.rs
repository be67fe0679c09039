//! Athena query actions.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_athena::Client;
use aws_sdk_athena::types::{QueryExecutionContext, ResultConfiguration};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::sdk::IntoField;
use crate::core::waiter::{Poll, poll_until};
use crate::errors::ActionError;
use crate::services::s3::parse_s3_uri;

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct StartQueryRequest {
    #[arg(long)]
    pub query: String,
    #[arg(long)]
    pub database: String,
    /// S3 URI that receives the result files, e.g. `s3://bucket/athena/`.
    #[arg(long)]
    pub output_location: String,
    #[arg(long)]
    #[serde(default)]
    pub work_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStatus {
    pub execution_id: String,
    pub state: String,
    pub reason: Option<String>,
    pub data_scanned_bytes: Option<i64>,
    pub engine_time_millis: Option<i64>,
}

impl QueryStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state.as_str(), "SUCCEEDED" | "FAILED" | "CANCELLED")
    }
}

pub type QueryRow = Vec<Option<String>>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AthenaApi: Send + Sync {
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String, ActionError>;
    async fn get_query_execution(&self, execution_id: &str) -> Result<QueryStatus, ActionError>;
    async fn get_query_results(&self, execution_id: &str) -> Result<Vec<QueryRow>, ActionError>;
    async fn stop_query(&self, execution_id: &str) -> Result<(), ActionError>;
    async fn list_named_queries(&self) -> Result<Vec<String>, ActionError>;
}

#[async_trait]
impl AthenaApi for Client {
    #[tracing::instrument(skip_all, fields(database = %request.database))]
    async fn start_query(&self, request: &StartQueryRequest) -> Result<String, ActionError> {
        parse_s3_uri(&request.output_location)?;

        let context = QueryExecutionContext::builder()
            .database(&request.database)
            .build();
        let result_configuration = ResultConfiguration::builder()
            .output_location(&request.output_location)
            .build();

        let output = self
            .start_query_execution()
            .query_string(&request.query)
            .query_execution_context(context)
            .result_configuration(result_configuration)
            .set_work_group(request.work_group.clone())
            .send()
            .await?;

        let execution_id: Option<String> = output.query_execution_id().field();
        let execution_id = execution_id.ok_or_else(|| {
            ActionError::UnexpectedState("StartQueryExecution returned no id".to_string())
        })?;
        info!(execution_id = %execution_id, "Started query");
        Ok(execution_id)
    }

    #[tracing::instrument(skip(self))]
    async fn get_query_execution(&self, execution_id: &str) -> Result<QueryStatus, ActionError> {
        let output = self
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await?;
        let execution = output
            .query_execution()
            .ok_or_else(|| ActionError::NotFound(format!("query execution {execution_id}")))?;
        let status = execution.status();
        let statistics = execution.statistics();

        Ok(QueryStatus {
            execution_id: execution_id.to_string(),
            state: status
                .and_then(|s| -> Option<String> { s.state().field() })
                .unwrap_or_default(),
            reason: status.and_then(|s| -> Option<String> { s.state_change_reason().field() }),
            data_scanned_bytes: statistics.and_then(|s| s.data_scanned_in_bytes()),
            engine_time_millis: statistics.and_then(|s| s.engine_execution_time_in_millis()),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_query_results(&self, execution_id: &str) -> Result<Vec<QueryRow>, ActionError> {
        let mut pages = self
            .get_query_results()
            .query_execution_id(execution_id)
            .into_paginator()
            .send();

        let mut rows = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page?;
            if let Some(result_set) = page.result_set() {
                rows.extend(result_set.rows().iter().map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(str::to_string))
                        .collect::<QueryRow>()
                }));
            }
        }
        info!(count = rows.len(), "Fetched query rows");
        Ok(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn stop_query(&self, execution_id: &str) -> Result<(), ActionError> {
        self.stop_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await?;
        info!("Stopped query");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn list_named_queries(&self) -> Result<Vec<String>, ActionError> {
        let mut pages = self.list_named_queries().into_paginator().send();
        let mut ids = Vec::new();
        while let Some(page) = pages.next().await {
            ids.extend(page?.named_query_ids().iter().cloned());
        }
        Ok(ids)
    }
}

async fn query_state(
    api: &dyn AthenaApi,
    execution_id: &str,
) -> Result<Poll<QueryStatus>, ActionError> {
    let status = api.get_query_execution(execution_id).await?;
    if status.is_terminal() {
        Ok(Poll::Ready(status))
    } else {
        Ok(Poll::Pending(status.state))
    }
}

/// Polls the execution until it leaves `QUEUED`/`RUNNING`.
///
/// # Errors
///
/// `FAILED` and `CANCELLED` executions are returned as `UnexpectedState`
/// carrying Athena's state-change reason.
pub async fn wait_for_query(
    api: &dyn AthenaApi,
    execution_id: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<QueryStatus, ActionError> {
    let status = poll_until(
        &format!("query {execution_id}"),
        interval,
        max_attempts,
        || query_state(api, execution_id),
    )
    .await?;

    if status.state == "SUCCEEDED" {
        Ok(status)
    } else {
        warn!(state = %status.state, reason = ?status.reason, "Query did not succeed");
        Err(ActionError::UnexpectedState(format!(
            "query {execution_id} {}: {}",
            status.state,
            status.reason.as_deref().unwrap_or("no reason given")
        )))
    }
}
