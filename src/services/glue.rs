//! Glue catalog, crawler and job actions.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_glue::Client;
use aws_sdk_glue::types::{CrawlerTargets, DatabaseInput, S3Target};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::core::waiter::{Poll, poll_until};
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct CreateCrawlerRequest {
    #[arg(long)]
    pub name: String,
    /// IAM role the crawler assumes.
    #[arg(long)]
    pub role_arn: String,
    #[arg(long)]
    pub database: String,
    /// S3 path to crawl, e.g. `s3://bucket/data/`.
    #[arg(long)]
    pub s3_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlerSummary {
    pub name: Option<String>,
    pub state: Option<String>,
    pub last_crawl_status: Option<String>,
    pub last_crawl_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub database: Option<String>,
    pub location: Option<String>,
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRunSummary {
    pub run_id: Option<String>,
    pub state: Option<String>,
    pub error_message: Option<String>,
    pub execution_seconds: i32,
    pub started: Option<String>,
}

/// Parses `key=value` pairs into Glue job arguments, adding the `--` prefix Glue expects.
///
/// # Errors
///
/// Returns `InvalidInput` for a pair without `=` or with an empty key.
pub fn parse_job_arguments(pairs: &[String]) -> Result<HashMap<String, String>, ActionError> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                ActionError::InvalidInput(format!("job argument '{pair}' is not key=value"))
            })?;
            let key = key.trim().trim_start_matches("--");
            if key.is_empty() {
                return Err(ActionError::InvalidInput(format!(
                    "job argument '{pair}' has an empty key"
                )));
            }
            Ok((format!("--{key}"), value.to_string()))
        })
        .collect()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GlueApi: Send + Sync {
    async fn create_database(&self, name: &str) -> Result<(), ActionError>;
    async fn create_crawler(&self, request: &CreateCrawlerRequest) -> Result<(), ActionError>;
    async fn get_crawler(&self, name: &str) -> Result<CrawlerSummary, ActionError>;
    async fn start_crawler(&self, name: &str) -> Result<(), ActionError>;
    async fn get_tables(&self, database: &str) -> Result<Vec<TableSummary>, ActionError>;
    async fn list_jobs(&self) -> Result<Vec<String>, ActionError>;
    async fn start_job_run(
        &self,
        job_name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<String, ActionError>;
    async fn get_job_run(&self, job_name: &str, run_id: &str)
    -> Result<JobRunSummary, ActionError>;
    async fn delete_crawler(&self, name: &str) -> Result<(), ActionError>;
    async fn delete_database(&self, name: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl GlueApi for Client {
    #[tracing::instrument(skip(self))]
    async fn create_database(&self, name: &str) -> Result<(), ActionError> {
        let input = DatabaseInput::builder().name(name).build()?;
        self.create_database().database_input(input).send().await?;
        info!("Created database");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn create_crawler(&self, request: &CreateCrawlerRequest) -> Result<(), ActionError> {
        let targets = CrawlerTargets::builder()
            .s3_targets(S3Target::builder().path(&request.s3_path).build())
            .build();
        self.create_crawler()
            .name(&request.name)
            .role(&request.role_arn)
            .database_name(&request.database)
            .targets(targets)
            .send()
            .await?;
        info!("Created crawler");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_crawler(&self, name: &str) -> Result<CrawlerSummary, ActionError> {
        let output = self.get_crawler().name(name).send().await?;
        let crawler = output
            .crawler()
            .ok_or_else(|| ActionError::NotFound(format!("crawler {name}")))?;
        let last_crawl = crawler.last_crawl();
        Ok(CrawlerSummary {
            name: crawler.name().field(),
            state: crawler.state().field(),
            last_crawl_status: last_crawl.and_then(|l| -> Option<String> { l.status().field() }),
            last_crawl_error: last_crawl
                .and_then(|l| -> Option<String> { l.error_message().field() }),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn start_crawler(&self, name: &str) -> Result<(), ActionError> {
        self.start_crawler().name(name).send().await?;
        info!("Started crawler");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_tables(&self, database: &str) -> Result<Vec<TableSummary>, ActionError> {
        let mut pages = self
            .get_tables()
            .database_name(database)
            .into_paginator()
            .send();
        let mut tables = Vec::new();
        while let Some(page) = pages.next().await {
            tables.extend(page?.table_list().iter().map(|t| TableSummary {
                name: t.name().field(),
                database: t.database_name().field(),
                location: t
                    .storage_descriptor()
                    .and_then(|s| -> Option<String> { s.location().field() }),
                created: t.create_time().timestamp(),
            }));
        }
        info!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    #[tracing::instrument(skip(self))]
    async fn list_jobs(&self) -> Result<Vec<String>, ActionError> {
        let mut pages = self.list_jobs().into_paginator().send();
        let mut jobs = Vec::new();
        while let Some(page) = pages.next().await {
            jobs.extend(page?.job_names().iter().cloned());
        }
        Ok(jobs)
    }

    #[tracing::instrument(skip(self))]
    async fn start_job_run(
        &self,
        job_name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<String, ActionError> {
        let output = self
            .start_job_run()
            .job_name(job_name)
            .set_arguments((!arguments.is_empty()).then_some(arguments))
            .send()
            .await?;
        let run_id: String = output.job_run_id().field();
        info!(run_id = %run_id, "Started job run");
        Ok(run_id)
    }

    #[tracing::instrument(skip(self))]
    async fn get_job_run(
        &self,
        job_name: &str,
        run_id: &str,
    ) -> Result<JobRunSummary, ActionError> {
        let output = self
            .get_job_run()
            .job_name(job_name)
            .run_id(run_id)
            .send()
            .await?;
        let run = output
            .job_run()
            .ok_or_else(|| ActionError::NotFound(format!("job run {run_id}")))?;
        Ok(JobRunSummary {
            run_id: run.id().field(),
            state: run.job_run_state().field(),
            error_message: run.error_message().field(),
            execution_seconds: run.execution_time().field(),
            started: run.started_on().timestamp(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_crawler(&self, name: &str) -> Result<(), ActionError> {
        self.delete_crawler().name(name).send().await?;
        info!("Deleted crawler");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_database(&self, name: &str) -> Result<(), ActionError> {
        self.delete_database().name(name).send().await?;
        info!("Deleted database");
        Ok(())
    }
}

async fn crawler_state(api: &dyn GlueApi, name: &str) -> Result<Poll<CrawlerSummary>, ActionError> {
    let crawler = api.get_crawler(name).await?;
    match crawler.state.as_deref() {
        Some("READY") => Ok(Poll::Ready(crawler)),
        other => Ok(Poll::Pending(other.unwrap_or("unknown").to_string())),
    }
}

/// Polls until the crawler is back in the `READY` state after a run.
///
/// # Errors
///
/// Returns the lookup error, or `Timeout` if the crawler is still running
/// after `max_attempts` checks.
pub async fn wait_for_crawler_ready(
    api: &dyn GlueApi,
    name: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<CrawlerSummary, ActionError> {
    poll_until(&format!("crawler {name}"), interval, max_attempts, || {
        crawler_state(api, name)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler(state: &str) -> CrawlerSummary {
        CrawlerSummary {
            name: Some("flights".into()),
            state: Some(state.into()),
            last_crawl_status: None,
            last_crawl_error: None,
        }
    }

    #[test]
    fn test_parse_job_arguments_adds_prefix() {
        let args = parse_job_arguments(&[
            "input=s3://bucket/in".to_string(),
            "--output=s3://bucket/out".to_string(),
        ])
        .unwrap();
        assert_eq!(args["--input"], "s3://bucket/in");
        assert_eq!(args["--output"], "s3://bucket/out");
    }

    #[test]
    fn test_parse_job_arguments_rejects_malformed_pairs() {
        assert!(parse_job_arguments(&["novalue".to_string()]).is_err());
        assert!(parse_job_arguments(&["=value".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_wait_for_crawler_ready() {
        let mut mock = MockGlueApi::new();
        let mut seq = mockall::Sequence::new();
        for state in ["RUNNING", "STOPPING", "READY"] {
            mock.expect_get_crawler()
                .withf(|name| name == "flights")
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(crawler(state)));
        }

        let ready = wait_for_crawler_ready(&mock, "flights", Duration::ZERO, 10)
            .await
            .unwrap();
        assert_eq!(ready.state.as_deref(), Some("READY"));
    }
}
