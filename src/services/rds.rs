//! RDS DB instance actions.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_rds::Client;
use aws_sdk_rds::types::DbInstance;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::core::waiter::{Poll, poll_until};
use crate::errors::ActionError;

#[derive(Clone, PartialEq, Args, Deserialize)]
pub struct CreateInstanceRequest {
    #[arg(long)]
    pub instance_id: String,
    #[arg(long, default_value = "mysql")]
    #[serde(default = "default_engine")]
    pub engine: String,
    #[arg(long, default_value = "db.t3.micro")]
    #[serde(default = "default_instance_class")]
    pub instance_class: String,
    #[arg(long)]
    pub master_username: String,
    #[arg(long, env = "RDS_MASTER_PASSWORD", hide_env_values = true)]
    pub master_password: String,
    #[arg(long, default_value_t = 20)]
    #[serde(default = "default_storage_gb")]
    pub storage_gb: i32,
}

impl std::fmt::Debug for CreateInstanceRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateInstanceRequest")
            .field("instance_id", &self.instance_id)
            .field("engine", &self.engine)
            .field("instance_class", &self.instance_class)
            .field("master_username", &self.master_username)
            .field("storage_gb", &self.storage_gb)
            .finish_non_exhaustive()
    }
}

fn default_engine() -> String {
    "mysql".to_string()
}

fn default_instance_class() -> String {
    "db.t3.micro".to_string()
}

fn default_storage_gb() -> i32 {
    20
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub status: Option<String>,
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub instance_class: Option<String>,
    pub endpoint: Option<String>,
}

impl From<&DbInstance> for InstanceSummary {
    fn from(instance: &DbInstance) -> Self {
        let endpoint = instance.endpoint().and_then(|e| {
            let address: Option<String> = e.address().field();
            let port: Option<i32> = e.port().field();
            address.map(|a| match port {
                Some(p) => format!("{a}:{p}"),
                None => a,
            })
        });
        Self {
            instance_id: instance.db_instance_identifier().field(),
            status: instance.db_instance_status().field(),
            engine: instance.engine().field(),
            engine_version: instance.engine_version().field(),
            instance_class: instance.db_instance_class().field(),
            endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub snapshot_id: String,
    pub status: Option<String>,
    pub created: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RdsApi: Send + Sync {
    async fn describe_instances(
        &self,
        instance_id: Option<String>,
    ) -> Result<Vec<InstanceSummary>, ActionError>;
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<InstanceSummary, ActionError>;
    async fn create_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<SnapshotSummary, ActionError>;
    async fn reboot_instance(&self, instance_id: &str) -> Result<InstanceSummary, ActionError>;
    async fn delete_instance(&self, instance_id: &str) -> Result<InstanceSummary, ActionError>;
}

#[async_trait]
impl RdsApi for Client {
    #[tracing::instrument(skip(self))]
    async fn describe_instances(
        &self,
        instance_id: Option<String>,
    ) -> Result<Vec<InstanceSummary>, ActionError> {
        let mut pages = self
            .describe_db_instances()
            .set_db_instance_identifier(instance_id)
            .into_paginator()
            .send();
        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            instances.extend(page?.db_instances().iter().map(InstanceSummary::from));
        }
        info!(count = instances.len(), "Described DB instances");
        Ok(instances)
    }

    #[tracing::instrument(skip(self))]
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<InstanceSummary, ActionError> {
        if request.storage_gb < 20 {
            return Err(ActionError::InvalidInput(format!(
                "allocated storage must be at least 20 GiB, got {}",
                request.storage_gb
            )));
        }

        let output = self
            .create_db_instance()
            .db_instance_identifier(&request.instance_id)
            .engine(&request.engine)
            .db_instance_class(&request.instance_class)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .allocated_storage(request.storage_gb)
            .send()
            .await?;
        let summary = output
            .db_instance()
            .map(InstanceSummary::from)
            .ok_or_else(|| ActionError::UnexpectedState("CreateDBInstance returned no instance".into()))?;
        info!(status = ?summary.status, "Created DB instance");
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn create_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<SnapshotSummary, ActionError> {
        let output = self
            .create_db_snapshot()
            .db_instance_identifier(instance_id)
            .db_snapshot_identifier(snapshot_id)
            .send()
            .await?;
        let snapshot = output
            .db_snapshot()
            .ok_or_else(|| ActionError::UnexpectedState("CreateDBSnapshot returned no snapshot".into()))?;
        Ok(SnapshotSummary {
            snapshot_id: snapshot.db_snapshot_identifier().field(),
            status: snapshot.status().field(),
            created: snapshot.snapshot_create_time().timestamp(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn reboot_instance(&self, instance_id: &str) -> Result<InstanceSummary, ActionError> {
        let output = self
            .reboot_db_instance()
            .db_instance_identifier(instance_id)
            .send()
            .await?;
        output
            .db_instance()
            .map(InstanceSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("DB instance {instance_id}")))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_instance(&self, instance_id: &str) -> Result<InstanceSummary, ActionError> {
        let output = self
            .delete_db_instance()
            .db_instance_identifier(instance_id)
            .skip_final_snapshot(true)
            .delete_automated_backups(true)
            .send()
            .await?;
        let summary = output
            .db_instance()
            .map(InstanceSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("DB instance {instance_id}")))?;
        info!(status = ?summary.status, "Deleting DB instance");
        Ok(summary)
    }
}

async fn instance_state(
    api: &dyn RdsApi,
    instance_id: &str,
) -> Result<Poll<InstanceSummary>, ActionError> {
    let instance = api
        .describe_instances(Some(instance_id.to_string()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ActionError::NotFound(format!("DB instance {instance_id}")))?;
    match instance.status.as_deref() {
        Some("available") => Ok(Poll::Ready(instance)),
        other => Ok(Poll::Pending(other.unwrap_or("unknown").to_string())),
    }
}

/// Polls until the instance reports `available`.
///
/// # Errors
///
/// Returns `NotFound` if the instance disappears, or `Timeout`.
pub async fn wait_for_instance_available(
    api: &dyn RdsApi,
    instance_id: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<InstanceSummary, ActionError> {
    poll_until(
        &format!("DB instance {instance_id}"),
        interval,
        max_attempts,
        || instance_state(api, instance_id),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_rds::operation::delete_db_instance::DeleteDbInstanceOutput;
    use aws_smithy_mocks::{mock, mock_client};

    fn instance(status: &str) -> InstanceSummary {
        InstanceSummary {
            instance_id: "orders-db".into(),
            status: Some(status.into()),
            engine: Some("mysql".into()),
            engine_version: None,
            instance_class: Some("db.t3.micro".into()),
            endpoint: None,
        }
    }

    #[tokio::test]
    async fn test_wait_for_instance_available_queries_by_id() {
        let mut mock = MockRdsApi::new();
        let mut seq = mockall::Sequence::new();
        for status in ["creating", "backing-up", "available"] {
            mock.expect_describe_instances()
                .withf(|id| id.as_deref() == Some("orders-db"))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(vec![instance(status)]));
        }

        let ready = wait_for_instance_available(&mock, "orders-db", Duration::ZERO, 5)
            .await
            .unwrap();
        assert_eq!(ready.status.as_deref(), Some("available"));
    }

    #[tokio::test]
    async fn test_wait_for_instance_available_missing_instance() {
        let mut mock = MockRdsApi::new();
        mock.expect_describe_instances().returning(|_| Ok(vec![]));

        let err = wait_for_instance_available(&mock, "orders-db", Duration::ZERO, 5)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_instance_summary_from_sdk_instance() {
        let sdk = DbInstance::builder()
            .db_instance_identifier("orders-db")
            .db_instance_status("available")
            .endpoint(
                aws_sdk_rds::types::Endpoint::builder()
                    .address("orders-db.abc.us-east-1.rds.amazonaws.com")
                    .port(3306)
                    .build(),
            )
            .build();
        let summary = InstanceSummary::from(&sdk);
        assert_eq!(summary.instance_id, "orders-db");
        assert_eq!(
            summary.endpoint.as_deref(),
            Some("orders-db.abc.us-east-1.rds.amazonaws.com:3306")
        );
    }

    #[tokio::test]
    async fn test_delete_instance_skips_final_snapshot() {
        let rule = mock!(Client::delete_db_instance)
            .match_requests(|req| {
                req.db_instance_identifier() == Some("orders-db")
                    && req.skip_final_snapshot() == Some(true)
                    && req.delete_automated_backups() == Some(true)
            })
            .then_output(|| {
                DeleteDbInstanceOutput::builder()
                    .db_instance(
                        DbInstance::builder()
                            .db_instance_identifier("orders-db")
                            .db_instance_status("deleting")
                            .build(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_rds, [&rule]);

        let summary = RdsApi::delete_instance(&client, "orders-db").await.unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(summary.instance_id, "orders-db");
        assert_eq!(summary.status.as_deref(), Some("deleting"));
    }

    #[tokio::test]
    async fn test_delete_instance_without_instance_is_not_found() {
        let rule = mock!(Client::delete_db_instance)
            .then_output(|| DeleteDbInstanceOutput::builder().build());
        let client = mock_client!(aws_sdk_rds, [&rule]);

        let err = RdsApi::delete_instance(&client, "orders-db")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
