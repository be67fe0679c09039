//! Redshift cluster actions.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_redshift::Client;
use aws_sdk_redshift::types::Cluster;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::core::waiter::{Poll, poll_until};
use crate::errors::ActionError;

#[derive(Clone, PartialEq, Args, Deserialize)]
pub struct CreateClusterRequest {
    #[arg(long)]
    pub cluster_id: String,
    #[arg(long)]
    pub master_username: String,
    #[arg(long, env = "REDSHIFT_MASTER_PASSWORD", hide_env_values = true)]
    pub master_password: String,
    #[arg(long, default_value = "ra3.large")]
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[arg(long)]
    #[serde(default)]
    pub db_name: Option<String>,
}

// Hand-written so the master password never reaches the logs.
impl std::fmt::Debug for CreateClusterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateClusterRequest")
            .field("cluster_id", &self.cluster_id)
            .field("master_username", &self.master_username)
            .field("node_type", &self.node_type)
            .field("db_name", &self.db_name)
            .finish_non_exhaustive()
    }
}

fn default_node_type() -> String {
    "ra3.large".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    pub status: Option<String>,
    pub node_type: Option<String>,
    pub endpoint: Option<String>,
    pub maintenance_window: Option<String>,
}

impl From<&Cluster> for ClusterSummary {
    fn from(cluster: &Cluster) -> Self {
        let endpoint = cluster.endpoint().and_then(|e| {
            let address: Option<String> = e.address().field();
            let port: Option<i32> = e.port().field();
            address.map(|a| match port {
                Some(p) => format!("{a}:{p}"),
                None => a,
            })
        });
        Self {
            cluster_id: cluster.cluster_identifier().field(),
            status: cluster.cluster_status().field(),
            node_type: cluster.node_type().field(),
            endpoint,
            maintenance_window: cluster.preferred_maintenance_window().field(),
        }
    }
}

/// Checks Redshift's master password rules locally before any call is made.
///
/// # Errors
///
/// Returns `InvalidInput` describing the first rule the password breaks.
pub fn validate_master_password(password: &str) -> Result<(), ActionError> {
    let len = password.chars().count();
    if !(8..=64).contains(&len) {
        return Err(ActionError::InvalidInput(
            "master password must be 8 to 64 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase())
        || !password.chars().any(|c| c.is_ascii_lowercase())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(ActionError::InvalidInput(
            "master password needs an uppercase letter, a lowercase letter and a digit"
                .to_string(),
        ));
    }
    if password
        .chars()
        .any(|c| matches!(c, '\'' | '"' | '\\' | '/' | '@' | ' '))
    {
        return Err(ActionError::InvalidInput(
            "master password must not contain quotes, slashes, '@' or spaces".to_string(),
        ));
    }
    Ok(())
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedshiftApi: Send + Sync {
    async fn create_cluster(
        &self,
        request: &CreateClusterRequest,
    ) -> Result<ClusterSummary, ActionError>;
    async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterSummary, ActionError>;
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, ActionError>;
    async fn modify_maintenance_window(
        &self,
        cluster_id: &str,
        window: &str,
    ) -> Result<ClusterSummary, ActionError>;
    async fn delete_cluster(&self, cluster_id: &str) -> Result<ClusterSummary, ActionError>;
}

#[async_trait]
impl RedshiftApi for Client {
    #[tracing::instrument(skip(self))]
    async fn create_cluster(
        &self,
        request: &CreateClusterRequest,
    ) -> Result<ClusterSummary, ActionError> {
        validate_master_password(&request.master_password)?;

        let output = self
            .create_cluster()
            .cluster_identifier(&request.cluster_id)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .node_type(&request.node_type)
            .cluster_type("single-node")
            .set_db_name(request.db_name.clone())
            .send()
            .await?;
        let summary = output
            .cluster()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::UnexpectedState("CreateCluster returned no cluster".into()))?;
        info!(status = ?summary.status, "Created cluster");
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_cluster(&self, cluster_id: &str) -> Result<ClusterSummary, ActionError> {
        let output = self
            .describe_clusters()
            .cluster_identifier(cluster_id)
            .send()
            .await?;
        output
            .clusters()
            .first()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("cluster {cluster_id}")))
    }

    #[tracing::instrument(skip(self))]
    async fn list_clusters(&self) -> Result<Vec<ClusterSummary>, ActionError> {
        let mut pages = self.describe_clusters().into_paginator().send();
        let mut clusters = Vec::new();
        while let Some(page) = pages.next().await {
            clusters.extend(page?.clusters().iter().map(ClusterSummary::from));
        }
        info!(count = clusters.len(), "Listed clusters");
        Ok(clusters)
    }

    #[tracing::instrument(skip(self))]
    async fn modify_maintenance_window(
        &self,
        cluster_id: &str,
        window: &str,
    ) -> Result<ClusterSummary, ActionError> {
        let output = self
            .modify_cluster()
            .cluster_identifier(cluster_id)
            .preferred_maintenance_window(window)
            .send()
            .await?;
        let summary = output
            .cluster()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("cluster {cluster_id}")))?;
        info!(window = ?summary.maintenance_window, "Modified maintenance window");
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_cluster(&self, cluster_id: &str) -> Result<ClusterSummary, ActionError> {
        let output = self
            .delete_cluster()
            .cluster_identifier(cluster_id)
            .skip_final_cluster_snapshot(true)
            .send()
            .await?;
        let summary = output
            .cluster()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("cluster {cluster_id}")))?;
        info!(status = ?summary.status, "Deleting cluster");
        Ok(summary)
    }
}

async fn cluster_state(
    api: &dyn RedshiftApi,
    cluster_id: &str,
) -> Result<Poll<ClusterSummary>, ActionError> {
    let summary = api.describe_cluster(cluster_id).await?;
    match summary.status.as_deref() {
        Some("available") => Ok(Poll::Ready(summary)),
        other => Ok(Poll::Pending(other.unwrap_or("unknown").to_string())),
    }
}

/// Polls `describe_cluster` until the cluster status is `available`.
///
/// # Errors
///
/// Returns the describe error, or `Timeout` if the cluster never becomes available.
pub async fn wait_for_cluster_available(
    api: &dyn RedshiftApi,
    cluster_id: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<ClusterSummary, ActionError> {
    poll_until(
        &format!("cluster {cluster_id}"),
        interval,
        max_attempts,
        || cluster_state(api, cluster_id),
    )
    .await
}
