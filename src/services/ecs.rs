//! ECS cluster actions.

use async_trait::async_trait;
use aws_sdk_ecs::Client;
use aws_sdk_ecs::types::Cluster;
use serde::Serialize;
use tracing::info;

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub name: String,
    pub arn: String,
    pub status: Option<String>,
    pub running_tasks: i32,
    pub pending_tasks: i32,
    pub active_services: i32,
}

impl From<&Cluster> for ClusterSummary {
    fn from(cluster: &Cluster) -> Self {
        Self {
            name: cluster.cluster_name().field(),
            arn: cluster.cluster_arn().field(),
            status: cluster.status().field(),
            running_tasks: cluster.running_tasks_count().field(),
            pending_tasks: cluster.pending_tasks_count().field(),
            active_services: cluster.active_services_count().field(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EcsApi: Send + Sync {
    async fn list_clusters(&self) -> Result<Vec<String>, ActionError>;
    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterSummary, ActionError>;
    async fn create_cluster(&self, name: &str) -> Result<ClusterSummary, ActionError>;
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>, ActionError>;
    async fn delete_cluster(&self, cluster: &str) -> Result<ClusterSummary, ActionError>;
}

#[async_trait]
impl EcsApi for Client {
    #[tracing::instrument(skip(self))]
    async fn list_clusters(&self) -> Result<Vec<String>, ActionError> {
        let arns = self
            .list_clusters()
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await?;
        info!(count = arns.len(), "Listed clusters");
        Ok(arns)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_cluster(&self, cluster: &str) -> Result<ClusterSummary, ActionError> {
        let output = self.describe_clusters().clusters(cluster).send().await?;
        if let Some(failure) = output.failures().first() {
            let reason: String = failure.reason().field();
            return Err(if reason == "MISSING" {
                ActionError::NotFound(format!("cluster {cluster}"))
            } else {
                ActionError::UnexpectedState(format!("cluster {cluster}: {reason}"))
            });
        }
        output
            .clusters()
            .first()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("cluster {cluster}")))
    }

    #[tracing::instrument(skip(self))]
    async fn create_cluster(&self, name: &str) -> Result<ClusterSummary, ActionError> {
        let output = self.create_cluster().cluster_name(name).send().await?;
        let summary = output
            .cluster()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::UnexpectedState("CreateCluster returned no cluster".into()))?;
        info!(arn = %summary.arn, "Created cluster");
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self, cluster: &str) -> Result<Vec<String>, ActionError> {
        let arns = self
            .list_tasks()
            .cluster(cluster)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await?;
        info!(count = arns.len(), "Listed tasks");
        Ok(arns)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_cluster(&self, cluster: &str) -> Result<ClusterSummary, ActionError> {
        let output = self.delete_cluster().cluster(cluster).send().await?;
        let summary = output
            .cluster()
            .map(ClusterSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("cluster {cluster}")))?;
        info!(status = ?summary.status, "Deleted cluster");
        Ok(summary)
    }
}
