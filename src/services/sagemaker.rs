//! SageMaker listing actions.

use async_trait::async_trait;
use aws_sdk_sagemaker::Client;
use serde::Serialize;
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookInstance {
    pub name: String,
    pub status: Option<String>,
    pub instance_type: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingJob {
    pub name: String,
    pub status: String,
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingJobDetails {
    pub name: String,
    pub status: String,
    pub secondary_status: Option<String>,
    pub failure_reason: Option<String>,
    pub algorithm_image: Option<String>,
    pub model_artifacts: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub arn: String,
    pub created: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SageMakerApi: Send + Sync {
    async fn list_notebook_instances(&self) -> Result<Vec<NotebookInstance>, ActionError>;
    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>, ActionError>;
    async fn describe_training_job(&self, name: &str) -> Result<TrainingJobDetails, ActionError>;
    async fn list_models(&self) -> Result<Vec<ModelSummary>, ActionError>;
}

#[async_trait]
impl SageMakerApi for Client {
    #[tracing::instrument(skip(self))]
    async fn list_notebook_instances(&self) -> Result<Vec<NotebookInstance>, ActionError> {
        let mut pages = self.list_notebook_instances().into_paginator().send();
        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            instances.extend(page?.notebook_instances().iter().map(|n| NotebookInstance {
                name: n.notebook_instance_name().field(),
                status: n.notebook_instance_status().field(),
                instance_type: n.instance_type().field(),
                url: n.url().field(),
            }));
        }
        info!(count = instances.len(), "Listed notebook instances");
        Ok(instances)
    }

    #[tracing::instrument(skip(self))]
    async fn list_training_jobs(&self) -> Result<Vec<TrainingJob>, ActionError> {
        let mut pages = self.list_training_jobs().into_paginator().send();
        let mut jobs = Vec::new();
        while let Some(page) = pages.next().await {
            jobs.extend(page?.training_job_summaries().iter().map(|j| TrainingJob {
                name: j.training_job_name().field(),
                status: j.training_job_status().field(),
                created: j.creation_time().timestamp(),
            }));
        }
        info!(count = jobs.len(), "Listed training jobs");
        Ok(jobs)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_training_job(&self, name: &str) -> Result<TrainingJobDetails, ActionError> {
        let output = self
            .describe_training_job()
            .training_job_name(name)
            .send()
            .await?;
        Ok(TrainingJobDetails {
            name: output.training_job_name().field(),
            status: output.training_job_status().field(),
            secondary_status: output.secondary_status().field(),
            failure_reason: output.failure_reason().field(),
            algorithm_image: output
                .algorithm_specification()
                .and_then(|a| -> Option<String> { a.training_image().field() }),
            model_artifacts: output
                .model_artifacts()
                .and_then(|m| -> Option<String> { m.s3_model_artifacts().field() }),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ModelSummary>, ActionError> {
        let mut pages = self.list_models().into_paginator().send();
        let mut models = Vec::new();
        while let Some(page) = pages.next().await {
            models.extend(page?.models().iter().map(|m| ModelSummary {
                name: m.model_name().field(),
                arn: m.model_arn().field(),
                created: m.creation_time().timestamp(),
            }));
        }
        info!(count = models.len(), "Listed models");
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sagemaker::operation::describe_training_job::DescribeTrainingJobOutput;
    use aws_sdk_sagemaker::operation::list_notebook_instances::ListNotebookInstancesOutput;
    use aws_sdk_sagemaker::types::{
        AlgorithmSpecification, InstanceType, ModelArtifacts, NotebookInstanceStatus,
        NotebookInstanceSummary, SecondaryStatus, TrainingJobStatus,
    };
    use aws_smithy_mocks::{mock, mock_client};

    #[tokio::test]
    async fn test_list_notebook_instances_maps_summaries() {
        let rule = mock!(Client::list_notebook_instances).then_output(|| {
            ListNotebookInstancesOutput::builder()
                .notebook_instances(
                    NotebookInstanceSummary::builder()
                        .notebook_instance_name("research")
                        .notebook_instance_status(NotebookInstanceStatus::InService)
                        .instance_type(InstanceType::MlT3Medium)
                        .url("research.notebook.us-east-1.sagemaker.aws")
                        .build(),
                )
                .build()
        });
        let client = mock_client!(aws_sdk_sagemaker, [&rule]);

        let instances = SageMakerApi::list_notebook_instances(&client).await.unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(
            instances,
            vec![NotebookInstance {
                name: "research".into(),
                status: Some("InService".into()),
                instance_type: Some("ml.t3.medium".into()),
                url: Some("research.notebook.us-east-1.sagemaker.aws".into()),
            }]
        );
    }

    #[tokio::test]
    async fn test_describe_training_job_reports_failure_details() {
        let rule = mock!(Client::describe_training_job)
            .match_requests(|req| req.training_job_name() == Some("churn-model"))
            .then_output(|| {
                DescribeTrainingJobOutput::builder()
                    .training_job_name("churn-model")
                    .training_job_status(TrainingJobStatus::Failed)
                    .secondary_status(SecondaryStatus::Failed)
                    .failure_reason("ClientError: no training data")
                    .algorithm_specification(
                        AlgorithmSpecification::builder()
                            .training_image("382416733822.dkr.ecr.us-east-1.amazonaws.com/xgboost:1")
                            .build(),
                    )
                    .model_artifacts(
                        ModelArtifacts::builder()
                            .s3_model_artifacts("s3://models/churn/output/model.tar.gz")
                            .build(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_sagemaker, [&rule]);

        let job = SageMakerApi::describe_training_job(&client, "churn-model")
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(job.name, "churn-model");
        assert_eq!(job.status, "Failed");
        assert_eq!(job.secondary_status.as_deref(), Some("Failed"));
        assert_eq!(
            job.failure_reason.as_deref(),
            Some("ClientError: no training data")
        );
        assert_eq!(
            job.model_artifacts.as_deref(),
            Some("s3://models/churn/output/model.tar.gz")
        );
        assert!(job.algorithm_image.is_some());
    }
}
