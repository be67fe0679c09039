//! Elastic Beanstalk application actions.

use async_trait::async_trait;
use aws_sdk_elasticbeanstalk::Client;
use aws_sdk_elasticbeanstalk::types::ApplicationDescription;
use serde::Serialize;
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationSummary {
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub versions: Vec<String>,
}

impl From<&ApplicationDescription> for ApplicationSummary {
    fn from(app: &ApplicationDescription) -> Self {
        Self {
            name: app.application_name().field(),
            description: app.description().field(),
            created: app.date_created().timestamp(),
            versions: app.versions().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentSummary {
    pub name: Option<String>,
    pub environment_id: Option<String>,
    pub application: Option<String>,
    pub status: Option<String>,
    pub health: Option<String>,
    pub cname: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ElasticBeanstalkApi: Send + Sync {
    async fn describe_applications(&self) -> Result<Vec<ApplicationSummary>, ActionError>;
    async fn create_application(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<ApplicationSummary, ActionError>;
    async fn describe_environments(
        &self,
        application: Option<String>,
    ) -> Result<Vec<EnvironmentSummary>, ActionError>;
    async fn delete_application(&self, name: &str, terminate_env: bool)
    -> Result<(), ActionError>;
}

#[async_trait]
impl ElasticBeanstalkApi for Client {
    #[tracing::instrument(skip(self))]
    async fn describe_applications(&self) -> Result<Vec<ApplicationSummary>, ActionError> {
        let output = self.describe_applications().send().await?;
        let apps: Vec<ApplicationSummary> = output
            .applications()
            .iter()
            .map(ApplicationSummary::from)
            .collect();
        info!(count = apps.len(), "Described applications");
        Ok(apps)
    }

    #[tracing::instrument(skip(self))]
    async fn create_application(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<ApplicationSummary, ActionError> {
        let output = self
            .create_application()
            .application_name(name)
            .set_description(description)
            .send()
            .await?;
        let app = output.application().map(ApplicationSummary::from).ok_or_else(|| {
            ActionError::UnexpectedState("CreateApplication returned no application".into())
        })?;
        info!("Created application");
        Ok(app)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_environments(
        &self,
        application: Option<String>,
    ) -> Result<Vec<EnvironmentSummary>, ActionError> {
        let output = self
            .describe_environments()
            .set_application_name(application)
            .send()
            .await?;
        Ok(output
            .environments()
            .iter()
            .map(|e| EnvironmentSummary {
                name: e.environment_name().field(),
                environment_id: e.environment_id().field(),
                application: e.application_name().field(),
                status: e.status().field(),
                health: e.health().field(),
                cname: e.cname().field(),
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_application(
        &self,
        name: &str,
        terminate_env: bool,
    ) -> Result<(), ActionError> {
        self.delete_application()
            .application_name(name)
            .terminate_env_by_force(terminate_env)
            .send()
            .await?;
        info!("Deleted application");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_elasticbeanstalk::operation::create_application::CreateApplicationOutput;
    use aws_sdk_elasticbeanstalk::operation::delete_application::DeleteApplicationOutput;
    use aws_sdk_elasticbeanstalk::operation::describe_environments::DescribeEnvironmentsOutput;
    use aws_sdk_elasticbeanstalk::types::{EnvironmentDescription, EnvironmentHealth, EnvironmentStatus};
    use aws_smithy_mocks::{mock, mock_client};

    #[test]
    fn test_application_summary_from_sdk() {
        let app = ApplicationDescription::builder()
            .application_name("storefront")
            .description("public shop")
            .versions("v1")
            .versions("v2")
            .build();
        let summary = ApplicationSummary::from(&app);
        assert_eq!(summary.name.as_deref(), Some("storefront"));
        assert_eq!(summary.versions, vec!["v1", "v2"]);
        assert!(summary.created.is_none());
    }


    #[tokio::test]
    async fn test_create_application_sends_description() {
        let rule = mock!(Client::create_application)
            .match_requests(|req| {
                req.application_name() == Some("storefront")
                    && req.description() == Some("public shop")
            })
            .then_output(|| {
                CreateApplicationOutput::builder()
                    .application(
                        ApplicationDescription::builder()
                            .application_name("storefront")
                            .description("public shop")
                            .build(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_elasticbeanstalk, [&rule]);

        let app = ElasticBeanstalkApi::create_application(
            &client,
            "storefront",
            Some("public shop".into()),
        )
        .await
        .unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(app.name.as_deref(), Some("storefront"));
    }

    #[tokio::test]
    async fn test_create_application_without_application_is_unexpected() {
        let rule = mock!(Client::create_application)
            .then_output(|| CreateApplicationOutput::builder().build());
        let client = mock_client!(aws_sdk_elasticbeanstalk, [&rule]);

        let err = ElasticBeanstalkApi::create_application(&client, "storefront", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::UnexpectedState(_)));
    }

    #[tokio::test]
    async fn test_delete_application_forwards_terminate_flag() {
        let rule = mock!(Client::delete_application)
            .match_requests(|req| {
                req.application_name() == Some("storefront")
                    && req.terminate_env_by_force() == Some(true)
            })
            .then_output(|| DeleteApplicationOutput::builder().build());
        let client = mock_client!(aws_sdk_elasticbeanstalk, [&rule]);

        ElasticBeanstalkApi::delete_application(&client, "storefront", true)
            .await
            .unwrap();
        assert_eq!(rule.num_calls(), 1);
    }

    #[tokio::test]
    async fn test_describe_environments_filters_by_application() {
        let rule = mock!(Client::describe_environments)
            .match_requests(|req| req.application_name() == Some("storefront"))
            .then_output(|| {
                DescribeEnvironmentsOutput::builder()
                    .environments(
                        EnvironmentDescription::builder()
                            .environment_name("storefront-prod")
                            .environment_id("e-abc123")
                            .application_name("storefront")
                            .status(EnvironmentStatus::Ready)
                            .health(EnvironmentHealth::Green)
                            .cname("storefront-prod.us-east-1.elasticbeanstalk.com")
                            .build(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_elasticbeanstalk, [&rule]);

        let envs =
            ElasticBeanstalkApi::describe_environments(&client, Some("storefront".into()))
                .await
                .unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].status.as_deref(), Some("Ready"));
        assert_eq!(envs[0].health.as_deref(), Some("Green"));
    }
}
