use std::sync::Arc;

use aws_config::SdkConfig;

use crate::services::athena::AthenaApi;
use crate::services::cognito::CognitoApi;
use crate::services::dynamodb::DynamoDbApi;
use crate::services::ecs::EcsApi;
use crate::services::elasticbeanstalk::ElasticBeanstalkApi;
use crate::services::forecast::ForecastApi;
use crate::services::glue::GlueApi;
use crate::services::rds::RdsApi;
use crate::services::redshift::RedshiftApi;
use crate::services::s3::S3Api;
use crate::services::sagemaker::SageMakerApi;
use crate::services::scheduler::SchedulerApi;
use crate::services::sns::SnsApi;
use crate::services::sqs::SqsApi;
use crate::services::ssm::SsmApi;
use crate::services::support::SupportApi;

/// One client per service, created once per process and shared.
///
/// Fields are trait objects so tests can swap a single service for a mock.
#[derive(Clone)]
pub struct AwsClients {
    pub athena: Arc<dyn AthenaApi>,
    pub cognito: Arc<dyn CognitoApi>,
    pub dynamodb: Arc<dyn DynamoDbApi>,
    pub ecs: Arc<dyn EcsApi>,
    pub elasticbeanstalk: Arc<dyn ElasticBeanstalkApi>,
    pub forecast: Arc<dyn ForecastApi>,
    pub glue: Arc<dyn GlueApi>,
    pub rds: Arc<dyn RdsApi>,
    pub redshift: Arc<dyn RedshiftApi>,
    pub s3: Arc<dyn S3Api>,
    pub sagemaker: Arc<dyn SageMakerApi>,
    pub scheduler: Arc<dyn SchedulerApi>,
    pub sns: Arc<dyn SnsApi>,
    pub sqs: Arc<dyn SqsApi>,
    pub ssm: Arc<dyn SsmApi>,
    pub support: Arc<dyn SupportApi>,
}

impl AwsClients {
    /// Builds every service client from one shared SDK config. No network calls are made here.
    #[must_use]
    pub fn from_conf(sdk_config: &SdkConfig) -> Self {
        Self {
            athena: Arc::new(aws_sdk_athena::Client::new(sdk_config)),
            cognito: Arc::new(aws_sdk_cognitoidentityprovider::Client::new(sdk_config)),
            dynamodb: Arc::new(aws_sdk_dynamodb::Client::new(sdk_config)),
            ecs: Arc::new(aws_sdk_ecs::Client::new(sdk_config)),
            elasticbeanstalk: Arc::new(aws_sdk_elasticbeanstalk::Client::new(sdk_config)),
            forecast: Arc::new(aws_sdk_forecast::Client::new(sdk_config)),
            glue: Arc::new(aws_sdk_glue::Client::new(sdk_config)),
            rds: Arc::new(aws_sdk_rds::Client::new(sdk_config)),
            redshift: Arc::new(aws_sdk_redshift::Client::new(sdk_config)),
            s3: Arc::new(s3_client(sdk_config)),
            sagemaker: Arc::new(aws_sdk_sagemaker::Client::new(sdk_config)),
            scheduler: Arc::new(aws_sdk_scheduler::Client::new(sdk_config)),
            sns: Arc::new(aws_sdk_sns::Client::new(sdk_config)),
            sqs: Arc::new(aws_sdk_sqs::Client::new(sdk_config)),
            ssm: Arc::new(aws_sdk_ssm::Client::new(sdk_config)),
            support: Arc::new(aws_sdk_support::Client::new(sdk_config)),
        }
    }
}

// Custom endpoints (LocalStack and friends) don't resolve virtual-hosted bucket names.
fn s3_client(sdk_config: &SdkConfig) -> aws_sdk_s3::Client {
    let conf = aws_sdk_s3::config::Builder::from(sdk_config)
        .force_path_style(sdk_config.endpoint_url().is_some())
        .build();
    aws_sdk_s3::Client::from_conf(conf)
}
