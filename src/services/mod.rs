//! One module per AWS service. Each exposes an `async_trait` seam whose
//! methods are the service's actions, implemented for the SDK client.

pub mod athena;
pub mod cognito;
pub mod dynamodb;
pub mod ecs;
pub mod elasticbeanstalk;
pub mod forecast;
pub mod glue;
pub mod rds;
pub mod redshift;
pub mod s3;
pub mod sagemaker;
pub mod scheduler;
pub mod sns;
pub mod sqs;
pub mod ssm;
pub mod support;
