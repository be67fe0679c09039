//! The catalogue of actions as data.
//!
//! [`ActionCommand`] is parsed from CLI arguments (`aws-actions sqs
//! send-message --queue-url ...`) and from Lambda events
//! (`{"service": "sqs", "action": "send_message", "queue_url": "..."}`),
//! so both entry points share one parameter contract.

use std::path::PathBuf;

use clap::Subcommand;
use serde::Deserialize;
use serde_json::Value;

use crate::services::athena::StartQueryRequest;
use crate::services::cognito::AppClient;
use crate::services::dynamodb::CreateTableRequest;
use crate::services::forecast::CreateDatasetRequest;
use crate::services::glue::CreateCrawlerRequest;
use crate::services::rds::CreateInstanceRequest;
use crate::services::redshift::CreateClusterRequest;
use crate::services::scheduler::CreateScheduleRequest;
use crate::services::sns::PublishRequest;
use crate::services::sqs::{ReceiveMessagesRequest, SendMessageRequest};
use crate::services::support::CreateCaseRequest;

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum ActionCommand {
    /// Amazon Athena queries.
    #[command(subcommand)]
    Athena(AthenaAction),
    /// Amazon Cognito user pools.
    #[command(subcommand)]
    Cognito(CognitoAction),
    /// Amazon DynamoDB tables and items.
    #[command(subcommand)]
    Dynamodb(DynamoDbAction),
    /// Amazon ECS clusters.
    #[command(subcommand)]
    Ecs(EcsAction),
    /// AWS Elastic Beanstalk applications.
    #[command(subcommand)]
    Elasticbeanstalk(ElasticBeanstalkAction),
    /// Amazon Forecast datasets and forecasts.
    #[command(subcommand)]
    Forecast(ForecastAction),
    /// AWS Glue catalog, crawlers and jobs.
    #[command(subcommand)]
    Glue(GlueAction),
    /// Amazon RDS instances.
    #[command(subcommand)]
    Rds(RdsAction),
    /// Amazon Redshift clusters.
    #[command(subcommand)]
    Redshift(RedshiftAction),
    /// Amazon S3 buckets and objects.
    #[command(subcommand)]
    S3(S3Action),
    /// Amazon SageMaker notebooks, training jobs and models.
    #[command(subcommand)]
    Sagemaker(SageMakerAction),
    /// Amazon EventBridge Scheduler.
    #[command(subcommand)]
    Scheduler(SchedulerAction),
    /// Amazon SNS topics and subscriptions.
    #[command(subcommand)]
    Sns(SnsAction),
    /// Amazon SQS queues and messages.
    #[command(subcommand)]
    Sqs(SqsAction),
    /// AWS Systems Manager Parameter Store.
    #[command(subcommand)]
    Ssm(SsmAction),
    /// AWS Support cases.
    #[command(subcommand)]
    Support(SupportAction),
}

impl ActionCommand {
    /// Service name as it appears in the JSON form.
    #[must_use]
    pub fn service(&self) -> &'static str {
        match self {
            ActionCommand::Athena(_) => "athena",
            ActionCommand::Cognito(_) => "cognito",
            ActionCommand::Dynamodb(_) => "dynamodb",
            ActionCommand::Ecs(_) => "ecs",
            ActionCommand::Elasticbeanstalk(_) => "elasticbeanstalk",
            ActionCommand::Forecast(_) => "forecast",
            ActionCommand::Glue(_) => "glue",
            ActionCommand::Rds(_) => "rds",
            ActionCommand::Redshift(_) => "redshift",
            ActionCommand::S3(_) => "s3",
            ActionCommand::Sagemaker(_) => "sagemaker",
            ActionCommand::Scheduler(_) => "scheduler",
            ActionCommand::Sns(_) => "sns",
            ActionCommand::Sqs(_) => "sqs",
            ActionCommand::Ssm(_) => "ssm",
            ActionCommand::Support(_) => "support",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DynamoDbAction {
    CreateTable(CreateTableRequest),
    DescribeTable {
        #[arg(long)]
        table: String,
    },
    /// Polls until the table is ACTIVE.
    WaitForTableActive {
        #[arg(long)]
        table: String,
    },
    ListTables,
    PutItem {
        #[arg(long)]
        table: String,
        /// Item as a JSON object, e.g. '{"id": "1", "year": 2024}'.
        #[arg(long, value_parser = parse_json)]
        item: Value,
    },
    GetItem {
        #[arg(long)]
        table: String,
        #[arg(long, value_parser = parse_json)]
        key: Value,
    },
    /// Equality query on a string partition key.
    Query {
        #[arg(long)]
        table: String,
        #[arg(long)]
        key_name: String,
        #[arg(long)]
        key_value: String,
    },
    Scan {
        #[arg(long)]
        table: String,
    },
    DeleteItem {
        #[arg(long)]
        table: String,
        #[arg(long, value_parser = parse_json)]
        key: Value,
    },
    DeleteTable {
        #[arg(long)]
        table: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SqsAction {
    CreateQueue {
        #[arg(long)]
        name: String,
    },
    GetQueueUrl {
        #[arg(long)]
        name: String,
    },
    ListQueues {
        #[arg(long)]
        #[serde(default)]
        prefix: Option<String>,
    },
    SendMessage(SendMessageRequest),
    ReceiveMessages(ReceiveMessagesRequest),
    DeleteMessage {
        #[arg(long)]
        queue_url: String,
        #[arg(long)]
        receipt_handle: String,
    },
    PurgeQueue {
        #[arg(long)]
        queue_url: String,
    },
    DeleteQueue {
        #[arg(long)]
        queue_url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum S3Action {
    ListBuckets,
    CreateBucket {
        #[arg(long)]
        bucket: String,
        /// Defaults to the configured region.
        #[arg(long)]
        #[serde(default)]
        region: Option<String>,
    },
    /// Uploads inline text or a local file.
    PutObject {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(long, conflicts_with = "file")]
        #[serde(default)]
        body: Option<String>,
        #[arg(long)]
        #[serde(default)]
        file: Option<PathBuf>,
    },
    /// Downloads an object, to `--output` when given.
    GetObject {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        #[serde(default)]
        output: Option<PathBuf>,
    },
    ListObjects {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        #[serde(default)]
        prefix: Option<String>,
    },
    /// Copies between two `s3://bucket/key` URIs.
    CopyObject {
        #[arg(long)]
        source: String,
        #[arg(long)]
        destination: String,
    },
    DeleteObject {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },
    DeleteBucket {
        #[arg(long)]
        bucket: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AthenaAction {
    StartQuery(StartQueryRequest),
    GetQueryExecution {
        #[arg(long)]
        execution_id: String,
    },
    /// Polls until the query finishes.
    WaitForQuery {
        #[arg(long)]
        execution_id: String,
    },
    GetQueryResults {
        #[arg(long)]
        execution_id: String,
    },
    StopQuery {
        #[arg(long)]
        execution_id: String,
    },
    ListNamedQueries,
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SageMakerAction {
    ListNotebookInstances,
    ListTrainingJobs,
    DescribeTrainingJob {
        #[arg(long)]
        name: String,
    },
    ListModels,
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EcsAction {
    ListClusters,
    DescribeCluster {
        #[arg(long)]
        cluster: String,
    },
    CreateCluster {
        #[arg(long)]
        name: String,
    },
    ListTasks {
        #[arg(long)]
        cluster: String,
    },
    DeleteCluster {
        #[arg(long)]
        cluster: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ForecastAction {
    CreateDataset(CreateDatasetRequest),
    ListDatasets,
    ListForecasts,
    DescribeForecast {
        #[arg(long)]
        arn: String,
    },
    DeleteDataset {
        #[arg(long)]
        arn: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RedshiftAction {
    CreateCluster(CreateClusterRequest),
    DescribeCluster {
        #[arg(long)]
        cluster_id: String,
    },
    /// Polls until the cluster is available.
    WaitForClusterAvailable {
        #[arg(long)]
        cluster_id: String,
    },
    ListClusters,
    /// Window format is `ddd:hh24:mi-ddd:hh24:mi`, e.g. `wed:07:30-wed:08:00`.
    ModifyMaintenanceWindow {
        #[arg(long)]
        cluster_id: String,
        #[arg(long)]
        window: String,
    },
    DeleteCluster {
        #[arg(long)]
        cluster_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SnsAction {
    CreateTopic {
        #[arg(long)]
        name: String,
        #[arg(long)]
        #[serde(default)]
        fifo: bool,
    },
    ListTopics,
    Publish(PublishRequest),
    Subscribe {
        #[arg(long)]
        topic_arn: String,
        /// e.g. `email`, `sqs`, `lambda`.
        #[arg(long)]
        protocol: String,
        #[arg(long)]
        endpoint: String,
    },
    ListSubscriptions {
        #[arg(long)]
        topic_arn: String,
    },
    Unsubscribe {
        #[arg(long)]
        subscription_arn: String,
    },
    DeleteTopic {
        #[arg(long)]
        topic_arn: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RdsAction {
    DescribeInstances {
        #[arg(long)]
        #[serde(default)]
        instance_id: Option<String>,
    },
    CreateInstance(CreateInstanceRequest),
    /// Polls until the instance is available.
    WaitForInstanceAvailable {
        #[arg(long)]
        instance_id: String,
    },
    CreateSnapshot {
        #[arg(long)]
        instance_id: String,
        #[arg(long)]
        snapshot_id: String,
    },
    RebootInstance {
        #[arg(long)]
        instance_id: String,
    },
    DeleteInstance {
        #[arg(long)]
        instance_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CognitoAction {
    ListUserPools,
    ListUsers {
        #[arg(long)]
        user_pool_id: String,
    },
    SignUp {
        #[command(flatten)]
        #[serde(flatten)]
        client: AppClient,
        #[arg(long)]
        username: String,
        #[arg(long, env = "COGNITO_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        email: String,
    },
    AdminGetUser {
        #[arg(long)]
        user_pool_id: String,
        #[arg(long)]
        username: String,
    },
    ResendConfirmationCode {
        #[command(flatten)]
        #[serde(flatten)]
        client: AppClient,
        #[arg(long)]
        username: String,
    },
    ConfirmSignUp {
        #[command(flatten)]
        #[serde(flatten)]
        client: AppClient,
        #[arg(long)]
        username: String,
        #[arg(long)]
        code: String,
    },
    AdminInitiateAuth {
        #[command(flatten)]
        #[serde(flatten)]
        client: AppClient,
        #[arg(long)]
        username: String,
        #[arg(long, env = "COGNITO_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    AssociateSoftwareToken {
        #[arg(long)]
        session: String,
    },
    VerifySoftwareToken {
        #[arg(long)]
        session: String,
        #[arg(long)]
        user_code: String,
    },
    AdminRespondToAuthChallenge {
        #[command(flatten)]
        #[serde(flatten)]
        client: AppClient,
        #[arg(long)]
        username: String,
        #[arg(long)]
        session: String,
        #[arg(long)]
        user_code: String,
    },
    AdminDeleteUser {
        #[arg(long)]
        user_pool_id: String,
        #[arg(long)]
        username: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GlueAction {
    CreateDatabase {
        #[arg(long)]
        name: String,
    },
    CreateCrawler(CreateCrawlerRequest),
    GetCrawler {
        #[arg(long)]
        name: String,
    },
    StartCrawler {
        #[arg(long)]
        name: String,
    },
    /// Polls until the crawler is READY again.
    WaitForCrawlerReady {
        #[arg(long)]
        name: String,
    },
    GetTables {
        #[arg(long)]
        database: String,
    },
    ListJobs,
    StartJobRun {
        #[arg(long)]
        job_name: String,
        /// Job argument as `key=value`; repeatable.
        #[arg(long = "argument")]
        #[serde(default)]
        arguments: Vec<String>,
    },
    GetJobRun {
        #[arg(long)]
        job_name: String,
        #[arg(long)]
        run_id: String,
    },
    DeleteCrawler {
        #[arg(long)]
        name: String,
    },
    DeleteDatabase {
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SchedulerAction {
    CreateScheduleGroup {
        #[arg(long)]
        name: String,
    },
    CreateSchedule(CreateScheduleRequest),
    ListSchedules {
        #[arg(long)]
        #[serde(default)]
        group: Option<String>,
    },
    DeleteSchedule {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "default")]
        #[serde(default = "default_schedule_group")]
        group: String,
    },
    DeleteScheduleGroup {
        #[arg(long)]
        name: String,
    },
}

fn default_schedule_group() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SupportAction {
    DescribeServices,
    DescribeSeverityLevels,
    CreateCase(CreateCaseRequest),
    DescribeCases {
        #[arg(long)]
        #[serde(default)]
        include_resolved: bool,
        /// Only cases created after this ISO-8601 date or time.
        #[arg(long)]
        #[serde(default)]
        after_time: Option<String>,
    },
    /// Uploads inline text or a local file into a new attachment set.
    AddAttachment {
        #[arg(long)]
        file_name: String,
        #[arg(long, conflicts_with = "file")]
        #[serde(default)]
        content: Option<String>,
        #[arg(long)]
        #[serde(default)]
        file: Option<PathBuf>,
    },
    AddCommunication {
        #[arg(long)]
        case_id: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        #[serde(default)]
        attachment_set_id: Option<String>,
    },
    DescribeCommunications {
        #[arg(long)]
        case_id: String,
    },
    DescribeAttachment {
        #[arg(long)]
        attachment_id: String,
    },
    ResolveCase {
        #[arg(long)]
        case_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ElasticBeanstalkAction {
    DescribeApplications,
    CreateApplication {
        #[arg(long)]
        name: String,
        #[arg(long)]
        #[serde(default)]
        description: Option<String>,
    },
    DescribeEnvironments {
        #[arg(long)]
        #[serde(default)]
        application: Option<String>,
    },
    DeleteApplication {
        #[arg(long)]
        name: String,
        /// Also terminate the application's running environments.
        #[arg(long)]
        #[serde(default)]
        terminate_env: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Subcommand, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SsmAction {
    /// Prints whether the parameter exists; the value itself is never shown.
    GetSecret {
        #[arg(long)]
        name: String,
    },
}

/// Interactive walkthroughs. CLI only, since they read from the console.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum ScenarioCommand {
    /// Create, update and resolve an AWS Support case.
    SupportCase,
    /// Sign up a Cognito user and enroll TOTP MFA.
    CognitoMfa(AppClient),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: ActionCommand,
    }

    fn parse(args: &[&str]) -> ActionCommand {
        TestCli::try_parse_from(std::iter::once("aws-actions").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_cli_and_json_forms_agree() {
        let from_cli = parse(&[
            "sqs",
            "send-message",
            "--queue-url",
            "https://sqs.us-east-1.amazonaws.com/123/orders",
            "--body",
            "hello",
        ]);
        let from_json: ActionCommand = serde_json::from_value(serde_json::json!({
            "service": "sqs",
            "action": "send_message",
            "queue_url": "https://sqs.us-east-1.amazonaws.com/123/orders",
            "body": "hello"
        }))
        .unwrap();
        assert_eq!(from_cli, from_json);
        assert_eq!(from_cli.service(), "sqs");
    }

    #[test]
    fn test_json_item_flag() {
        let command = parse(&[
            "dynamodb",
            "put-item",
            "--table",
            "movies",
            "--item",
            r#"{"title": "Heat", "year": 1995}"#,
        ]);
        let ActionCommand::Dynamodb(DynamoDbAction::PutItem { table, item }) = &command else {
            panic!("unexpected command: {command:?}");
        };
        assert_eq!(table, "movies");
        assert_eq!(item["year"], 1995);
    }

    #[test]
    fn test_invalid_json_flag_is_rejected() {
        let result = TestCli::try_parse_from([
            "aws-actions",
            "dynamodb",
            "get-item",
            "--table",
            "movies",
            "--key",
            "{not json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_glue_arguments() {
        let command = parse(&[
            "glue",
            "start-job-run",
            "--job-name",
            "etl",
            "--argument",
            "input=s3://in",
            "--argument",
            "output=s3://out",
        ]);
        assert_eq!(
            command,
            ActionCommand::Glue(GlueAction::StartJobRun {
                job_name: "etl".into(),
                arguments: vec!["input=s3://in".into(), "output=s3://out".into()],
            })
        );
    }

    #[test]
    fn test_unit_action_from_json() {
        let command: ActionCommand =
            serde_json::from_str(r#"{"service": "s3", "action": "list_buckets"}"#).unwrap();
        assert_eq!(command, ActionCommand::S3(S3Action::ListBuckets));
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<ActionCommand, _> =
            serde_json::from_str(r#"{"service": "sqs", "action": "teleport"}"#);
        assert!(result.is_err());
    }
}
