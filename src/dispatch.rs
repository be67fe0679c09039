//! Routes an [`ActionCommand`] to the matching service seam and renders the
//! result as JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::clients::AwsClients;
use crate::commands::{
    ActionCommand, AthenaAction, CognitoAction, DynamoDbAction, EcsAction, ElasticBeanstalkAction,
    ForecastAction, GlueAction, RdsAction, RedshiftAction, S3Action, SageMakerAction,
    ScenarioCommand, SchedulerAction, SnsAction, SqsAction, SsmAction, SupportAction,
};
use crate::core::config::AppConfig;
use crate::errors::ActionError;
use crate::scenarios::{self, Prompt};
use crate::services::athena::{self, AthenaApi};
use crate::services::cognito::{AppClient, AuthOutcome, CognitoApi};
use crate::services::dynamodb::{self, DynamoDbApi, item_to_json, json_to_item};
use crate::services::ecs::EcsApi;
use crate::services::elasticbeanstalk::ElasticBeanstalkApi;
use crate::services::forecast::ForecastApi;
use crate::services::glue::{self, GlueApi, parse_job_arguments};
use crate::services::rds::{self, RdsApi};
use crate::services::redshift::{self, RedshiftApi};
use crate::services::s3::{DownloadedObject, S3Api, parse_s3_uri};
use crate::services::sagemaker::SageMakerApi;
use crate::services::scheduler::SchedulerApi;
use crate::services::sns::SnsApi;
use crate::services::sqs::SqsApi;
use crate::services::ssm::{SsmApi, resolve_secret};
use crate::services::support::SupportApi;

const FALLBACK_REGION: &str = "us-east-1";

fn to_json<T: Serialize>(value: T) -> Result<Value, ActionError> {
    Ok(serde_json::to_value(value)?)
}

/// Runs one action and returns its result as JSON.
///
/// # Errors
///
/// Returns whatever the action returns; the error is also logged.
pub async fn dispatch(
    command: ActionCommand,
    clients: &AwsClients,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    let service = command.service();
    info!(service, "Dispatching action");

    let result = match command {
        ActionCommand::Athena(action) => athena(action, clients.athena.as_ref(), config).await,
        ActionCommand::Cognito(action) => {
            cognito(action, clients.cognito.as_ref(), clients.ssm.as_ref(), config).await
        }
        ActionCommand::Dynamodb(action) => {
            dynamodb(action, clients.dynamodb.as_ref(), config).await
        }
        ActionCommand::Ecs(action) => ecs(action, clients.ecs.as_ref()).await,
        ActionCommand::Elasticbeanstalk(action) => {
            elasticbeanstalk(action, clients.elasticbeanstalk.as_ref()).await
        }
        ActionCommand::Forecast(action) => forecast(action, clients.forecast.as_ref()).await,
        ActionCommand::Glue(action) => glue(action, clients.glue.as_ref(), config).await,
        ActionCommand::Rds(action) => rds(action, clients.rds.as_ref(), config).await,
        ActionCommand::Redshift(action) => {
            redshift(action, clients.redshift.as_ref(), config).await
        }
        ActionCommand::S3(action) => s3(action, clients.s3.as_ref(), config).await,
        ActionCommand::Sagemaker(action) => sagemaker(action, clients.sagemaker.as_ref()).await,
        ActionCommand::Scheduler(action) => scheduler(action, clients.scheduler.as_ref()).await,
        ActionCommand::Sns(action) => sns(action, clients.sns.as_ref()).await,
        ActionCommand::Sqs(action) => sqs(action, clients.sqs.as_ref()).await,
        ActionCommand::Ssm(action) => ssm(action, clients.ssm.as_ref()).await,
        ActionCommand::Support(action) => support(action, clients.support.as_ref(), config).await,
    };

    if let Err(e) = &result {
        error!(service, error = %e, "Action failed");
    }
    result
}

/// Runs an interactive walkthrough against `prompt`.
///
/// # Errors
///
/// Returns the first error raised by the walkthrough.
pub async fn run_scenario(
    command: ScenarioCommand,
    clients: &AwsClients,
    config: &AppConfig,
    prompt: &mut dyn Prompt,
) -> Result<Value, ActionError> {
    match command {
        ScenarioCommand::SupportCase => to_json(
            scenarios::support_case::run(
                clients.support.as_ref(),
                prompt,
                &config.support_language,
            )
            .await?,
        ),
        ScenarioCommand::CognitoMfa(client) => {
            let client = with_client_secret(client, clients.ssm.as_ref(), config).await?;
            to_json(scenarios::cognito_mfa::run(clients.cognito.as_ref(), prompt, &client).await?)
        }
    }
}

/// Fills in the app client secret from Parameter Store when it wasn't given inline.
async fn with_client_secret(
    mut client: AppClient,
    ssm: &dyn SsmApi,
    config: &AppConfig,
) -> Result<AppClient, ActionError> {
    client.client_secret = resolve_secret(
        ssm,
        client.client_secret.take(),
        config.cognito_client_secret_param.as_deref(),
    )
    .await?;
    Ok(client)
}

async fn dynamodb(
    action: DynamoDbAction,
    api: &dyn DynamoDbApi,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    match action {
        DynamoDbAction::CreateTable(request) => to_json(api.create_table(&request).await?),
        DynamoDbAction::DescribeTable { table } => to_json(api.describe_table(&table).await?),
        DynamoDbAction::WaitForTableActive { table } => to_json(
            dynamodb::wait_for_table_active(
                api,
                &table,
                config.poll_interval,
                config.poll_max_attempts,
            )
            .await?,
        ),
        DynamoDbAction::ListTables => to_json(api.list_tables().await?),
        DynamoDbAction::PutItem { table, item } => {
            api.put_item(&table, json_to_item(&item)?).await?;
            Ok(json!({ "table": table, "stored": true }))
        }
        DynamoDbAction::GetItem { table, key } => {
            let item = api.get_item(&table, json_to_item(&key)?).await?;
            Ok(item.as_ref().map_or(Value::Null, item_to_json))
        }
        DynamoDbAction::Query {
            table,
            key_name,
            key_value,
        } => {
            let items = api
                .query(
                    &table,
                    &key_name,
                    aws_sdk_dynamodb::types::AttributeValue::S(key_value),
                )
                .await?;
            Ok(Value::Array(items.iter().map(item_to_json).collect()))
        }
        DynamoDbAction::Scan { table } => {
            let items = api.scan(&table).await?;
            Ok(Value::Array(items.iter().map(item_to_json).collect()))
        }
        DynamoDbAction::DeleteItem { table, key } => {
            api.delete_item(&table, json_to_item(&key)?).await?;
            Ok(json!({ "table": table, "deleted": true }))
        }
        DynamoDbAction::DeleteTable { table } => {
            api.delete_table(&table).await?;
            Ok(json!({ "table": table, "deleted": true }))
        }
    }
}

async fn sqs(action: SqsAction, api: &dyn SqsApi) -> Result<Value, ActionError> {
    match action {
        SqsAction::CreateQueue { name } => {
            Ok(json!({ "queue_url": api.create_queue(&name).await? }))
        }
        SqsAction::GetQueueUrl { name } => {
            Ok(json!({ "queue_url": api.get_queue_url(&name).await? }))
        }
        SqsAction::ListQueues { prefix } => to_json(api.list_queues(prefix).await?),
        SqsAction::SendMessage(request) => {
            Ok(json!({ "message_id": api.send_message(&request).await? }))
        }
        SqsAction::ReceiveMessages(request) => {
            request.validate()?;
            to_json(api.receive_messages(&request).await?)
        }
        SqsAction::DeleteMessage {
            queue_url,
            receipt_handle,
        } => {
            api.delete_message(&queue_url, &receipt_handle).await?;
            Ok(json!({ "deleted": true }))
        }
        SqsAction::PurgeQueue { queue_url } => {
            api.purge_queue(&queue_url).await?;
            Ok(json!({ "queue_url": queue_url, "purged": true }))
        }
        SqsAction::DeleteQueue { queue_url } => {
            api.delete_queue(&queue_url).await?;
            Ok(json!({ "queue_url": queue_url, "deleted": true }))
        }
    }
}

/// Bytes for an upload, from inline text or a local file.
async fn upload_body(
    inline: Option<String>,
    file: Option<std::path::PathBuf>,
) -> Result<Vec<u8>, ActionError> {
    match (inline, file) {
        (Some(text), None) => Ok(text.into_bytes()),
        (None, Some(path)) => tokio::fs::read(&path)
            .await
            .map_err(|e| ActionError::Io(format!("{}: {e}", path.display()))),
        (Some(_), Some(_)) => Err(ActionError::InvalidInput(
            "give either inline content or a file, not both".into(),
        )),
        (None, None) => Err(ActionError::InvalidInput(
            "inline content or a file is required".into(),
        )),
    }
}

/// Text objects are returned inline; anything else as base64.
fn downloaded_to_json(object: &DownloadedObject) -> Value {
    match std::str::from_utf8(&object.body) {
        Ok(text) => json!({
            "key": object.key,
            "content_type": object.content_type,
            "size": object.body.len(),
            "body": text,
        }),
        Err(_) => json!({
            "key": object.key,
            "content_type": object.content_type,
            "size": object.body.len(),
            "body_base64": STANDARD.encode(&object.body),
        }),
    }
}

async fn s3(action: S3Action, api: &dyn S3Api, config: &AppConfig) -> Result<Value, ActionError> {
    match action {
        S3Action::ListBuckets => to_json(api.list_buckets().await?),
        S3Action::CreateBucket { bucket, region } => {
            let region = region
                .or_else(|| config.region.clone())
                .unwrap_or_else(|| FALLBACK_REGION.to_string());
            api.create_bucket(&bucket, &region).await?;
            Ok(json!({ "bucket": bucket, "region": region }))
        }
        S3Action::PutObject {
            bucket,
            key,
            body,
            file,
        } => {
            let bytes = upload_body(body, file).await?;
            let size = bytes.len();
            api.put_object(&bucket, &key, bytes).await?;
            Ok(json!({ "bucket": bucket, "key": key, "size": size }))
        }
        S3Action::GetObject {
            bucket,
            key,
            output,
        } => {
            let object = api.get_object(&bucket, &key).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &object.body)
                        .await
                        .map_err(|e| ActionError::Io(format!("{}: {e}", path.display())))?;
                    Ok(json!({
                        "key": object.key,
                        "size": object.body.len(),
                        "written_to": path.display().to_string(),
                    }))
                }
                None => Ok(downloaded_to_json(&object)),
            }
        }
        S3Action::ListObjects { bucket, prefix } => to_json(api.list_objects(&bucket, prefix).await?),
        S3Action::CopyObject {
            source,
            destination,
        } => {
            let from = parse_s3_uri(&source)?;
            let to = parse_s3_uri(&destination)?;
            if from.key.is_empty() || to.key.is_empty() {
                return Err(ActionError::InvalidInput(
                    "copy source and destination must both name an object key".into(),
                ));
            }
            api.copy_object(&from, &to).await?;
            Ok(json!({ "source": source, "destination": destination }))
        }
        S3Action::DeleteObject { bucket, key } => {
            api.delete_object(&bucket, &key).await?;
            Ok(json!({ "bucket": bucket, "key": key, "deleted": true }))
        }
        S3Action::DeleteBucket { bucket } => {
            api.delete_bucket(&bucket).await?;
            Ok(json!({ "bucket": bucket, "deleted": true }))
        }
    }
}

async fn athena(
    action: AthenaAction,
    api: &dyn AthenaApi,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    match action {
        AthenaAction::StartQuery(request) => {
            Ok(json!({ "execution_id": api.start_query(&request).await? }))
        }
        AthenaAction::GetQueryExecution { execution_id } => {
            to_json(api.get_query_execution(&execution_id).await?)
        }
        AthenaAction::WaitForQuery { execution_id } => to_json(
            athena::wait_for_query(
                api,
                &execution_id,
                config.poll_interval,
                config.poll_max_attempts,
            )
            .await?,
        ),
        AthenaAction::GetQueryResults { execution_id } => {
            to_json(api.get_query_results(&execution_id).await?)
        }
        AthenaAction::StopQuery { execution_id } => {
            api.stop_query(&execution_id).await?;
            Ok(json!({ "execution_id": execution_id, "stopped": true }))
        }
        AthenaAction::ListNamedQueries => to_json(api.list_named_queries().await?),
    }
}

async fn sagemaker(action: SageMakerAction, api: &dyn SageMakerApi) -> Result<Value, ActionError> {
    match action {
        SageMakerAction::ListNotebookInstances => to_json(api.list_notebook_instances().await?),
        SageMakerAction::ListTrainingJobs => to_json(api.list_training_jobs().await?),
        SageMakerAction::DescribeTrainingJob { name } => {
            to_json(api.describe_training_job(&name).await?)
        }
        SageMakerAction::ListModels => to_json(api.list_models().await?),
    }
}

async fn ecs(action: EcsAction, api: &dyn EcsApi) -> Result<Value, ActionError> {
    match action {
        EcsAction::ListClusters => to_json(api.list_clusters().await?),
        EcsAction::DescribeCluster { cluster } => to_json(api.describe_cluster(&cluster).await?),
        EcsAction::CreateCluster { name } => to_json(api.create_cluster(&name).await?),
        EcsAction::ListTasks { cluster } => to_json(api.list_tasks(&cluster).await?),
        EcsAction::DeleteCluster { cluster } => to_json(api.delete_cluster(&cluster).await?),
    }
}

async fn forecast(action: ForecastAction, api: &dyn ForecastApi) -> Result<Value, ActionError> {
    match action {
        ForecastAction::CreateDataset(request) => {
            request.validate()?;
            Ok(json!({ "dataset_arn": api.create_dataset(&request).await? }))
        }
        ForecastAction::ListDatasets => to_json(api.list_datasets().await?),
        ForecastAction::ListForecasts => to_json(api.list_forecasts().await?),
        ForecastAction::DescribeForecast { arn } => to_json(api.describe_forecast(&arn).await?),
        ForecastAction::DeleteDataset { arn } => {
            api.delete_dataset(&arn).await?;
            Ok(json!({ "dataset_arn": arn, "deleted": true }))
        }
    }
}

async fn redshift(
    action: RedshiftAction,
    api: &dyn RedshiftApi,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    match action {
        RedshiftAction::CreateCluster(request) => to_json(api.create_cluster(&request).await?),
        RedshiftAction::DescribeCluster { cluster_id } => {
            to_json(api.describe_cluster(&cluster_id).await?)
        }
        RedshiftAction::WaitForClusterAvailable { cluster_id } => to_json(
            redshift::wait_for_cluster_available(
                api,
                &cluster_id,
                config.poll_interval,
                config.poll_max_attempts,
            )
            .await?,
        ),
        RedshiftAction::ListClusters => to_json(api.list_clusters().await?),
        RedshiftAction::ModifyMaintenanceWindow { cluster_id, window } => {
            to_json(api.modify_maintenance_window(&cluster_id, &window).await?)
        }
        RedshiftAction::DeleteCluster { cluster_id } => {
            to_json(api.delete_cluster(&cluster_id).await?)
        }
    }
}

async fn sns(action: SnsAction, api: &dyn SnsApi) -> Result<Value, ActionError> {
    match action {
        SnsAction::CreateTopic { name, fifo } => {
            Ok(json!({ "topic_arn": api.create_topic(&name, fifo).await? }))
        }
        SnsAction::ListTopics => to_json(api.list_topics().await?),
        SnsAction::Publish(request) => {
            request.validate()?;
            Ok(json!({ "message_id": api.publish(&request).await? }))
        }
        SnsAction::Subscribe {
            topic_arn,
            protocol,
            endpoint,
        } => Ok(json!({
            "subscription_arn": api.subscribe(&topic_arn, &protocol, &endpoint).await?
        })),
        SnsAction::ListSubscriptions { topic_arn } => {
            to_json(api.list_subscriptions(&topic_arn).await?)
        }
        SnsAction::Unsubscribe { subscription_arn } => {
            api.unsubscribe(&subscription_arn).await?;
            Ok(json!({ "subscription_arn": subscription_arn, "deleted": true }))
        }
        SnsAction::DeleteTopic { topic_arn } => {
            api.delete_topic(&topic_arn).await?;
            Ok(json!({ "topic_arn": topic_arn, "deleted": true }))
        }
    }
}

async fn rds(action: RdsAction, api: &dyn RdsApi, config: &AppConfig) -> Result<Value, ActionError> {
    match action {
        RdsAction::DescribeInstances { instance_id } => {
            to_json(api.describe_instances(instance_id).await?)
        }
        RdsAction::CreateInstance(request) => to_json(api.create_instance(&request).await?),
        RdsAction::WaitForInstanceAvailable { instance_id } => to_json(
            rds::wait_for_instance_available(
                api,
                &instance_id,
                config.poll_interval,
                config.poll_max_attempts,
            )
            .await?,
        ),
        RdsAction::CreateSnapshot {
            instance_id,
            snapshot_id,
        } => to_json(api.create_snapshot(&instance_id, &snapshot_id).await?),
        RdsAction::RebootInstance { instance_id } => {
            to_json(api.reboot_instance(&instance_id).await?)
        }
        RdsAction::DeleteInstance { instance_id } => {
            to_json(api.delete_instance(&instance_id).await?)
        }
    }
}

/// Tokens stay out of the result; the session is kept so a follow-up challenge can be answered.
fn auth_outcome_to_json(outcome: &AuthOutcome) -> Value {
    json!({
        "challenge": outcome.challenge,
        "session": outcome.session,
        "authenticated": outcome.tokens.is_some(),
    })
}

async fn cognito(
    action: CognitoAction,
    api: &dyn CognitoApi,
    ssm: &dyn SsmApi,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    match action {
        CognitoAction::ListUserPools => to_json(api.list_user_pools().await?),
        CognitoAction::ListUsers { user_pool_id } => to_json(api.list_users(&user_pool_id).await?),
        CognitoAction::SignUp {
            client,
            username,
            password,
            email,
        } => {
            let client = with_client_secret(client, ssm, config).await?;
            to_json(api.sign_up(&client, &username, &password, &email).await?)
        }
        CognitoAction::AdminGetUser {
            user_pool_id,
            username,
        } => to_json(api.admin_get_user(&user_pool_id, &username).await?),
        CognitoAction::ResendConfirmationCode { client, username } => {
            let client = with_client_secret(client, ssm, config).await?;
            let destination = api.resend_confirmation_code(&client, &username).await?;
            Ok(json!({ "destination": destination }))
        }
        CognitoAction::ConfirmSignUp {
            client,
            username,
            code,
        } => {
            let client = with_client_secret(client, ssm, config).await?;
            api.confirm_sign_up(&client, &username, &code).await?;
            Ok(json!({ "username": username, "confirmed": true }))
        }
        CognitoAction::AdminInitiateAuth {
            client,
            username,
            password,
        } => {
            let client = with_client_secret(client, ssm, config).await?;
            let outcome = api.admin_initiate_auth(&client, &username, &password).await?;
            Ok(auth_outcome_to_json(&outcome))
        }
        CognitoAction::AssociateSoftwareToken { session } => {
            let token = api.associate_software_token(&session).await?;
            Ok(json!({ "secret_code": token.secret_code, "session": token.session }))
        }
        CognitoAction::VerifySoftwareToken { session, user_code } => {
            let result = api.verify_software_token(&session, &user_code).await?;
            Ok(json!({ "status": result.status, "session": result.session }))
        }
        CognitoAction::AdminRespondToAuthChallenge {
            client,
            username,
            session,
            user_code,
        } => {
            let client = with_client_secret(client, ssm, config).await?;
            let outcome = api
                .admin_respond_to_auth_challenge(&client, &username, &session, &user_code)
                .await?;
            Ok(auth_outcome_to_json(&outcome))
        }
        CognitoAction::AdminDeleteUser {
            user_pool_id,
            username,
        } => {
            api.admin_delete_user(&user_pool_id, &username).await?;
            Ok(json!({ "username": username, "deleted": true }))
        }
    }
}

async fn glue(action: GlueAction, api: &dyn GlueApi, config: &AppConfig) -> Result<Value, ActionError> {
    match action {
        GlueAction::CreateDatabase { name } => {
            api.create_database(&name).await?;
            Ok(json!({ "database": name, "created": true }))
        }
        GlueAction::CreateCrawler(request) => {
            api.create_crawler(&request).await?;
            Ok(json!({ "crawler": request.name, "created": true }))
        }
        GlueAction::GetCrawler { name } => to_json(api.get_crawler(&name).await?),
        GlueAction::StartCrawler { name } => {
            api.start_crawler(&name).await?;
            Ok(json!({ "crawler": name, "started": true }))
        }
        GlueAction::WaitForCrawlerReady { name } => to_json(
            glue::wait_for_crawler_ready(api, &name, config.poll_interval, config.poll_max_attempts)
                .await?,
        ),
        GlueAction::GetTables { database } => to_json(api.get_tables(&database).await?),
        GlueAction::ListJobs => to_json(api.list_jobs().await?),
        GlueAction::StartJobRun {
            job_name,
            arguments,
        } => {
            let arguments = parse_job_arguments(&arguments)?;
            Ok(json!({ "run_id": api.start_job_run(&job_name, arguments).await? }))
        }
        GlueAction::GetJobRun { job_name, run_id } => {
            to_json(api.get_job_run(&job_name, &run_id).await?)
        }
        GlueAction::DeleteCrawler { name } => {
            api.delete_crawler(&name).await?;
            Ok(json!({ "crawler": name, "deleted": true }))
        }
        GlueAction::DeleteDatabase { name } => {
            api.delete_database(&name).await?;
            Ok(json!({ "database": name, "deleted": true }))
        }
    }
}

async fn scheduler(action: SchedulerAction, api: &dyn SchedulerApi) -> Result<Value, ActionError> {
    match action {
        SchedulerAction::CreateScheduleGroup { name } => {
            Ok(json!({ "schedule_group_arn": api.create_schedule_group(&name).await? }))
        }
        SchedulerAction::CreateSchedule(request) => {
            request.validate()?;
            Ok(json!({ "schedule_arn": api.create_schedule(&request).await? }))
        }
        SchedulerAction::ListSchedules { group } => to_json(api.list_schedules(group).await?),
        SchedulerAction::DeleteSchedule { name, group } => {
            api.delete_schedule(&name, &group).await?;
            Ok(json!({ "schedule": name, "group": group, "deleted": true }))
        }
        SchedulerAction::DeleteScheduleGroup { name } => {
            api.delete_schedule_group(&name).await?;
            Ok(json!({ "schedule_group": name, "deleted": true }))
        }
    }
}

async fn support(
    action: SupportAction,
    api: &dyn SupportApi,
    config: &AppConfig,
) -> Result<Value, ActionError> {
    let language = config.support_language.as_str();
    match action {
        SupportAction::DescribeServices => to_json(api.describe_services(language).await?),
        SupportAction::DescribeSeverityLevels => {
            to_json(api.describe_severity_levels(language).await?)
        }
        SupportAction::CreateCase(request) => {
            Ok(json!({ "case_id": api.create_case(&request, language).await? }))
        }
        SupportAction::DescribeCases {
            include_resolved,
            after_time,
        } => to_json(
            api.describe_cases(include_resolved, after_time, language)
                .await?,
        ),
        SupportAction::AddAttachment {
            file_name,
            content,
            file,
        } => {
            let bytes = upload_body(content, file).await?;
            Ok(json!({ "attachment_set_id": api.add_attachment(&file_name, bytes).await? }))
        }
        SupportAction::AddCommunication {
            case_id,
            body,
            attachment_set_id,
        } => {
            let added = api
                .add_communication(&case_id, &body, attachment_set_id)
                .await?;
            Ok(json!({ "case_id": case_id, "added": added }))
        }
        SupportAction::DescribeCommunications { case_id } => {
            to_json(api.describe_communications(&case_id).await?)
        }
        SupportAction::DescribeAttachment { attachment_id } => {
            to_json(api.describe_attachment(&attachment_id).await?)
        }
        SupportAction::ResolveCase { case_id } => to_json(api.resolve_case(&case_id).await?),
    }
}

async fn elasticbeanstalk(
    action: ElasticBeanstalkAction,
    api: &dyn ElasticBeanstalkApi,
) -> Result<Value, ActionError> {
    match action {
        ElasticBeanstalkAction::DescribeApplications => to_json(api.describe_applications().await?),
        ElasticBeanstalkAction::CreateApplication { name, description } => {
            to_json(api.create_application(&name, description).await?)
        }
        ElasticBeanstalkAction::DescribeEnvironments { application } => {
            to_json(api.describe_environments(application).await?)
        }
        ElasticBeanstalkAction::DeleteApplication {
            name,
            terminate_env,
        } => {
            api.delete_application(&name, terminate_env).await?;
            Ok(json!({ "application": name, "deleted": true }))
        }
    }
}

async fn ssm(action: SsmAction, api: &dyn SsmApi) -> Result<Value, ActionError> {
    match action {
        SsmAction::GetSecret { name } => {
            let found = api.get_secret(&name).await?.is_some();
            Ok(json!({ "name": name, "found": found }))
        }
    }
}
