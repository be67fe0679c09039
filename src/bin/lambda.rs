use aws_actions::clients::AwsClients;
use aws_actions::core::aws::load_sdk_config;
use aws_actions::core::config::AppConfig;
use aws_actions::handler::handler;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    aws_actions::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let clients = AwsClients::from_conf(&load_sdk_config(&config).await);

    let (clients, config) = (&clients, &config);
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(event, clients, config).await
    }))
    .await
}
