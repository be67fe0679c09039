/// aws-actions - a catalogue of small AWS SDK actions, one per API call.
///
/// Each service module wraps single request/response calls behind an
/// `async_trait` seam implemented for the SDK client. Actions are reachable
/// from a CLI (`aws-actions <service> <action> --flags`) and from a Lambda
/// function that accepts the same command as JSON.
///
/// # Architecture
///
/// - `services::*` - one seam trait per AWS service plus its result types
/// - `scenarios::*` - interactive walkthroughs chaining several actions
/// - `commands` - the action catalogue as a clap + serde enum
/// - `dispatch` - routes a command to its service and renders JSON
/// - `core` - configuration, SDK config loading and status polling
///
/// # Example
///
/// ```no_run
/// use aws_actions::clients::AwsClients;
/// use aws_actions::commands::{ActionCommand, SqsAction};
/// use aws_actions::core::aws::load_sdk_config;
/// use aws_actions::core::config::AppConfig;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     aws_actions::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let clients = AwsClients::from_conf(&load_sdk_config(&config).await);
///
///     let command = ActionCommand::Sqs(SqsAction::ListQueues { prefix: None });
///     let queues = aws_actions::dispatch::dispatch(command, &clients, &config).await?;
///     println!("{queues}");
///     Ok(())
/// }
/// ```
pub mod clients;
pub mod commands;
pub mod core;
pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod scenarios;
pub mod services;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// The level comes from `RUST_LOG` when set, `info` otherwise. Call once at
/// startup; a second call panics because the global subscriber is already set.
///
/// # Example
///
/// ```
/// aws_actions::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Human-readable logging on stderr for the CLI, so stdout stays pure JSON.
///
/// Defaults to `warn` unless `RUST_LOG` says otherwise.
pub fn setup_cli_logging() {
    use tracing_subscriber::prelude::*;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
