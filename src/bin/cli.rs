use anyhow::Context;
use aws_actions::clients::AwsClients;
use aws_actions::commands::{ActionCommand, ScenarioCommand};
use aws_actions::core::aws::load_sdk_config;
use aws_actions::core::config::AppConfig;
use aws_actions::dispatch::{dispatch, run_scenario};
use aws_actions::scenarios::StdinPrompt;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aws-actions",
    version,
    about = "Run single AWS SDK actions and guided scenarios",
    long_about = "Each subcommand wraps one AWS API call and prints its result as JSON.\n\
                  Credentials and region come from the standard AWS provider chain."
)]
struct Cli {
    /// Region override; otherwise AWS_ACTIONS_REGION or the provider chain.
    #[arg(long, global = true)]
    region: Option<String>,
    /// Custom endpoint, e.g. http://localhost:4566 for LocalStack.
    #[arg(long, global = true)]
    endpoint_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Action(ActionCommand),
    /// Interactive walkthroughs that chain several actions
    #[command(subcommand)]
    Scenario(ScenarioCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    aws_actions::setup_cli_logging();
    let cli = Cli::parse();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("reading configuration")?
        .with_overrides(cli.region, cli.endpoint_url);
    let clients = AwsClients::from_conf(&load_sdk_config(&config).await);

    let output = match cli.command {
        Commands::Action(command) => {
            let service = command.service();
            dispatch(command, &clients, &config)
                .await
                .with_context(|| format!("{service} action failed"))?
        }
        Commands::Scenario(scenario) => {
            let mut prompt = StdinPrompt::new();
            run_scenario(scenario, &clients, &config, &mut prompt)
                .await
                .context("scenario failed")?
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("rendering result")?
    );
    Ok(())
}
