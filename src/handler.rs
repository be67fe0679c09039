//! Lambda entry point: one event in, one action run, its JSON result out.
//!
//! The event is the JSON form of [`ActionCommand`], either as the payload
//! itself or as a string `body` (API Gateway / function URL invocations).

use serde_json::Value;
use tracing::error;

use crate::commands::ActionCommand;
use crate::errors::ActionError;

/// Extracts the command from a Lambda payload.
///
/// # Errors
///
/// Returns `Serialization` if the payload or its body is not a valid command.
pub fn parse_event(payload: Value) -> Result<ActionCommand, ActionError> {
    let command = match payload.get("body") {
        Some(Value::String(body)) => serde_json::from_str(body),
        Some(_) => {
            error!("Request body is not a string");
            return Err(ActionError::Serialization(
                "request body must be a JSON string".to_string(),
            ));
        }
        None => serde_json::from_value(payload),
    };
    command.map_err(|e| {
        error!(error = %e, "Event is not a valid action");
        ActionError::from(e)
    })
}

#[cfg(feature = "lambda")]
pub use self::function_handler as handler;

/// Runs the action named by the event.
///
/// # Errors
///
/// Malformed events and failed actions are returned as Lambda errors.
#[cfg(feature = "lambda")]
#[tracing::instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    event: lambda_runtime::LambdaEvent<Value>,
    clients: &crate::clients::AwsClients,
    config: &crate::core::config::AppConfig,
) -> Result<Value, lambda_runtime::Error> {
    let command = parse_event(event.payload)?;
    Ok(crate::dispatch::dispatch(command, clients, config).await?)
}
