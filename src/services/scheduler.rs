//! EventBridge Scheduler actions.

use async_trait::async_trait;
use aws_sdk_scheduler::Client;
use aws_sdk_scheduler::types::{
    ActionAfterCompletion, FlexibleTimeWindow, FlexibleTimeWindowMode, Target,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::Args;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

static AT_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^at\((\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})\)$").expect("static regex compile")
});
static RATE_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rate\(([1-9]\d*) (minute|minutes|hour|hours|day|days)\)$")
        .expect("static regex compile")
});
static CRON_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^cron\((\S+(?: \S+){5})\)$").expect("static regex compile"));

const AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct CreateScheduleRequest {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "default")]
    #[serde(default = "default_group")]
    pub group: String,
    /// `at(yyyy-mm-ddThh:mm:ss)`, `rate(n unit)` or `cron(...)`.
    #[arg(long)]
    pub expression: String,
    /// IANA time zone the expression is evaluated in. Scheduler defaults to UTC.
    #[arg(long)]
    #[serde(default)]
    pub timezone: Option<String>,
    #[arg(long)]
    pub target_arn: String,
    #[arg(long)]
    pub role_arn: String,
    /// JSON payload passed to the target.
    #[arg(long)]
    #[serde(default)]
    pub input: Option<String>,
    #[arg(long)]
    #[serde(default)]
    pub flexible_window_minutes: Option<i32>,
    #[arg(long)]
    #[serde(default)]
    pub delete_after_completion: bool,
}

fn default_group() -> String {
    "default".to_string()
}

impl CreateScheduleRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed expression, an unknown time zone
    /// or a flexible window outside 1 to 1440 minutes.
    pub fn validate(&self) -> Result<(), ActionError> {
        validate_expression(&self.expression)?;
        if let Some(tz) = &self.timezone {
            validate_timezone(tz)?;
        }
        if let Some(minutes) = self.flexible_window_minutes
            && !(1..=1440).contains(&minutes)
        {
            return Err(ActionError::InvalidInput(format!(
                "flexible window must be 1 to 1440 minutes, got {minutes}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub name: Option<String>,
    pub group: Option<String>,
    pub state: Option<String>,
    pub target_arn: Option<String>,
}

/// Renders a one-time `at(...)` expression for the given instant.
pub fn one_time_expression(when: DateTime<Utc>) -> String {
    format!("at({})", when.format(AT_FORMAT))
}

/// # Errors
///
/// Returns `InvalidInput` unless the expression is a well-formed `at`, `rate`
/// or `cron` expression.
pub fn validate_expression(expression: &str) -> Result<(), ActionError> {
    if let Some(caps) = AT_EXPRESSION.captures(expression) {
        return NaiveDateTime::parse_from_str(&caps[1], AT_FORMAT)
            .map(|_| ())
            .map_err(|e| {
                ActionError::InvalidInput(format!("invalid date in '{expression}': {e}"))
            });
    }
    if RATE_EXPRESSION.is_match(expression) || CRON_EXPRESSION.is_match(expression) {
        return Ok(());
    }
    Err(ActionError::InvalidInput(format!(
        "'{expression}' is not an at(), rate() or cron() expression"
    )))
}

/// # Errors
///
/// Returns `InvalidInput` if `timezone` is not an IANA zone name.
pub fn validate_timezone(timezone: &str) -> Result<(), ActionError> {
    timezone
        .parse::<chrono_tz::Tz>()
        .map(|_| ())
        .map_err(|_| ActionError::InvalidInput(format!("unknown time zone '{timezone}'")))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulerApi: Send + Sync {
    async fn create_schedule_group(&self, name: &str) -> Result<String, ActionError>;
    async fn create_schedule(&self, request: &CreateScheduleRequest)
    -> Result<String, ActionError>;
    async fn list_schedules(
        &self,
        group: Option<String>,
    ) -> Result<Vec<ScheduleSummary>, ActionError>;
    async fn delete_schedule(&self, name: &str, group: &str) -> Result<(), ActionError>;
    async fn delete_schedule_group(&self, name: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl SchedulerApi for Client {
    #[tracing::instrument(skip(self))]
    async fn create_schedule_group(&self, name: &str) -> Result<String, ActionError> {
        let output = self
            .create_schedule_group()
            .name(name)
            .client_token(uuid::Uuid::new_v4().to_string())
            .send()
            .await?;
        let arn: String = output.schedule_group_arn().field();
        info!(arn = %arn, "Created schedule group");
        Ok(arn)
    }

    #[tracing::instrument(skip(self))]
    async fn create_schedule(
        &self,
        request: &CreateScheduleRequest,
    ) -> Result<String, ActionError> {
        request.validate()?;

        let target = Target::builder()
            .arn(&request.target_arn)
            .role_arn(&request.role_arn)
            .set_input(request.input.clone())
            .build()?;
        let window = match request.flexible_window_minutes {
            Some(minutes) => FlexibleTimeWindow::builder()
                .mode(FlexibleTimeWindowMode::Flexible)
                .maximum_window_in_minutes(minutes)
                .build()?,
            None => FlexibleTimeWindow::builder()
                .mode(FlexibleTimeWindowMode::Off)
                .build()?,
        };
        let after_completion = if request.delete_after_completion {
            ActionAfterCompletion::Delete
        } else {
            ActionAfterCompletion::None
        };

        let output = self
            .create_schedule()
            .name(&request.name)
            .group_name(&request.group)
            .schedule_expression(&request.expression)
            .set_schedule_expression_timezone(request.timezone.clone())
            .target(target)
            .flexible_time_window(window)
            .action_after_completion(after_completion)
            .client_token(uuid::Uuid::new_v4().to_string())
            .send()
            .await?;
        let arn: String = output.schedule_arn().field();
        info!(arn = %arn, "Created schedule");
        Ok(arn)
    }

    #[tracing::instrument(skip(self))]
    async fn list_schedules(
        &self,
        group: Option<String>,
    ) -> Result<Vec<ScheduleSummary>, ActionError> {
        let mut pages = self
            .list_schedules()
            .set_group_name(group)
            .into_paginator()
            .send();
        let mut schedules = Vec::new();
        while let Some(page) = pages.next().await {
            schedules.extend(page?.schedules().iter().map(|s| ScheduleSummary {
                name: s.name().field(),
                group: s.group_name().field(),
                state: s.state().field(),
                target_arn: s
                    .target()
                    .and_then(|t| -> Option<String> { t.arn().field() }),
            }));
        }
        info!(count = schedules.len(), "Listed schedules");
        Ok(schedules)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_schedule(&self, name: &str, group: &str) -> Result<(), ActionError> {
        self.delete_schedule()
            .name(name)
            .group_name(group)
            .client_token(uuid::Uuid::new_v4().to_string())
            .send()
            .await?;
        info!("Deleted schedule");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_schedule_group(&self, name: &str) -> Result<(), ActionError> {
        self.delete_schedule_group()
            .name(name)
            .client_token(uuid::Uuid::new_v4().to_string())
            .send()
            .await?;
        info!("Deleted schedule group");
        Ok(())
    }
}
