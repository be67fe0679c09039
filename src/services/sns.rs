//! SNS topic, subscription and publish actions.

use async_trait::async_trait;
use aws_sdk_sns::Client;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

const FIFO_SUFFIX: &str = ".fifo";

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct PublishRequest {
    #[arg(long)]
    pub topic_arn: String,
    #[arg(long)]
    pub message: String,
    #[arg(long)]
    #[serde(default)]
    pub subject: Option<String>,
    /// Required for FIFO topics.
    #[arg(long)]
    #[serde(default)]
    pub group_id: Option<String>,
    /// Deduplication id for FIFO topics without content-based deduplication.
    #[arg(long)]
    #[serde(default)]
    pub deduplication_id: Option<String>,
}

impl PublishRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` if a FIFO topic is missing its message group id,
    /// or a standard topic is given FIFO-only fields.
    pub fn validate(&self) -> Result<(), ActionError> {
        let fifo = self.topic_arn.ends_with(FIFO_SUFFIX);
        if fifo && self.group_id.is_none() {
            return Err(ActionError::InvalidInput(
                "publishing to a FIFO topic requires a message group id".to_string(),
            ));
        }
        if !fifo && (self.group_id.is_some() || self.deduplication_id.is_some()) {
            return Err(ActionError::InvalidInput(
                "message group and deduplication ids only apply to FIFO topics".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionSummary {
    pub arn: Option<String>,
    pub protocol: Option<String>,
    pub endpoint: Option<String>,
}

/// Topic name with the `.fifo` suffix applied when `fifo` is set.
#[must_use]
pub fn topic_name(name: &str, fifo: bool) -> String {
    if fifo && !name.ends_with(FIFO_SUFFIX) {
        format!("{name}{FIFO_SUFFIX}")
    } else {
        name.to_string()
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnsApi: Send + Sync {
    async fn create_topic(&self, name: &str, fifo: bool) -> Result<String, ActionError>;
    async fn list_topics(&self) -> Result<Vec<String>, ActionError>;
    async fn publish(&self, request: &PublishRequest) -> Result<String, ActionError>;
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, ActionError>;
    async fn list_subscriptions(
        &self,
        topic_arn: &str,
    ) -> Result<Vec<SubscriptionSummary>, ActionError>;
    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), ActionError>;
    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl SnsApi for Client {
    #[tracing::instrument(skip(self))]
    async fn create_topic(&self, name: &str, fifo: bool) -> Result<String, ActionError> {
        let mut request = self.create_topic().name(topic_name(name, fifo));
        if fifo {
            request = request
                .attributes("FifoTopic", "true")
                .attributes("ContentBasedDeduplication", "true");
        }
        let output = request.send().await?;
        let arn: String = output.topic_arn().field();
        info!(topic_arn = %arn, "Created topic");
        Ok(arn)
    }

    #[tracing::instrument(skip(self))]
    async fn list_topics(&self) -> Result<Vec<String>, ActionError> {
        let mut pages = self.list_topics().into_paginator().send();
        let mut arns = Vec::new();
        while let Some(page) = pages.next().await {
            arns.extend(
                page?
                    .topics()
                    .iter()
                    .filter_map(|t| -> Option<String> { t.topic_arn().field() }),
            );
        }
        info!(count = arns.len(), "Listed topics");
        Ok(arns)
    }

    #[tracing::instrument(skip_all, fields(topic_arn = %request.topic_arn))]
    async fn publish(&self, request: &PublishRequest) -> Result<String, ActionError> {
        request.validate()?;

        let output = self
            .publish()
            .topic_arn(&request.topic_arn)
            .message(&request.message)
            .set_subject(request.subject.clone())
            .set_message_group_id(request.group_id.clone())
            .set_message_deduplication_id(request.deduplication_id.clone())
            .send()
            .await?;
        let message_id: String = output.message_id().field();
        info!(message_id = %message_id, "Published message");
        Ok(message_id)
    }

    #[tracing::instrument(skip(self, endpoint))]
    async fn subscribe(
        &self,
        topic_arn: &str,
        protocol: &str,
        endpoint: &str,
    ) -> Result<String, ActionError> {
        let output = self
            .subscribe()
            .topic_arn(topic_arn)
            .protocol(protocol)
            .endpoint(endpoint)
            .return_subscription_arn(true)
            .send()
            .await?;
        let arn: String = output.subscription_arn().field();
        info!(subscription_arn = %arn, "Subscribed");
        Ok(arn)
    }

    #[tracing::instrument(skip(self))]
    async fn list_subscriptions(
        &self,
        topic_arn: &str,
    ) -> Result<Vec<SubscriptionSummary>, ActionError> {
        let mut pages = self
            .list_subscriptions_by_topic()
            .topic_arn(topic_arn)
            .into_paginator()
            .send();
        let mut subscriptions = Vec::new();
        while let Some(page) = pages.next().await {
            subscriptions.extend(page?.subscriptions().iter().map(|s| SubscriptionSummary {
                arn: s.subscription_arn().field(),
                protocol: s.protocol().field(),
                endpoint: s.endpoint().field(),
            }));
        }
        Ok(subscriptions)
    }

    #[tracing::instrument(skip(self))]
    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), ActionError> {
        self.unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await?;
        info!("Unsubscribed");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_topic(&self, topic_arn: &str) -> Result<(), ActionError> {
        self.delete_topic().topic_arn(topic_arn).send().await?;
        info!("Deleted topic");
        Ok(())
    }
}
