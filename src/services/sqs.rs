//! SQS actions.

use async_trait::async_trait;
use aws_sdk_sqs::Client;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

const MAX_RECEIVE_MESSAGES: i32 = 10;
const MAX_WAIT_SECONDS: i32 = 20;
const MAX_DELAY_SECONDS: i32 = 900;

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct SendMessageRequest {
    #[arg(long)]
    pub queue_url: String,
    #[arg(long)]
    pub body: String,
    #[arg(long)]
    #[serde(default)]
    pub delay_seconds: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct ReceiveMessagesRequest {
    #[arg(long)]
    pub queue_url: String,
    #[arg(long, default_value_t = 1)]
    #[serde(default = "default_max_messages")]
    pub max_messages: i32,
    #[arg(long, default_value_t = 0)]
    #[serde(default)]
    pub wait_seconds: i32,
}

fn default_max_messages() -> i32 {
    1
}

impl ReceiveMessagesRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` if the batch size or long-poll wait is outside SQS limits.
    pub fn validate(&self) -> Result<(), ActionError> {
        if !(1..=MAX_RECEIVE_MESSAGES).contains(&self.max_messages) {
            return Err(ActionError::InvalidInput(format!(
                "max_messages must be between 1 and {MAX_RECEIVE_MESSAGES}, got {}",
                self.max_messages
            )));
        }
        if !(0..=MAX_WAIT_SECONDS).contains(&self.wait_seconds) {
            return Err(ActionError::InvalidInput(format!(
                "wait_seconds must be between 0 and {MAX_WAIT_SECONDS}, got {}",
                self.wait_seconds
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SqsApi: Send + Sync {
    async fn create_queue(&self, name: &str) -> Result<String, ActionError>;
    async fn get_queue_url(&self, name: &str) -> Result<String, ActionError>;
    async fn list_queues(&self, prefix: Option<String>) -> Result<Vec<String>, ActionError>;
    async fn send_message(&self, request: &SendMessageRequest) -> Result<String, ActionError>;
    async fn receive_messages(
        &self,
        request: &ReceiveMessagesRequest,
    ) -> Result<Vec<QueueMessage>, ActionError>;
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str)
    -> Result<(), ActionError>;
    async fn purge_queue(&self, queue_url: &str) -> Result<(), ActionError>;
    async fn delete_queue(&self, queue_url: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl SqsApi for Client {
    #[tracing::instrument(skip(self))]
    async fn create_queue(&self, name: &str) -> Result<String, ActionError> {
        let output = self.create_queue().queue_name(name).send().await?;
        let url: String = output.queue_url().field();
        info!(queue_url = %url, "Created queue");
        Ok(url)
    }

    #[tracing::instrument(skip(self))]
    async fn get_queue_url(&self, name: &str) -> Result<String, ActionError> {
        let output = self.get_queue_url().queue_name(name).send().await?;
        let url: Option<String> = output.queue_url().field();
        url.ok_or_else(|| ActionError::NotFound(format!("queue {name}")))
    }

    #[tracing::instrument(skip(self))]
    async fn list_queues(&self, prefix: Option<String>) -> Result<Vec<String>, ActionError> {
        let mut pages = self
            .list_queues()
            .set_queue_name_prefix(prefix)
            .into_paginator()
            .send();
        let mut urls = Vec::new();
        while let Some(page) = pages.next().await {
            urls.extend(page?.queue_urls().iter().cloned());
        }
        info!(count = urls.len(), "Listed queues");
        Ok(urls)
    }

    #[tracing::instrument(skip(self, request), fields(queue_url = %request.queue_url))]
    async fn send_message(&self, request: &SendMessageRequest) -> Result<String, ActionError> {
        if let Some(delay) = request.delay_seconds
            && !(0..=MAX_DELAY_SECONDS).contains(&delay)
        {
            return Err(ActionError::InvalidInput(format!(
                "delay_seconds must be between 0 and {MAX_DELAY_SECONDS}, got {delay}"
            )));
        }

        let output = self
            .send_message()
            .queue_url(&request.queue_url)
            .message_body(&request.body)
            .set_delay_seconds(request.delay_seconds)
            .send()
            .await?;
        let message_id: String = output.message_id().field();
        info!(message_id = %message_id, "Sent message");
        Ok(message_id)
    }

    #[tracing::instrument(skip(self, request), fields(queue_url = %request.queue_url))]
    async fn receive_messages(
        &self,
        request: &ReceiveMessagesRequest,
    ) -> Result<Vec<QueueMessage>, ActionError> {
        request.validate()?;

        let output = self
            .receive_message()
            .queue_url(&request.queue_url)
            .max_number_of_messages(request.max_messages)
            .wait_time_seconds(request.wait_seconds)
            .send()
            .await?;

        let messages: Vec<QueueMessage> = output
            .messages()
            .iter()
            .map(|m| QueueMessage {
                message_id: m.message_id().field(),
                receipt_handle: m.receipt_handle().field(),
                body: m.body().field(),
            })
            .collect();
        info!(count = messages.len(), "Received messages");
        Ok(messages)
    }

    #[tracing::instrument(skip(self, receipt_handle))]
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), ActionError> {
        self.delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;
        info!("Deleted message");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn purge_queue(&self, queue_url: &str) -> Result<(), ActionError> {
        self.purge_queue().queue_url(queue_url).send().await?;
        info!("Purged queue");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_queue(&self, queue_url: &str) -> Result<(), ActionError> {
        self.delete_queue().queue_url(queue_url).send().await?;
        info!("Deleted queue");
        Ok(())
    }
}
