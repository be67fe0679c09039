//! AWS Support case actions.
//!
//! The Support API only answers for accounts on a Business, Enterprise
//! On-Ramp or Enterprise support plan; other accounts get
//! `SubscriptionRequiredException` back as an `ActionError::Service`.

use async_trait::async_trait;
use aws_sdk_support::Client;
use aws_sdk_support::primitives::Blob;
use aws_sdk_support::types::Attachment;
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub code: Option<String>,
    pub name: Option<String>,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityLevel {
    pub code: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct CreateCaseRequest {
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub service_code: String,
    #[arg(long)]
    pub category_code: String,
    #[arg(long)]
    pub severity_code: String,
    /// First communication on the case.
    #[arg(long)]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub case_id: Option<String>,
    pub display_id: Option<String>,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentRef {
    pub attachment_id: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunicationSummary {
    pub body: Option<String>,
    pub submitted_by: Option<String>,
    pub created: Option<String>,
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentContent {
    pub file_name: Option<String>,
    pub size: usize,
    #[serde(skip)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCase {
    pub initial_status: Option<String>,
    pub final_status: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportApi: Send + Sync {
    async fn describe_services(&self, language: &str)
    -> Result<Vec<ServiceSummary>, ActionError>;
    async fn describe_severity_levels(
        &self,
        language: &str,
    ) -> Result<Vec<SeverityLevel>, ActionError>;
    async fn create_case(
        &self,
        request: &CreateCaseRequest,
        language: &str,
    ) -> Result<String, ActionError>;
    async fn describe_cases(
        &self,
        include_resolved: bool,
        after_time: Option<String>,
        language: &str,
    ) -> Result<Vec<CaseSummary>, ActionError>;
    async fn add_attachment(&self, file_name: &str, data: Vec<u8>)
    -> Result<String, ActionError>;
    async fn add_communication(
        &self,
        case_id: &str,
        body: &str,
        attachment_set_id: Option<String>,
    ) -> Result<bool, ActionError>;
    async fn describe_communications(
        &self,
        case_id: &str,
    ) -> Result<Vec<CommunicationSummary>, ActionError>;
    async fn describe_attachment(
        &self,
        attachment_id: &str,
    ) -> Result<AttachmentContent, ActionError>;
    async fn resolve_case(&self, case_id: &str) -> Result<ResolvedCase, ActionError>;
}

#[async_trait]
impl SupportApi for Client {
    #[tracing::instrument(skip(self))]
    async fn describe_services(
        &self,
        language: &str,
    ) -> Result<Vec<ServiceSummary>, ActionError> {
        let output = self.describe_services().language(language).send().await?;
        let services: Vec<ServiceSummary> = output
            .services()
            .iter()
            .map(|s| ServiceSummary {
                code: s.code().field(),
                name: s.name().field(),
                categories: s
                    .categories()
                    .iter()
                    .map(|c| CategorySummary {
                        code: c.code().field(),
                        name: c.name().field(),
                    })
                    .collect(),
            })
            .collect();
        info!(count = services.len(), "Described support services");
        Ok(services)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_severity_levels(
        &self,
        language: &str,
    ) -> Result<Vec<SeverityLevel>, ActionError> {
        let output = self
            .describe_severity_levels()
            .language(language)
            .send()
            .await?;
        Ok(output
            .severity_levels()
            .iter()
            .map(|l| SeverityLevel {
                code: l.code().field(),
                name: l.name().field(),
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn create_case(
        &self,
        request: &CreateCaseRequest,
        language: &str,
    ) -> Result<String, ActionError> {
        let output = self
            .create_case()
            .subject(&request.subject)
            .service_code(&request.service_code)
            .category_code(&request.category_code)
            .severity_code(&request.severity_code)
            .communication_body(&request.body)
            .language(language)
            .issue_type("technical")
            .send()
            .await?;
        let case_id: Option<String> = output.case_id().field();
        let case_id = case_id
            .ok_or_else(|| ActionError::UnexpectedState("CreateCase returned no case id".into()))?;
        info!(case_id = %case_id, "Created support case");
        Ok(case_id)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_cases(
        &self,
        include_resolved: bool,
        after_time: Option<String>,
        language: &str,
    ) -> Result<Vec<CaseSummary>, ActionError> {
        let mut pages = self
            .describe_cases()
            .include_resolved_cases(include_resolved)
            .set_after_time(after_time)
            .language(language)
            .into_paginator()
            .send();
        let mut cases = Vec::new();
        while let Some(page) = pages.next().await {
            cases.extend(page?.cases().iter().map(|c| CaseSummary {
                case_id: c.case_id().field(),
                display_id: c.display_id().field(),
                subject: c.subject().field(),
                status: c.status().field(),
                created: c.time_created().field(),
            }));
        }
        info!(count = cases.len(), "Described support cases");
        Ok(cases)
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn add_attachment(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<String, ActionError> {
        let attachment = Attachment::builder()
            .file_name(file_name)
            .data(Blob::new(data))
            .build();
        let output = self
            .add_attachments_to_set()
            .attachments(attachment)
            .send()
            .await?;
        let set_id: Option<String> = output.attachment_set_id().field();
        let set_id = set_id.ok_or_else(|| {
            ActionError::UnexpectedState("AddAttachmentsToSet returned no set id".into())
        })?;
        info!(attachment_set_id = %set_id, "Uploaded attachment");
        Ok(set_id)
    }

    #[tracing::instrument(skip(self, body))]
    async fn add_communication(
        &self,
        case_id: &str,
        body: &str,
        attachment_set_id: Option<String>,
    ) -> Result<bool, ActionError> {
        let output = self
            .add_communication_to_case()
            .case_id(case_id)
            .communication_body(body)
            .set_attachment_set_id(attachment_set_id)
            .send()
            .await?;
        let added: bool = output.result().field();
        info!(added, "Added communication");
        Ok(added)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_communications(
        &self,
        case_id: &str,
    ) -> Result<Vec<CommunicationSummary>, ActionError> {
        let mut pages = self
            .describe_communications()
            .case_id(case_id)
            .into_paginator()
            .send();
        let mut communications = Vec::new();
        while let Some(page) = pages.next().await {
            communications.extend(page?.communications().iter().map(|c| {
                CommunicationSummary {
                    body: c.body().field(),
                    submitted_by: c.submitted_by().field(),
                    created: c.time_created().field(),
                    attachments: c
                        .attachment_set()
                        .iter()
                        .map(|a| AttachmentRef {
                            attachment_id: a.attachment_id().field(),
                            file_name: a.file_name().field(),
                        })
                        .collect(),
                }
            }));
        }
        Ok(communications)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_attachment(
        &self,
        attachment_id: &str,
    ) -> Result<AttachmentContent, ActionError> {
        let output = self
            .describe_attachment()
            .attachment_id(attachment_id)
            .send()
            .await?;
        let attachment = output
            .attachment()
            .ok_or_else(|| ActionError::NotFound(format!("attachment {attachment_id}")))?;
        let data = attachment
            .data()
            .map(|b| b.as_ref().to_vec())
            .unwrap_or_default();
        Ok(AttachmentContent {
            file_name: attachment.file_name().field(),
            size: data.len(),
            data,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn resolve_case(&self, case_id: &str) -> Result<ResolvedCase, ActionError> {
        let output = self.resolve_case().case_id(case_id).send().await?;
        let resolved = ResolvedCase {
            initial_status: output.initial_case_status().field(),
            final_status: output.final_case_status().field(),
        };
        info!(final_status = ?resolved.final_status, "Resolved support case");
        Ok(resolved)
    }
}

/// Picks the attachment on the most recent communication that carries one.
///
/// Support returns communications newest first.
pub fn latest_attachment(communications: &[CommunicationSummary]) -> Option<&AttachmentRef> {
    communications
        .iter()
        .find_map(|c| c.attachments.iter().find(|a| a.attachment_id.is_some()))
}
