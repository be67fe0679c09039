//! Opens a support case, attaches a file to it, then resolves it.

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::ActionError;
use crate::scenarios::{Prompt, choose};
use crate::services::support::{CreateCaseRequest, SupportApi, latest_attachment};

const CASE_SUBJECT: &str = "Test case - please ignore";
const CASE_BODY: &str = "This is a test case created by the aws-actions support walkthrough. Please ignore.";
const COMMUNICATION_BODY: &str = "Adding an attachment to this test case.";
const ATTACHMENT_NAME: &str = "attachment.txt";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportCaseReport {
    pub case_id: String,
    pub attachment_set_id: String,
    pub final_status: Option<String>,
}

/// Runs the walkthrough end to end against `api`.
///
/// # Errors
///
/// Stops at the first failed call. A service with no categories is
/// `UnexpectedState`.
pub async fn run(
    api: &dyn SupportApi,
    prompt: &mut dyn Prompt,
    language: &str,
) -> Result<SupportCaseReport, ActionError> {
    prompt.say("Welcome to the AWS Support case walkthrough.").await?;

    let services = api.describe_services(language).await?;
    let names: Vec<String> = services
        .iter()
        .map(|s| s.name.clone().or_else(|| s.code.clone()).unwrap_or_default())
        .collect();
    let picked = choose(prompt, "Select a service", &names).await?;
    let service = &services[picked];

    if service.categories.is_empty() {
        return Err(ActionError::UnexpectedState(format!(
            "service {} has no categories",
            names[picked]
        )));
    }
    let category_names: Vec<String> = service
        .categories
        .iter()
        .map(|c| c.name.clone().or_else(|| c.code.clone()).unwrap_or_default())
        .collect();
    let category = &service.categories[choose(prompt, "Select a category", &category_names).await?];

    let levels = api.describe_severity_levels(language).await?;
    let level_names: Vec<String> = levels
        .iter()
        .map(|l| l.name.clone().or_else(|| l.code.clone()).unwrap_or_default())
        .collect();
    let level = &levels[choose(prompt, "Select a severity level", &level_names).await?];

    let request = CreateCaseRequest {
        subject: CASE_SUBJECT.to_string(),
        service_code: service.code.clone().unwrap_or_default(),
        category_code: category.code.clone().unwrap_or_default(),
        severity_code: level.code.clone().unwrap_or_default(),
        body: CASE_BODY.to_string(),
    };
    let case_id = api.create_case(&request, language).await?;
    prompt.say(&format!("Created case {case_id}")).await?;

    let open_cases = api.describe_cases(false, None, language).await?;
    prompt.say(&format!("{} open case(s):", open_cases.len())).await?;
    for case in &open_cases {
        prompt
            .say(&format!(
                "  {} {} [{}]",
                case.display_id.as_deref().unwrap_or("-"),
                case.subject.as_deref().unwrap_or("-"),
                case.status.as_deref().unwrap_or("-"),
            ))
            .await?;
    }

    let content = format!("Attachment for case {case_id}: {}", uuid::Uuid::new_v4());
    let attachment_set_id = api
        .add_attachment(ATTACHMENT_NAME, content.into_bytes())
        .await?;
    prompt
        .say(&format!("Uploaded attachment set {attachment_set_id}"))
        .await?;

    let added = api
        .add_communication(&case_id, COMMUNICATION_BODY, Some(attachment_set_id.clone()))
        .await?;
    if !added {
        error!(case_id = %case_id, "Support did not accept the communication");
        return Err(ActionError::UnexpectedState(format!(
            "communication was not added to case {case_id}"
        )));
    }

    let communications = api.describe_communications(&case_id).await?;
    for comm in &communications {
        prompt
            .say(&format!(
                "  {} wrote: {}",
                comm.submitted_by.as_deref().unwrap_or("unknown"),
                comm.body.as_deref().unwrap_or_default(),
            ))
            .await?;
    }

    match latest_attachment(&communications).and_then(|a| a.attachment_id.clone()) {
        Some(attachment_id) => {
            let attachment = api.describe_attachment(&attachment_id).await?;
            prompt
                .say(&format!(
                    "Attachment {} is {} byte(s)",
                    attachment.file_name.as_deref().unwrap_or(ATTACHMENT_NAME),
                    attachment.size
                ))
                .await?;
        }
        None => {
            prompt
                .say("No attachment is visible on the case yet")
                .await?;
        }
    }

    let resolved = api.resolve_case(&case_id).await?;
    prompt
        .say(&format!(
            "Case status went from {} to {}",
            resolved.initial_status.as_deref().unwrap_or("unknown"),
            resolved.final_status.as_deref().unwrap_or("unknown"),
        ))
        .await?;

    let today = Utc::now().format("%Y-%m-%d").to_string();
    let recent = api.describe_cases(true, Some(today), language).await?;
    let final_status = recent
        .iter()
        .find(|c| c.case_id.as_deref() == Some(case_id.as_str()))
        .and_then(|c| c.status.clone())
        .or(resolved.final_status);
    prompt
        .say(&format!(
            "Case {case_id} is now {}",
            final_status.as_deref().unwrap_or("unknown")
        ))
        .await?;

    info!(case_id = %case_id, "Support case walkthrough finished");
    Ok(SupportCaseReport {
        case_id,
        attachment_set_id,
        final_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::testing::ScriptedPrompt;
    use crate::services::support::{
        AttachmentContent, AttachmentRef, CaseSummary, CategorySummary, CommunicationSummary,
        MockSupportApi, ResolvedCase, ServiceSummary, SeverityLevel,
    };

    fn services() -> Vec<ServiceSummary> {
        vec![
            ServiceSummary {
                code: Some("amazon-dynamodb".into()),
                name: Some("DynamoDB".into()),
                categories: vec![CategorySummary {
                    code: Some("performance".into()),
                    name: Some("Performance".into()),
                }],
            },
            ServiceSummary {
                code: Some("general-info".into()),
                name: Some("General Info".into()),
                categories: vec![
                    CategorySummary {
                        code: Some("using-aws".into()),
                        name: Some("Using AWS".into()),
                    },
                    CategorySummary {
                        code: Some("other".into()),
                        name: Some("Other".into()),
                    },
                ],
            },
        ]
    }

    fn case(status: &str) -> CaseSummary {
        CaseSummary {
            case_id: Some("case-1".into()),
            display_id: Some("1234".into()),
            subject: Some(CASE_SUBJECT.into()),
            status: Some(status.into()),
            created: None,
        }
    }

    #[tokio::test]
    async fn test_walkthrough_creates_and_resolves_case() {
        let mut api = MockSupportApi::new();
        api.expect_describe_services()
            .withf(|lang| lang == "en")
            .returning(|_| Ok(services()));
        api.expect_describe_severity_levels().returning(|_| {
            Ok(vec![
                SeverityLevel {
                    code: Some("low".into()),
                    name: Some("Low".into()),
                },
                SeverityLevel {
                    code: Some("urgent".into()),
                    name: Some("Urgent".into()),
                },
            ])
        });
        api.expect_create_case()
            .withf(|req, lang| {
                req.service_code == "general-info"
                    && req.category_code == "other"
                    && req.severity_code == "low"
                    && lang == "en"
            })
            .times(1)
            .returning(|_, _| Ok("case-1".into()));
        api.expect_describe_cases()
            .withf(|resolved, after, _| !*resolved && after.is_none())
            .times(1)
            .returning(|_, _, _| Ok(vec![case("opened")]));
        api.expect_add_attachment()
            .withf(|name, data| name == ATTACHMENT_NAME && !data.is_empty())
            .times(1)
            .returning(|_, _| Ok("set-1".into()));
        api.expect_add_communication()
            .withf(|id, _, set| id == "case-1" && set.as_deref() == Some("set-1"))
            .times(1)
            .returning(|_, _, _| Ok(true));
        api.expect_describe_communications().returning(|_| {
            Ok(vec![CommunicationSummary {
                body: Some(COMMUNICATION_BODY.into()),
                submitted_by: Some("me".into()),
                created: None,
                attachments: vec![AttachmentRef {
                    attachment_id: Some("att-1".into()),
                    file_name: Some(ATTACHMENT_NAME.into()),
                }],
            }])
        });
        api.expect_describe_attachment()
            .withf(|id| id == "att-1")
            .returning(|_| {
                Ok(AttachmentContent {
                    file_name: Some(ATTACHMENT_NAME.into()),
                    size: 42,
                    data: vec![0; 42],
                })
            });
        api.expect_resolve_case().returning(|_| {
            Ok(ResolvedCase {
                initial_status: Some("opened".into()),
                final_status: Some("resolved".into()),
            })
        });
        api.expect_describe_cases()
            .withf(|resolved, after, _| *resolved && after.is_some())
            .times(1)
            .returning(|_, _, _| Ok(vec![case("resolved")]));

        let mut prompt = ScriptedPrompt::new(&["2", "2", "1"]);
        let report = run(&api, &mut prompt, "en").await.unwrap();

        assert_eq!(report.case_id, "case-1");
        assert_eq!(report.attachment_set_id, "set-1");
        assert_eq!(report.final_status.as_deref(), Some("resolved"));
        assert!(prompt.saw("is 42 byte(s)"));
    }

    #[tokio::test]
    async fn test_walkthrough_stops_when_communication_rejected() {
        let mut api = MockSupportApi::new();
        api.expect_describe_services().returning(|_| Ok(services()));
        api.expect_describe_severity_levels().returning(|_| {
            Ok(vec![SeverityLevel {
                code: Some("low".into()),
                name: Some("Low".into()),
            }])
        });
        api.expect_create_case().returning(|_, _| Ok("case-1".into()));
        api.expect_describe_cases().returning(|_, _, _| Ok(vec![]));
        api.expect_add_attachment().returning(|_, _| Ok("set-1".into()));
        api.expect_add_communication().returning(|_, _, _| Ok(false));
        api.expect_resolve_case().never();

        let mut prompt = ScriptedPrompt::new(&["1", "1", "1"]);
        let err = run(&api, &mut prompt, "en").await.unwrap_err();
        assert!(matches!(err, ActionError::UnexpectedState(_)));
    }
}
