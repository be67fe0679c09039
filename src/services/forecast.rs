//! Amazon Forecast dataset and forecast actions.

use async_trait::async_trait;
use aws_sdk_forecast::Client;
use aws_sdk_forecast::types::{AttributeType, DatasetType, Domain, Schema, SchemaAttribute};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::errors::ActionError;

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct CreateDatasetRequest {
    #[arg(long)]
    pub name: String,
    /// Dataset domain, e.g. `CUSTOM` or `RETAIL`.
    #[arg(long, default_value = "CUSTOM")]
    #[serde(default = "default_domain")]
    pub domain: String,
    /// `TARGET_TIME_SERIES`, `RELATED_TIME_SERIES` or `ITEM_METADATA`.
    #[arg(long, default_value = "TARGET_TIME_SERIES")]
    #[serde(default = "default_dataset_type")]
    pub dataset_type: String,
    /// Data frequency such as `D`, `H` or `1min`; required for time series datasets.
    #[arg(long)]
    #[serde(default)]
    pub frequency: Option<String>,
}

fn default_domain() -> String {
    "CUSTOM".to_string()
}

fn default_dataset_type() -> String {
    "TARGET_TIME_SERIES".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub name: Option<String>,
    pub arn: Option<String>,
    pub dataset_type: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub name: Option<String>,
    pub arn: Option<String>,
    pub status: Option<String>,
    pub predictor_arn: Option<String>,
    pub message: Option<String>,
    pub created: Option<String>,
}

/// Schema used for each dataset type.
///
/// # Errors
///
/// Returns `InvalidInput` for an unknown dataset type.
pub fn schema_for(dataset_type: &str) -> Result<Schema, ActionError> {
    let columns: &[(&str, AttributeType)] = match dataset_type {
        "TARGET_TIME_SERIES" => &[
            ("item_id", AttributeType::String),
            ("timestamp", AttributeType::Timestamp),
            ("target_value", AttributeType::Float),
        ],
        "RELATED_TIME_SERIES" => &[
            ("item_id", AttributeType::String),
            ("timestamp", AttributeType::Timestamp),
            ("price", AttributeType::Float),
        ],
        "ITEM_METADATA" => &[
            ("item_id", AttributeType::String),
            ("category", AttributeType::String),
        ],
        other => {
            return Err(ActionError::InvalidInput(format!(
                "unknown dataset type {other}; expected one of {:?}",
                DatasetType::values()
            )));
        }
    };

    let attributes = columns
        .iter()
        .map(|(name, kind)| {
            SchemaAttribute::builder()
                .attribute_name(*name)
                .attribute_type(kind.clone())
                .build()
        })
        .collect();
    Ok(Schema::builder().set_attributes(Some(attributes)).build())
}

impl CreateDatasetRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown domain or a time series dataset without a frequency.
    pub fn validate(&self) -> Result<(), ActionError> {
        if !Domain::values().contains(&self.domain.as_str()) {
            return Err(ActionError::InvalidInput(format!(
                "unknown domain {}; expected one of {:?}",
                self.domain,
                Domain::values()
            )));
        }
        if self.dataset_type != "ITEM_METADATA" && self.frequency.is_none() {
            return Err(ActionError::InvalidInput(format!(
                "{} datasets need a frequency",
                self.dataset_type
            )));
        }
        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastApi: Send + Sync {
    async fn create_dataset(&self, request: &CreateDatasetRequest) -> Result<String, ActionError>;
    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, ActionError>;
    async fn list_forecasts(&self) -> Result<Vec<ForecastSummary>, ActionError>;
    async fn describe_forecast(&self, arn: &str) -> Result<ForecastSummary, ActionError>;
    async fn delete_dataset(&self, arn: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl ForecastApi for Client {
    #[tracing::instrument(skip_all, fields(name = %request.name))]
    async fn create_dataset(&self, request: &CreateDatasetRequest) -> Result<String, ActionError> {
        request.validate()?;
        let schema = schema_for(&request.dataset_type)?;

        let output = self
            .create_dataset()
            .dataset_name(&request.name)
            .domain(Domain::from(request.domain.as_str()))
            .dataset_type(DatasetType::from(request.dataset_type.as_str()))
            .set_data_frequency(request.frequency.clone())
            .schema(schema)
            .send()
            .await?;
        let arn: String = output.dataset_arn().field();
        info!(arn = %arn, "Created dataset");
        Ok(arn)
    }

    #[tracing::instrument(skip(self))]
    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, ActionError> {
        let mut pages = self.list_datasets().into_paginator().send();
        let mut datasets = Vec::new();
        while let Some(page) = pages.next().await {
            datasets.extend(page?.datasets().iter().map(|d| DatasetSummary {
                name: d.dataset_name().field(),
                arn: d.dataset_arn().field(),
                dataset_type: d.dataset_type().field(),
                domain: d.domain().field(),
            }));
        }
        info!(count = datasets.len(), "Listed datasets");
        Ok(datasets)
    }

    #[tracing::instrument(skip(self))]
    async fn list_forecasts(&self) -> Result<Vec<ForecastSummary>, ActionError> {
        let mut pages = self.list_forecasts().into_paginator().send();
        let mut forecasts = Vec::new();
        while let Some(page) = pages.next().await {
            forecasts.extend(page?.forecasts().iter().map(|f| ForecastSummary {
                name: f.forecast_name().field(),
                arn: f.forecast_arn().field(),
                status: f.status().field(),
                predictor_arn: f.predictor_arn().field(),
                message: f.message().field(),
                created: f.creation_time().timestamp(),
            }));
        }
        info!(count = forecasts.len(), "Listed forecasts");
        Ok(forecasts)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_forecast(&self, arn: &str) -> Result<ForecastSummary, ActionError> {
        let output = self.describe_forecast().forecast_arn(arn).send().await?;
        Ok(ForecastSummary {
            name: output.forecast_name().field(),
            arn: output.forecast_arn().field(),
            status: output.status().field(),
            predictor_arn: output.predictor_arn().field(),
            message: output.message().field(),
            created: output.creation_time().timestamp(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_dataset(&self, arn: &str) -> Result<(), ActionError> {
        self.delete_dataset().dataset_arn(arn).send().await?;
        info!("Deleted dataset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_forecast::operation::create_dataset::CreateDatasetOutput;
    use aws_smithy_mocks::{mock, mock_client};

    fn request(dataset_type: &str, frequency: Option<&str>) -> CreateDatasetRequest {
        CreateDatasetRequest {
            name: "demand".into(),
            domain: "CUSTOM".into(),
            dataset_type: dataset_type.into(),
            frequency: frequency.map(str::to_string),
        }
    }

    #[test]
    fn test_schema_for_target_time_series() {
        let schema = schema_for("TARGET_TIME_SERIES").unwrap();
        let names: Vec<_> = schema
            .attributes()
            .iter()
            .filter_map(|a| a.attribute_name())
            .collect();
        assert_eq!(names, vec!["item_id", "timestamp", "target_value"]);
    }

    #[test]
    fn test_schema_for_unknown_type() {
        assert!(schema_for("SOMETHING_ELSE").is_err());
    }

    #[test]
    fn test_validate_requires_frequency_for_time_series() {
        assert!(request("TARGET_TIME_SERIES", Some("D")).validate().is_ok());
        assert!(request("TARGET_TIME_SERIES", None).validate().is_err());
        assert!(request("ITEM_METADATA", None).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_domain() {
        let mut bad = request("TARGET_TIME_SERIES", Some("D"));
        bad.domain = "GROCERIES".into();
        assert!(bad.validate().is_err());
    }


    #[tokio::test]
    async fn test_create_dataset_sends_target_series_schema() {
        let rule = mock!(Client::create_dataset)
            .match_requests(|req| {
                let columns: Vec<(Option<&str>, Option<&AttributeType>)> = req
                    .schema()
                    .map(|s| {
                        s.attributes()
                            .iter()
                            .map(|a| (a.attribute_name(), a.attribute_type()))
                            .collect()
                    })
                    .unwrap_or_default();
                req.dataset_name() == Some("demand")
                    && req.domain() == Some(&Domain::Custom)
                    && req.dataset_type() == Some(&DatasetType::TargetTimeSeries)
                    && req.data_frequency() == Some("D")
                    && columns
                        == vec![
                            (Some("item_id"), Some(&AttributeType::String)),
                            (Some("timestamp"), Some(&AttributeType::Timestamp)),
                            (Some("target_value"), Some(&AttributeType::Float)),
                        ]
            })
            .then_output(|| {
                CreateDatasetOutput::builder()
                    .dataset_arn("arn:aws:forecast:us-east-1:123456789012:dataset/demand")
                    .build()
            });
        let client = mock_client!(aws_sdk_forecast, [&rule]);

        let request = CreateDatasetRequest {
            name: "demand".into(),
            domain: "CUSTOM".into(),
            dataset_type: "TARGET_TIME_SERIES".into(),
            frequency: Some("D".into()),
        };
        let arn = ForecastApi::create_dataset(&client, &request).await.unwrap();
        assert_eq!(rule.num_calls(), 1);
        assert_eq!(arn, "arn:aws:forecast:us-east-1:123456789012:dataset/demand");
    }

    #[tokio::test]
    async fn test_create_dataset_without_frequency_never_calls_forecast() {
        let rule = mock!(Client::create_dataset)
            .then_output(|| CreateDatasetOutput::builder().build());
        let client = mock_client!(aws_sdk_forecast, [&rule]);

        let request = CreateDatasetRequest {
            name: "demand".into(),
            domain: "CUSTOM".into(),
            dataset_type: "TARGET_TIME_SERIES".into(),
            frequency: None,
        };
        let err = ForecastApi::create_dataset(&client, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidInput(_)));
        assert_eq!(rule.num_calls(), 0);
    }
}
