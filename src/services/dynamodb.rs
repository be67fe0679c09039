//! DynamoDB actions: table lifecycle and single-item reads and writes.
//!
//! Items cross the crate boundary as JSON objects and are converted to and
//! from `AttributeValue` maps with [`json_to_item`] and [`item_to_json`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
    ScalarAttributeType, TableDescription,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use tracing::info;

use crate::core::sdk::IntoField;
use crate::core::waiter::{Poll, poll_until};
use crate::errors::ActionError;

pub type Item = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq, Args, Deserialize)]
pub struct CreateTableRequest {
    #[arg(long)]
    pub table: String,
    /// String attribute used as the partition (hash) key.
    #[arg(long)]
    pub partition_key: String,
    /// Optional string attribute used as the sort (range) key.
    #[arg(long)]
    #[serde(default)]
    pub sort_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub status: String,
    pub item_count: Option<i64>,
}

impl From<&TableDescription> for TableSummary {
    fn from(table: &TableDescription) -> Self {
        Self {
            name: table.table_name().field(),
            status: table.table_status().field(),
            item_count: table.item_count().field(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DynamoDbApi: Send + Sync {
    async fn create_table(&self, request: &CreateTableRequest) -> Result<TableSummary, ActionError>;
    async fn describe_table(&self, table: &str) -> Result<TableSummary, ActionError>;
    async fn list_tables(&self) -> Result<Vec<String>, ActionError>;
    async fn put_item(&self, table: &str, item: Item) -> Result<(), ActionError>;
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, ActionError>;
    async fn query(
        &self,
        table: &str,
        key_name: &str,
        key_value: AttributeValue,
    ) -> Result<Vec<Item>, ActionError>;
    async fn scan(&self, table: &str) -> Result<Vec<Item>, ActionError>;
    async fn delete_item(&self, table: &str, key: Item) -> Result<(), ActionError>;
    async fn delete_table(&self, table: &str) -> Result<(), ActionError>;
}

/// Key schema and attribute definitions for string-typed keys.
///
/// # Errors
///
/// Returns `InvalidInput` if a key name is empty or both keys share a name.
pub fn key_definitions(
    partition_key: &str,
    sort_key: Option<&str>,
) -> Result<(Vec<KeySchemaElement>, Vec<AttributeDefinition>), ActionError> {
    if partition_key.trim().is_empty() {
        return Err(ActionError::InvalidInput(
            "partition key name must not be empty".to_string(),
        ));
    }
    if let Some(sort) = sort_key {
        if sort.trim().is_empty() {
            return Err(ActionError::InvalidInput(
                "sort key name must not be empty".to_string(),
            ));
        }
        if sort == partition_key {
            return Err(ActionError::InvalidInput(format!(
                "sort key must differ from partition key '{partition_key}'"
            )));
        }
    }

    let mut schema = Vec::new();
    let mut definitions = Vec::new();
    for (name, key_type) in std::iter::once((partition_key, KeyType::Hash))
        .chain(sort_key.map(|sort| (sort, KeyType::Range)))
    {
        schema.push(
            KeySchemaElement::builder()
                .attribute_name(name)
                .key_type(key_type)
                .build()?,
        );
        definitions.push(
            AttributeDefinition::builder()
                .attribute_name(name)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        );
    }
    Ok((schema, definitions))
}

/// Converts a JSON object into a DynamoDB item.
///
/// # Errors
///
/// Returns `InvalidInput` if `value` is not a JSON object.
pub fn json_to_item(value: &Value) -> Result<Item, ActionError> {
    let Value::Object(map) = value else {
        return Err(ActionError::InvalidInput(
            "item must be a JSON object".to_string(),
        ));
    };
    Ok(map
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect())
}

#[must_use]
pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

#[must_use]
pub fn item_to_json(item: &Item) -> Value {
    let map: Map<String, Value> = item
        .iter()
        .map(|(k, v)| (k.clone(), attribute_to_json(v)))
        .collect();
    Value::Object(map)
}

#[must_use]
pub fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(items) => Value::Array(items.iter().map(attribute_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attribute_to_json(v)))
                .collect(),
        ),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| number_to_json(n)).collect()),
        // Binary values have no JSON form; report their size instead.
        AttributeValue::B(blob) => Value::String(format!("<{} bytes>", blob.as_ref().len())),
        AttributeValue::Bs(blobs) => Value::Array(
            blobs
                .iter()
                .map(|b| Value::String(format!("<{} bytes>", b.as_ref().len())))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn number_to_json(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Number(i.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(raw.to_string()), Value::Number)
}

#[async_trait]
impl DynamoDbApi for Client {
    #[tracing::instrument(skip_all, fields(table = %request.table))]
    async fn create_table(&self, request: &CreateTableRequest) -> Result<TableSummary, ActionError> {
        let (schema, definitions) =
            key_definitions(&request.partition_key, request.sort_key.as_deref())?;

        let output = self
            .create_table()
            .table_name(&request.table)
            .set_key_schema(Some(schema))
            .set_attribute_definitions(Some(definitions))
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await?;

        let summary = output
            .table_description()
            .map(TableSummary::from)
            .ok_or_else(|| ActionError::UnexpectedState("CreateTable returned no table".to_string()))?;
        info!(status = %summary.status, "Created table");
        Ok(summary)
    }

    #[tracing::instrument(skip(self))]
    async fn describe_table(&self, table: &str) -> Result<TableSummary, ActionError> {
        let output = self.describe_table().table_name(table).send().await?;
        output
            .table()
            .map(TableSummary::from)
            .ok_or_else(|| ActionError::NotFound(format!("table {table}")))
    }

    #[tracing::instrument(skip(self))]
    async fn list_tables(&self) -> Result<Vec<String>, ActionError> {
        let tables = self
            .list_tables()
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await?;
        info!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    #[tracing::instrument(skip(self, item))]
    async fn put_item(&self, table: &str, item: Item) -> Result<(), ActionError> {
        self.put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await?;
        info!("Put item");
        Ok(())
    }

    #[tracing::instrument(skip(self, key))]
    async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>, ActionError> {
        let output = self
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await?;
        Ok(output.item().cloned())
    }

    #[tracing::instrument(skip(self, key_value))]
    async fn query(
        &self,
        table: &str,
        key_name: &str,
        key_value: AttributeValue,
    ) -> Result<Vec<Item>, ActionError> {
        let items = self
            .query()
            .table_name(table)
            .key_condition_expression("#pk = :pk")
            .expression_attribute_names("#pk", key_name)
            .expression_attribute_values(":pk", key_value)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await?;
        info!(count = items.len(), "Queried table");
        Ok(items)
    }

    #[tracing::instrument(skip(self))]
    async fn scan(&self, table: &str) -> Result<Vec<Item>, ActionError> {
        let items = self
            .scan()
            .table_name(table)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await?;
        info!(count = items.len(), "Scanned table");
        Ok(items)
    }

    #[tracing::instrument(skip(self, key))]
    async fn delete_item(&self, table: &str, key: Item) -> Result<(), ActionError> {
        self.delete_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await?;
        info!("Deleted item");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_table(&self, table: &str) -> Result<(), ActionError> {
        self.delete_table().table_name(table).send().await?;
        info!("Deleted table");
        Ok(())
    }
}

async fn table_status(api: &dyn DynamoDbApi, table: &str) -> Result<Poll<TableSummary>, ActionError> {
    let summary = api.describe_table(table).await?;
    if summary.status == "ACTIVE" {
        Ok(Poll::Ready(summary))
    } else {
        Ok(Poll::Pending(summary.status))
    }
}

/// Polls `describe_table` until the table reports `ACTIVE`.
///
/// # Errors
///
/// Returns the describe error, or `Timeout` if the table never becomes active.
pub async fn wait_for_table_active(
    api: &dyn DynamoDbApi,
    table: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<TableSummary, ActionError> {
    poll_until(&format!("table {table}"), interval, max_attempts, || {
        table_status(api, table)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::create_table::CreateTableOutput;
    use aws_sdk_dynamodb::operation::query::QueryOutput;
    use aws_sdk_dynamodb::types::TableStatus;
    use aws_smithy_mocks::{mock, mock_client};
    use serde_json::json;

    #[test]
    fn test_key_definitions_with_sort_key() {
        let (schema, definitions) = key_definitions("artist", Some("title")).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema[0].key_type(), &KeyType::Hash);
        assert_eq!(schema[1].key_type(), &KeyType::Range);
        assert_eq!(definitions.len(), 2);
        assert!(
            definitions
                .iter()
                .all(|d| d.attribute_type() == &ScalarAttributeType::S)
        );
    }

    #[test]
    fn test_key_definitions_rejects_duplicate_names() {
        let err = key_definitions("id", Some("id")).unwrap_err();
        assert!(matches!(err, ActionError::InvalidInput(_)));
        assert!(key_definitions(" ", None).is_err());
    }

    #[test]
    fn test_json_to_item_maps_types() {
        let item = json_to_item(&json!({
            "id": "song-1",
            "year": 1999,
            "explicit": false,
            "tags": ["rock", 7],
            "meta": {"label": null}
        }))
        .unwrap();

        assert_eq!(item["id"], AttributeValue::S("song-1".into()));
        assert_eq!(item["year"], AttributeValue::N("1999".into()));
        assert_eq!(item["explicit"], AttributeValue::Bool(false));
        assert_eq!(
            item["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("rock".into()),
                AttributeValue::N("7".into())
            ])
        );
        let AttributeValue::M(meta) = &item["meta"] else {
            panic!("meta should be a map");
        };
        assert_eq!(meta["label"], AttributeValue::Null(true));
    }

    #[test]
    fn test_json_to_item_rejects_non_objects() {
        assert!(json_to_item(&json!(["not", "an", "object"])).is_err());
        assert!(json_to_item(&json!("text")).is_err());
    }

    #[test]
    fn test_item_to_json_handles_sets_and_numbers() {
        let mut item = Item::new();
        item.insert("price".into(), AttributeValue::N("9.5".into()));
        item.insert("count".into(), AttributeValue::N("3".into()));
        item.insert(
            "colors".into(),
            AttributeValue::Ss(vec!["red".into(), "blue".into()]),
        );

        let value = item_to_json(&item);
        assert_eq!(value["price"], json!(9.5));
        assert_eq!(value["count"], json!(3));
        assert_eq!(value["colors"], json!(["red", "blue"]));
    }

    #[tokio::test]
    async fn test_wait_for_table_active_polls_describe() {
        let mut mock = MockDynamoDbApi::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_describe_table()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|table| {
                Ok(TableSummary {
                    name: table.to_string(),
                    status: "CREATING".into(),
                    item_count: None,
                })
            });
        mock.expect_describe_table()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|table| {
                Ok(TableSummary {
                    name: table.to_string(),
                    status: "ACTIVE".into(),
                    item_count: Some(0),
                })
            });

        let summary = wait_for_table_active(&mock, "Music", Duration::ZERO, 5)
            .await
            .unwrap();
        assert_eq!(summary.status, "ACTIVE");
        assert_eq!(summary.name, "Music");
    }

    #[tokio::test]
    async fn test_create_table_requests_on_demand_billing() {
        let rule = mock!(Client::create_table)
            .match_requests(|req| {
                req.table_name() == Some("music")
                    && req.billing_mode() == Some(&BillingMode::PayPerRequest)
                    && req.key_schema().len() == 2
                    && req.key_schema()[0].attribute_name() == "artist"
                    && req.key_schema()[1].key_type() == &KeyType::Range
                    && req.attribute_definitions().len() == 2
            })
            .then_output(|| {
                CreateTableOutput::builder()
                    .table_description(
                        TableDescription::builder()
                            .table_name("music")
                            .table_status(TableStatus::Creating)
                            .build(),
                    )
                    .build()
            });
        let client = mock_client!(aws_sdk_dynamodb, [&rule]);

        let request = CreateTableRequest {
            table: "music".into(),
            partition_key: "artist".into(),
            sort_key: Some("title".into()),
        };
        let summary = DynamoDbApi::create_table(&client, &request).await.unwrap();

        assert_eq!(rule.num_calls(), 1);
        assert_eq!(summary.name, "music");
        assert_eq!(summary.status, "CREATING");
    }

    #[tokio::test]
    async fn test_query_binds_partition_key_by_placeholder() {
        let rule = mock!(Client::query)
            .match_requests(|req| {
                req.key_condition_expression() == Some("#pk = :pk")
                    && req
                        .expression_attribute_names()
                        .and_then(|names| names.get("#pk"))
                        .map(String::as_str)
                        == Some("artist")
                    && req
                        .expression_attribute_values()
                        .and_then(|values| values.get(":pk"))
                        == Some(&AttributeValue::S("Nina Simone".into()))
            })
            .then_output(|| {
                QueryOutput::builder()
                    .items(HashMap::from([(
                        "artist".to_string(),
                        AttributeValue::S("Nina Simone".into()),
                    )]))
                    .build()
            });
        let client = mock_client!(aws_sdk_dynamodb, [&rule]);

        let items = DynamoDbApi::query(
            &client,
            "music",
            "artist",
            AttributeValue::S("Nina Simone".into()),
        )
        .await
        .unwrap();

        assert_eq!(rule.num_calls(), 1);
        assert_eq!(items.len(), 1);
    }
}
