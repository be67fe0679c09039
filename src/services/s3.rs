//! S3 bucket and object actions.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use serde::Serialize;
use tracing::info;

use crate::core::sdk::{IntoField, IntoTimestamp};
use crate::errors::ActionError;

/// Region whose buckets must be created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";
const S3_SCHEME: &str = "s3://";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub name: String,
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: Option<i64>,
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedObject {
    pub key: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

/// Parses `s3://bucket/key/path` into its bucket and key. The key may be empty.
///
/// The key is taken verbatim: spaces, `%`, `?` and `#` are part of the object
/// name, not URL syntax.
///
/// # Errors
///
/// Returns `InvalidInput` for anything that is not an `s3://` URI with a bucket.
pub fn parse_s3_uri(uri: &str) -> Result<S3Location, ActionError> {
    let rest = uri
        .strip_prefix(S3_SCHEME)
        .ok_or_else(|| ActionError::InvalidInput(format!("{uri}: expected an s3:// URI")))?;
    let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() || bucket.chars().any(char::is_whitespace) {
        return Err(ActionError::InvalidInput(format!(
            "{uri}: missing or malformed bucket"
        )));
    }
    Ok(S3Location {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

/// Content type for an object key, guessed from its extension.
#[must_use]
pub fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `CopySource` header value: the source bucket and URL-encoded key.
#[must_use]
pub fn copy_source(bucket: &str, key: &str) -> String {
    format!("{bucket}/{}", urlencoding::encode(key))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait S3Api: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ActionError>;
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ActionError>;
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ActionError>;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<DownloadedObject, ActionError>;
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<String>,
    ) -> Result<Vec<ObjectSummary>, ActionError>;
    async fn copy_object(
        &self,
        source: &S3Location,
        destination: &S3Location,
    ) -> Result<(), ActionError>;
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ActionError>;
    async fn delete_bucket(&self, bucket: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl S3Api for Client {
    #[tracing::instrument(skip(self))]
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ActionError> {
        let output = self.list_buckets().send().await?;
        let buckets: Vec<BucketSummary> = output
            .buckets()
            .iter()
            .map(|b| BucketSummary {
                name: b.name().field(),
                created: b.creation_date().timestamp(),
            })
            .collect();
        info!(count = buckets.len(), "Listed buckets");
        Ok(buckets)
    }

    #[tracing::instrument(skip(self))]
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), ActionError> {
        let configuration = (region != DEFAULT_REGION).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });
        self.create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(configuration)
            .send()
            .await?;
        info!("Created bucket");
        Ok(())
    }

    #[tracing::instrument(skip(self, body), fields(size = body.len()))]
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), ActionError> {
        self.put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type_for(key))
            .body(ByteStream::from(body))
            .send()
            .await?;
        info!("Uploaded object");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_object(&self, bucket: &str, key: &str) -> Result<DownloadedObject, ActionError> {
        let output = self.get_object().bucket(bucket).key(key).send().await?;
        let content_type: Option<String> = output.content_type().field();
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ActionError::Io(format!("reading s3://{bucket}/{key}: {e}")))?
            .into_bytes()
            .to_vec();
        info!(size = body.len(), "Downloaded object");
        Ok(DownloadedObject {
            key: key.to_string(),
            content_type,
            body,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<String>,
    ) -> Result<Vec<ObjectSummary>, ActionError> {
        let mut pages = self
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            objects.extend(page?.contents().iter().map(|o| ObjectSummary {
                key: o.key().field(),
                size: o.size().field(),
                last_modified: o.last_modified().timestamp(),
            }));
        }
        info!(count = objects.len(), "Listed objects");
        Ok(objects)
    }

    #[tracing::instrument(skip(self))]
    async fn copy_object(
        &self,
        source: &S3Location,
        destination: &S3Location,
    ) -> Result<(), ActionError> {
        self.copy_object()
            .copy_source(copy_source(&source.bucket, &source.key))
            .bucket(&destination.bucket)
            .key(&destination.key)
            .send()
            .await?;
        info!("Copied object");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ActionError> {
        self.delete_object().bucket(bucket).key(key).send().await?;
        info!("Deleted object");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_bucket(&self, bucket: &str) -> Result<(), ActionError> {
        self.delete_bucket().bucket(bucket).send().await?;
        info!("Deleted bucket");
        Ok(())
    }
}
