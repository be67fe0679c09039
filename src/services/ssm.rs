//! Parameter Store access for secrets the other actions need.

use async_trait::async_trait;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::types::ParameterType;
use tracing::{debug, info};

use crate::errors::ActionError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SsmApi: Send + Sync {
    /// Reads a `SecureString` parameter, decrypted. `None` if it doesn't exist.
    async fn get_secret(&self, name: &str) -> Result<Option<String>, ActionError>;
    async fn put_secret(&self, name: &str, value: &str) -> Result<(), ActionError>;
}

#[async_trait]
impl SsmApi for Client {
    #[tracing::instrument(skip(self))]
    async fn get_secret(&self, name: &str) -> Result<Option<String>, ActionError> {
        match self
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(resp) => Ok(resp
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)),
            Err(e) => {
                let err = ActionError::from(e);
                if err.is_not_found() {
                    debug!("Parameter does not exist");
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    #[tracing::instrument(skip(self, value))]
    async fn put_secret(&self, name: &str, value: &str) -> Result<(), ActionError> {
        self.put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::SecureString)
            .overwrite(true)
            .send()
            .await?;
        info!("Stored parameter");
        Ok(())
    }
}

/// Resolves a secret that may come inline or from Parameter Store.
///
/// An inline value wins. Otherwise the named parameter is read; a missing
/// parameter is `NotFound`.
///
/// # Errors
///
/// Returns the lookup error, or `NotFound` if neither source yields a value.
pub async fn resolve_secret(
    api: &dyn SsmApi,
    inline: Option<String>,
    param_name: Option<&str>,
) -> Result<Option<String>, ActionError> {
    if inline.is_some() {
        return Ok(inline);
    }
    let Some(name) = param_name else {
        return Ok(None);
    };
    api.get_secret(name)
        .await?
        .map(Some)
        .ok_or_else(|| ActionError::NotFound(format!("parameter {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_secret_prefers_inline() {
        let mock = MockSsmApi::new();
        let secret = resolve_secret(&mock, Some("inline".into()), Some("/app/secret"))
            .await
            .unwrap();
        assert_eq!(secret.as_deref(), Some("inline"));
    }

    #[tokio::test]
    async fn test_resolve_secret_reads_parameter() {
        let mut mock = MockSsmApi::new();
        mock.expect_get_secret()
            .withf(|name| name == "/app/secret")
            .times(1)
            .returning(|_| Ok(Some("from-ssm".into())));

        let secret = resolve_secret(&mock, None, Some("/app/secret")).await.unwrap();
        assert_eq!(secret.as_deref(), Some("from-ssm"));
    }

    #[tokio::test]
    async fn test_resolve_secret_missing_parameter() {
        let mut mock = MockSsmApi::new();
        mock.expect_get_secret().returning(|_| Ok(None));

        let err = resolve_secret(&mock, None, Some("/app/secret"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_secret_without_sources() {
        let mock = MockSsmApi::new();
        assert!(resolve_secret(&mock, None, None).await.unwrap().is_none());
    }
}
