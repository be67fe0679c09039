//! Cognito user pool actions, including the calls behind TOTP MFA enrollment.
//!
//! App clients created with a client secret require a `SECRET_HASH` on every
//! client-side call; [`secret_hash`] computes it and the actions below attach
//! it whenever [`AppClient::client_secret`] is set.

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::Client;
use aws_sdk_cognitoidentityprovider::types::{
    AttributeType, AuthFlowType, AuthenticationResultType, ChallengeNameType, UserType,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{error, info};

use crate::core::sdk::IntoField;
use crate::errors::ActionError;

#[derive(Clone, PartialEq, Args, Deserialize)]
pub struct AppClient {
    #[arg(long)]
    pub user_pool_id: String,
    #[arg(long)]
    pub client_id: String,
    /// Falls back to the Parameter Store parameter named by `COGNITO_CLIENT_SECRET_PARAM`.
    #[arg(long, env = "COGNITO_CLIENT_SECRET", hide_env_values = true)]
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for AppClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppClient")
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("has_secret", &self.client_secret.is_some())
            .finish()
    }
}

impl AppClient {
    fn secret_hash_for(&self, username: &str) -> Result<Option<String>, ActionError> {
        self.client_secret
            .as_deref()
            .map(|secret| secret_hash(username, &self.client_id, secret))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPoolSummary {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub username: Option<String>,
    pub status: Option<String>,
    pub enabled: bool,
    pub email: Option<String>,
}

impl From<&UserType> for UserSummary {
    fn from(user: &UserType) -> Self {
        let email = user
            .attributes()
            .iter()
            .find(|a| {
                let name: String = a.name().field();
                name == "email"
            })
            .and_then(|a| -> Option<String> { a.value().field() });
        Self {
            username: user.username().field(),
            status: user.user_status().field(),
            enabled: user.enabled().field(),
            email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpResult {
    pub user_sub: String,
    pub confirmed: bool,
}

#[derive(Clone, PartialEq, Serialize)]
pub struct AuthTokens {
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub id_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub expires_in: i32,
    pub token_type: Option<String>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl From<&AuthenticationResultType> for AuthTokens {
    fn from(result: &AuthenticationResultType) -> Self {
        Self {
            access_token: result.access_token().field(),
            id_token: result.id_token().field(),
            refresh_token: result.refresh_token().field(),
            expires_in: result.expires_in().field(),
            token_type: result.token_type().field(),
        }
    }
}

/// Outcome of an auth call: either another challenge to answer or tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthOutcome {
    pub challenge: Option<String>,
    #[serde(skip_serializing)]
    pub session: Option<String>,
    pub tokens: Option<AuthTokens>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoftwareToken {
    pub secret_code: String,
    #[serde(skip_serializing)]
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyResult {
    pub status: Option<String>,
    #[serde(skip_serializing)]
    pub session: Option<String>,
}

/// `SECRET_HASH` for an app client with a secret:
/// base64(HMAC-SHA256(client_secret, username + client_id)).
///
/// # Errors
///
/// Returns `Config` if the HMAC cannot be keyed with the secret.
pub fn secret_hash(
    username: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<String, ActionError> {
    let mut mac = match Hmac::<Sha256>::new_from_slice(client_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return Err(ActionError::Config(format!("client secret: {e}")));
        }
    };
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CognitoApi: Send + Sync {
    async fn list_user_pools(&self) -> Result<Vec<UserPoolSummary>, ActionError>;
    async fn list_users(&self, user_pool_id: &str) -> Result<Vec<UserSummary>, ActionError>;
    async fn sign_up(
        &self,
        client: &AppClient,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<SignUpResult, ActionError>;
    async fn admin_get_user(
        &self,
        user_pool_id: &str,
        username: &str,
    ) -> Result<UserSummary, ActionError>;
    async fn resend_confirmation_code(
        &self,
        client: &AppClient,
        username: &str,
    ) -> Result<Option<String>, ActionError>;
    async fn confirm_sign_up(
        &self,
        client: &AppClient,
        username: &str,
        code: &str,
    ) -> Result<(), ActionError>;
    async fn admin_initiate_auth(
        &self,
        client: &AppClient,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, ActionError>;
    async fn associate_software_token(&self, session: &str) -> Result<SoftwareToken, ActionError>;
    async fn verify_software_token(
        &self,
        session: &str,
        user_code: &str,
    ) -> Result<VerifyResult, ActionError>;
    async fn admin_respond_to_auth_challenge(
        &self,
        client: &AppClient,
        username: &str,
        session: &str,
        user_code: &str,
    ) -> Result<AuthOutcome, ActionError>;
    async fn admin_delete_user(&self, user_pool_id: &str, username: &str)
    -> Result<(), ActionError>;
}

fn auth_outcome(
    challenge: Option<&ChallengeNameType>,
    session: Option<&str>,
    result: Option<&AuthenticationResultType>,
) -> AuthOutcome {
    AuthOutcome {
        challenge: challenge.field(),
        session: session.field(),
        tokens: result.map(AuthTokens::from),
    }
}

#[async_trait]
impl CognitoApi for Client {
    #[tracing::instrument(skip(self))]
    async fn list_user_pools(&self) -> Result<Vec<UserPoolSummary>, ActionError> {
        let mut pages = self.list_user_pools().max_results(60).into_paginator().send();
        let mut pools = Vec::new();
        while let Some(page) = pages.next().await {
            pools.extend(page?.user_pools().iter().map(|p| UserPoolSummary {
                id: p.id().field(),
                name: p.name().field(),
            }));
        }
        info!(count = pools.len(), "Listed user pools");
        Ok(pools)
    }

    #[tracing::instrument(skip(self))]
    async fn list_users(&self, user_pool_id: &str) -> Result<Vec<UserSummary>, ActionError> {
        let mut pages = self
            .list_users()
            .user_pool_id(user_pool_id)
            .into_paginator()
            .send();
        let mut users = Vec::new();
        while let Some(page) = pages.next().await {
            users.extend(page?.users().iter().map(UserSummary::from));
        }
        info!(count = users.len(), "Listed users");
        Ok(users)
    }

    #[tracing::instrument(skip(self, password, email))]
    async fn sign_up(
        &self,
        client: &AppClient,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<SignUpResult, ActionError> {
        let email_attribute = AttributeType::builder().name("email").value(email).build()?;
        let output = self
            .sign_up()
            .client_id(&client.client_id)
            .username(username)
            .password(password)
            .user_attributes(email_attribute)
            .set_secret_hash(client.secret_hash_for(username)?)
            .send()
            .await?;
        let result = SignUpResult {
            user_sub: output.user_sub().field(),
            confirmed: output.user_confirmed().field(),
        };
        info!(confirmed = result.confirmed, "Signed up user");
        Ok(result)
    }

    #[tracing::instrument(skip(self))]
    async fn admin_get_user(
        &self,
        user_pool_id: &str,
        username: &str,
    ) -> Result<UserSummary, ActionError> {
        let output = self
            .admin_get_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await?;
        let email = output
            .user_attributes()
            .iter()
            .find(|a| {
                let name: String = a.name().field();
                name == "email"
            })
            .and_then(|a| -> Option<String> { a.value().field() });
        Ok(UserSummary {
            username: output.username().field(),
            status: output.user_status().field(),
            enabled: output.enabled().field(),
            email,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn resend_confirmation_code(
        &self,
        client: &AppClient,
        username: &str,
    ) -> Result<Option<String>, ActionError> {
        let output = self
            .resend_confirmation_code()
            .client_id(&client.client_id)
            .username(username)
            .set_secret_hash(client.secret_hash_for(username)?)
            .send()
            .await?;
        let destination = output
            .code_delivery_details()
            .and_then(|d| -> Option<String> { d.destination().field() });
        info!(destination = ?destination, "Resent confirmation code");
        Ok(destination)
    }

    #[tracing::instrument(skip(self, code))]
    async fn confirm_sign_up(
        &self,
        client: &AppClient,
        username: &str,
        code: &str,
    ) -> Result<(), ActionError> {
        self.confirm_sign_up()
            .client_id(&client.client_id)
            .username(username)
            .confirmation_code(code)
            .set_secret_hash(client.secret_hash_for(username)?)
            .send()
            .await?;
        info!("Confirmed user");
        Ok(())
    }

    #[tracing::instrument(skip(self, password))]
    async fn admin_initiate_auth(
        &self,
        client: &AppClient,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, ActionError> {
        let mut request = self
            .admin_initiate_auth()
            .user_pool_id(&client.user_pool_id)
            .client_id(&client.client_id)
            .auth_flow(AuthFlowType::AdminUserPasswordAuth)
            .auth_parameters("USERNAME", username)
            .auth_parameters("PASSWORD", password);
        if let Some(hash) = client.secret_hash_for(username)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }
        let output = request.send().await?;
        let outcome = auth_outcome(
            output.challenge_name(),
            output.session(),
            output.authentication_result(),
        );
        info!(challenge = ?outcome.challenge, "Initiated auth");
        Ok(outcome)
    }

    #[tracing::instrument(skip_all)]
    async fn associate_software_token(&self, session: &str) -> Result<SoftwareToken, ActionError> {
        let output = self.associate_software_token().session(session).send().await?;
        let secret_code: Option<String> = output.secret_code().field();
        Ok(SoftwareToken {
            secret_code: secret_code.ok_or_else(|| {
                ActionError::UnexpectedState("AssociateSoftwareToken returned no secret".into())
            })?,
            session: output.session().field(),
        })
    }

    #[tracing::instrument(skip_all)]
    async fn verify_software_token(
        &self,
        session: &str,
        user_code: &str,
    ) -> Result<VerifyResult, ActionError> {
        let output = self
            .verify_software_token()
            .session(session)
            .user_code(user_code)
            .send()
            .await?;
        let result = VerifyResult {
            status: output.status().field(),
            session: output.session().field(),
        };
        info!(status = ?result.status, "Verified software token");
        Ok(result)
    }

    #[tracing::instrument(skip(self, session, user_code))]
    async fn admin_respond_to_auth_challenge(
        &self,
        client: &AppClient,
        username: &str,
        session: &str,
        user_code: &str,
    ) -> Result<AuthOutcome, ActionError> {
        let mut request = self
            .admin_respond_to_auth_challenge()
            .user_pool_id(&client.user_pool_id)
            .client_id(&client.client_id)
            .challenge_name(ChallengeNameType::SoftwareTokenMfa)
            .challenge_responses("USERNAME", username)
            .challenge_responses("SOFTWARE_TOKEN_MFA_CODE", user_code)
            .session(session);
        if let Some(hash) = client.secret_hash_for(username)? {
            request = request.challenge_responses("SECRET_HASH", hash);
        }
        let output = request.send().await?;
        Ok(auth_outcome(
            output.challenge_name(),
            output.session(),
            output.authentication_result(),
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn admin_delete_user(
        &self,
        user_pool_id: &str,
        username: &str,
    ) -> Result<(), ActionError> {
        self.admin_delete_user()
            .user_pool_id(user_pool_id)
            .username(username)
            .send()
            .await?;
        info!("Deleted user");
        Ok(())
    }
}
