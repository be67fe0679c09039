//! Signs up a user, enrolls a TOTP authenticator and signs in with it.

use serde::Serialize;
use tracing::{error, info};

use crate::errors::ActionError;
use crate::scenarios::{Prompt, confirm};
use crate::services::cognito::{AppClient, AuthOutcome, CognitoApi};

const MFA_SETUP: &str = "MFA_SETUP";
const SOFTWARE_TOKEN_MFA: &str = "SOFTWARE_TOKEN_MFA";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MfaReport {
    pub username: String,
    pub user_sub: String,
    pub token_expires_in: i32,
    pub user_deleted: bool,
}

fn expect_challenge<'a>(outcome: &'a AuthOutcome, expected: &str) -> Result<&'a str, ActionError> {
    match (outcome.challenge.as_deref(), outcome.session.as_deref()) {
        (Some(challenge), Some(session)) if challenge == expected => Ok(session),
        (challenge, _) => {
            error!(expected, got = ?challenge, "Unexpected auth challenge");
            Err(ActionError::UnexpectedState(format!(
                "expected challenge {expected}, got {}",
                challenge.unwrap_or("none")
            )))
        }
    }
}

/// Runs the enrollment walkthrough for a new user of `client`.
///
/// The user pool must require (or allow) TOTP MFA and the app client must
/// allow the `ADMIN_USER_PASSWORD_AUTH` flow.
///
/// # Errors
///
/// Stops at the first failed call. A challenge other than the one the flow
/// is waiting for is `UnexpectedState`.
pub async fn run(
    api: &dyn CognitoApi,
    prompt: &mut dyn Prompt,
    client: &AppClient,
) -> Result<MfaReport, ActionError> {
    prompt
        .say("This walkthrough signs up a user and enrolls an authenticator app for MFA.")
        .await?;

    let username = prompt.ask("Username").await?;
    let password = prompt.ask_secret("Password").await?;
    let email = prompt.ask("Email address").await?;

    let signed_up = api.sign_up(client, &username, &password, &email).await?;
    prompt
        .say(&format!(
            "Signed up {username} (confirmed: {})",
            signed_up.confirmed
        ))
        .await?;

    let user = api.admin_get_user(&client.user_pool_id, &username).await?;
    prompt
        .say(&format!(
            "User status is {}",
            user.status.as_deref().unwrap_or("unknown")
        ))
        .await?;

    let destination = api.resend_confirmation_code(client, &username).await?;
    prompt
        .say(&format!(
            "Confirmation code sent to {}",
            destination.as_deref().unwrap_or("the address on file")
        ))
        .await?;

    let code = prompt.ask("Confirmation code").await?;
    api.confirm_sign_up(client, &username, &code).await?;
    let user = api.admin_get_user(&client.user_pool_id, &username).await?;
    prompt
        .say(&format!(
            "User status is now {}",
            user.status.as_deref().unwrap_or("unknown")
        ))
        .await?;

    let setup = api.admin_initiate_auth(client, &username, &password).await?;
    let session = expect_challenge(&setup, MFA_SETUP)?;

    let token = api.associate_software_token(session).await?;
    prompt
        .say(&format!(
            "Add this secret to your authenticator app: {}",
            token.secret_code
        ))
        .await?;

    let totp = prompt.ask("Code from the authenticator app").await?;
    let verify_session = token.session.as_deref().unwrap_or(session);
    let verified = api.verify_software_token(verify_session, &totp).await?;
    if verified.status.as_deref() != Some("SUCCESS") {
        return Err(ActionError::UnexpectedState(format!(
            "software token verification returned {}",
            verified.status.as_deref().unwrap_or("no status")
        )));
    }
    prompt.say("Authenticator app verified.").await?;

    let challenge = api.admin_initiate_auth(client, &username, &password).await?;
    let session = expect_challenge(&challenge, SOFTWARE_TOKEN_MFA)?;

    let totp = prompt.ask("New code from the authenticator app").await?;
    let signed_in = api
        .admin_respond_to_auth_challenge(client, &username, session, &totp)
        .await?;
    let tokens = signed_in.tokens.ok_or_else(|| {
        ActionError::UnexpectedState(format!(
            "MFA response returned challenge {} instead of tokens",
            signed_in.challenge.as_deref().unwrap_or("none")
        ))
    })?;
    prompt
        .say(&format!(
            "Signed in. Access token expires in {} seconds.",
            tokens.expires_in
        ))
        .await?;

    let user_deleted = if confirm(prompt, &format!("Delete user {username}?")).await? {
        api.admin_delete_user(&client.user_pool_id, &username).await?;
        true
    } else {
        false
    };

    info!(username = %username, "MFA walkthrough finished");
    Ok(MfaReport {
        username,
        user_sub: signed_up.user_sub,
        token_expires_in: tokens.expires_in,
        user_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::testing::ScriptedPrompt;
    use crate::services::cognito::{
        AuthTokens, MockCognitoApi, SignUpResult, SoftwareToken, UserSummary, VerifyResult,
    };

    fn app_client() -> AppClient {
        AppClient {
            user_pool_id: "us-east-1_pool".into(),
            client_id: "client-id".into(),
            client_secret: None,
        }
    }

    fn user(status: &str) -> UserSummary {
        UserSummary {
            username: Some("alice".into()),
            status: Some(status.into()),
            enabled: true,
            email: Some("alice@example.com".into()),
        }
    }

    fn challenge(name: &str, session: &str) -> AuthOutcome {
        AuthOutcome {
            challenge: Some(name.into()),
            session: Some(session.into()),
            tokens: None,
        }
    }

    fn mock_until_setup(api: &mut MockCognitoApi) {
        api.expect_sign_up()
            .withf(|_, username, _, email| username == "alice" && email == "alice@example.com")
            .times(1)
            .returning(|_, _, _, _| {
                Ok(SignUpResult {
                    user_sub: "sub-1".into(),
                    confirmed: false,
                })
            });
        let mut seq = mockall::Sequence::new();
        api.expect_admin_get_user()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(user("UNCONFIRMED")));
        api.expect_admin_get_user()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(user("CONFIRMED")));
        api.expect_resend_confirmation_code()
            .returning(|_, _| Ok(Some("a***@e***".into())));
        api.expect_confirm_sign_up()
            .withf(|_, _, code| code == "123456")
            .times(1)
            .returning(|_, _, _| Ok(()));
    }

    #[tokio::test]
    async fn test_enrolls_totp_and_signs_in() {
        let mut api = MockCognitoApi::new();
        mock_until_setup(&mut api);

        let mut auth_seq = mockall::Sequence::new();
        api.expect_admin_initiate_auth()
            .times(1)
            .in_sequence(&mut auth_seq)
            .returning(|_, _, _| Ok(challenge(MFA_SETUP, "setup-session")));
        api.expect_admin_initiate_auth()
            .times(1)
            .in_sequence(&mut auth_seq)
            .returning(|_, _, _| Ok(challenge(SOFTWARE_TOKEN_MFA, "mfa-session")));
        api.expect_associate_software_token()
            .withf(|session| session == "setup-session")
            .returning(|_| {
                Ok(SoftwareToken {
                    secret_code: "JBSWY3DPEHPK3PXP".into(),
                    session: Some("assoc-session".into()),
                })
            });
        api.expect_verify_software_token()
            .withf(|session, code| session == "assoc-session" && code == "111111")
            .returning(|_, _| {
                Ok(VerifyResult {
                    status: Some("SUCCESS".into()),
                    session: None,
                })
            });
        api.expect_admin_respond_to_auth_challenge()
            .withf(|_, _, session, code| session == "mfa-session" && code == "222222")
            .returning(|_, _, _, _| {
                Ok(AuthOutcome {
                    challenge: None,
                    session: None,
                    tokens: Some(AuthTokens {
                        access_token: "access".into(),
                        id_token: None,
                        refresh_token: None,
                        expires_in: 3600,
                        token_type: Some("Bearer".into()),
                    }),
                })
            });
        api.expect_admin_delete_user()
            .withf(|pool, username| pool == "us-east-1_pool" && username == "alice")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut prompt = ScriptedPrompt::new(&[
            "alice",
            "Passw0rd!",
            "alice@example.com",
            "123456",
            "111111",
            "222222",
            "y",
        ]);
        let report = run(&api, &mut prompt, &app_client()).await.unwrap();

        assert_eq!(report.user_sub, "sub-1");
        assert_eq!(report.token_expires_in, 3600);
        assert!(report.user_deleted);
        assert!(prompt.saw("JBSWY3DPEHPK3PXP"));
        assert!(prompt.saw("User status is now CONFIRMED"));
    }

    #[tokio::test]
    async fn test_unexpected_first_challenge() {
        let mut api = MockCognitoApi::new();
        mock_until_setup(&mut api);
        api.expect_admin_initiate_auth()
            .returning(|_, _, _| Ok(challenge("NEW_PASSWORD_REQUIRED", "session")));
        api.expect_associate_software_token().never();

        let mut prompt =
            ScriptedPrompt::new(&["alice", "Passw0rd!", "alice@example.com", "123456"]);
        let err = run(&api, &mut prompt, &app_client()).await.unwrap_err();
        assert!(matches!(err, ActionError::UnexpectedState(msg) if msg.contains("MFA_SETUP")));
    }

    #[tokio::test]
    async fn test_password_reaches_sign_up_verbatim() {
        let mut api = MockCognitoApi::new();
        api.expect_sign_up()
            .withf(|_, username, password, _| username == "alice" && password == " Passw0rd! ")
            .times(1)
            .returning(|_, _, _, _| Err(ActionError::service("InvalidPasswordException", "stop")));

        let mut prompt = ScriptedPrompt::new(&["alice", " Passw0rd! ", "alice@example.com"]);
        let err = run(&api, &mut prompt, &app_client()).await.unwrap_err();
        assert_eq!(err.code(), Some("InvalidPasswordException"));
        assert!(!prompt.saw("Passw0rd!"));
    }

    #[test]
    fn test_expect_challenge_requires_session() {
        let outcome = AuthOutcome {
            challenge: Some(MFA_SETUP.into()),
            session: None,
            tokens: None,
        };
        assert!(expect_challenge(&outcome, MFA_SETUP).is_err());
    }
}
