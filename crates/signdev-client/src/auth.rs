//! Account flows: login, registration, password reset
//!
//! Each flow validates locally first; a rejected input never reaches the
//! server. Outcomes are reported through the [`Notifier`].

use crate::api::AuthApi;
use crate::error::{ClientError, Result};
use crate::notify::Notifier;
use crate::session::{Session, SessionStore};
use signdev_types::{LoginRequest, RegisterRequest, ResetRequest, User, VerifyOtpRequest};
use tracing::warn;

pub const REGISTERED: &str = "Account created! Please login.";

pub const INVALID_EMAIL: &str = "Please enter a valid email address.";

/// Accepts what an HTML email field accepts: `local@domain` with no
/// whitespace, and a domain of non-empty dot-separated labels
pub fn validate_email(email: &str) -> Result<()> {
    let valid = email.trim().split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && !email.trim().contains(char::is_whitespace)
            && domain.split('.').all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
    });
    if valid {
        Ok(())
    } else {
        Err(ClientError::Validation(INVALID_EMAIL.to_string()))
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Report a failure and hand the error back
fn fail<T>(notifier: &dyn Notifier, err: ClientError, fallback: &str) -> Result<T> {
    warn!(error = %err, "{}", fallback);
    notifier.error(&err.message_or(fallback));
    Err(err)
}

/// Exchange credentials for a session and persist it
pub async fn login(
    api: &dyn AuthApi,
    session: &SessionStore,
    notifier: &dyn Notifier,
    email: &str,
    password: &str,
) -> Result<User> {
    if let Err(e) = validate_email(email).and_then(|_| require(password, "Password")) {
        return fail(notifier, e, "Login failed");
    }

    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    let auth = match api.login(&request).await {
        Ok(auth) => auth,
        Err(e) => return fail(notifier, e, "Login failed"),
    };

    let user = auth.user.clone();
    if let Err(e) = session.login(auth) {
        return fail(notifier, e, "Login failed");
    }
    Ok(user)
}

pub async fn register(
    api: &dyn AuthApi,
    notifier: &dyn Notifier,
    name: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let checked = require(name, "Name")
        .and_then(|_| validate_email(email))
        .and_then(|_| require(password, "Password"));
    if let Err(e) = checked {
        return fail(notifier, e, "Registration failed.");
    }

    let request = RegisterRequest {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    match api.register(&request).await {
        Ok(_) => {
            notifier.info(REGISTERED);
            Ok(())
        }
        Err(e) => fail(notifier, e, "Registration failed."),
    }
}

/// Ask for a one-time password by email; returns the notice shown
pub async fn request_reset(
    api: &dyn AuthApi,
    notifier: &dyn Notifier,
    email: &str,
) -> Result<String> {
    if let Err(e) = validate_email(email) {
        return fail(notifier, e, "Failed to send OTP");
    }

    let request = ResetRequest {
        email: email.trim().to_string(),
    };
    match api.request_reset(&request).await {
        Ok(reply) => {
            let message = reply
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "OTP sent to your email".to_string());
            notifier.info(&message);
            Ok(message)
        }
        Err(e) => fail(notifier, e, "Failed to send OTP"),
    }
}

/// Consume the one-time password and set a new password
pub async fn verify_otp(
    api: &dyn AuthApi,
    notifier: &dyn Notifier,
    email: &str,
    otp: &str,
    new_password: &str,
) -> Result<String> {
    let checked = validate_email(email)
        .and_then(|_| require(otp, "OTP"))
        .and_then(|_| require(new_password, "New password"));
    if let Err(e) = checked {
        return fail(notifier, e, "OTP verification failed");
    }

    let request = VerifyOtpRequest {
        email: email.trim().to_string(),
        otp: otp.trim().to_string(),
        new_password: new_password.to_string(),
    };
    match api.verify_otp(&request).await {
        Ok(reply) => {
            let message = reply
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Password reset successful".to_string());
            notifier.info(&message);
            Ok(message)
        }
        Err(e) => fail(notifier, e, "OTP verification failed"),
    }
}

/// Gate for operations that need a logged-in user
pub fn require_session(session: &SessionStore) -> Result<Session> {
    session.current().ok_or(ClientError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use crate::test_support::MockApi;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("  Ada@Example.org ").is_ok());
        assert!(validate_email("user@localhost").is_ok());
        assert!(validate_email("noatsign.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@").is_err());
        assert!(validate_email("a@example..com").is_err());
        assert!(validate_email("a b@example.com").is_err());
        assert!(validate_email("a@-example.com").is_err());
    }

    proptest! {
        #[test]
        fn emails_without_at_are_rejected(s in "[a-z0-9.]{0,30}") {
            prop_assert!(validate_email(&s).is_err());
        }

        #[test]
        fn simple_addresses_are_accepted(
            local in "[a-z][a-z0-9]{0,10}",
            domain in "[a-z]{1,10}",
            tld in "[a-z]{2,4}",
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            prop_assert!(validate_email(&email).is_ok());
        }
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let api = MockApi::new();
        let session = SessionStore::in_memory();
        let notifier = RecordingNotifier::new();

        let user = login(&api, &session, &notifier, "ada@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(session.token().as_deref(), Some("mock-token"));
        assert!(require_session(&session).is_ok());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_login_failure_uses_server_message() {
        let api = MockApi::new();
        api.fail_next("login", Some("Invalid credentials"));
        let session = SessionStore::in_memory();
        let notifier = RecordingNotifier::new();

        assert!(login(&api, &session, &notifier, "ada@example.com", "bad")
            .await
            .is_err());
        assert!(!session.is_authenticated());
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Error, "Invalid credentials".to_string()))
        );
    }

    #[tokio::test]
    async fn test_login_failure_fallback() {
        let api = MockApi::new();
        api.fail_next("login", None);
        let notifier = RecordingNotifier::new();

        let _ = login(&api, &SessionStore::in_memory(), &notifier, "ada@example.com", "pw").await;
        assert_eq!(notifier.messages(), vec!["Login failed".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_email_issues_no_request() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();

        let err = register(&api, &notifier, "Ada", "not-an-email", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(api.calls().is_empty());
        assert_eq!(notifier.messages(), vec![INVALID_EMAIL.to_string()]);
    }

    #[tokio::test]
    async fn test_register_notice() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();

        register(&api, &notifier, "Ada", "ada@example.com", "pw")
            .await
            .unwrap();
        assert_eq!(api.calls(), vec!["register".to_string()]);
        assert_eq!(notifier.messages(), vec![REGISTERED.to_string()]);
    }

    #[tokio::test]
    async fn test_reset_flow_messages() {
        let api = MockApi::new();
        let notifier = RecordingNotifier::new();

        let sent = request_reset(&api, &notifier, "ada@example.com").await.unwrap();
        assert_eq!(sent, "OTP sent to your email");

        api.set_message("verify_otp", "Password updated");
        let done = verify_otp(&api, &notifier, "ada@example.com", "123456", "Secret1")
            .await
            .unwrap();
        assert_eq!(done, "Password updated");
    }

    #[tokio::test]
    async fn test_verify_otp_failure_fallback() {
        let api = MockApi::new();
        api.fail_next("verify_otp", None);
        let notifier = RecordingNotifier::new();

        let _ = verify_otp(&api, &notifier, "ada@example.com", "000000", "Secret1").await;
        assert_eq!(
            notifier.last(),
            Some((NoticeLevel::Error, "OTP verification failed".to_string()))
        );
    }

    #[test]
    fn test_require_session_without_login() {
        let session = SessionStore::in_memory();
        assert!(matches!(
            require_session(&session),
            Err(ClientError::NotAuthenticated)
        ));
    }
}
