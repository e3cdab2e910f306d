//! Conversational login state machine
//!
//! One chat message at a time drives a chat from `Start` through the email
//! and password steps to `Success` or `Error`. The machine is a closed enum
//! with an explicit transition function; a failed transition is never an
//! `Err`, it is the `Error` variant, and callers inspect the resulting step.
//!
//! Side effects are confined to the account lookup and password check done
//! through [`AccountLookup`]; persisting the resulting chat binding is the
//! caller's job (see `services::login`).

use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::services::account::AccountLookup;
use crate::services::channel::ButtonRows;
use crate::utils::errors::Result;

pub const MSG_ENTER_EMAIL: &str = "Enter your account email to sign in";
pub const MSG_ENTER_PASSWORD: &str = "Enter your password";
pub const MSG_REGISTRATION_FAILED: &str = "Registration failed";
pub const MSG_AUTH_ERROR: &str = "Authentication error! Retry in 30 seconds...";

/// Position of a chat in the login conversation.
///
/// Serialized per chat with a TTL; expiry restarts the conversation from
/// `Start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum LoginStep {
    /// Bootstrap placeholder used when no cached session exists
    Start,
    AwaitingEmail,
    AwaitingPassword { email: String, account_id: Uuid },
    /// Loops on itself; only session TTL expiry leaves it
    Error,
    /// Terminal; carries the authenticated account
    Success { account_id: Uuid },
}

impl LoginStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoginStep::Success { .. } | LoginStep::Error)
    }
}

/// Result of advancing the machine by one input
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step: LoginStep,
    pub message: Option<String>,
    pub markup: Option<ButtonRows>,
}

impl StepOutcome {
    fn silent(step: LoginStep) -> Self {
        Self { step, message: None, markup: None }
    }

    fn with_message(step: LoginStep, message: &str) -> Self {
        Self { step, message: Some(message.to_string()), markup: None }
    }
}

/// Syntactic email check; no lookup is performed for non-matches
pub(crate) fn is_email(input: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    });
    re.is_match(input)
}

/// Deterministic transition function over [`LoginStep`]
#[derive(Clone)]
pub struct LoginStepMachine {
    accounts: Arc<dyn AccountLookup>,
}

impl LoginStepMachine {
    pub fn new(accounts: Arc<dyn AccountLookup>) -> Self {
        Self { accounts }
    }

    /// Advance one step with one inbound input
    pub async fn advance(&self, step: LoginStep, input: &str) -> Result<StepOutcome> {
        match step {
            LoginStep::Start => {
                // Unconditionally move forward; the input that woke us up is
                // not yet credential material.
                Ok(StepOutcome::with_message(LoginStep::AwaitingEmail, MSG_ENTER_EMAIL))
            }

            LoginStep::AwaitingEmail => self.advance_email(input).await,

            LoginStep::AwaitingPassword { email, account_id } => {
                self.advance_password(&email, account_id, input).await
            }

            LoginStep::Error => {
                Ok(StepOutcome::with_message(LoginStep::Error, MSG_AUTH_ERROR))
            }

            step @ LoginStep::Success { .. } => Ok(StepOutcome::silent(step)),
        }
    }

    async fn advance_email(&self, input: &str) -> Result<StepOutcome> {
        if !is_email(input) {
            return Ok(StepOutcome::with_message(LoginStep::AwaitingEmail, MSG_ENTER_EMAIL));
        }

        match self.accounts.find_active_by_email(input).await? {
            None => {
                debug!(email = input, "No active account for email");
                Ok(StepOutcome::with_message(LoginStep::Error, MSG_REGISTRATION_FAILED))
            }
            Some(account) => Ok(StepOutcome::with_message(
                LoginStep::AwaitingPassword {
                    email: input.to_string(),
                    account_id: account.id,
                },
                MSG_ENTER_PASSWORD,
            )),
        }
    }

    async fn advance_password(
        &self,
        email: &str,
        account_id: Uuid,
        input: &str,
    ) -> Result<StepOutcome> {
        let account = match self.accounts.find_by_id(account_id).await? {
            Some(account) => account,
            None => {
                debug!(email = email, "Pending account disappeared before password check");
                return Ok(StepOutcome::with_message(LoginStep::Error, MSG_AUTH_ERROR));
            }
        };

        if self.accounts.verify_password(&account, input).await? {
            Ok(StepOutcome::silent(LoginStep::Success { account_id }))
        } else {
            Ok(StepOutcome::with_message(LoginStep::Error, MSG_AUTH_ERROR))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::account::AccountRef;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct StubAccounts {
        account: AccountRef,
        password: String,
    }

    impl StubAccounts {
        fn machine(email: &str, password: &str) -> (LoginStepMachine, Uuid) {
            let id = Uuid::new_v4();
            let stub = Self {
                account: AccountRef::new(id, email, "stub-hash"),
                password: password.to_string(),
            };
            (LoginStepMachine::new(Arc::new(stub)), id)
        }
    }

    #[async_trait]
    impl AccountLookup for StubAccounts {
        async fn find_active_by_email(&self, email: &str) -> Result<Option<AccountRef>> {
            Ok((email == self.account.email).then(|| self.account.clone()))
        }

        async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountRef>> {
            Ok((account_id == self.account.id).then(|| self.account.clone()))
        }

        async fn verify_password(&self, _account: &AccountRef, plaintext: &str) -> Result<bool> {
            Ok(plaintext == self.password)
        }
    }

    #[tokio::test]
    async fn test_start_bootstraps_to_email_prompt() {
        let (machine, _) = StubAccounts::machine("user@example.com", "pw");

        let outcome = machine.advance(LoginStep::Start, "/login").await.unwrap();
        assert_eq!(outcome.step, LoginStep::AwaitingEmail);
        assert_eq!(outcome.message.as_deref(), Some(MSG_ENTER_EMAIL));
    }

    #[tokio::test]
    async fn test_invalid_email_syntax_reprompts_without_lookup() {
        let (machine, _) = StubAccounts::machine("user@example.com", "pw");

        let outcome = machine.advance(LoginStep::AwaitingEmail, "not an email").await.unwrap();
        assert_eq!(outcome.step, LoginStep::AwaitingEmail);
        assert_eq!(outcome.message.as_deref(), Some(MSG_ENTER_EMAIL));
    }

    #[tokio::test]
    async fn test_unknown_email_fails_registration() {
        let (machine, _) = StubAccounts::machine("user@example.com", "pw");

        let outcome = machine
            .advance(LoginStep::AwaitingEmail, "other@example.com")
            .await
            .unwrap();
        assert_eq!(outcome.step, LoginStep::Error);
        assert_eq!(outcome.message.as_deref(), Some(MSG_REGISTRATION_FAILED));
    }

    #[tokio::test]
    async fn test_email_then_password_reaches_success() {
        let (machine, account_id) = StubAccounts::machine("user@example.com", "hunter2");

        let outcome = machine
            .advance(LoginStep::AwaitingEmail, "user@example.com")
            .await
            .unwrap();
        assert_matches!(&outcome.step, LoginStep::AwaitingPassword { email, .. }
            if email == "user@example.com");
        assert_eq!(outcome.message.as_deref(), Some(MSG_ENTER_PASSWORD));

        let outcome = machine.advance(outcome.step, "hunter2").await.unwrap();
        assert_eq!(outcome.step, LoginStep::Success { account_id });
        assert_eq!(outcome.message, None);
    }

    #[tokio::test]
    async fn test_wrong_password_always_errors() {
        let (machine, account_id) = StubAccounts::machine("user@example.com", "hunter2");

        let pending = LoginStep::AwaitingPassword {
            email: "user@example.com".to_string(),
            account_id,
        };

        let outcome = machine.advance(pending, "wrongpass").await.unwrap();
        assert_eq!(outcome.step, LoginStep::Error);
        assert_eq!(outcome.message.as_deref(), Some(MSG_AUTH_ERROR));
    }

    #[tokio::test]
    async fn test_error_step_loops_and_reannounces() {
        let (machine, _) = StubAccounts::machine("user@example.com", "pw");

        for input in ["user@example.com", "pw", "anything"] {
            let outcome = machine.advance(LoginStep::Error, input).await.unwrap();
            assert_eq!(outcome.step, LoginStep::Error);
            assert_eq!(outcome.message.as_deref(), Some(MSG_AUTH_ERROR));
        }
    }

    #[tokio::test]
    async fn test_success_is_terminal_and_silent() {
        let (machine, account_id) = StubAccounts::machine("user@example.com", "pw");

        let success = LoginStep::Success { account_id };
        let outcome = machine.advance(success.clone(), "more input").await.unwrap();
        assert_eq!(outcome.step, success);
        assert_eq!(outcome.message, None);
    }

    #[test]
    fn test_email_syntax() {
        assert!(is_email("user@example.com"));
        assert!(is_email("a.b+c@sub.domain.org"));
        assert!(!is_email("user@example"));
        assert!(!is_email("plaintext"));
        assert!(!is_email("two words@example.com"));
    }

    #[test]
    fn test_step_serialization_round_trip() {
        let step = LoginStep::AwaitingPassword {
            email: "user@example.com".to_string(),
            account_id: Uuid::new_v4(),
        };
        let json = serde_json::to_string(&step).unwrap();
        let restored: LoginStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, restored);
    }
}
