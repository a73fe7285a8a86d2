//! Terminal-session authenticator
//!
//! Application passwords are typed at a masked `inquire` prompt. Biometric
//! checks run `fprintd-verify` on Linux. A terminal session has no way to
//! raise the device passcode sheet, so that gate is reported unavailable.

use tokio::process::Command;
use zeroize::Zeroizing;

use crate::biometry::BiometryType;
use crate::policy::AccessControlPolicy;
use crate::traits::{AuthError, Authenticator, PasswordPurpose};

pub struct TerminalAuthenticator {
    biometry: Option<BiometryType>,
    user: Option<String>,
}

impl TerminalAuthenticator {
    /// `biometry` is the capability the caller's probe detected
    pub fn new(biometry: Option<BiometryType>) -> Self {
        Self {
            biometry,
            user: std::env::var("USER").ok(),
        }
    }

    fn has_fingerprint_reader(&self) -> bool {
        cfg!(target_os = "linux") && self.biometry == Some(BiometryType::Fingerprint)
    }

    async fn verify_fingerprint(&self, reason: &str) -> Result<(), AuthError> {
        eprintln!("{}", reason);
        let mut command = Command::new("fprintd-verify");
        if let Some(user) = &self.user {
            command.arg(user);
        }
        let status = command
            .status()
            .await
            .map_err(|e| AuthError::Unavailable(format!("fprintd-verify: {}", e)))?;
        if status.success() {
            Ok(())
        } else {
            tracing::debug!(status = %status, "Fingerprint verification failed");
            Err(AuthError::Failed("fingerprint did not match".into()))
        }
    }
}

fn map_prompt_error(err: inquire::InquireError) -> AuthError {
    match err {
        inquire::InquireError::OperationCanceled
        | inquire::InquireError::OperationInterrupted => AuthError::Cancelled,
        inquire::InquireError::NotTTY => {
            AuthError::Unavailable("no terminal available for password entry".into())
        }
        other => AuthError::Failed(other.to_string()),
    }
}

#[async_trait::async_trait]
impl Authenticator for TerminalAuthenticator {
    fn supports(&self, policy: AccessControlPolicy) -> bool {
        match policy {
            AccessControlPolicy::None | AccessControlPolicy::ApplicationPassword => true,
            AccessControlPolicy::DevicePasscode => false,
            AccessControlPolicy::BiometryCurrentSet => self.has_fingerprint_reader(),
        }
    }

    async fn verify_presence(
        &self,
        policy: AccessControlPolicy,
        reason: &str,
    ) -> Result<(), AuthError> {
        match policy {
            AccessControlPolicy::BiometryCurrentSet if self.has_fingerprint_reader() => {
                self.verify_fingerprint(reason).await
            }
            AccessControlPolicy::BiometryCurrentSet => Err(AuthError::Unavailable(
                "no enrolled fingerprint reader".into(),
            )),
            AccessControlPolicy::DevicePasscode => Err(AuthError::Unavailable(
                "device passcode prompts are not available in a terminal session".into(),
            )),
            AccessControlPolicy::None | AccessControlPolicy::ApplicationPassword => Ok(()),
        }
    }

    async fn request_password(
        &self,
        reason: &str,
        purpose: PasswordPurpose,
    ) -> Result<Zeroizing<String>, AuthError> {
        let message = reason.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let prompt = inquire::Password::new(&message)
                .with_display_mode(inquire::PasswordDisplayMode::Masked);
            let prompt = match purpose {
                PasswordPurpose::Create => {
                    prompt.with_custom_confirmation_message("Confirm password:")
                }
                PasswordPurpose::Unlock => prompt.without_confirmation(),
            };
            prompt.prompt()
        })
        .await
        .map_err(|e| AuthError::Failed(format!("password prompt failed: {}", e)))?;

        answer.map(Zeroizing::new).map_err(map_prompt_error)
    }
}
