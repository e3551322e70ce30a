//! Interactive portal sign-in for the terminal.

use async_trait::async_trait;
use dialoguer::Password;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::Credential;
use geobridge_core::ports::IdentityProvider;
use geobridge_remote::{oauth_authorize_url, StaticTokenIdentity};

/// Restores from the configured token, otherwise asks the user to sign in
/// through the out-of-band OAuth page and paste the token back
pub struct PromptIdentity {
    portal_url: String,
    app_id: String,
    stored: StaticTokenIdentity,
}

impl PromptIdentity {
    pub fn new(
        portal_url: impl Into<String>,
        app_id: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        Self {
            portal_url: portal_url.into(),
            app_id: app_id.into(),
            stored: StaticTokenIdentity::new(token),
        }
    }
}

#[async_trait]
impl IdentityProvider for PromptIdentity {
    async fn check_sign_in_status(&self, sharing_url: &str) -> Result<Credential> {
        self.stored.check_sign_in_status(sharing_url).await
    }

    async fn sign_in(&self, sharing_url: &str) -> Result<Credential> {
        if !console::user_attended() {
            return Err(BridgeError::Authentication {
                reason: "no terminal to sign in from".to_string(),
            });
        }

        let url = oauth_authorize_url(&self.portal_url, &self.app_id);
        eprintln!("Sign in at:\n  {}\n", console::style(&url).cyan());

        let token = tokio::task::spawn_blocking(|| {
            Password::new()
                .with_prompt("Paste the access token")
                .allow_empty_password(true)
                .interact()
        })
        .await
        .map_err(prompt_failed)?
        .map_err(prompt_failed)?;

        let token = token.trim();
        if token.is_empty() {
            return Err(BridgeError::Authentication { reason: "sign-in cancelled".to_string() });
        }
        Ok(Credential::new(token, sharing_url))
    }
}

fn prompt_failed(error: impl std::fmt::Display) -> BridgeError {
    BridgeError::Authentication { reason: format!("sign-in prompt failed: {}", error) }
}
