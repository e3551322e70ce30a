//! Establishing the portal session before any content request is made.

use geobridge_core::error::Result;
use geobridge_core::models::session::{sharing_url, user_label, ANONYMOUS_LABEL};
use geobridge_core::models::Session;
use geobridge_core::ports::{ContentPlatform, IdentityProvider};
use std::sync::Arc;
use tokio::sync::watch;

/// Restores or creates the portal session and publishes the signed-in user label
pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    platform: Arc<dyn ContentPlatform>,
    label: watch::Sender<String>,
}

impl SessionManager {
    pub fn new(identity: Arc<dyn IdentityProvider>, platform: Arc<dyn ContentPlatform>) -> Self {
        let (label, _) = watch::channel(ANONYMOUS_LABEL.to_string());
        Self { identity, platform, label }
    }

    /// Receiver for the user label; holds [`ANONYMOUS_LABEL`] until a session exists
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.label.subscribe()
    }

    pub fn current_label(&self) -> String {
        self.label.borrow().clone()
    }

    /// Restore a previous sign-in, falling back to the interactive challenge
    ///
    /// A restored credential is only accepted once the platform confirms who it
    /// belongs to. If the challenge fails the error is returned and the label
    /// stays anonymous.
    pub async fn establish_session(&self, portal_url: &str) -> Result<Session> {
        let sharing = sharing_url(portal_url);

        if let Some(session) = self.restore(portal_url, &sharing).await {
            tracing::info!(user = %session.user_label(), "Restored previous sign-in");
            self.publish(&session);
            return Ok(session);
        }

        let credential = match self.identity.sign_in(&sharing).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in did not complete");
                self.label.send_replace(ANONYMOUS_LABEL.to_string());
                return Err(e);
            }
        };

        let user = match self.platform.current_user(portal_url, &credential).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Signed in, but the user could not be resolved");
                None
            }
        };

        let session = Session::authenticated(portal_url, credential, user);
        tracing::info!(user = %session.user_label(), "Signed in");
        self.publish(&session);
        Ok(session)
    }

    async fn restore(&self, portal_url: &str, sharing: &str) -> Option<Session> {
        let credential = match self.identity.check_sign_in_status(sharing).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::debug!(reason = %e, "No stored credential");
                return None;
            }
        };

        match self.platform.current_user(portal_url, &credential).await {
            Ok(user) => Some(Session::authenticated(portal_url, credential, user)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential was rejected, signing in again");
                None
            }
        }
    }

    fn publish(&self, session: &Session) {
        self.label.send_replace(user_label(session.user.as_ref()));
    }
}
