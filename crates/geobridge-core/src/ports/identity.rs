use async_trait::async_trait;

use crate::error::Result;
use crate::models::Credential;

/// Port for the external identity service of a content platform
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Restore a credential from a previous sign-in without user interaction
    ///
    /// Any error means "not signed in"; callers fall through to [`sign_in`].
    ///
    /// [`sign_in`]: IdentityProvider::sign_in
    async fn check_sign_in_status(&self, sharing_url: &str) -> Result<Credential>;

    /// Run the interactive challenge and wait until the user completes or cancels it
    async fn sign_in(&self, sharing_url: &str) -> Result<Credential>;
}
