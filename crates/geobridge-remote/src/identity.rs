use async_trait::async_trait;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::Credential;
use geobridge_core::ports::IdentityProvider;

/// Out-of-band OAuth authorize URL; the user signs in there and copies the token back
pub fn oauth_authorize_url(portal_url: &str, app_id: &str) -> String {
    format!(
        "{}/sharing/rest/oauth2/authorize?client_id={}&response_type=token&expiration=120&redirect_uri=urn:ietf:wg:oauth:2.0:oob",
        portal_url.trim_end_matches('/'),
        app_id
    )
}

/// Identity provider backed by a token obtained ahead of time
///
/// It can only restore; there is no interactive challenge to run.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    token: Option<String>,
}

impl StaticTokenIdentity {
    pub fn new(token: Option<String>) -> Self {
        Self { token: token.filter(|t| !t.trim().is_empty()) }
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn check_sign_in_status(&self, sharing_url: &str) -> Result<Credential> {
        self.token
            .as_ref()
            .map(|token| Credential::new(token.clone(), sharing_url))
            .ok_or_else(|| BridgeError::Authentication {
                reason: "no stored credential".to_string(),
            })
    }

    async fn sign_in(&self, _sharing_url: &str) -> Result<Credential> {
        Err(BridgeError::Authentication {
            reason: "interactive sign-in is not available".to_string(),
        })
    }
}
