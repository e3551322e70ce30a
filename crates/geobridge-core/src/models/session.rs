use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown for the current user when nobody is signed in
pub const ANONYMOUS_LABEL: &str = "[ not signed in ]";

/// Token issued by the identity service for a portal
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub server: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, server: impl Into<String>) -> Self {
        Self { token: token.into(), server: server.into() }
    }
}

// Tokens never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("server", &self.server)
            .finish()
    }
}

/// Identity of the signed-in portal user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalUser {
    pub username: String,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
}

/// An authenticated (or anonymous) session against a content platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub portal_url: String,
    pub user: Option<PortalUser>,
    pub credential: Option<Credential>,
}

impl Session {
    /// Session used when sign-in was cancelled or denied
    pub fn anonymous(portal_url: impl Into<String>) -> Self {
        Self { portal_url: portal_url.into(), user: None, credential: None }
    }

    pub fn authenticated(
        portal_url: impl Into<String>,
        credential: Credential,
        user: Option<PortalUser>,
    ) -> Self {
        Self { portal_url: portal_url.into(), user, credential: Some(credential) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    /// `{portal_url}/sharing`, the root the identity service is registered for
    pub fn sharing_url(&self) -> String {
        sharing_url(&self.portal_url)
    }

    /// Text for any "current user" label
    pub fn user_label(&self) -> String {
        user_label(self.user.as_ref())
    }
}

pub fn sharing_url(portal_url: &str) -> String {
    format!("{}/sharing", portal_url.trim_end_matches('/'))
}

pub fn user_label(user: Option<&PortalUser>) -> String {
    user.map(|u| u.username.clone()).unwrap_or_else(|| ANONYMOUS_LABEL.to_string())
}
