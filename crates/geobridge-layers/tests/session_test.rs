//! Integration tests for establishing a portal session

use async_trait::async_trait;
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::session::ANONYMOUS_LABEL;
use geobridge_core::models::{Credential, PortalUser};
use geobridge_core::ports::IdentityProvider;
use geobridge_layers::{MemoryPlatform, SessionManager};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Identity provider with a fixed stored token and a fixed challenge result
struct ScriptedIdentity {
    stored: Option<String>,
    challenge: Option<String>,
    sign_ins: AtomicUsize,
}

impl ScriptedIdentity {
    fn new(stored: Option<&str>, challenge: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            stored: stored.map(String::from),
            challenge: challenge.map(String::from),
            sign_ins: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl IdentityProvider for ScriptedIdentity {
    async fn check_sign_in_status(&self, sharing_url: &str) -> Result<Credential> {
        assert_eq!(sharing_url, "https://portal.test/sharing");
        self.stored
            .as_ref()
            .map(|token| Credential::new(token.clone(), sharing_url))
            .ok_or_else(|| BridgeError::Authentication { reason: "not signed in".to_string() })
    }

    async fn sign_in(&self, sharing_url: &str) -> Result<Credential> {
        self.sign_ins.fetch_add(1, Ordering::SeqCst);
        self.challenge
            .as_ref()
            .map(|token| Credential::new(token.clone(), sharing_url))
            .ok_or_else(|| BridgeError::Authentication { reason: "cancelled".to_string() })
    }
}

fn platform() -> MemoryPlatform {
    let platform = MemoryPlatform::new();
    platform.insert_user(
        "stored-token",
        PortalUser { username: "planner_jane".to_string(), full_name: None },
    );
    platform.insert_user(
        "fresh-token",
        PortalUser { username: "planner_joe".to_string(), full_name: None },
    );
    platform
}

#[tokio::test]
async fn test_restores_previous_sign_in() {
    let identity = ScriptedIdentity::new(Some("stored-token"), Some("fresh-token"));
    let manager = SessionManager::new(identity.clone(), Arc::new(platform()));
    let label = manager.subscribe();
    assert_eq!(*label.borrow(), ANONYMOUS_LABEL);

    let session = manager.establish_session("https://portal.test/").await.unwrap();

    assert_eq!(session.token(), Some("stored-token"));
    assert_eq!(*label.borrow(), "planner_jane");
    assert_eq!(identity.sign_ins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_stored_credential_falls_back_to_sign_in() {
    let identity = ScriptedIdentity::new(Some("expired-token"), Some("fresh-token"));
    let manager = SessionManager::new(identity.clone(), Arc::new(platform()));

    let session = manager.establish_session("https://portal.test").await.unwrap();

    assert_eq!(session.token(), Some("fresh-token"));
    assert_eq!(manager.current_label(), "planner_joe");
    assert_eq!(identity.sign_ins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_challenge_stays_anonymous() {
    let identity = ScriptedIdentity::new(None, None);
    let manager = SessionManager::new(identity, Arc::new(platform()));

    let err = manager.establish_session("https://portal.test").await.unwrap_err();

    assert!(matches!(err, BridgeError::Authentication { .. }));
    assert_eq!(manager.current_label(), ANONYMOUS_LABEL);
}

#[tokio::test]
async fn test_unresolved_user_keeps_credential() {
    let identity = ScriptedIdentity::new(None, Some("unknown-token"));
    let manager = SessionManager::new(identity, Arc::new(platform()));

    let session = manager.establish_session("https://portal.test").await.unwrap();

    assert!(session.is_authenticated());
    assert!(session.user.is_none());
    assert_eq!(manager.current_label(), ANONYMOUS_LABEL);
}
