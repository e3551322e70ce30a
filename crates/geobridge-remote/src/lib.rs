//! geobridge remote - HTTP adapters
//!
//! A shared JSON client plus the adapters for the content platform,
//! its identity service, and the diagram migration API.

pub mod client;
pub mod diagram;
pub mod identity;
pub mod portal;

pub use client::{ClientConfig, RemoteClient, RequestOptions, StatusMessages};
pub use diagram::DiagramApiClient;
pub use identity::{oauth_authorize_url, StaticTokenIdentity};
pub use portal::PortalClient;
