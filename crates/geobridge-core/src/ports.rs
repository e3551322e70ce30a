//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod diagram;
pub mod display;
pub mod identity;
pub mod platform;

pub use diagram::DiagramService;
pub use display::{DisplayLayer, DisplayLayerKind, FeatureView, MapDisplay, ResultPresenter};
pub use identity::IdentityProvider;
pub use platform::ContentPlatform;
