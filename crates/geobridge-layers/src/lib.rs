//! geobridge layers - Session, layer toggling and geometry-triggered queries
//!
//! This crate drives the map side of the workflow: it establishes the portal
//! session, loads and caches resources as they are toggled on, tracks which
//! sub-resource spatial queries target, and answers drawn geometries with the
//! features they intersect.

pub mod analysis;
pub mod controller;
pub mod display;
pub mod memory;
pub mod session;
pub mod spatial;

pub use analysis::{summarize_interventions, QueryOutcome, QueryWorkflow};
pub use controller::LayerController;
pub use display::{HeadlessDisplay, LocalFeatureView};
pub use memory::{MemoryPlatform, RecordingPresenter};
pub use session::SessionManager;
