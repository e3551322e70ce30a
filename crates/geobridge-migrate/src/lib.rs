//! geobridge migrate - Diagram conversion and migration
//!
//! Verifies that a diagram project can receive scenario features, converts
//! those features into create-diagram records, and submits them.

pub mod console;
pub mod convert;
pub mod lookup;
pub mod workflow;

pub use console::{ConsoleEntry, ConsoleLevel, ConsoleLog};
pub use convert::{normalize_feature_type, to_migration_record};
pub use lookup::{CategoryLookupTable, ExpectedSystem, EXPECTED_SYSTEMS};
pub use workflow::{
    FailedRecord, MigrationOptions, MigrationPlan, MigrationReport, MigrationState,
    MigrationWorkflow, PlannedSubmission, RecordOutcome, SkipReason, SkippedRecord,
    DEFAULT_CONCURRENCY,
};
