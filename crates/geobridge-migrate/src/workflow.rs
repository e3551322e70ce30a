//! Verification and migration of scenario features into a diagram project.
//!
//! States move `Idle -> Verifying -> Verified -> Migrating -> Done`. Blank
//! input moves straight to `Failed`, as does a remote error while verifying.
//! A reachable but misconfigured project returns to `Idle`. A finished
//! migration can be run again from `Done`.

use futures::stream::{self, StreamExt};
use geobridge_core::error::{BridgeError, Result};
use geobridge_core::models::{DiagramKind, MigrationRecord, SourceFeatureRecord, SystemId};
use geobridge_core::ports::DiagramService;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::console::ConsoleLog;
use crate::convert::to_migration_record;
use crate::lookup::CategoryLookupTable;

/// Default number of create requests in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

const BLANK_INPUT_MESSAGE: &str = "Please provide a valid API Token and Project ID";
const NOT_ESRI_MESSAGE: &str =
    "The project is not an ESRI workspace project, we cannot migrate data at this time.";
const NOT_SET_UP_MESSAGE: &str =
    "The project is not setup correctly, please contact your administrator";
const VERIFIED_MESSAGE: &str = "Project successfully verified, ready for data migration..";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationState {
    Idle,
    Verifying,
    Verified,
    Migrating,
    Done,
    Failed,
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationState::Idle => "idle",
            MigrationState::Verifying => "verifying",
            MigrationState::Verified => "verified",
            MigrationState::Migrating => "migrating",
            MigrationState::Done => "done",
            MigrationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn transition_allowed(from: MigrationState, to: MigrationState) -> bool {
    use MigrationState::*;

    matches!(
        (from, to),
        (Idle | Verified | Done | Failed, Verifying)
            | (Idle | Verified | Done | Failed, Failed)
            | (Verifying, Verified | Idle | Failed)
            | (Verified | Done, Migrating)
            | (Migrating, Done)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Whether records are created as projects or policies
    pub kind: DiagramKind,
    /// Create requests in flight at once; 0 is treated as 1
    pub concurrency: usize,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self { kind: DiagramKind::Project, concurrency: DEFAULT_CONCURRENCY }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The category resolves to no system of the project
    UnmappedCategory,
    /// The feature geometry is `null`
    MissingGeometry,
}

/// A source record that will not be submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    /// Position in the source sequence
    pub index: usize,
    pub category: Option<String>,
    pub reason: SkipReason,
}

impl SkippedRecord {
    /// Error describing why the record was left out
    pub fn error(&self) -> BridgeError {
        match self.reason {
            SkipReason::UnmappedCategory => BridgeError::UnmappedCategory {
                category: self.category.clone().unwrap_or_else(|| "<none>".to_string()),
            },
            SkipReason::MissingGeometry => BridgeError::MissingGeometry,
        }
    }
}

/// A source record whose create request failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRecord {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSubmission {
    pub index: usize,
    pub system: SystemId,
    pub record: MigrationRecord,
}

/// Converted records split into what will be submitted and what is skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationPlan {
    pub submissions: Vec<PlannedSubmission>,
    pub skipped: Vec<SkippedRecord>,
}

/// Result of one source record, reported as the migration progresses
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Submitted { index: usize, created: serde_json::Value },
    Skipped(SkippedRecord),
    Failed(FailedRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub total: usize,
    pub submitted: usize,
    pub skipped: Vec<SkippedRecord>,
    /// Ordered by source position
    pub failed: Vec<FailedRecord>,
}

impl MigrationReport {
    pub fn all_submitted(&self) -> bool {
        self.submitted == self.total
    }
}

#[derive(Debug)]
struct VerifiedProject {
    project_id: String,
    lookup: Arc<CategoryLookupTable>,
}

#[derive(Debug)]
struct Inner {
    state: MigrationState,
    verified: Option<VerifiedProject>,
}

/// Drives verification of a diagram project and migration of records into it
pub struct MigrationWorkflow {
    service: Arc<dyn DiagramService>,
    options: MigrationOptions,
    console: ConsoleLog,
    inner: Mutex<Inner>,
}

impl MigrationWorkflow {
    pub fn new(service: Arc<dyn DiagramService>, options: MigrationOptions) -> Self {
        Self {
            service,
            options,
            console: ConsoleLog::new(),
            inner: Mutex::new(Inner { state: MigrationState::Idle, verified: None }),
        }
    }

    /// Write to an existing console instead of a fresh one
    pub fn with_console(mut self, console: ConsoleLog) -> Self {
        self.console = console;
        self
    }

    pub fn state(&self) -> MigrationState {
        self.lock().state
    }

    /// Whether [`migrate_diagrams`](Self::migrate_diagrams) may run
    pub fn is_migration_enabled(&self) -> bool {
        let inner = self.lock();
        matches!(inner.state, MigrationState::Verified | MigrationState::Done)
            && inner.verified.is_some()
    }

    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    /// Lookup table of the verified project, if any
    pub fn lookup(&self) -> Option<Arc<CategoryLookupTable>> {
        self.lock().verified.as_ref().map(|v| v.lookup.clone())
    }

    /// Check that `project_id` exists, is reachable with `api_token`, and can receive records
    ///
    /// On success the project's systems populate the category lookup and
    /// migration is enabled. A project that is reachable but misconfigured
    /// leaves the workflow idle; any other failure leaves it failed.
    ///
    /// A call rejected because a migration is running keeps the console as
    /// it is and appends the rejection.
    pub async fn verify_project(&self, project_id: &str, api_token: &str) -> Result<()> {
        let (project_id, api_token) = (project_id.trim(), api_token.trim());
        let blank = project_id.is_empty() || api_token.is_empty();

        let next = if blank { MigrationState::Failed } else { MigrationState::Verifying };
        if let Err(e) = self.transition(next, "verify") {
            self.console.error(e.to_string());
            return Err(e);
        }
        self.console.clear();

        if blank {
            self.console.error(BLANK_INPUT_MESSAGE);
            return Err(BridgeError::Validation(BLANK_INPUT_MESSAGE.to_string()));
        }

        tracing::info!(project = %project_id, "Verifying project");

        match self.run_verification(project_id, api_token).await {
            Ok(lookup) => {
                {
                    let mut inner = self.lock();
                    inner.verified = Some(VerifiedProject {
                        project_id: project_id.to_string(),
                        lookup: Arc::new(lookup),
                    });
                }
                self.transition(MigrationState::Verified, "verify")?;
                self.console.info(VERIFIED_MESSAGE);
                Ok(())
            }
            Err(e) => {
                let next = match e {
                    BridgeError::Validation(_) => MigrationState::Idle,
                    _ => MigrationState::Failed,
                };
                self.transition(next, "verify")?;
                self.console.error(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_verification(
        &self,
        project_id: &str,
        api_token: &str,
    ) -> Result<CategoryLookupTable> {
        let project = self.service.project(project_id, api_token).await?;
        if project.external_connection.as_deref() != Some("esri") {
            self.console.json(&serde_json::to_value(&project).unwrap_or_default());
            return Err(BridgeError::Validation(NOT_ESRI_MESSAGE.to_string()));
        }

        let systems = self.service.systems(project_id, api_token).await?;
        CategoryLookupTable::from_verified(systems).map_err(|missing| {
            let missing: Vec<String> =
                missing.iter().map(|m| format!("{} {}", m.name, m.color)).collect();
            tracing::warn!(missing = %missing.join(", "), "Project is missing expected systems");
            BridgeError::Validation(NOT_SET_UP_MESSAGE.to_string())
        })
    }

    /// Convert `records` and split them into submissions and skips
    ///
    /// Requires `project_id` to be the verified project. Nothing is sent.
    pub fn plan(&self, records: &[SourceFeatureRecord], project_id: &str) -> Result<MigrationPlan> {
        let lookup = self.verified_lookup(project_id.trim())?;

        let mut plan = MigrationPlan::default();
        for (index, source) in records.iter().enumerate() {
            let system = lookup.resolve_category(source.category.as_deref().unwrap_or_default());
            let skip = |reason| SkippedRecord { index, category: source.category.clone(), reason };
            if !system.is_mapped() {
                plan.skipped.push(skip(SkipReason::UnmappedCategory));
                continue;
            }
            match to_migration_record(source) {
                Some(record) => plan.submissions.push(PlannedSubmission { index, system, record }),
                None => plan.skipped.push(skip(SkipReason::MissingGeometry)),
            }
        }
        Ok(plan)
    }

    /// Convert and submit every record to the verified project
    pub async fn migrate_diagrams(
        &self,
        records: &[SourceFeatureRecord],
        project_id: &str,
        api_token: &str,
    ) -> Result<MigrationReport> {
        self.migrate_diagrams_with(records, project_id, api_token, |_| {}).await
    }

    /// Like [`migrate_diagrams`](Self::migrate_diagrams), calling `on_record`
    /// as each record settles
    ///
    /// Records are submitted independently with bounded concurrency, so
    /// outcomes arrive in completion order. A failed submission is recorded
    /// and the rest continue.
    pub async fn migrate_diagrams_with<F>(
        &self,
        records: &[SourceFeatureRecord],
        project_id: &str,
        api_token: &str,
        mut on_record: F,
    ) -> Result<MigrationReport>
    where
        F: FnMut(&RecordOutcome),
    {
        let (project_id, api_token) = (project_id.trim(), api_token.trim());
        if project_id.is_empty() || api_token.is_empty() {
            self.console.error(BLANK_INPUT_MESSAGE);
            return Err(BridgeError::Validation(BLANK_INPUT_MESSAGE.to_string()));
        }

        let plan = match self
            .plan(records, project_id)
            .and_then(|plan| self.transition(MigrationState::Migrating, "migrate").map(|_| plan))
        {
            Ok(plan) => plan,
            Err(e) => {
                self.console.error(e.to_string());
                return Err(e);
            }
        };
        self.console.clear();
        self.console.info(format!(
            "Migrating {} of {} records as {}",
            plan.submissions.len(),
            records.len(),
            self.options.kind.as_str()
        ));

        let mut report = MigrationReport { total: records.len(), ..Default::default() };

        for skipped in plan.skipped {
            self.console.notice(format!("Record {}: {}", skipped.index + 1, skipped.error()));
            on_record(&RecordOutcome::Skipped(skipped.clone()));
            report.skipped.push(skipped);
        }

        let service = &self.service;
        let kind = self.options.kind;
        let mut submissions = stream::iter(plan.submissions)
            .map(|planned| async move {
                let result = service
                    .add_diagram(project_id, api_token, planned.system, kind, &planned.record)
                    .await;
                (planned.index, result)
            })
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some((index, result)) = submissions.next().await {
            let outcome = match result {
                Ok(created) => {
                    self.console.json(&created);
                    report.submitted += 1;
                    RecordOutcome::Submitted { index, created }
                }
                Err(e) => {
                    self.console.error(format!("Record {} failed: {}", index + 1, e));
                    let failed = FailedRecord { index, message: e.to_string() };
                    report.failed.push(failed.clone());
                    RecordOutcome::Failed(failed)
                }
            };
            on_record(&outcome);
        }
        drop(submissions);

        report.failed.sort_by_key(|f| f.index);
        self.transition(MigrationState::Done, "migrate")?;
        tracing::info!(
            total = report.total,
            submitted = report.submitted,
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Migration finished"
        );
        Ok(report)
    }

    fn verified_lookup(&self, project_id: &str) -> Result<Arc<CategoryLookupTable>> {
        let inner = self.lock();
        if !matches!(inner.state, MigrationState::Verified | MigrationState::Done) {
            return Err(BridgeError::InvalidState {
                state: inner.state.to_string(),
                operation: "migrate".to_string(),
            });
        }

        match &inner.verified {
            Some(verified) if verified.project_id == project_id => Ok(verified.lookup.clone()),
            _ => Err(BridgeError::Validation(format!(
                "Project {} has not been verified",
                project_id
            ))),
        }
    }

    fn transition(&self, to: MigrationState, operation: &str) -> Result<()> {
        let mut inner = self.lock();
        let from = inner.state;
        if !transition_allowed(from, to) {
            return Err(BridgeError::InvalidState {
                state: from.to_string(),
                operation: operation.to_string(),
            });
        }

        if matches!(to, MigrationState::Verifying | MigrationState::Failed) {
            inner.verified = None;
        }
        inner.state = to;
        tracing::debug!(from = %from, to = %to, "Migration state changed");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
