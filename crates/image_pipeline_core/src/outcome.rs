use std::fmt::{self, Write as _};

use thiserror::Error;

use crate::error::{CreateOutcome, ProviderError};
use crate::naming::{website_url, ResourceNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Table,
    Bucket,
    Cors,
    Hosting,
    Function,
    InvokePermission,
    Notification,
    SiteUpload,
    PublicAccessBlock,
    BucketPolicy,
    ObjectAcl,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Bucket => "bucket",
            Self::Cors => "cors",
            Self::Hosting => "hosting",
            Self::Function => "function",
            Self::InvokePermission => "invoke_permission",
            Self::Notification => "notification",
            Self::SiteUpload => "site_upload",
            Self::PublicAccessBlock => "public_access_block",
            Self::BucketPolicy => "bucket_policy",
            Self::ObjectAcl => "object_acl",
        }
    }

    /// Steps whose failure only degrades the deployment.
    pub fn is_best_effort(self) -> bool {
        matches!(
            self,
            Self::Cors | Self::PublicAccessBlock | Self::BucketPolicy | Self::ObjectAcl
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    AlreadyExists,
    Failed(String),
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<CreateOutcome> for StepOutcome {
    fn from(value: CreateOutcome) -> Self {
        match value {
            CreateOutcome::Created => Self::Succeeded,
            CreateOutcome::AlreadyPresent => Self::AlreadyExists,
        }
    }
}

impl From<Result<CreateOutcome, ProviderError>> for StepOutcome {
    fn from(value: Result<CreateOutcome, ProviderError>) -> Self {
        match value {
            Ok(outcome) => outcome.into(),
            Err(error) => Self::Failed(error.to_string()),
        }
    }
}

impl From<Result<(), ProviderError>> for StepOutcome {
    fn from(value: Result<(), ProviderError>) -> Self {
        match value {
            Ok(()) => Self::Succeeded,
            Err(error) => Self::Failed(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step: Step,
    pub resource: String,
    pub outcome: StepOutcome,
}

/// Side effects of one orchestrator run, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOutcome {
    records: Vec<StepRecord>,
}

impl DeploymentOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: Step, resource: impl Into<String>, outcome: StepOutcome) {
        self.records.push(StepRecord {
            step,
            resource: resource.into(),
            outcome,
        });
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn outcome_of(&self, step: Step, resource: &str) -> Option<&StepOutcome> {
        self.records
            .iter()
            .rev()
            .find(|record| record.step == step && record.resource == resource)
            .map(|record| &record.outcome)
    }

    pub fn created(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|record| record.outcome.is_ok())
    }

    /// Failed steps that are not best-effort.
    pub fn failed(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|record| !record.outcome.is_ok() && !record.step.is_best_effort())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|record| !record.outcome.is_ok() && record.step.is_best_effort())
    }

    pub fn is_clean(&self) -> bool {
        self.records.iter().all(|record| record.outcome.is_ok())
    }

    pub fn report(&self, region: &str, names: &ResourceNames) -> String {
        let mut out = String::new();
        let headline = if self.is_clean() {
            "Deployment complete"
        } else {
            "Deployment finished with warnings"
        };
        let _ = writeln!(out, "{headline}");

        for record in self.failed() {
            let _ = writeln!(
                out,
                "  failed  {} {}: {}",
                record.step,
                record.resource,
                record.outcome.failure().unwrap_or_default()
            );
        }
        for record in self.warnings() {
            let _ = writeln!(
                out,
                "  warning {} {}: {}",
                record.step,
                record.resource,
                record.outcome.failure().unwrap_or_default()
            );
        }

        let _ = writeln!(out, "URL: {}", website_url(&names.web_bucket, region));
        let _ = writeln!(out, "Input bucket: {}", names.input_bucket);
        out
    }
}

/// Run stopped at the hard-fail point; carries everything done before it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("deployment aborted: {reason}")]
pub struct DeployAbort {
    pub outcome: DeploymentOutcome,
    pub reason: String,
}
