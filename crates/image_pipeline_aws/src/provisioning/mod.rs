//! Sequential provisioning of the pipeline's cloud resources.
//!
//! Each component returns or records a [`StepOutcome`]; only the orchestrator
//! decides whether a failure ends the run.
//!
//! [`StepOutcome`]: crate::runtime::outcome::StepOutcome

use std::path::PathBuf;
use std::time::Duration;

use crate::runtime::naming::{ProjectIdentity, ResourceNames};
use crate::runtime::wait::{RetryPolicy, WaitPolicy};

pub mod buckets;
pub mod function;
pub mod orchestrator;
pub mod site;
pub mod table;
pub mod trigger;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const FUNCTION_RUNTIME: &str = "provided.al2023";
pub const FUNCTION_HANDLER: &str = "bootstrap";
pub const FUNCTION_TIMEOUT_SECS: i32 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    pub table_ready: WaitPolicy,
    pub bucket_ready: WaitPolicy,
    pub function_ready: WaitPolicy,
    pub notification_retry: RetryPolicy,
    pub public_access_settle: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            table_ready: WaitPolicy::new(Duration::from_secs(60), Duration::from_secs(2)),
            bucket_ready: WaitPolicy::new(Duration::from_secs(30), Duration::from_secs(1)),
            function_ready: WaitPolicy::new(Duration::from_secs(60), Duration::from_secs(2)),
            notification_retry: RetryPolicy::default(),
            public_access_settle: Duration::from_secs(2),
        }
    }
}

impl Timings {
    /// No waiting between polls or retries.
    pub fn immediate() -> Self {
        Self {
            table_ready: WaitPolicy::immediate(),
            bucket_ready: WaitPolicy::immediate(),
            function_ready: WaitPolicy::immediate(),
            notification_retry: RetryPolicy::no_backoff(3),
            public_access_settle: Duration::ZERO,
        }
    }
}

/// Everything one orchestrator run needs, built once and passed down.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployConfig {
    pub region: String,
    pub identity: ProjectIdentity,
    pub names: ResourceNames,
    pub role_arn: Option<String>,
    pub artifact_path: PathBuf,
    pub template_path: PathBuf,
    pub timings: Timings,
}

impl DeployConfig {
    pub fn new(
        region: impl Into<String>,
        identity: ProjectIdentity,
        artifact_path: impl Into<PathBuf>,
        template_path: impl Into<PathBuf>,
    ) -> Self {
        let names = ResourceNames::derive(&identity);
        Self {
            region: region.into(),
            identity,
            names,
            role_arn: None,
            artifact_path: artifact_path.into(),
            template_path: template_path.into(),
            timings: Timings::default(),
        }
    }

    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }
}
