use tracing::{error, info, warn};

use super::buckets::{configure_hosting, provision_buckets, BucketStatus};
use super::function::{deploy_function, function_spec, package_handler};
use super::site::publish_site;
use super::table::ensure_table;
use super::trigger::{bind_trigger, invoke_grant};
use super::DeployConfig;
use crate::adapters::provider::{FunctionApi, StorageApi, TableApi};
use crate::runtime::outcome::{DeployAbort, DeploymentOutcome, Step, StepOutcome};

/// Drives table → buckets → hosting → function → trigger → site in order.
///
/// Step failures are recorded and the run continues against the planned
/// names. The only abort is a missing handler artifact, checked right before
/// the function step.
pub struct Orchestrator<'a, T, S, F> {
    config: &'a DeployConfig,
    tables: &'a T,
    storage: &'a S,
    functions: &'a F,
}

impl<'a, T, S, F> Orchestrator<'a, T, S, F>
where
    T: TableApi,
    S: StorageApi,
    F: FunctionApi,
{
    pub fn new(config: &'a DeployConfig, tables: &'a T, storage: &'a S, functions: &'a F) -> Self {
        Self {
            config,
            tables,
            storage,
            functions,
        }
    }

    pub fn run(&self) -> Result<DeploymentOutcome, DeployAbort> {
        let config = self.config;
        let names = &config.names;
        let timings = &config.timings;
        let mut outcome = DeploymentOutcome::new();
        info!(component = "orchestrator", event = "deployment_started", project_id = %config.identity, region = %config.region);

        let table = ensure_table(self.tables, &names.table, timings.table_ready);
        outcome.record(Step::Table, &names.table, table);

        let statuses = provision_buckets(
            self.storage,
            &names.buckets(),
            timings.bucket_ready,
            &mut outcome,
        );
        let web_status = statuses
            .into_iter()
            .find(|status| status.name == names.web_bucket)
            .unwrap_or_else(|| BucketStatus {
                name: names.web_bucket.clone(),
                ready: false,
            });
        let hosting = configure_hosting(self.storage, &web_status);
        outcome.record(Step::Hosting, &names.web_bucket, hosting);

        let package = match package_handler(&config.artifact_path) {
            Ok(value) => value,
            Err(artifact_error) => {
                error!(component = "orchestrator", event = "deployment_aborted", error = %artifact_error);
                return Err(DeployAbort {
                    outcome,
                    reason: artifact_error.to_string(),
                });
            }
        };

        let function_arn = match &config.role_arn {
            Some(role_arn) => {
                let spec = function_spec(&names.function, role_arn, &names.table, package);
                let (deployed, arn) =
                    deploy_function(self.functions, &spec, timings.function_ready);
                outcome.record(Step::Function, &names.function, deployed);
                arn
            }
            None => {
                error!(component = "orchestrator", event = "function_skipped", function = %names.function, reason = "no execution role");
                outcome.record(
                    Step::Function,
                    &names.function,
                    StepOutcome::Failed("skipped: no execution role resolved".to_string()),
                );
                None
            }
        };

        match function_arn {
            Some(arn) => bind_trigger(
                self.functions,
                self.storage,
                &invoke_grant(names),
                &names.input_bucket,
                &arn,
                timings.notification_retry,
                &mut outcome,
            ),
            None => outcome.record(
                Step::Notification,
                &names.input_bucket,
                StepOutcome::Failed("skipped: no function ARN available".to_string()),
            ),
        }

        publish_site(
            self.storage,
            &config.template_path,
            &names.input_bucket,
            &names.web_bucket,
            timings.public_access_settle,
            &mut outcome,
        );

        let failed = outcome.failed().count();
        let warnings = outcome.warnings().count();
        if failed == 0 && warnings == 0 {
            info!(component = "orchestrator", event = "deployment_completed", project_id = %config.identity);
        } else {
            warn!(component = "orchestrator", event = "deployment_degraded", project_id = %config.identity, failed, warnings);
        }
        Ok(outcome)
    }
}
