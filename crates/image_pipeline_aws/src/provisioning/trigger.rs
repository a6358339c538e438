use tracing::{error, info, warn};

use crate::adapters::provider::{FunctionApi, PermissionGrant, StorageApi};
use crate::runtime::error::ProviderError;
use crate::runtime::naming::{bucket_arn, ResourceNames};
use crate::runtime::outcome::{DeploymentOutcome, Step, StepOutcome};
use crate::runtime::wait::{retry_when, RetryPolicy};

pub const INVOKE_ACTION: &str = "lambda:InvokeFunction";
pub const STORAGE_PRINCIPAL: &str = "s3.amazonaws.com";

/// Invocation grant restricted to events originating from the input bucket.
pub fn invoke_grant(names: &ResourceNames) -> PermissionGrant {
    PermissionGrant {
        function_name: names.function.clone(),
        statement_id: names.permission_statement.clone(),
        action: INVOKE_ACTION.to_string(),
        principal: STORAGE_PRINCIPAL.to_string(),
        source_arn: bucket_arn(&names.input_bucket),
    }
}

/// Grants the storage service permission to invoke the function, then
/// subscribes the function to object-created events on `input_bucket`.
///
/// The grant may not be visible immediately, so registration is retried with
/// backoff while the provider answers with an authorization error.
pub fn bind_trigger(
    functions: &impl FunctionApi,
    storage: &impl StorageApi,
    grant: &PermissionGrant,
    input_bucket: &str,
    function_arn: &str,
    retry: RetryPolicy,
    outcome: &mut DeploymentOutcome,
) {
    let permission: StepOutcome = functions.add_invoke_permission(grant).into();
    let granted = permission.is_ok();
    match permission.failure() {
        Some(reason) => {
            error!(component = "trigger", event = "permission_failed", function = %grant.function_name, error = reason)
        }
        None => info!(component = "trigger", event = "permission_granted", function = %grant.function_name, source_arn = %grant.source_arn),
    }
    outcome.record(Step::InvokePermission, &grant.statement_id, permission);

    if !granted {
        outcome.record(
            Step::Notification,
            input_bucket,
            StepOutcome::Failed("skipped: invoke permission was not granted".to_string()),
        );
        return;
    }

    let registered = retry_when(
        retry,
        ProviderError::is_access_denied,
        |attempt, error, backoff| {
            warn!(component = "trigger", event = "notification_retry", bucket = input_bucket, attempt, backoff_ms = backoff.as_millis() as u64, error = %error)
        },
        || storage.put_object_created_notification(input_bucket, function_arn),
    );

    let notification = match registered {
        Ok(()) => {
            info!(component = "trigger", event = "notification_registered", bucket = input_bucket, function_arn);
            StepOutcome::Succeeded
        }
        Err(retry_error) => {
            error!(component = "trigger", event = "notification_failed", bucket = input_bucket, error = %retry_error);
            StepOutcome::Failed(retry_error.to_string())
        }
    };
    outcome.record(Step::Notification, input_bucket, notification);
}
