use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{FUNCTION_HANDLER, FUNCTION_RUNTIME, FUNCTION_TIMEOUT_SECS};
use crate::adapters::provider::{FunctionApi, FunctionSpec};
use crate::runtime::contract::TABLE_ENV_VAR;
use crate::runtime::outcome::StepOutcome;
use crate::runtime::wait::{wait_until, WaitPolicy};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("handler artifact not found at '{0}'")]
    Missing(PathBuf),
    #[error("failed to package handler artifact '{path}': {reason}")]
    Package { path: PathBuf, reason: String },
}

/// Zips the compiled handler binary as the `bootstrap` entry expected by
/// custom Lambda runtimes.
pub fn package_handler(binary_path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !binary_path.is_file() {
        return Err(ArtifactError::Missing(binary_path.to_path_buf()));
    }
    let package_error = |reason: String| ArtifactError::Package {
        path: binary_path.to_path_buf(),
        reason,
    };

    let binary = fs::read(binary_path).map_err(|error| package_error(error.to_string()))?;
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(FUNCTION_HANDLER, options)
        .map_err(|error| package_error(error.to_string()))?;
    zip.write_all(&binary)
        .map_err(|error| package_error(error.to_string()))?;
    let cursor = zip
        .finish()
        .map_err(|error| package_error(error.to_string()))?;
    Ok(cursor.into_inner())
}

pub fn function_spec(name: &str, role_arn: &str, table: &str, package: Vec<u8>) -> FunctionSpec {
    FunctionSpec {
        name: name.to_string(),
        role_arn: role_arn.to_string(),
        runtime: FUNCTION_RUNTIME.to_string(),
        handler: FUNCTION_HANDLER.to_string(),
        timeout_secs: FUNCTION_TIMEOUT_SECS,
        environment: BTreeMap::from([(TABLE_ENV_VAR.to_string(), table.to_string())]),
        package,
    }
}

/// Deploys the function and waits until it can be configured further.
/// The ARN is returned whenever the provider reported one, even if the
/// function never became active.
pub fn deploy_function(
    functions: &impl FunctionApi,
    spec: &FunctionSpec,
    ready: WaitPolicy,
) -> (StepOutcome, Option<String>) {
    let deployed = match functions.create_function(spec) {
        Ok(value) => value,
        Err(create_error) => {
            error!(component = "function", event = "function_create_failed", function = %spec.name, error = %create_error);
            return (StepOutcome::Failed(create_error.to_string()), None);
        }
    };
    info!(component = "function", event = "function_deployed", function = %spec.name, arn = %deployed.arn);

    match wait_until(ready, || functions.function_active(&spec.name)) {
        Ok(()) => (deployed.outcome.into(), Some(deployed.arn)),
        Err(wait_error) => {
            error!(component = "function", event = "function_not_active", function = %spec.name, error = %wait_error);
            (
                StepOutcome::Failed(format!(
                    "function {} did not become active: {wait_error}",
                    spec.name
                )),
                Some(deployed.arn),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use crate::runtime::error::ProviderErrorKind;
    use crate::test_helpers::FakeCloud;

    use super::*;

    #[test]
    fn missing_artifact_is_reported_as_missing() {
        let error = package_handler(Path::new("/definitely/not/here/bootstrap"))
            .expect_err("missing binary should fail");
        assert!(matches!(error, ArtifactError::Missing(_)));
    }

    #[test]
    fn packages_binary_as_bootstrap_entry() {
        let dir = tempfile::tempdir().expect("temp dir");
        let binary_path = dir.path().join("image_processor");
        fs::write(&binary_path, b"\x7fELF-bytes").expect("write binary");

        let package = package_handler(&binary_path).expect("packaging should succeed");

        let mut archive = ZipArchive::new(Cursor::new(package)).expect("valid zip");
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut body = Vec::new();
        entry.read_to_end(&mut body).expect("readable entry");
        assert_eq!(body, b"\x7fELF-bytes");
    }

    #[test]
    fn spec_binds_table_name_in_environment() {
        let spec = function_spec(
            "procesador-imagenes-ab12cd34",
            "arn:aws:iam::000000000000:role/LabRole",
            "TransripcionesAuto",
            vec![1, 2, 3],
        );

        assert_eq!(spec.environment.len(), 1);
        assert_eq!(
            spec.environment.get("TABLA_DYNAMO").map(String::as_str),
            Some("TransripcionesAuto")
        );
        assert_eq!(spec.handler, "bootstrap");
        assert_eq!(spec.timeout_secs, 15);
    }

    #[test]
    fn deploy_returns_arn_of_created_function() {
        let cloud = FakeCloud::new();
        let spec = function_spec("fn-a", "role", "table", Vec::new());

        let (outcome, arn) = deploy_function(&cloud, &spec, WaitPolicy::immediate());

        assert_eq!(outcome, StepOutcome::Succeeded);
        assert_eq!(arn, Some(FakeCloud::function_arn("fn-a")));
    }

    #[test]
    fn redeploy_reports_already_exists_with_arn() {
        let cloud = FakeCloud::new();
        let spec = function_spec("fn-a", "role", "table", Vec::new());
        deploy_function(&cloud, &spec, WaitPolicy::immediate());

        let (outcome, arn) = deploy_function(&cloud, &spec, WaitPolicy::immediate());
        assert_eq!(outcome, StepOutcome::AlreadyExists);
        assert!(arn.is_some());
    }

    #[test]
    fn create_failure_yields_no_arn() {
        let cloud = FakeCloud::new();
        cloud.fail("CreateFunction", "fn-a", ProviderErrorKind::AccessDenied);
        let spec = function_spec("fn-a", "role", "table", Vec::new());

        let (outcome, arn) = deploy_function(&cloud, &spec, WaitPolicy::immediate());
        assert!(matches!(outcome, StepOutcome::Failed(_)));
        assert_eq!(arn, None);
    }
}
