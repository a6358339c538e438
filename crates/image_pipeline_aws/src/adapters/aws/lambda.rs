use std::collections::HashMap;

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime, State};

use super::block_on;
use super::errors::classify;
use crate::adapters::provider::{DeployedFunction, FunctionApi, FunctionSpec, PermissionGrant};
use crate::runtime::error::{idempotent, CreateOutcome, ProviderError};

#[derive(Debug, Clone)]
pub struct LambdaFunctions {
    client: aws_sdk_lambda::Client,
}

impl LambdaFunctions {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }

    fn existing_arn(&self, name: &str) -> Result<String, ProviderError> {
        let output = block_on(self.client.get_function().function_name(name).send())
            .map_err(|error| classify("GetFunction", error))?;
        output
            .configuration()
            .and_then(|configuration| configuration.function_arn())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::other("GetFunction", "function has no ARN"))
    }
}

impl FunctionApi for LambdaFunctions {
    fn create_function(&self, spec: &FunctionSpec) -> Result<DeployedFunction, ProviderError> {
        let variables: HashMap<String, String> = spec.environment.clone().into_iter().collect();
        let request = self
            .client
            .create_function()
            .function_name(&spec.name)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .role(&spec.role_arn)
            .handler(&spec.handler)
            .code(
                FunctionCode::builder()
                    .zip_file(Blob::new(spec.package.clone()))
                    .build(),
            )
            .timeout(spec.timeout_secs)
            .environment(Environment::builder().set_variables(Some(variables)).build());

        match block_on(request.send()) {
            Ok(output) => {
                let arn = output
                    .function_arn()
                    .map(str::to_string)
                    .ok_or_else(|| ProviderError::other("CreateFunction", "response carried no ARN"))?;
                Ok(DeployedFunction {
                    arn,
                    outcome: CreateOutcome::Created,
                })
            }
            Err(error) => {
                let error = classify("CreateFunction", error);
                if !error.is_already_exists() {
                    return Err(error);
                }
                Ok(DeployedFunction {
                    arn: self.existing_arn(&spec.name)?,
                    outcome: CreateOutcome::AlreadyPresent,
                })
            }
        }
    }

    fn function_active(&self, name: &str) -> Result<bool, ProviderError> {
        let output = block_on(self.client.get_function().function_name(name).send())
            .map_err(|error| classify("GetFunction", error))?;
        Ok(output
            .configuration()
            .and_then(|configuration| configuration.state())
            .is_some_and(|state| *state == State::Active))
    }

    fn add_invoke_permission(
        &self,
        grant: &PermissionGrant,
    ) -> Result<CreateOutcome, ProviderError> {
        let result = block_on(
            self.client
                .add_permission()
                .function_name(&grant.function_name)
                .statement_id(&grant.statement_id)
                .action(&grant.action)
                .principal(&grant.principal)
                .source_arn(&grant.source_arn)
                .send(),
        );

        idempotent(
            result
                .map(|_| ())
                .map_err(|error| classify("AddPermission", error)),
        )
    }
}
