use std::collections::BTreeMap;

use crate::runtime::error::{CreateOutcome, ProviderError};
use crate::runtime::site::CorsRules;

pub trait TableApi {
    fn create_table(&self, name: &str, partition_key: &str)
        -> Result<CreateOutcome, ProviderError>;

    fn table_active(&self, name: &str) -> Result<bool, ProviderError>;
}

pub trait StorageApi {
    fn create_bucket(&self, bucket: &str) -> Result<CreateOutcome, ProviderError>;

    /// Provider-confirmed existence; `Ok(false)` while not yet visible.
    fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError>;

    fn put_cors(&self, bucket: &str, rules: &CorsRules) -> Result<(), ProviderError>;

    fn put_website(&self, bucket: &str, index_document: &str) -> Result<(), ProviderError>;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), ProviderError>;

    fn delete_public_access_block(&self, bucket: &str) -> Result<(), ProviderError>;

    fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError>;

    fn put_public_read_acl(&self, bucket: &str, key: &str) -> Result<(), ProviderError>;

    /// Replaces the bucket's notification configuration with a single
    /// object-created subscription targeting `function_arn`.
    fn put_object_created_notification(
        &self,
        bucket: &str,
        function_arn: &str,
    ) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub role_arn: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_secs: i32,
    pub environment: BTreeMap<String, String>,
    pub package: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedFunction {
    pub arn: String,
    pub outcome: CreateOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    pub function_name: String,
    pub statement_id: String,
    pub action: String,
    pub principal: String,
    pub source_arn: String,
}

pub trait FunctionApi {
    /// Creates the function, or resolves the ARN of the existing one.
    fn create_function(&self, spec: &FunctionSpec) -> Result<DeployedFunction, ProviderError>;

    fn function_active(&self, name: &str) -> Result<bool, ProviderError>;

    fn add_invoke_permission(&self, grant: &PermissionGrant)
        -> Result<CreateOutcome, ProviderError>;
}
