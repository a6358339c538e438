//! In-memory cloud implementing every capability trait, with fault injection.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::adapters::labels::LabelDetector;
use crate::adapters::provider::{
    DeployedFunction, FunctionApi, FunctionSpec, PermissionGrant, StorageApi, TableApi,
};
use crate::adapters::record_store::RecordStore;
use crate::runtime::contract::{ImageRecord, LabelRequest};
use crate::runtime::error::{CreateOutcome, ProviderError, ProviderErrorKind};
use crate::runtime::site::CorsRules;

pub const FAKE_ACCOUNT: &str = "000000000000";

#[derive(Debug, Clone)]
struct Fault {
    kind: ProviderErrorKind,
    remaining: Option<u32>,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<String>,
    faults: HashMap<String, Fault>,
    tables: HashSet<String>,
    inactive_checks: HashMap<String, u32>,
    buckets: HashSet<String>,
    hidden_checks: HashMap<String, u32>,
    cors: HashMap<String, CorsRules>,
    websites: HashMap<String, String>,
    objects: BTreeMap<(String, String), (Vec<u8>, String)>,
    unblocked: HashSet<String>,
    policies: HashMap<String, String>,
    public_objects: HashSet<(String, String)>,
    functions: HashMap<String, FunctionSpec>,
    permissions: HashMap<String, PermissionGrant>,
    notifications: HashMap<String, String>,
    labels: HashMap<String, Vec<String>>,
    label_requests: Vec<LabelRequest>,
    records: HashMap<String, ImageRecord>,
    record_writes: usize,
}

impl FakeState {
    fn call(&mut self, operation: &str, resource: &str) -> Result<(), ProviderError> {
        let id = format!("{operation}:{resource}");
        self.calls.push(id.clone());

        let Some(fault) = self.faults.get_mut(&id) else {
            return Ok(());
        };
        if let Some(remaining) = fault.remaining.as_mut() {
            if *remaining == 0 {
                return Ok(());
            }
            *remaining -= 1;
        }
        Err(ProviderError::new(
            fault.kind,
            operation,
            format!("injected {:?} for {resource}", fault.kind),
        ))
    }

    fn require_bucket(&self, operation: &str, bucket: &str) -> Result<(), ProviderError> {
        if self.buckets.contains(bucket) {
            Ok(())
        } else {
            Err(ProviderError::new(
                ProviderErrorKind::NotFound,
                operation,
                format!("NoSuchBucket: {bucket}"),
            ))
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeCloud {
    state: Mutex<FakeState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("poisoned mutex");
        f(&mut state)
    }

    /// Every call to `operation` on `resource` fails with `kind`.
    pub fn fail(&self, operation: &str, resource: &str, kind: ProviderErrorKind) {
        self.inject(operation, resource, kind, None);
    }

    /// The next `times` calls to `operation` on `resource` fail with `kind`.
    pub fn fail_times(&self, operation: &str, resource: &str, kind: ProviderErrorKind, times: u32) {
        self.inject(operation, resource, kind, Some(times));
    }

    fn inject(&self, operation: &str, resource: &str, kind: ProviderErrorKind, remaining: Option<u32>) {
        self.with_state(|state| {
            state
                .faults
                .insert(format!("{operation}:{resource}"), Fault { kind, remaining })
        });
    }

    pub fn with_table(&self, name: &str) {
        self.with_state(|state| state.tables.insert(name.to_string()));
    }

    /// Status checks on table `name` report it as still creating this many times.
    pub fn delay_activation(&self, name: &str, checks: u32) {
        self.with_state(|state| state.inactive_checks.insert(name.to_string(), checks));
    }

    pub fn with_bucket(&self, name: &str) {
        self.with_state(|state| state.buckets.insert(name.to_string()));
    }

    /// Existence checks on `bucket` report false this many times after creation.
    pub fn delay_visibility(&self, bucket: &str, checks: u32) {
        self.with_state(|state| state.hidden_checks.insert(bucket.to_string(), checks));
    }

    pub fn with_labels(&self, key: &str, labels: &[&str]) {
        let labels = labels.iter().map(|label| label.to_string()).collect();
        self.with_state(|state| state.labels.insert(key.to_string(), labels));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|state| state.calls.clone())
    }

    pub fn called(&self, operation: &str, resource: &str) -> bool {
        let id = format!("{operation}:{resource}");
        self.with_state(|state| state.calls.iter().any(|call| *call == id))
    }

    pub fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.with_state(|state| {
            state
                .calls
                .iter()
                .filter(|call| call.starts_with(&prefix))
                .count()
        })
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.with_state(|state| state.buckets.contains(bucket))
    }

    pub fn cors(&self, bucket: &str) -> Option<CorsRules> {
        self.with_state(|state| state.cors.get(bucket).cloned())
    }

    pub fn website_index(&self, bucket: &str) -> Option<String> {
        self.with_state(|state| state.websites.get(bucket).cloned())
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<(String, String)> {
        self.with_state(|state| {
            state
                .objects
                .get(&(bucket.to_string(), key.to_string()))
                .map(|(body, content_type)| {
                    (String::from_utf8_lossy(body).into_owned(), content_type.clone())
                })
        })
    }

    pub fn policy(&self, bucket: &str) -> Option<String> {
        self.with_state(|state| state.policies.get(bucket).cloned())
    }

    pub fn is_public_access_unblocked(&self, bucket: &str) -> bool {
        self.with_state(|state| state.unblocked.contains(bucket))
    }

    pub fn is_object_public(&self, bucket: &str, key: &str) -> bool {
        self.with_state(|state| {
            state
                .public_objects
                .contains(&(bucket.to_string(), key.to_string()))
        })
    }

    pub fn function(&self, name: &str) -> Option<FunctionSpec> {
        self.with_state(|state| state.functions.get(name).cloned())
    }

    pub fn permission(&self, statement_id: &str) -> Option<PermissionGrant> {
        self.with_state(|state| state.permissions.get(statement_id).cloned())
    }

    pub fn notification_target(&self, bucket: &str) -> Option<String> {
        self.with_state(|state| state.notifications.get(bucket).cloned())
    }

    pub fn label_requests(&self) -> Vec<LabelRequest> {
        self.with_state(|state| state.label_requests.clone())
    }

    pub fn record(&self, key: &str) -> Option<ImageRecord> {
        self.with_state(|state| state.records.get(key).cloned())
    }

    pub fn record_count(&self) -> usize {
        self.with_state(|state| state.records.len())
    }

    pub fn record_writes(&self) -> usize {
        self.with_state(|state| state.record_writes)
    }

    pub fn function_arn(name: &str) -> String {
        format!("arn:aws:lambda:us-east-1:{FAKE_ACCOUNT}:function:{name}")
    }
}

impl TableApi for FakeCloud {
    fn create_table(
        &self,
        name: &str,
        _partition_key: &str,
    ) -> Result<CreateOutcome, ProviderError> {
        self.with_state(|state| {
            state.call("CreateTable", name)?;
            if state.tables.insert(name.to_string()) {
                Ok(CreateOutcome::Created)
            } else {
                Ok(CreateOutcome::AlreadyPresent)
            }
        })
    }

    fn table_active(&self, name: &str) -> Result<bool, ProviderError> {
        self.with_state(|state| {
            state.call("DescribeTable", name)?;
            if let Some(remaining) = state.inactive_checks.get_mut(name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(false);
                }
            }
            Ok(state.tables.contains(name))
        })
    }
}

impl StorageApi for FakeCloud {
    fn create_bucket(&self, bucket: &str) -> Result<CreateOutcome, ProviderError> {
        self.with_state(|state| {
            state.call("CreateBucket", bucket)?;
            if state.buckets.insert(bucket.to_string()) {
                Ok(CreateOutcome::Created)
            } else {
                Ok(CreateOutcome::AlreadyPresent)
            }
        })
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        self.with_state(|state| {
            state.call("HeadBucket", bucket)?;
            if let Some(remaining) = state.hidden_checks.get_mut(bucket) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(false);
                }
            }
            Ok(state.buckets.contains(bucket))
        })
    }

    fn put_cors(&self, bucket: &str, rules: &CorsRules) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutBucketCors", bucket)?;
            state.require_bucket("PutBucketCors", bucket)?;
            state.cors.insert(bucket.to_string(), rules.clone());
            Ok(())
        })
    }

    fn put_website(&self, bucket: &str, index_document: &str) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutBucketWebsite", bucket)?;
            state.require_bucket("PutBucketWebsite", bucket)?;
            state
                .websites
                .insert(bucket.to_string(), index_document.to_string());
            Ok(())
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutObject", &format!("{bucket}/{key}"))?;
            state.require_bucket("PutObject", bucket)?;
            state.objects.insert(
                (bucket.to_string(), key.to_string()),
                (body.to_vec(), content_type.to_string()),
            );
            Ok(())
        })
    }

    fn delete_public_access_block(&self, bucket: &str) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("DeletePublicAccessBlock", bucket)?;
            state.require_bucket("DeletePublicAccessBlock", bucket)?;
            state.unblocked.insert(bucket.to_string());
            Ok(())
        })
    }

    fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutBucketPolicy", bucket)?;
            state.require_bucket("PutBucketPolicy", bucket)?;
            state.policies.insert(bucket.to_string(), policy.to_string());
            Ok(())
        })
    }

    fn put_public_read_acl(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutObjectAcl", &format!("{bucket}/{key}"))?;
            state.require_bucket("PutObjectAcl", bucket)?;
            state
                .public_objects
                .insert((bucket.to_string(), key.to_string()));
            Ok(())
        })
    }

    fn put_object_created_notification(
        &self,
        bucket: &str,
        function_arn: &str,
    ) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutBucketNotificationConfiguration", bucket)?;
            state.require_bucket("PutBucketNotificationConfiguration", bucket)?;
            state
                .notifications
                .insert(bucket.to_string(), function_arn.to_string());
            Ok(())
        })
    }
}

impl FunctionApi for FakeCloud {
    fn create_function(&self, spec: &FunctionSpec) -> Result<DeployedFunction, ProviderError> {
        self.with_state(|state| {
            state.call("CreateFunction", &spec.name)?;
            let outcome = if state.functions.contains_key(&spec.name) {
                CreateOutcome::AlreadyPresent
            } else {
                state.functions.insert(spec.name.clone(), spec.clone());
                CreateOutcome::Created
            };
            Ok(DeployedFunction {
                arn: Self::function_arn(&spec.name),
                outcome,
            })
        })
    }

    fn function_active(&self, name: &str) -> Result<bool, ProviderError> {
        self.with_state(|state| {
            state.call("GetFunction", name)?;
            Ok(state.functions.contains_key(name))
        })
    }

    fn add_invoke_permission(
        &self,
        grant: &PermissionGrant,
    ) -> Result<CreateOutcome, ProviderError> {
        self.with_state(|state| {
            state.call("AddPermission", &grant.function_name)?;
            if !state.functions.contains_key(&grant.function_name) {
                return Err(ProviderError::new(
                    ProviderErrorKind::NotFound,
                    "AddPermission",
                    format!("function {} not found", grant.function_name),
                ));
            }
            if state.permissions.contains_key(&grant.statement_id) {
                return Ok(CreateOutcome::AlreadyPresent);
            }
            state
                .permissions
                .insert(grant.statement_id.clone(), grant.clone());
            Ok(CreateOutcome::Created)
        })
    }
}

impl LabelDetector for FakeCloud {
    fn detect_labels(&self, request: &LabelRequest) -> Result<Vec<String>, ProviderError> {
        self.with_state(|state| {
            state.call("DetectLabels", &format!("{}/{}", request.bucket, request.key))?;
            state.label_requests.push(request.clone());
            Ok(state.labels.get(&request.key).cloned().unwrap_or_default())
        })
    }
}

impl RecordStore for FakeCloud {
    fn put_record(&self, record: &ImageRecord) -> Result<(), ProviderError> {
        self.with_state(|state| {
            state.call("PutItem", &record.id_archivo)?;
            state.record_writes += 1;
            state
                .records
                .insert(record.id_archivo.clone(), record.clone());
            Ok(())
        })
    }
}
