use tracing::{error, info, warn};

use crate::adapters::provider::StorageApi;
use crate::runtime::contract::INDEX_DOCUMENT;
use crate::runtime::outcome::{DeploymentOutcome, Step, StepOutcome};
use crate::runtime::site::CorsRules;
use crate::runtime::wait::{wait_until, WaitPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStatus {
    pub name: String,
    pub ready: bool,
}

/// Creates each bucket independently; a failure on one bucket never stops
/// the next. CORS is applied only after the provider confirms the bucket.
pub fn provision_buckets(
    storage: &impl StorageApi,
    buckets: &[&str],
    ready: WaitPolicy,
    outcome: &mut DeploymentOutcome,
) -> Vec<BucketStatus> {
    buckets
        .iter()
        .map(|bucket| {
            let created = provision_bucket(storage, bucket, ready);
            let is_ready = created.is_ok();
            outcome.record(Step::Bucket, *bucket, created);

            if is_ready {
                let cors: StepOutcome = storage.put_cors(bucket, &CorsRules::default()).into();
                if let Some(reason) = cors.failure() {
                    warn!(component = "buckets", event = "cors_failed", bucket = *bucket, error = reason);
                }
                outcome.record(Step::Cors, *bucket, cors);
            }

            BucketStatus {
                name: bucket.to_string(),
                ready: is_ready,
            }
        })
        .collect()
}

fn provision_bucket(storage: &impl StorageApi, bucket: &str, ready: WaitPolicy) -> StepOutcome {
    info!(component = "buckets", event = "bucket_create_started", bucket);
    let created: StepOutcome = storage.create_bucket(bucket).into();
    if let Some(reason) = created.failure() {
        error!(component = "buckets", event = "bucket_create_failed", bucket, error = reason);
        return created;
    }

    match wait_until(ready, || storage.bucket_exists(bucket)) {
        Ok(()) => {
            info!(component = "buckets", event = "bucket_ready", bucket);
            created
        }
        Err(wait_error) => {
            error!(component = "buckets", event = "bucket_not_visible", bucket, error = %wait_error);
            StepOutcome::Failed(format!("bucket {bucket} not confirmed: {wait_error}"))
        }
    }
}

/// Enables static-site serving, unless the bucket itself is unavailable.
pub fn configure_hosting(storage: &impl StorageApi, web_bucket: &BucketStatus) -> StepOutcome {
    if !web_bucket.ready {
        warn!(component = "hosting", event = "hosting_skipped", bucket = %web_bucket.name);
        return StepOutcome::Failed(format!(
            "skipped: bucket {} was not created",
            web_bucket.name
        ));
    }

    let outcome: StepOutcome = storage.put_website(&web_bucket.name, INDEX_DOCUMENT).into();
    match outcome.failure() {
        Some(reason) => {
            error!(component = "hosting", event = "hosting_failed", bucket = %web_bucket.name, error = reason)
        }
        None => info!(component = "hosting", event = "hosting_enabled", bucket = %web_bucket.name),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use crate::runtime::error::ProviderErrorKind;
    use crate::test_helpers::FakeCloud;

    use super::*;

    const INPUT: &str = "proyecto-entrada-ab12cd34";
    const WEB: &str = "proyecto-web-ab12cd34";

    #[test]
    fn creates_both_buckets_with_cors() {
        let cloud = FakeCloud::new();
        let mut outcome = DeploymentOutcome::new();

        let statuses = provision_buckets(&cloud, &[INPUT, WEB], WaitPolicy::immediate(), &mut outcome);

        assert!(statuses.iter().all(|status| status.ready));
        assert_eq!(cloud.cors(WEB), Some(CorsRules::default()));
        assert_eq!(outcome.outcome_of(Step::Cors, INPUT), Some(&StepOutcome::Succeeded));
    }

    #[test]
    fn input_failure_does_not_block_web_bucket() {
        let cloud = FakeCloud::new();
        cloud.fail("CreateBucket", INPUT, ProviderErrorKind::Other);
        let mut outcome = DeploymentOutcome::new();

        let statuses = provision_buckets(&cloud, &[INPUT, WEB], WaitPolicy::immediate(), &mut outcome);

        assert!(!statuses[0].ready);
        assert!(statuses[1].ready);
        assert!(cloud.has_bucket(WEB));
        assert!(!cloud.called("PutBucketCors", INPUT));
    }

    #[test]
    fn cors_waits_for_confirmed_existence() {
        let cloud = FakeCloud::new();
        cloud.delay_visibility(WEB, 2);
        let mut outcome = DeploymentOutcome::new();
        let policy = WaitPolicy::new(std::time::Duration::from_secs(5), std::time::Duration::ZERO);

        provision_buckets(&cloud, &[WEB], policy, &mut outcome);

        let calls = cloud.calls();
        let cors_at = calls
            .iter()
            .position(|call| call == &format!("PutBucketCors:{WEB}"))
            .expect("cors should be applied");
        let head_checks = calls[..cors_at]
            .iter()
            .filter(|call| call.starts_with("HeadBucket:"))
            .count();
        assert_eq!(head_checks, 3);
    }

    #[test]
    fn unconfirmed_bucket_skips_cors_and_fails() {
        let cloud = FakeCloud::new();
        cloud.delay_visibility(WEB, 10);
        let mut outcome = DeploymentOutcome::new();

        let statuses = provision_buckets(&cloud, &[WEB], WaitPolicy::immediate(), &mut outcome);

        assert!(!statuses[0].ready);
        assert!(!cloud.called("PutBucketCors", WEB));
        assert!(matches!(
            outcome.outcome_of(Step::Bucket, WEB),
            Some(StepOutcome::Failed(_))
        ));
    }

    #[test]
    fn existing_bucket_is_reused() {
        let cloud = FakeCloud::new();
        cloud.with_bucket(INPUT);
        let mut outcome = DeploymentOutcome::new();

        provision_buckets(&cloud, &[INPUT], WaitPolicy::immediate(), &mut outcome);
        assert_eq!(
            outcome.outcome_of(Step::Bucket, INPUT),
            Some(&StepOutcome::AlreadyExists)
        );
    }

    #[test]
    fn hosting_is_skipped_for_unavailable_bucket() {
        let cloud = FakeCloud::new();
        let status = BucketStatus {
            name: WEB.to_string(),
            ready: false,
        };

        let outcome = configure_hosting(&cloud, &status);

        assert!(outcome.failure().is_some_and(|reason| reason.starts_with("skipped")));
        assert_eq!(cloud.call_count("PutBucketWebsite"), 0);
    }

    #[test]
    fn hosting_uses_index_document() {
        let cloud = FakeCloud::new();
        cloud.with_bucket(WEB);
        let status = BucketStatus {
            name: WEB.to_string(),
            ready: true,
        };

        assert_eq!(configure_hosting(&cloud, &status), StepOutcome::Succeeded);
        assert_eq!(cloud.website_index(WEB).as_deref(), Some("index.html"));
    }
}
