use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::adapters::provider::StorageApi;
use crate::runtime::contract::{HTML_CONTENT_TYPE, INDEX_DOCUMENT};
use crate::runtime::outcome::{DeploymentOutcome, Step, StepOutcome};
use crate::runtime::site::{public_read_policy, render_site};

/// Renders the page template with the input bucket name, uploads it to the
/// web bucket and then tries to make it publicly readable.
///
/// The three public-access attempts are independent: any of them may be
/// refused by a restricted account without affecting the others.
pub fn publish_site(
    storage: &impl StorageApi,
    template_path: &Path,
    input_bucket: &str,
    web_bucket: &str,
    settle: Duration,
    outcome: &mut DeploymentOutcome,
) {
    let object = format!("{web_bucket}/{INDEX_DOCUMENT}");

    let template = match fs::read_to_string(template_path) {
        Ok(value) => value,
        Err(read_error) => {
            error!(component = "site", event = "template_unreadable", path = %template_path.display(), error = %read_error);
            outcome.record(
                Step::SiteUpload,
                object,
                StepOutcome::Failed(format!(
                    "cannot read template '{}': {read_error}",
                    template_path.display()
                )),
            );
            return;
        }
    };

    let page = render_site(&template, input_bucket);
    let uploaded: StepOutcome = storage
        .put_object(web_bucket, INDEX_DOCUMENT, page.as_bytes(), HTML_CONTENT_TYPE)
        .into();
    if let Some(reason) = uploaded.failure() {
        error!(component = "site", event = "upload_failed", object = %object, error = reason);
        outcome.record(Step::SiteUpload, object, uploaded);
        return;
    }
    info!(component = "site", event = "page_uploaded", object = %object);
    outcome.record(Step::SiteUpload, object.clone(), uploaded);

    let unblocked: StepOutcome = storage.delete_public_access_block(web_bucket).into();
    if unblocked.is_ok() {
        thread::sleep(settle);
    }
    record_best_effort(outcome, Step::PublicAccessBlock, web_bucket, unblocked);

    let policy = storage
        .put_bucket_policy(web_bucket, &public_read_policy(web_bucket))
        .into();
    record_best_effort(outcome, Step::BucketPolicy, web_bucket, policy);

    let acl = storage
        .put_public_read_acl(web_bucket, INDEX_DOCUMENT)
        .into();
    record_best_effort(outcome, Step::ObjectAcl, &object, acl);
}

fn record_best_effort(
    outcome: &mut DeploymentOutcome,
    step: Step,
    resource: &str,
    result: StepOutcome,
) {
    match result.failure() {
        Some(reason) => warn!(component = "site", event = "public_access_degraded", step = %step, resource, error = reason),
        None => info!(component = "site", event = "public_access_applied", step = %step, resource),
    }
    outcome.record(step, resource, result);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::runtime::error::ProviderErrorKind;
    use crate::test_helpers::FakeCloud;

    use super::*;

    const INPUT: &str = "proyecto-entrada-ab12cd34";
    const WEB: &str = "proyecto-web-ab12cd34";

    fn template(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("index.html");
        fs::write(&path, "<a>__NOMBRE_BUCKET_PLACEHOLDER__</a>").expect("write template");
        path
    }

    #[test]
    fn uploads_rendered_page_and_opens_access() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cloud = FakeCloud::new();
        cloud.with_bucket(WEB);
        let mut outcome = DeploymentOutcome::new();

        publish_site(&cloud, &template(&dir), INPUT, WEB, Duration::ZERO, &mut outcome);

        assert_eq!(
            cloud.object(WEB, "index.html"),
            Some((format!("<a>{INPUT}</a>"), "text/html".to_string()))
        );
        assert!(cloud.is_public_access_unblocked(WEB));
        assert!(cloud.policy(WEB).is_some());
        assert!(cloud.is_object_public(WEB, "index.html"));
        assert!(outcome.is_clean());
    }

    #[test]
    fn each_public_access_attempt_is_independent() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cloud = FakeCloud::new();
        cloud.with_bucket(WEB);
        cloud.fail("DeletePublicAccessBlock", WEB, ProviderErrorKind::AccessDenied);
        cloud.fail("PutBucketPolicy", WEB, ProviderErrorKind::AccessDenied);
        let mut outcome = DeploymentOutcome::new();

        publish_site(&cloud, &template(&dir), INPUT, WEB, Duration::ZERO, &mut outcome);

        assert!(cloud.is_object_public(WEB, "index.html"));
        let warned: Vec<Step> = outcome.warnings().map(|record| record.step).collect();
        assert_eq!(warned, vec![Step::PublicAccessBlock, Step::BucketPolicy]);
        assert_eq!(outcome.failed().count(), 0);
    }

    #[test]
    fn upload_failure_skips_public_access() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cloud = FakeCloud::new();
        let mut outcome = DeploymentOutcome::new();

        publish_site(&cloud, &template(&dir), INPUT, WEB, Duration::ZERO, &mut outcome);

        assert_eq!(cloud.call_count("PutBucketPolicy"), 0);
        assert!(matches!(
            outcome.outcome_of(Step::SiteUpload, &format!("{WEB}/index.html")),
            Some(StepOutcome::Failed(_))
        ));
    }

    #[test]
    fn missing_template_is_a_failed_step() {
        let cloud = FakeCloud::new();
        cloud.with_bucket(WEB);
        let mut outcome = DeploymentOutcome::new();

        publish_site(
            &cloud,
            Path::new("/no/such/index.html"),
            INPUT,
            WEB,
            Duration::ZERO,
            &mut outcome,
        );

        assert_eq!(cloud.call_count("PutObject"), 0);
        assert_eq!(outcome.failed().count(), 1);
    }
}
