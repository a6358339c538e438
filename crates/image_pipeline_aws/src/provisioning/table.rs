use tracing::{error, info};

use crate::adapters::provider::TableApi;
use crate::runtime::contract::PARTITION_KEY;
use crate::runtime::error::CreateOutcome;
use crate::runtime::outcome::StepOutcome;
use crate::runtime::wait::{wait_until, WaitPolicy};

/// Creates the record table if missing. The step only reports success once
/// the table is ACTIVE, whether it was created now or by an earlier run.
pub fn ensure_table(tables: &impl TableApi, name: &str, ready: WaitPolicy) -> StepOutcome {
    let created = match tables.create_table(name, PARTITION_KEY) {
        Ok(CreateOutcome::AlreadyPresent) => {
            info!(component = "table", event = "table_already_exists", table = name);
            StepOutcome::AlreadyExists
        }
        Ok(CreateOutcome::Created) => StepOutcome::Succeeded,
        Err(create_error) => {
            error!(component = "table", event = "table_create_failed", table = name, error = %create_error);
            return StepOutcome::Failed(create_error.to_string());
        }
    };

    match wait_until(ready, || tables.table_active(name)) {
        Ok(()) => {
            info!(component = "table", event = "table_active", table = name);
            created
        }
        Err(wait_error) => {
            error!(component = "table", event = "table_not_active", table = name, error = %wait_error);
            StepOutcome::Failed(format!("table {name} did not become active: {wait_error}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::runtime::error::ProviderErrorKind;
    use crate::test_helpers::FakeCloud;

    use super::*;

    #[test]
    fn creates_missing_table_and_waits_for_it() {
        let cloud = FakeCloud::new();
        let outcome = ensure_table(&cloud, "TransripcionesAuto", WaitPolicy::immediate());

        assert_eq!(outcome, StepOutcome::Succeeded);
        assert!(cloud.called("DescribeTable", "TransripcionesAuto"));
    }

    #[test]
    fn existing_table_is_not_an_error() {
        let cloud = FakeCloud::new();
        cloud.with_table("TransripcionesAuto");

        let outcome = ensure_table(&cloud, "TransripcionesAuto", WaitPolicy::immediate());
        assert_eq!(outcome, StepOutcome::AlreadyExists);
        assert!(cloud.called("DescribeTable", "TransripcionesAuto"));
    }

    #[test]
    fn existing_table_still_creating_is_awaited() {
        let cloud = FakeCloud::new();
        cloud.with_table("TransripcionesAuto");
        cloud.delay_activation("TransripcionesAuto", 2);

        let policy = WaitPolicy::new(Duration::from_secs(5), Duration::ZERO);
        let outcome = ensure_table(&cloud, "TransripcionesAuto", policy);

        assert_eq!(outcome, StepOutcome::AlreadyExists);
        assert_eq!(cloud.call_count("DescribeTable"), 3);
    }

    #[test]
    fn existing_table_that_never_activates_fails() {
        let cloud = FakeCloud::new();
        cloud.with_table("TransripcionesAuto");
        cloud.delay_activation("TransripcionesAuto", u32::MAX);

        let outcome = ensure_table(&cloud, "TransripcionesAuto", WaitPolicy::immediate());
        let reason = outcome.failure().expect("inactive table should fail the step");
        assert!(reason.contains("did not become active"));
    }

    #[test]
    fn create_failure_is_reported() {
        let cloud = FakeCloud::new();
        cloud.fail("CreateTable", "TransripcionesAuto", ProviderErrorKind::AccessDenied);

        let outcome = ensure_table(&cloud, "TransripcionesAuto", WaitPolicy::immediate());
        assert!(matches!(outcome, StepOutcome::Failed(_)));
    }

    #[test]
    fn readiness_check_failure_is_reported() {
        let cloud = FakeCloud::new();
        cloud.fail("DescribeTable", "TransripcionesAuto", ProviderErrorKind::Other);

        let outcome = ensure_table(&cloud, "TransripcionesAuto", WaitPolicy::immediate());
        let reason = outcome.failure().expect("wait failure should fail the step");
        assert!(reason.contains("did not become active"));
    }
}
