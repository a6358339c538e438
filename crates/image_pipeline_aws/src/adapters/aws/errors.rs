use std::error::Error;
use std::fmt::Debug;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::runtime::error::{ProviderError, ProviderErrorKind};

const UNVALIDATED_DESTINATION: &str = "Unable to validate the following destination configurations";

/// Classifies an SDK failure by its service error code.
pub fn classify<E, R>(operation: &str, error: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: Debug,
{
    let kind = kind_for_code(error.code(), error.message());
    ProviderError::new(kind, operation, DisplayErrorContext(&error).to_string())
}

pub fn kind_for_code(code: Option<&str>, message: Option<&str>) -> ProviderErrorKind {
    match code {
        Some("ResourceInUseException" | "BucketAlreadyOwnedByYou" | "ResourceConflictException") => {
            ProviderErrorKind::AlreadyExists
        }
        Some("AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation") => {
            ProviderErrorKind::AccessDenied
        }
        // S3 reports an invoke permission that has not propagated yet this way.
        Some("InvalidArgument")
            if message.is_some_and(|text| text.contains(UNVALIDATED_DESTINATION)) =>
        {
            ProviderErrorKind::AccessDenied
        }
        Some("NotFound" | "NoSuchBucket" | "NoSuchKey" | "ResourceNotFoundException") => {
            ProviderErrorKind::NotFound
        }
        _ => ProviderErrorKind::Other,
    }
}
