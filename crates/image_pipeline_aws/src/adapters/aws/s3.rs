use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CorsConfiguration, CorsRule, CreateBucketConfiguration, Event,
    IndexDocument, LambdaFunctionConfiguration, NotificationConfiguration, ObjectCannedAcl,
    WebsiteConfiguration,
};

use super::block_on;
use super::errors::classify;
use crate::adapters::provider::StorageApi;
use crate::runtime::error::{idempotent, CreateOutcome, ProviderError};
use crate::runtime::site::CorsRules;

/// Region in which buckets are created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";
const OBJECT_CREATED_EVENTS: &str = "s3:ObjectCreated:*";

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    region: String,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

fn build_error(operation: &str, error: impl std::fmt::Display) -> ProviderError {
    ProviderError::other(operation, format!("invalid request: {error}"))
}

impl StorageApi for S3Storage {
    fn create_bucket(&self, bucket: &str) -> Result<CreateOutcome, ProviderError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        idempotent(
            block_on(request.send())
                .map(|_| ())
                .map_err(|error| classify("CreateBucket", error)),
        )
    }

    fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        match block_on(self.client.head_bucket().bucket(bucket).send()) {
            Ok(_) => Ok(true),
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_not_found()) =>
            {
                Ok(false)
            }
            Err(error) => Err(classify("HeadBucket", error)),
        }
    }

    fn put_cors(&self, bucket: &str, rules: &CorsRules) -> Result<(), ProviderError> {
        let rule = CorsRule::builder()
            .set_allowed_headers(Some(rules.allowed_headers.clone()))
            .set_allowed_methods(Some(rules.allowed_methods.clone()))
            .set_allowed_origins(Some(rules.allowed_origins.clone()))
            .set_expose_headers(Some(rules.expose_headers.clone()))
            .build()
            .map_err(|error| build_error("PutBucketCors", error))?;
        let configuration = CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|error| build_error("PutBucketCors", error))?;

        block_on(
            self.client
                .put_bucket_cors()
                .bucket(bucket)
                .cors_configuration(configuration)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutBucketCors", error))
    }

    fn put_website(&self, bucket: &str, index_document: &str) -> Result<(), ProviderError> {
        let index = IndexDocument::builder()
            .suffix(index_document)
            .build()
            .map_err(|error| build_error("PutBucketWebsite", error))?;
        let configuration = WebsiteConfiguration::builder()
            .index_document(index)
            .build();

        block_on(
            self.client
                .put_bucket_website()
                .bucket(bucket)
                .website_configuration(configuration)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutBucketWebsite", error))
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<(), ProviderError> {
        block_on(
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body.to_vec()))
                .content_type(content_type)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutObject", error))
    }

    fn delete_public_access_block(&self, bucket: &str) -> Result<(), ProviderError> {
        block_on(
            self.client
                .delete_public_access_block()
                .bucket(bucket)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("DeletePublicAccessBlock", error))
    }

    fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ProviderError> {
        block_on(
            self.client
                .put_bucket_policy()
                .bucket(bucket)
                .policy(policy)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutBucketPolicy", error))
    }

    fn put_public_read_acl(&self, bucket: &str, key: &str) -> Result<(), ProviderError> {
        block_on(
            self.client
                .put_object_acl()
                .bucket(bucket)
                .key(key)
                .acl(ObjectCannedAcl::PublicRead)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutObjectAcl", error))
    }

    fn put_object_created_notification(
        &self,
        bucket: &str,
        function_arn: &str,
    ) -> Result<(), ProviderError> {
        let target = LambdaFunctionConfiguration::builder()
            .lambda_function_arn(function_arn)
            .events(Event::from(OBJECT_CREATED_EVENTS))
            .build()
            .map_err(|error| build_error("PutBucketNotificationConfiguration", error))?;
        let configuration = NotificationConfiguration::builder()
            .lambda_function_configurations(target)
            .build();

        block_on(
            self.client
                .put_bucket_notification_configuration()
                .bucket(bucket)
                .notification_configuration(configuration)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| classify("PutBucketNotificationConfiguration", error))
    }
}
