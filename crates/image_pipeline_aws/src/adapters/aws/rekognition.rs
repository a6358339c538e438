use aws_sdk_rekognition::types::{Image, S3Object};

use super::block_on;
use super::errors::classify;
use crate::adapters::labels::LabelDetector;
use crate::runtime::contract::LabelRequest;
use crate::runtime::error::ProviderError;

#[derive(Debug, Clone)]
pub struct RekognitionLabels {
    client: aws_sdk_rekognition::Client,
}

impl RekognitionLabels {
    pub fn new(client: aws_sdk_rekognition::Client) -> Self {
        Self { client }
    }
}

impl LabelDetector for RekognitionLabels {
    fn detect_labels(&self, request: &LabelRequest) -> Result<Vec<String>, ProviderError> {
        let image = Image::builder()
            .s3_object(
                S3Object::builder()
                    .bucket(&request.bucket)
                    .name(&request.key)
                    .build(),
            )
            .build();

        let client = self.client.clone();
        let max_labels = request.max_labels;
        let min_confidence = request.min_confidence;
        let output = block_on(async move {
            client
                .detect_labels()
                .image(image)
                .max_labels(max_labels)
                .min_confidence(min_confidence)
                .send()
                .await
        })
        .map_err(|error| classify("DetectLabels", error))?;

        Ok(output
            .labels()
            .iter()
            .filter_map(|label| label.name())
            .map(str::to_string)
            .collect())
    }
}
