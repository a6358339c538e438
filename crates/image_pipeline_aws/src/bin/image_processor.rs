use aws_config::BehaviorVersion;
use image_pipeline_aws::adapters::aws::dynamodb::DynamoRecordStore;
use image_pipeline_aws::adapters::aws::rekognition::RekognitionLabels;
use image_pipeline_aws::handlers::image_event::{handle_image_event, ProcessorConfig};
use image_pipeline_aws::runtime::contract::EventResponse;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

async fn handle_request(
    event: LambdaEvent<Value>,
    detector: &RekognitionLabels,
    store: &DynamoRecordStore,
) -> Result<EventResponse, Error> {
    handle_image_event(&event.payload, detector, store).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = ProcessorConfig::from_env()?;
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let detector = RekognitionLabels::new(aws_sdk_rekognition::Client::new(&aws_config));
    let store = DynamoRecordStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.table_name,
    );

    lambda_runtime::run(service_fn(|event| handle_request(event, &detector, &store))).await
}
