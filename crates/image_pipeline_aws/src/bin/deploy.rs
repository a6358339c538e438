use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use clap::Parser;
use image_pipeline_aws::adapters::aws::dynamodb::DynamoTables;
use image_pipeline_aws::adapters::aws::identity::caller_role_arn;
use image_pipeline_aws::adapters::aws::lambda::LambdaFunctions;
use image_pipeline_aws::adapters::aws::s3::S3Storage;
use image_pipeline_aws::provisioning::orchestrator::Orchestrator;
use image_pipeline_aws::provisioning::{DeployConfig, Timings, DEFAULT_REGION};
use image_pipeline_aws::runtime::naming::ProjectIdentity;
use image_pipeline_aws::runtime::wait::{RetryPolicy, WaitPolicy};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deploy",
    about = "Provision the image pipeline and publish its upload site"
)]
struct Cli {
    /// Region every resource is created in
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,
    /// Reuse an existing 8-hex-char project id instead of generating one
    #[arg(long)]
    project_id: Option<String>,
    /// Execution role for the function; derived from the caller's account if absent
    #[arg(long, env = "PIPELINE_ROLE_ARN")]
    role_arn: Option<String>,
    /// Role name used when deriving the execution role ARN
    #[arg(long, default_value = "LabRole")]
    role_name: String,
    /// Compiled image_processor binary, packaged as `bootstrap`
    #[arg(
        long,
        default_value = "target/x86_64-unknown-linux-gnu/release/image_processor"
    )]
    artifact: PathBuf,
    /// Page template containing the input-bucket placeholder
    #[arg(long, default_value = "index.html")]
    template: PathBuf,
    /// Upper bound for each readiness poll, in seconds
    #[arg(long, default_value_t = 60)]
    ready_timeout_secs: u64,
    /// Retries of the event subscription while the invoke grant propagates
    #[arg(long, default_value_t = 6)]
    notification_retries: u32,
}

impl Cli {
    fn timings(&self) -> Timings {
        let defaults = Timings::default();
        let timeout = Duration::from_secs(self.ready_timeout_secs);
        Timings {
            table_ready: WaitPolicy::new(timeout, defaults.table_ready.interval),
            bucket_ready: WaitPolicy::new(timeout, defaults.bucket_ready.interval),
            function_ready: WaitPolicy::new(timeout, defaults.function_ready.interval),
            notification_retry: RetryPolicy {
                max_retries: self.notification_retries,
                ..defaults.notification_retry
            },
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let identity = match &cli.project_id {
        Some(token) => ProjectIdentity::parse(token).context("invalid --project-id")?,
        None => ProjectIdentity::generate(),
    };

    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cli.region.clone()))
        .load()
        .await;

    let role_arn = match &cli.role_arn {
        Some(value) => Some(value.clone()),
        None => {
            let sts = aws_sdk_sts::Client::new(&aws_config);
            match caller_role_arn(&sts, &cli.role_name).await {
                Ok(value) => {
                    info!(component = "deploy", event = "role_detected", role_arn = %value);
                    Some(value)
                }
                Err(error) => {
                    warn!(component = "deploy", event = "role_unresolved", error = %error);
                    None
                }
            }
        }
    };

    let mut config = DeployConfig::new(
        cli.region.clone(),
        identity,
        cli.artifact.clone(),
        cli.template.clone(),
    )
    .with_timings(cli.timings());
    config.role_arn = role_arn;

    let tables = DynamoTables::new(aws_sdk_dynamodb::Client::new(&aws_config));
    let storage = S3Storage::new(aws_sdk_s3::Client::new(&aws_config), cli.region.clone());
    let functions = LambdaFunctions::new(aws_sdk_lambda::Client::new(&aws_config));

    match Orchestrator::new(&config, &tables, &storage, &functions).run() {
        Ok(outcome) => {
            print!("{}", outcome.report(&config.region, &config.names));
            Ok(ExitCode::SUCCESS)
        }
        Err(abort) => {
            eprintln!("{abort}");
            print!("{}", abort.outcome.report(&config.region, &config.names));
            Ok(ExitCode::FAILURE)
        }
    }
}
