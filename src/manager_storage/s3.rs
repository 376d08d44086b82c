use std::time::Duration;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;
use crate::config::StorageParameters;
use crate::manager_storage::errors::StoreError;
use crate::manager_storage::ObjectStore;

/// The one region where S3 refuses an explicit location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 backed object store. The SDK is async, so calls are driven to completion on a
/// current thread runtime owned by the store.
pub struct S3Store {
    runtime: Runtime,
    client: Client,
}

impl S3Store {
    /// Returns an S3 store for the configured region, credentials come from the default chain
    ///
    /// # Arguments
    ///
    /// * 'config' - storage configuration
    pub fn new(config: &StorageParameters) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Transport(format!("error building runtime: {}", e)))?;

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_secs))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config);
        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = runtime.block_on(loader.load());

        // Path style addressing for S3 compatible endpoints such as LocalStack
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();

        Ok(Self { runtime, client: Client::from_conf(s3_config) })
    }
}

impl ObjectStore for S3Store {
    fn head_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let result = self.runtime.block_on(
            self.client
                .head_bucket()
                .bucket(bucket)
                .send()
        );

        match result {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadBucketError::NotFound(_)) => Err(StoreError::NotFound),
            Err(e) => Err(classify(e)),
        }
    }

    fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            let configuration = CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build();
            request = request.create_bucket_configuration(configuration);
        }

        match self.runtime.block_on(request.send()) {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), CreateBucketError::BucketAlreadyOwnedByYou(_)) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.runtime.block_on(
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body))
                .content_type(content_type)
                .send()
        )
            .map(|_| ())
            .map_err(classify)
    }
}

/// Maps an SDK error onto the store error taxonomy using the HTTP status where there is one
///
/// # Arguments
///
/// * 'e' - the SDK error
fn classify<E>(e: SdkError<E, HttpResponse>) -> StoreError
where
    E: std::error::Error + 'static,
{
    let status = match &e {
        SdkError::ServiceError(service_err) => Some(service_err.raw().status().as_u16()),
        _ => None,
    };
    let message = DisplayErrorContext(&e).to_string();

    match status {
        Some(404) => StoreError::NotFound,
        Some(401) | Some(403) => StoreError::AccessDenied(message),
        Some(_) => StoreError::Service(message),
        None => StoreError::Transport(message),
    }
}
