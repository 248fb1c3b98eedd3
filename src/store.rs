//! Object storage backend.
//!
//! [`ObjectStore`] is the seam between the pipeline and S3: the
//! uploader and lifecycle configurator speak in terms of uploads and
//! expiration rules, and [`S3ObjectStore`] translates those into SDK
//! calls. Tests substitute a mock.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, ExpirationStatus, LifecycleExpiration, LifecycleRule,
    LifecycleRuleFilter, ObjectCannedAcl,
};
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{CredentialSource, RunConfig};

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object upload failed: {0}")]
    Upload(String),

    #[error("lifecycle configuration failed: {0}")]
    Lifecycle(String),

    #[error("invalid lifecycle rule: {0}")]
    InvalidRule(String),
}

/// One object write.
#[derive(Debug, Clone)]
pub struct ObjectUpload {
    /// Full object key including any folder prefix.
    pub key: String,
    /// Encoded image payload.
    pub body: Bytes,
    /// MIME type recorded on the object.
    pub content_type: String,
    /// Whether the object gets a public-read ACL.
    pub public_read: bool,
    /// Advisory Expires header; the lifecycle rule is authoritative.
    pub expires: Option<DateTime<Utc>>,
}

/// A bucket expiration rule scoped to a key prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirationRule {
    /// Rule identifier, derived from the retention period.
    pub id: String,
    /// Key prefix the rule applies to.
    pub prefix: String,
    /// Days after which matching objects expire.
    pub days: i32,
}

/// Write operations the pipeline needs from the storage backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write one object.
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), StoreError>;

    /// Install (or replace) the bucket's expiration rule.
    async fn put_expiration_rule(&self, rule: &ExpirationRule) -> Result<(), StoreError>;
}

/// [`ObjectStore`] backed by the AWS S3 SDK.
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build the S3 client from the run configuration, wiring the
    /// resolved credential source into the SDK's provider chain.
    pub async fn new(config: &RunConfig) -> Self {
        let region = aws_config::Region::new(config.region.clone());
        let loader = aws_config::defaults(BehaviorVersion::latest()).region(region);

        let loader = match &config.credentials {
            CredentialSource::Static {
                access_key,
                secret_key,
            } => loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "command-line",
            )),
            CredentialSource::Profile(name) => loader.credentials_provider(
                aws_config::profile::ProfileFileCredentialsProvider::builder()
                    .profile_name(name)
                    .build(),
            ),
            CredentialSource::Environment => loader.credentials_provider(
                aws_config::environment::EnvironmentVariableCredentialsProvider::new(),
            ),
        };

        let aws_config = loader.load().await;

        let mut builder = S3ConfigBuilder::from(&aws_config);
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        let client = S3Client::from_conf(builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "object store client initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, upload: ObjectUpload) -> Result<(), StoreError> {
        debug!(key = %upload.key, bytes = upload.body.len(), "putting object");

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&upload.key)
            .body(ByteStream::from(upload.body))
            .content_type(&upload.content_type);

        if upload.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        if let Some(expires) = upload.expires {
            request = request.expires(aws_sdk_s3::primitives::DateTime::from_secs(
                expires.timestamp(),
            ));
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Upload(e.to_string()))?;

        Ok(())
    }

    async fn put_expiration_rule(&self, rule: &ExpirationRule) -> Result<(), StoreError> {
        let lifecycle_rule = LifecycleRule::builder()
            .id(&rule.id)
            .filter(LifecycleRuleFilter::builder().prefix(&rule.prefix).build())
            .status(ExpirationStatus::Enabled)
            .expiration(LifecycleExpiration::builder().days(rule.days).build())
            .build()
            .map_err(|e| StoreError::InvalidRule(e.to_string()))?;

        let configuration = BucketLifecycleConfiguration::builder()
            .rules(lifecycle_rule)
            .build()
            .map_err(|e| StoreError::InvalidRule(e.to_string()))?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .map_err(|e| StoreError::Lifecycle(e.to_string()))?;

        Ok(())
    }
}
