//! Connection settings for the cloud backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stand-in printed for credentials.
const REDACTED: &str = "<redacted>";

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| REDACTED)
}

/// Settings for an S3-compatible bucket.
///
/// Unset credentials fall back to the standard `AWS_*` environment variables
/// and instance metadata.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct S3Options {
    /// Bucket name
    bucket: String,
    /// Region, `us-east-1` when unset
    #[serde(default)]
    region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...)
    #[serde(default)]
    endpoint: Option<String>,
    /// Access key id
    #[serde(default)]
    access_key_id: Option<String>,
    /// Secret access key
    #[serde(default)]
    secret_access_key: Option<String>,
    /// Permit plain HTTP endpoints
    #[serde(default)]
    allow_http: bool,
}

impl S3Options {
    /// Options for `bucket` with everything else unset.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set static credentials.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Permit plain HTTP endpoints.
    pub fn with_allow_http(mut self, allow_http: bool) -> Self {
        self.allow_http = allow_http;
        self
    }
}

impl fmt::Debug for S3Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Options")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(&self.secret_access_key))
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

/// Settings for a Google Cloud Storage bucket.
///
/// Without a key or key path the client uses application default credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GcsOptions {
    /// Bucket name
    bucket: String,
    /// Service account key, JSON serialized
    #[serde(default)]
    service_account_key: Option<String>,
    /// Path to a service account key file
    #[serde(default)]
    service_account_path: Option<String>,
}

impl GcsOptions {
    /// Options for `bucket` with application default credentials.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    /// Use a JSON service account key.
    pub fn with_service_account_key(mut self, key: impl Into<String>) -> Self {
        self.service_account_key = Some(key.into());
        self
    }

    /// Use a service account key file.
    pub fn with_service_account_path(mut self, path: impl Into<String>) -> Self {
        self.service_account_path = Some(path.into());
        self
    }
}

impl fmt::Debug for GcsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsOptions")
            .field("bucket", &self.bucket)
            .field("service_account_key", &redact(&self.service_account_key))
            .field("service_account_path", &self.service_account_path)
            .finish()
    }
}
