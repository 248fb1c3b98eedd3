//! Run configuration for the capture agent.
//!
//! Command-line arguments, defaults, and the credential environment are
//! merged here into one immutable [`RunConfig`] before anything touches
//! the camera or the network.

use crate::cli::Args;
use std::time::Duration;
use thiserror::Error;

/// Delimiter between the key and secret halves of an explicit
/// credential argument.
const CREDENTIAL_DELIMITER: char = '|';

/// Errors raised while resolving or validating the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("credential argument {0:?} must be a profile name or \"KEY|SECRET\"")]
    InvalidCredentialSpec(String),

    #[error("no credentials: pass --credentials or set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")]
    MissingCredentials,
}

/// Where the S3 client gets its credentials from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Explicit key pair supplied on the command line.
    Static {
        access_key: String,
        secret_key: String,
    },
    /// Named profile from the shared AWS credentials file.
    Profile(String),
    /// Key pair from the process environment.
    Environment,
}

impl CredentialSource {
    /// Resolve the credential source with the documented precedence: an
    /// explicit `--credentials` argument wins; otherwise the
    /// environment pair is required.
    pub fn resolve(
        spec: Option<&str>,
        env_access_key: Option<String>,
        env_secret_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(spec) = spec {
            return Self::parse_spec(spec);
        }

        match (env_access_key, env_secret_key) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Ok(CredentialSource::Environment)
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Parse an explicit credential argument. One token selects a named
    /// profile; two `|`-separated tokens are a key/secret pair; any
    /// other shape is fatal.
    fn parse_spec(spec: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = spec.split(CREDENTIAL_DELIMITER).collect();
        match parts.as_slice() {
            [profile] if !profile.is_empty() => Ok(CredentialSource::Profile(profile.to_string())),
            [key, secret] if !key.is_empty() && !secret.is_empty() => {
                Ok(CredentialSource::Static {
                    access_key: key.to_string(),
                    secret_key: secret.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidCredentialSpec(spec.to_string())),
        }
    }
}

/// Immutable configuration for one run of the agent.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Destination S3 bucket.
    pub bucket: String,

    /// Key prefix for uploaded frames.
    pub folder: String,

    /// Days until uploaded frames expire; values <= 0 disable the
    /// expiration rule entirely.
    pub retention_days: i32,

    /// Seconds between capture cycles.
    pub interval_secs: u64,

    /// Video device path handed to the capture tool.
    pub device: String,

    /// Capture resolution as WIDTHxHEIGHT.
    pub resolution: String,

    /// AWS region for the bucket.
    pub region: String,

    /// Custom S3 endpoint URL, if any.
    pub endpoint_url: Option<String>,

    /// Force path-style addressing (MinIO compatibility).
    pub force_path_style: bool,

    /// Resolved credential source.
    pub credentials: CredentialSource,

    /// Log filter when RUST_LOG is not set.
    pub log_level: String,

    /// Emit logs as JSON instead of human-readable lines.
    pub log_json: bool,

    /// Port for the Prometheus exporter.
    pub metrics_port: u16,
}

impl RunConfig {
    /// Merge parsed arguments and the credential environment into a
    /// validated configuration.
    pub fn resolve(
        args: Args,
        env_access_key: Option<String>,
        env_secret_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        let credentials =
            CredentialSource::resolve(args.credentials.as_deref(), env_access_key, env_secret_key)?;

        let config = Self {
            bucket: args.bucket,
            folder: args.folder,
            retention_days: args.ttl_days,
            interval_secs: args.interval,
            device: args.device,
            resolution: args.resolution,
            region: args.region,
            endpoint_url: args.endpoint_url,
            force_path_style: args.force_path_style,
            credentials,
            log_level: args.log_level,
            log_json: args.log_json,
            metrics_port: args.metrics_port,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate field-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::MissingField("bucket".to_string()));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }

        if self.device.is_empty() {
            return Err(ConfigError::MissingField("device".to_string()));
        }

        let dims: Vec<&str> = self.resolution.split('x').collect();
        let valid = dims.len() == 2
            && dims
                .iter()
                .all(|d| d.parse::<u32>().map(|n| n > 0).unwrap_or(false));
        if !valid {
            return Err(ConfigError::InvalidValue {
                field: "resolution".to_string(),
                message: "expected WIDTHxHEIGHT, e.g. 800x600".to_string(),
            });
        }

        Ok(())
    }

    /// Base wait between cycles as a Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse_args(argv: &[&str]) -> Args {
        Args::parse_from(argv)
    }

    fn base_args() -> Args {
        parse_args(&["capture-agent", "--bucket", "test-bucket"])
    }

    #[test]
    fn test_explicit_key_pair() {
        let source = CredentialSource::resolve(Some("AAA|BBB"), None, None).unwrap();
        assert_eq!(
            source,
            CredentialSource::Static {
                access_key: "AAA".to_string(),
                secret_key: "BBB".to_string(),
            }
        );
    }

    #[test]
    fn test_named_profile() {
        let source = CredentialSource::resolve(Some("profilename"), None, None).unwrap();
        assert_eq!(source, CredentialSource::Profile("profilename".to_string()));
    }

    #[test]
    fn test_three_token_spec_is_fatal() {
        let result = CredentialSource::resolve(Some("a|b|c"), None, None);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCredentialSpec(_))
        ));
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let result = CredentialSource::resolve(Some("AAA|"), None, None);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCredentialSpec(_))
        ));
    }

    #[test]
    fn test_environment_fallback() {
        let source = CredentialSource::resolve(
            None,
            Some("AKIA123".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();
        assert_eq!(source, CredentialSource::Environment);
    }

    #[test]
    fn test_missing_credentials_everywhere() {
        let result = CredentialSource::resolve(None, None, None);
        assert!(matches!(result, Err(ConfigError::MissingCredentials)));

        // An empty environment value is as missing as an absent one.
        let result = CredentialSource::resolve(None, Some(String::new()), Some("s".to_string()));
        assert!(matches!(result, Err(ConfigError::MissingCredentials)));
    }

    #[test]
    fn test_explicit_spec_wins_over_environment() {
        let source = CredentialSource::resolve(
            Some("fieldcam"),
            Some("AKIA123".to_string()),
            Some("secret".to_string()),
        )
        .unwrap();
        assert_eq!(source, CredentialSource::Profile("fieldcam".to_string()));
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let config = RunConfig::resolve(
            base_args(),
            Some("k".to_string()),
            Some("s".to_string()),
        )
        .unwrap();

        assert_eq!(config.bucket, "test-bucket");
        assert_eq!(config.folder, "images");
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.device, "/dev/video0");
        assert_eq!(config.resolution, "800x600");
        assert_eq!(config.credentials, CredentialSource::Environment);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let args = parse_args(&["capture-agent", "--bucket", "b", "--interval", "0"]);
        let result = RunConfig::resolve(args, Some("k".to_string()), Some("s".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_malformed_resolution_rejected() {
        for bad in ["800", "800x", "x600", "800x600x3", "widexhigh"] {
            let args = parse_args(&["capture-agent", "--bucket", "b", "--resolution", bad]);
            let result = RunConfig::resolve(args, Some("k".to_string()), Some("s".to_string()));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "resolution {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_negative_ttl_is_allowed() {
        // <= 0 means "no expiration", not an error.
        let args = parse_args(&["capture-agent", "--bucket", "b", "--ttl-days=-1"]);
        let config =
            RunConfig::resolve(args, Some("k".to_string()), Some("s".to_string())).unwrap();
        assert_eq!(config.retention_days, -1);
    }
}
