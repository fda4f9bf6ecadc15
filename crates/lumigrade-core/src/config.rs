//! Configuration module
//!
//! Server, upload and grading settings read from the environment (and an
//! optional `.env` file).

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIM, DEFAULT_MAX_DIM_LIMIT};

const SERVER_PORT: u16 = 3001;
const MAX_UPLOAD_SIZE_MB: usize = 25;
const REQUEST_TIMEOUT_MS: u64 = 60_000;
const HTTP_CONCURRENCY_LIMIT: usize = 64;

/// Output format of the tracing subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub max_upload_size_bytes: usize,
    /// Directory for temporary uploads; `None` uses the system temp dir
    pub upload_dir: Option<PathBuf>,
    /// Deadline for one grading job, in milliseconds
    pub request_timeout_ms: u64,
    pub http_concurrency_limit: usize,
    /// Default bounding box for graded output
    pub max_dim: u32,
    /// Largest `maxDim` a client may request
    pub max_dim_limit: u32,
    pub jpeg_quality: u8,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            upload_dir: None,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
            max_dim: DEFAULT_MAX_DIM,
            max_dim_limit: DEFAULT_MAX_DIM_LIMIT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup, then validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        // REQUEST_TIMEOUT_MS wins over the coarser REQUEST_TIMEOUT_SECS
        let request_timeout_ms = lookup("REQUEST_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .or_else(|| {
                lookup("REQUEST_TIMEOUT_SECS")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(|secs| secs.saturating_mul(1000))
            })
            .unwrap_or(REQUEST_TIMEOUT_MS);

        let config = Config {
            server_port: lookup("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            upload_dir: lookup("UPLOAD_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            request_timeout_ms,
            http_concurrency_limit: lookup("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            max_dim: lookup("MAX_DIM")
                .unwrap_or_else(|| DEFAULT_MAX_DIM.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_DIM),
            max_dim_limit: lookup("MAX_DIM_LIMIT")
                .unwrap_or_else(|| DEFAULT_MAX_DIM_LIMIT.to_string())
                .parse()
                .unwrap_or(DEFAULT_MAX_DIM_LIMIT),
            jpeg_quality: lookup("JPEG_QUALITY")
                .unwrap_or_else(|| DEFAULT_JPEG_QUALITY.to_string())
                .parse()
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            log_format: LogFormat::parse(&lookup("LOG_FORMAT").unwrap_or_default()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than 0"));
        }

        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.request_timeout_ms == 0 {
            return Err(anyhow::anyhow!(
                "REQUEST_TIMEOUT_MS must be greater than 0"
            ));
        }

        if self.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than 0"
            ));
        }

        if self.max_dim == 0 || self.max_dim_limit == 0 {
            return Err(anyhow::anyhow!(
                "MAX_DIM and MAX_DIM_LIMIT must be greater than 0"
            ));
        }

        if self.max_dim > self.max_dim_limit {
            return Err(anyhow::anyhow!(
                "MAX_DIM ({}) cannot exceed MAX_DIM_LIMIT ({})",
                self.max_dim,
                self.max_dim_limit
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!("JPEG_QUALITY must be between 1 and 100"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.server_port, 3001);
        assert_eq!(config.max_dim, 2560);
        assert_eq!(config.jpeg_quality, 88);
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert_eq!(config.log_format, LogFormat::Compact);
        assert!(config.upload_dir.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_unparsable_numbers_fall_back_to_defaults() {
        let config = config_from(&[("REQUEST_TIMEOUT_SECS", "soon"), ("MAX_DIM", "big")]).unwrap();
        assert_eq!(config.request_timeout_ms, 60_000);
        assert_eq!(config.max_dim, 2560);
    }

    #[test]
    fn test_request_timeout_units() {
        let config = config_from(&[("REQUEST_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(config.request_timeout_ms, 5_000);

        let config = config_from(&[
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("REQUEST_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.request_timeout_ms, 250);

        assert!(config_from(&[("REQUEST_TIMEOUT_MS", "0")]).is_err());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("PORT", "0")]).is_err());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        assert!(config_from(&[("ENVIRONMENT", "production")]).is_err());

        let config = config_from(&[
            ("APP_ENV", "prod"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
        ])
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.cors_origins[1], "https://b.example");
    }

    #[test]
    fn test_max_dim_cannot_exceed_limit() {
        assert!(config_from(&[("MAX_DIM", "9000")]).is_err());
        let config = config_from(&[("MAX_DIM", "9000"), ("MAX_DIM_LIMIT", "10000")]).unwrap();
        assert_eq!(config.max_dim, 9000);
    }

    #[test]
    fn test_quality_out_of_range_is_rejected() {
        assert!(config_from(&[("JPEG_QUALITY", "0")]).is_err());
        // 101 parses as u8 and must be rejected by validation
        assert!(config_from(&[("JPEG_QUALITY", "101")]).is_err());
    }

    #[test]
    fn test_json_log_format_and_upload_dir() {
        let config = config_from(&[("LOG_FORMAT", "JSON"), ("UPLOAD_DIR", "/tmp/uploads")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.upload_dir, Some(PathBuf::from("/tmp/uploads")));
    }
}
