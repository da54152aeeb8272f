//! Configuration module
//!
//! All configuration is read from the environment once at startup, validated,
//! and threaded through the application as an immutable value.

use std::env;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_THUMBNAIL_SIZE_MB: usize = 10;
const MAX_VIDEO_SIZE_MB: usize = 1024;
const SPOOL_THRESHOLD_MB: usize = 32;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    // Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub assets_root: String,
    pub assets_base_url: String,
    // Upload limits
    pub max_thumbnail_size_bytes: usize,
    pub max_video_size_bytes: usize,
    /// Multipart parts larger than this spill from memory to a temp file.
    pub spool_threshold_bytes: usize,
    // Video probing
    pub ffprobe_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8091".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let config = Config {
            server_port,
            environment,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            assets_root: env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            assets_base_url: env::var("ASSETS_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", server_port)),
            max_thumbnail_size_bytes: env::var("MAX_THUMBNAIL_SIZE_MB")
                .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_THUMBNAIL_SIZE_MB)
                * 1024
                * 1024,
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            spool_threshold_bytes: env::var("SPOOL_THRESHOLD_MB")
                .unwrap_or_else(|_| SPOOL_THRESHOLD_MB.to_string())
                .parse::<usize>()
                .unwrap_or(SPOOL_THRESHOLD_MB)
                * 1024
                * 1024,
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.assets_root.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "ASSETS_ROOT must be set when using local storage backend"
                    ));
                }
            }
        }

        if self.max_thumbnail_size_bytes == 0 || self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be non-zero"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server_port: 8091,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            database_url: "postgresql://localhost/reelvault".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            assets_root: "./assets".to_string(),
            assets_base_url: "http://localhost:8091/assets".to_string(),
            max_thumbnail_size_bytes: MAX_THUMBNAIL_SIZE_MB * 1024 * 1024,
            max_video_size_bytes: MAX_VIDEO_SIZE_MB * 1024 * 1024,
            spool_threshold_bytes: SPOOL_THRESHOLD_MB * 1024 * 1024,
            ffprobe_path: "ffprobe".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_local_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_jwt_secret() {
        let mut config = base_config();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_s3_settings_for_s3_backend() {
        let mut config = base_config();
        config.storage_backend = StorageBackend::S3;
        assert!(config.validate().is_err());

        config.s3_bucket = Some("reels".to_string());
        assert!(config.validate().is_err());

        config.s3_region = Some("us-east-2".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let mut config = base_config();
        assert!(!config.is_production());
        config.environment = "Production".to_string();
        assert!(config.is_production());
    }
}
