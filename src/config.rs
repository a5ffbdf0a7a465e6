use std::env;
use std::path::PathBuf;

use log::warn;
use thiserror::Error;

const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";
const DEFAULT_DATABASE_URL: &str = "sqlite://project_mgmt.db";
const DEFAULT_UPLOAD_FOLDER: &str = "uploads";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;
const MIN_SECRET_KEY_LEN: usize = 32;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("SECRET_KEY must be at least 32 bytes long")]
    SecretKeyTooShort,
    #[error("{0} must be a positive integer, got {1:?}")]
    InvalidNumber(&'static str, String),
    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),
    #[error("S3_BUCKET is set but {0} is missing")]
    MissingS3Credential(&'static str),
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: String,
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub max_content_length: usize,
    pub bind_address: String,
    pub bcrypt_cost: u32,
    pub s3: Option<S3Config>,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset.
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let secret_key = match get("SECRET_KEY") {
            Some(key) => key,
            None => {
                warn!("SECRET_KEY not set, falling back to the development key");
                DEV_SECRET_KEY.to_string()
            }
        };
        if secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::SecretKeyTooShort);
        }

        let max_content_length = match get("MAX_CONTENT_LENGTH") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber("MAX_CONTENT_LENGTH", raw))?,
            None => DEFAULT_MAX_CONTENT_LENGTH,
        };

        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidNumber("BCRYPT_COST", raw))?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        let s3 = match get("S3_BUCKET") {
            Some(bucket) => Some(S3Config {
                bucket,
                access_key: get("S3_ACCESS_KEY")
                    .ok_or(ConfigError::MissingS3Credential("S3_ACCESS_KEY"))?,
                secret_key: get("S3_SECRET_KEY")
                    .ok_or(ConfigError::MissingS3Credential("S3_SECRET_KEY"))?,
                endpoint: get("S3_ENDPOINT"),
                region: get("S3_REGION").unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            }),
            None => None,
        };

        Ok(Config {
            secret_key,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            upload_folder: PathBuf::from(
                get("UPLOAD_FOLDER").unwrap_or_else(|| DEFAULT_UPLOAD_FOLDER.to_string()),
            ),
            max_content_length,
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            bcrypt_cost,
            s3,
        })
    }
}
