use anyhow::Context;
use serde::Deserialize;

/// Token lifetimes are capped at one year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3-compatible bucket that holds avatars and cover images.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Prefix joined with the object key to build the URL stored on a user.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = required("DATABASE_URL")?;

        let jwt = JwtConfig {
            access_secret: required("ACCESS_TOKEN_SECRET")?,
            refresh_secret: required("REFRESH_TOKEN_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "vidtube".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "vidtube-users".into()),
            access_ttl_minutes: ttl_minutes("ACCESS_TOKEN_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: ttl_minutes("REFRESH_TOKEN_TTL_MINUTES", 60 * 24 * 10)?,
        };

        let endpoint = required("MEDIA_ENDPOINT")?;
        let bucket = required("MEDIA_BUCKET")?;
        let public_base_url = std::env::var("MEDIA_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));
        let media = MediaConfig {
            access_key: required("MEDIA_ACCESS_KEY")?,
            secret_key: required("MEDIA_SECRET_KEY")?,
            region: std::env::var("MEDIA_REGION").unwrap_or_else(|_| "us-east-1".into()),
            endpoint,
            bucket,
            public_base_url,
        };

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or(std::env::var("APP_PORT").ok(), 8080),
            database_url,
            jwt,
            media,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} must be set"))
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn ttl_minutes(key: &str, default: i64) -> anyhow::Result<i64> {
    check_ttl(key, parse_or(std::env::var(key).ok(), default))
}

fn check_ttl(key: &str, minutes: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("{key} must be between 1 and {MAX_TTL_MINUTES} minutes, got {minutes}");
    }
    Ok(minutes)
}
