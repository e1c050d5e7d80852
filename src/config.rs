use std::{env, fmt, ops::RangeInclusive, path::PathBuf};

/// Accepted `JWT_MAXAGE` values, in minutes: one minute up to one year.
pub const JWT_MAXAGE_RANGE: RangeInclusive<i64> = 1..=60 * 24 * 365;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} environment variable must be set"),
            Self::Invalid(key) => write!(f, "{key} has an invalid value"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub contact_to: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token and cookie lifetime, in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    /// Name shown on the home page.
    pub site_owner: String,
    pub public_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn init() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let smtp = match (
            env::var("SMTP_SERVER"),
            env::var("SMTP_USERNAME"),
            env::var("SMTP_PASSWORD"),
            env::var("CONTACT_TO"),
        ) {
            (Ok(server), Ok(username), Ok(password), Ok(contact_to)) => Some(SmtpConfig {
                server,
                port: parsed("SMTP_PORT", 587)?,
                username,
                password,
                contact_to,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_maxage: bounded(
                "JWT_MAXAGE",
                env::var("JWT_MAXAGE").ok(),
                60,
                JWT_MAXAGE_RANGE,
            )?,
            port: parsed("PORT", 8080)?,
            site_owner: env::var("SITE_OWNER").unwrap_or_else(|_| "Jorge".to_string()),
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/uploads")),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            smtp,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parsed<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn bounded<T>(
    key: &'static str,
    raw: Option<String>,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd,
{
    let value = match raw {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key))?,
        None => default,
    };

    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid(key))
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/test".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 0,
            site_owner: "Jorge".to_string(),
            public_dir: std::env::temp_dir().join("portfolio-blog-test-public"),
            upload_dir: std::env::temp_dir().join("portfolio-blog-test-uploads"),
            max_upload_bytes: 20 * 1024 * 1024,
            smtp: None,
        }
    }
}
