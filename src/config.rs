use std::env;

use secrecy::SecretString;

const DEFAULT_SESSION_MAX_AGE_DAYS: i64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub auth: AuthConfig,
    pub payment_webhook_secret: SecretString,
    pub cloudinary: CloudinaryConfig,
}

/// Settings consumed by the sign-in flow and session tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Emails granted the admin role when their account is first created.
    pub admin_emails: Vec<String>,
    pub session_secret: SecretString,
    pub session_max_age_days: i64,
    pub google_client_id: String,
}

impl AuthConfig {
    pub fn role_for(&self, email: &str) -> &'static str {
        if self
            .admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
        {
            "admin"
        } else {
            "user"
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let admin_emails = ["ADMIN_EMAIL1", "ADMIN_EMAIL2"]
            .into_iter()
            .filter_map(|key| env::var(key).ok())
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .collect();

        let auth = AuthConfig {
            admin_emails,
            session_secret: required_secret("SESSION_SECRET")?,
            session_max_age_days: env::var("SESSION_MAX_AGE_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|days| *days > 0)
                .unwrap_or(DEFAULT_SESSION_MAX_AGE_DAYS),
            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")?,
            api_key: env::var("CLOUDINARY_API_KEY")?,
            api_secret: required_secret("CLOUDINARY_API_SECRET")?,
        };

        Ok(Self {
            port,
            database_url,
            host,
            max_upload_bytes,
            auth,
            payment_webhook_secret: required_secret("PAYMENT_WEBHOOK_SECRET")?,
            cloudinary,
        })
    }
}

fn required_secret(key: &str) -> anyhow::Result<SecretString> {
    let value = env::var(key).map_err(|_| anyhow::anyhow!("{key} is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{key} must not be empty");
    }
    Ok(SecretString::from(value))
}
