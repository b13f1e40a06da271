use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub at_username: Option<String>,
    pub at_api_key: Option<String>,
    pub sms_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let at_username = env::var("AT_USERNAME").ok().filter(|s| !s.is_empty());
        let at_api_key = env::var("AT_API_KEY").ok().filter(|s| !s.is_empty());
        let sms_timeout_secs = env::var("SMS_TIMEOUT_SECS")
            .ok()
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(10);
        Ok(Self {
            database_url,
            host,
            port,
            at_username,
            at_api_key,
            sms_timeout_secs,
        })
    }
}
