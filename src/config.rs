use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: Option<String>,
    pub app_name: String,
    pub deployment: String,
    pub session_ttl_hours: i64,
    pub bootstrap_admin_username: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok(); // Load from .env file if available
        let db_url = env::var("DB_URL").ok().or_else(|| {
            Some(format!(
                "{}://{}:{}@{}:{}/{}",
                env::var("DB_PREFIX").unwrap_or_else(|_| "postgresql".to_string()),
                env::var("DB_USER").expect("DB_USER must be set"),
                env::var("DB_PASSWORD").expect("DB_PASSWORD must be set"),
                env::var("DB_HOST").expect("DB_HOST must be set"),
                env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string()),
                env::var("DB_NAME").expect("DB_NAME must be set"),
            ))
        });

        Config {
            app_name: env::var("APP_NAME").expect("APP_NAME must be set"),
            deployment: env::var("DEPLOYMENT")
                .expect("DEPLOYMENT must be set, this can be local, dev, stage, or prod"),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|hours| hours.parse().ok())
                .filter(|hours: &i64| *hours > 0)
                .unwrap_or(12),
            bootstrap_admin_username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
            db_url,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            app_name: "spray-api-test".to_string(),
            deployment: "test".to_string(),
            session_ttl_hours: 12,
            bootstrap_admin_username: None,
            bootstrap_admin_password: None,
            db_url: None,
        }
    }
}
