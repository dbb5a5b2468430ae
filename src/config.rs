use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub payment_base_url: String,
    pub payment_key_id: String,
    pub payment_key_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            payment_base_url: std::env::var("PAYMENT_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            payment_key_id: std::env::var("PAYMENT_KEY_ID")
                .map_err(|_| anyhow::anyhow!("PAYMENT_KEY_ID environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("PAYMENT_KEY_ID cannot be empty");
                    }
                    Ok(key)
                })?,
            payment_key_secret: std::env::var("PAYMENT_KEY_SECRET")
                .map_err(|_| anyhow::anyhow!("PAYMENT_KEY_SECRET environment variable required"))
                .and_then(|secret| {
                    if secret.trim().is_empty() {
                        anyhow::bail!("PAYMENT_KEY_SECRET cannot be empty");
                    }
                    Ok(secret)
                })?,
        };

        if !config.payment_base_url.starts_with("http://")
            && !config.payment_base_url.starts_with("https://")
        {
            anyhow::bail!("PAYMENT_BASE_URL must start with http:// or https://");
        }

        // Log successful configuration load (the key secret is never logged)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Payment Base URL: {}", config.payment_base_url);
        tracing::debug!("Payment Key ID: {}", config.payment_key_id);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
