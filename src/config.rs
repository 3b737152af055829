use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Store API
    pub api_url: String,
    pub api_key: Option<String>,

    // Interface
    pub ui_language: String,

    // Reads
    pub read_retry_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("SLIDER_API_URL").context("SLIDER_API_URL not set")?;
        let api_url = api_url.trim().trim_end_matches('/').to_string();
        if api_url.is_empty() {
            bail!("SLIDER_API_URL must not be empty");
        }

        let read_retry_attempts = match std::env::var("READ_RETRY_ATTEMPTS") {
            Ok(v) => v
                .parse::<u32>()
                .context(format!("Invalid READ_RETRY_ATTEMPTS: '{}'", v))?,
            Err(_) => 3,
        };
        if read_retry_attempts == 0 {
            bail!("READ_RETRY_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            api_url,
            api_key: std::env::var("SLIDER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            ui_language: std::env::var("UI_LANGUAGE").unwrap_or_else(|_| "en".to_string()),
            read_retry_attempts,
        })
    }
}
