use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_EXCERPT_CHARS: usize = 3000;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub gateway_api_key: String,
    pub gateway_url: String,
    pub model: String,
    /// Ask the gateway for `response_format: json_object`.
    pub json_mode: bool,
    pub fetch_timeout: Duration,
    pub gateway_timeout: Duration,
    pub excerpt_chars: usize,
    /// Base URL of the auth provider; sessions are resolved against it.
    pub auth_url: Option<String>,
    /// Public API key the auth provider expects on every call.
    pub auth_api_key: Option<String>,
    /// Hosted sign-in page the "Sign In" links point at.
    pub sign_in_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source, applying defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway_api_key = lookup("AI_GATEWAY_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("AI_GATEWAY_API_KEY is not configured".to_string()))?;

        let gateway_url = lookup("AI_GATEWAY_URL").unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());
        let model = lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let json_mode = parse_or("AI_JSON_MODE", lookup("AI_JSON_MODE"), false)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or("PORT", lookup("PORT"), 3000)?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let fetch_timeout = parse_or("FETCH_TIMEOUT_SECS", lookup("FETCH_TIMEOUT_SECS"), 10)?;
        let gateway_timeout = parse_or("GATEWAY_TIMEOUT_SECS", lookup("GATEWAY_TIMEOUT_SECS"), 60)?;
        let excerpt_chars = parse_or("EXCERPT_CHARS", lookup("EXCERPT_CHARS"), DEFAULT_EXCERPT_CHARS)?;
        if excerpt_chars == 0 {
            return Err(AppError::Config("Invalid EXCERPT_CHARS: must be positive".to_string()));
        }

        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let auth_url = non_empty("AUTH_URL").map(|url| url.trim_end_matches('/').to_string());
        let auth_api_key = non_empty("AUTH_API_KEY");
        let sign_in_url = non_empty("AUTH_SIGN_IN_URL");

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            gateway_api_key,
            gateway_url,
            model,
            json_mode,
            fetch_timeout: Duration::from_secs(fetch_timeout),
            gateway_timeout: Duration::from_secs(gateway_timeout),
            excerpt_chars,
            auth_url,
            auth_api_key,
            sign_in_url,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e))),
    }
}
