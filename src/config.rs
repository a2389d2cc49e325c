use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5001";
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROFILE_PATH: &str = ".flexspace/profile.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    /// Bucket for direct storage uploads; the fallback path is disabled without one
    pub storage_bucket: Option<String>,
    pub upload_timeout: Duration,
    pub http_timeout: Duration,
    pub profile_path: PathBuf,
    pub id_token: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            api_url: try_load::<String>("FLEXSPACE_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            storage_bucket: optional("FLEXSPACE_STORAGE_BUCKET"),
            upload_timeout: Duration::from_secs(try_load(
                "FLEXSPACE_UPLOAD_TIMEOUT_SECS",
                &DEFAULT_UPLOAD_TIMEOUT_SECS.to_string(),
            )),
            http_timeout: Duration::from_secs(try_load(
                "FLEXSPACE_HTTP_TIMEOUT_SECS",
                &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
            )),
            profile_path: try_load("FLEXSPACE_PROFILE_PATH", DEFAULT_PROFILE_PATH),
            id_token: optional("FLEXSPACE_ID_TOKEN"),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_bucket: None,
            upload_timeout: Duration::from_secs(DEFAULT_UPLOAD_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            profile_path: PathBuf::from(DEFAULT_PROFILE_PATH),
            id_token: None,
        }
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
            .parse()
            .unwrap_or_else(|_| unreachable!("default for {key} must parse"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_load_falls_back_on_garbage() {
        env::set_var("FLEXSPACE_TEST_TIMEOUT", "soon");
        let secs: u64 = try_load("FLEXSPACE_TEST_TIMEOUT", "15");
        assert_eq!(secs, 15);
        env::remove_var("FLEXSPACE_TEST_TIMEOUT");
    }

    #[test]
    fn with_api_url_strips_trailing_slash() {
        let config = Config::default().with_api_url("https://api.example.com/");
        assert_eq!(config.api_url, "https://api.example.com");
    }
}
