use std::{path::PathBuf, time::Duration};

use anyhow::Context;

use crate::{api_client::DEFAULT_TIMEOUT, session::DEFAULT_LOGIN_ROUTE};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub timeout: Duration,
    pub download_dir: PathBuf,
    pub login_route: String,
}

const DEFAULT_SESSION_FILE: &str = ".ebook_portal/session.json";
const DEFAULT_DOWNLOAD_DIR: &str = ".";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let api_url = std::env::var("PORTAL_API_URL").unwrap_or_default();
        let session_file =
            std::env::var("PORTAL_SESSION_FILE").unwrap_or(DEFAULT_SESSION_FILE.into());
        let download_dir =
            std::env::var("PORTAL_DOWNLOAD_DIR").unwrap_or(DEFAULT_DOWNLOAD_DIR.into());
        let login_route =
            std::env::var("PORTAL_LOGIN_ROUTE").unwrap_or(DEFAULT_LOGIN_ROUTE.into());
        let timeout = match std::env::var("PORTAL_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid PORTAL_TIMEOUT_SECS: {}", raw))?,
            ),
            Err(_) => DEFAULT_TIMEOUT,
        };
        Ok(Config {
            api_url,
            session_file: session_file.into(),
            timeout,
            download_dir: download_dir.into(),
            login_route,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.api_url.is_empty() {
            return Err("PORTAL_API_URL is missing".into());
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(format!("PORTAL_API_URL must be an http(s) URL, got {}", self.api_url));
        }
        if self.timeout.is_zero() {
            return Err("PORTAL_TIMEOUT_SECS must be greater than zero".into());
        }
        Ok(())
    }
}
