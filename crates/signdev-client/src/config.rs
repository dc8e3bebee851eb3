//! Client configuration

use crate::error::{ClientError, Result};
use signdev_pdf::DEFAULT_RENDER_WIDTH;
use signdev_types::FontSource;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api/";

/// File name of the persisted session inside the data directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root every relative endpoint path is joined onto
    pub base_url: String,
    /// Where the session survives restarts
    pub data_dir: PathBuf,
    pub font_source: FontSource,
    /// Width in pixels pages are rendered at for placement
    pub render_width: f64,
    /// Per-request timeout; `None` leaves requests unbounded
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: default_data_dir(),
            font_source: FontSource::default(),
            render_width: DEFAULT_RENDER_WIDTH,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Build from `SIGNDEV_*` environment variables, defaulting anything unset
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SIGNDEV_API_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }

        if let Ok(dir) = std::env::var("SIGNDEV_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(source) = std::env::var("SIGNDEV_FONT_SOURCE") {
            config.font_source = source
                .parse()
                .map_err(|e: signdev_types::UnknownFontSource| ClientError::Config(e.to_string()))?;
        }

        if let Ok(width) = std::env::var("SIGNDEV_RENDER_WIDTH") {
            config.render_width = width
                .parse::<f64>()
                .ok()
                .filter(|w| *w > 0.0)
                .ok_or_else(|| {
                    ClientError::Config(format!("SIGNDEV_RENDER_WIDTH is not a positive number: {}", width))
                })?;
        }

        if let Ok(secs) = std::env::var("SIGNDEV_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ClientError::Config(format!("SIGNDEV_REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_font_source(mut self, source: FontSource) -> Self {
        self.font_source = source;
        self
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

/// Platform data directory plus `signdev`, or `./signdev` when the platform has none
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("signdev")
}
