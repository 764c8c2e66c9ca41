use std::path::PathBuf;
use std::time::Duration;

use config::{Config as Cfg, Environment, File};
use serde::Deserialize;

use crate::ecc::EccLevel;
use crate::error::{Error, Result};
use crate::render::RenderOptions;

pub const MAX_SCALE: u32 = 64;
pub const MAX_MARGIN: u32 = 64;

/// Runtime settings. Every field has a default so an empty environment works.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_margin")]
    pub margin: u32,
    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default = "default_ecc")]
    pub ecc: String,
    /// Encoded while nothing has been saved yet.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(default = "default_download_name")]
    pub download_name: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_clipboard_max_len")]
    pub clipboard_max_len: usize,
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_margin() -> u32 {
    2
}

fn default_scale() -> u32 {
    9
}

fn default_ecc() -> String {
    "M".to_string()
}

fn default_placeholder() -> String {
    "https://example.com".to_string()
}

fn default_download_name() -> String {
    "zzQR.png".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_clipboard_max_len() -> usize {
    800
}

fn default_toast_ms() -> u64 {
    1600
}

fn default_highlight_ms() -> u64 {
    900
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            scale: default_scale(),
            ecc: default_ecc(),
            placeholder: default_placeholder(),
            download_name: default_download_name(),
            output_dir: default_output_dir(),
            clipboard_max_len: default_clipboard_max_len(),
            toast_ms: default_toast_ms(),
            highlight_ms: default_highlight_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Loads `.env`, an optional `zzqr.{toml,yaml,json}` file, then `ZZQR__*`
    /// environment variables, later sources winning.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Cfg::builder()
            .add_source(File::with_name("zzqr").required(false))
            .add_source(Environment::with_prefix("ZZQR").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.render_options()?;
        Ok(settings)
    }

    pub fn ecc_level(&self) -> Result<EccLevel> {
        self.ecc.parse()
    }

    /// Render options at the configured starting level.
    ///
    /// `scale` must be within `1..=MAX_SCALE` and `margin` at most `MAX_MARGIN`.
    pub fn render_options(&self) -> Result<RenderOptions> {
        if !(1..=MAX_SCALE).contains(&self.scale) {
            return Err(invalid(format!(
                "scale must be between 1 and {MAX_SCALE}, got {}",
                self.scale
            )));
        }
        if self.margin > MAX_MARGIN {
            return Err(invalid(format!(
                "margin must be at most {MAX_MARGIN}, got {}",
                self.margin
            )));
        }
        Ok(RenderOptions {
            margin: self.margin,
            scale: self.scale,
            ecc: self.ecc_level()?,
        })
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

fn invalid(message: String) -> Error {
    Error::Config(config::ConfigError::Message(message))
}
