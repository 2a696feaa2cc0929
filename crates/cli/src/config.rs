use std::time::Duration;

use anyhow::{bail, Context};
use shotver_core::paths::{MediaRoot, PathStyle};
use shotver_tracking::shotgun::ShotgunConfig;
use shotver_tracking::RetryPolicy;

/// Default API script user.
const DEFAULT_SCRIPT_NAME: &str = "AX_SGversionTools";

/// Default web root that media URLs are served from.
const DEFAULT_MEDIA_URL_ROOT: &str = "http://yogi.axis.rocks";

/// Default encode deadline per flavor, in seconds.
const DEFAULT_ENCODE_TIMEOUT_SECS: u64 = 3600;

/// Default number of version creation attempts.
const DEFAULT_CREATE_ATTEMPTS: u32 = 3;

/// Command-line tool configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// ShotGrid site URL.
    pub site_url: Option<String>,
    pub script_name: String,
    pub script_key: Option<String>,
    /// Mount that version media is written under.
    pub media_root: MediaRoot,
    /// Web root that mirrors `media_root`.
    pub media_url_root: String,
    pub ffmpeg_path: String,
    pub encode_timeout: Duration,
    pub retry: RetryPolicy,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                                   |
    /// |---------------------------|-------------------------------------------|
    /// | `SHOTGUN_URL`             | `https://{SHOTGUN_STUDIO}.shotgunstudio.com` |
    /// | `SHOTGUN_STUDIO`          | --                                        |
    /// | `SHOTGUN_SCRIPT_NAME`     | `AX_SGversionTools`                       |
    /// | `SHOTGUN_SCRIPT_KEY`      | -- (required to reach the site)           |
    /// | `OUTPUT_ROOT`             | `X:` on Windows, `/Volumes/output` else   |
    /// | `MEDIA_URL_ROOT`          | `http://yogi.axis.rocks`                  |
    /// | `FFMPEG_PATH`             | `ffmpeg`                                  |
    /// | `ENCODE_TIMEOUT_SECS`     | `3600`                                    |
    /// | `CREATE_VERSION_ATTEMPTS` | `3`                                       |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let site_url = var("SHOTGUN_URL").or_else(|| {
            var("SHOTGUN_STUDIO").map(|studio| format!("https://{studio}.shotgunstudio.com"))
        });

        let media_root = match var("OUTPUT_ROOT") {
            Some(path) => MediaRoot::new(path, PathStyle::host()),
            None => MediaRoot::host_default(),
        };

        let encode_timeout_secs: u64 = match var("ENCODE_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("ENCODE_TIMEOUT_SECS must be a valid u64, got '{v}'"))?,
            None => DEFAULT_ENCODE_TIMEOUT_SECS,
        };

        let attempts: u32 = match var("CREATE_VERSION_ATTEMPTS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("CREATE_VERSION_ATTEMPTS must be a valid u32, got '{v}'"))?,
            None => DEFAULT_CREATE_ATTEMPTS,
        };

        Ok(Self {
            site_url,
            script_name: var("SHOTGUN_SCRIPT_NAME").unwrap_or_else(|| DEFAULT_SCRIPT_NAME.into()),
            script_key: var("SHOTGUN_SCRIPT_KEY"),
            media_root,
            media_url_root: var("MEDIA_URL_ROOT").unwrap_or_else(|| DEFAULT_MEDIA_URL_ROOT.into()),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".into()),
            encode_timeout: Duration::from_secs(encode_timeout_secs),
            retry: RetryPolicy::new(attempts),
        })
    }

    /// Connection settings for the ShotGrid site.
    pub fn shotgun(&self) -> anyhow::Result<ShotgunConfig> {
        let Some(site_url) = self.site_url.clone() else {
            bail!("SHOTGUN_URL or SHOTGUN_STUDIO must be set");
        };
        let script_key = self
            .script_key
            .clone()
            .context("SHOTGUN_SCRIPT_KEY must be set")?;

        Ok(ShotgunConfig {
            site_url,
            script_name: self.script_name.clone(),
            script_key,
        })
    }
}
