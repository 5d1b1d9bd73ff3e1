//! Application configuration for labbook.
//!
//! With no config file every value falls back to the built-in defaults, which
//! reproduce the fixed scrape of the PortSwigger lab index. An optional user
//! config lives at `~/.labbook/labbook.toml`; CLI flags override config file
//! values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LabbookError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "labbook.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".labbook";

// ---------------------------------------------------------------------------
// Config structs (matching labbook.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Site being scraped.
    #[serde(default)]
    pub site: SiteConfig,

    /// Local file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin of the site; also prepended to root-relative links in fragments.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the page listing every lab.
    #[serde(default = "default_index_path")]
    pub index_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            index_path: default_index_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://portswigger.net".into()
}
fn default_index_path() -> String {
    "/web-security/all-labs".into()
}

/// `[paths]` section. Relative paths are resolved against `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Base directory; the working directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Directory that receives one archived file per lab page.
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Template containing the `{{ content }}` placeholder.
    #[serde(default = "default_template")]
    pub template: String,

    /// Combined output document.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: None,
            download_dir: default_download_dir(),
            template: default_template(),
            output: default_output(),
        }
    }
}

fn default_download_dir() -> String {
    "labs".into()
}
fn default_template() -> String {
    "ResultTemplate.html".into()
}
fn default_output() -> String {
    "PortSwiggerAllLabs.html".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header; `labbook/<version>` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration with every URL parsed and every path made absolute.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Parsed site base URL; discovered hrefs are resolved against it.
    pub base_url: Url,
    /// Site origin without a trailing slash, e.g. `https://portswigger.net`.
    pub site_origin: String,
    /// Absolute URL of the lab index page.
    pub index_url: Url,
    /// Directory for archived pages.
    pub download_dir: PathBuf,
    /// Template file.
    pub template_path: PathBuf,
    /// Combined output file.
    pub output_path: PathBuf,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl RunConfig {
    /// Resolve an [`AppConfig`] into runtime settings.
    ///
    /// `root_override` (from `--root`) wins over `paths.root`, which wins over
    /// the current working directory.
    pub fn resolve(config: &AppConfig, root_override: Option<&Path>) -> Result<Self> {
        let base = Url::parse(&config.site.base_url).map_err(|e| {
            LabbookError::config(format!("invalid site.base_url '{}': {e}", config.site.base_url))
        })?;
        if base.cannot_be_a_base() {
            return Err(LabbookError::config(format!(
                "site.base_url '{base}' cannot be used as a base URL"
            )));
        }
        let index_url = base.join(&config.site.index_path).map_err(|e| {
            LabbookError::config(format!(
                "invalid site.index_path '{}': {e}",
                config.site.index_path
            ))
        })?;
        let site_origin = base.as_str().trim_end_matches('/').to_string();

        let root = match (root_override, config.paths.root.as_deref()) {
            (Some(root), _) => root.to_path_buf(),
            (None, Some(root)) => PathBuf::from(root),
            (None, None) => {
                std::env::current_dir().map_err(|e| LabbookError::io(".", e))?
            }
        };

        Ok(Self {
            base_url: base,
            site_origin,
            index_url,
            download_dir: root.join(&config.paths.download_dir),
            template_path: root.join(&config.paths.template),
            output_path: root.join(&config.paths.output),
            timeout: Duration::from_secs(config.http.timeout_secs),
            user_agent: config
                .http
                .user_agent
                .clone()
                .unwrap_or_else(|| concat!("labbook/", env!("CARGO_PKG_VERSION")).to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.labbook/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LabbookError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.labbook/labbook.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LabbookError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LabbookError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LabbookError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LabbookError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LabbookError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
