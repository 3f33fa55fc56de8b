use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

const FFMPEG_VERSION: &str = "0.12.6";

/// Everything one `fetch-assets` run needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory the assets are written into.
    pub destination: PathBuf,
    /// Explicit manifests, fetched in order.
    pub groups: Vec<AssetGroup>,
    /// Registry-listing discovery; `None` disables it.
    pub discovery: Option<DiscoveryConfig>,
    pub http: HttpConfig,
}

/// A manifest bound to one base URL.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetGroup {
    pub label: String,
    /// Prefix each file name is appended to verbatim.
    pub base_url: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Registry "flat" listing endpoint.
    pub listing_url: String,
    /// Prefix the listed path is appended to when downloading a chunk.
    pub download_base_url: String,
    /// Substring a listed path must contain.
    pub dir_marker: String,
    /// Suffix a listed path must end with.
    pub suffix: String,
    /// Case-insensitive infixes that mark a file name as a chunk.
    pub chunk_infixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// Settings for the development server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub port: u16,
    pub root: PathBuf,
    pub open_browser: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("lib"),
            groups: vec![
                AssetGroup {
                    label: "FFmpeg Library Files".to_string(),
                    base_url: format!(
                        "https://cdn.jsdelivr.net/npm/@ffmpeg/ffmpeg@{FFMPEG_VERSION}/dist/umd/"
                    ),
                    files: vec!["ffmpeg.js".to_string(), "814.ffmpeg.js".to_string()],
                },
                AssetGroup {
                    label: "FFmpeg Core Files".to_string(),
                    base_url: format!(
                        "https://cdn.jsdelivr.net/npm/@ffmpeg/core@{FFMPEG_VERSION}/dist/umd/"
                    ),
                    files: vec!["ffmpeg-core.js".to_string(), "ffmpeg-core.wasm".to_string()],
                },
            ],
            discovery: Some(DiscoveryConfig::default()),
            http: HttpConfig::default(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            listing_url: format!(
                "https://data.jsdelivr.com/v1/package/npm/@ffmpeg/ffmpeg@{FFMPEG_VERSION}/flat"
            ),
            download_base_url: format!(
                "https://cdn.jsdelivr.net/npm/@ffmpeg/ffmpeg@{FFMPEG_VERSION}"
            ),
            dir_marker: "/dist/umd/".to_string(),
            suffix: ".js".to_string(),
            chunk_infixes: vec![".ffmpeg.js".to_string(), "worker".to_string()],
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("wasm-assets/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            root: PathBuf::from("."),
            open_browser: true,
        }
    }
}

impl ServeConfig {
    /// Listens on every interface.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn browser_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Parses `[PORT] [ROOT] [--no-browser]`, in any order.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut positional = 0;

        for arg in args {
            if arg == "--no-browser" {
                config.open_browser = false;
                continue;
            }
            if arg.starts_with('-') {
                return Err(ConfigError::InvalidArgument(arg));
            }
            match positional {
                0 => {
                    config.port = arg
                        .parse()
                        .map_err(|_| ConfigError::InvalidArgument(arg.clone()))?;
                }
                1 => config.root = PathBuf::from(arg),
                _ => return Err(ConfigError::InvalidArgument(arg)),
            }
            positional += 1;
        }

        Ok(config)
    }
}

impl FetchConfig {
    /// Loads a JSON config; fields that are left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(ConfigError::SerdeError)
    }

    /// Every file name named by the explicit groups.
    pub fn listed_files(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.files.iter().map(String::as_str))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
    InvalidArgument(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(err) => write!(f, "IO error: {err}"),
            ConfigError::SerdeError(err) => write!(f, "Config parse error: {err}"),
            ConfigError::InvalidArgument(arg) => write!(f, "Invalid argument: {arg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(err) => Some(err),
            ConfigError::SerdeError(err) => Some(err),
            ConfigError::InvalidArgument(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ffmpeg_release() {
        let config = FetchConfig::default();
        assert_eq!(config.destination, PathBuf::from("lib"));
        assert_eq!(config.groups.len(), 2);
        assert_eq!(
            config.groups[1].base_url,
            "https://cdn.jsdelivr.net/npm/@ffmpeg/core@0.12.6/dist/umd/"
        );
        let listed: Vec<_> = config.listed_files().collect();
        assert_eq!(
            listed,
            ["ffmpeg.js", "814.ffmpeg.js", "ffmpeg-core.js", "ffmpeg-core.wasm"]
        );
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FetchConfig::from_json(
            r#"{
                "destination": "vendor",
                "groups": [
                    { "label": "Core", "base_url": "http://cdn/core/", "files": ["a.wasm"] }
                ],
                "discovery": null
            }"#,
        )
        .unwrap();

        assert_eq!(config.destination, PathBuf::from("vendor"));
        assert_eq!(config.groups[0].files, ["a.wasm"]);
        assert!(config.discovery.is_none());
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn partial_discovery_section() {
        let config =
            FetchConfig::from_json(r#"{ "discovery": { "listing_url": "http://x/flat" } }"#)
                .unwrap();
        let discovery = config.discovery.unwrap();
        assert_eq!(discovery.listing_url, "http://x/flat");
        assert_eq!(discovery.dir_marker, "/dist/umd/");
        // groups were left out, so the defaults remain
        assert_eq!(config.groups.len(), 2);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            FetchConfig::from_json("{ not json"),
            Err(ConfigError::SerdeError(_))
        ));
    }

    #[test]
    fn serve_defaults() {
        let serve = ServeConfig::default();
        assert_eq!(serve.bind_addr().port(), 8000);
        assert_eq!(serve.browser_url(), "http://localhost:8000");
        assert!(serve.open_browser);
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn serve_args() {
        let serve = ServeConfig::from_args(args(&["9000", "public", "--no-browser"])).unwrap();
        assert_eq!(serve.port, 9000);
        assert_eq!(serve.root, PathBuf::from("public"));
        assert!(!serve.open_browser);

        assert_eq!(ServeConfig::from_args(Vec::new()).unwrap(), ServeConfig::default());
    }

    #[test]
    fn serve_args_rejects_garbage() {
        assert!(ServeConfig::from_args(args(&["http"])).is_err());
        assert!(ServeConfig::from_args(args(&["--verbose"])).is_err());
        assert!(ServeConfig::from_args(args(&["1", "a", "b"])).is_err());
    }
}
