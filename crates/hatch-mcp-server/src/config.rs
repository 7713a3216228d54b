use crate::hatch_mcp::HatchMCPBuilder;
use crate::HatchMCP;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while loading a server configuration
#[derive(Debug, Error)]
pub enum LoaderError {
    /// IO operation failed
    #[error("IO error reading {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML in {path}: {source}")]
    ParseToml {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: toml::de::Error,
    },

    /// Failed to parse YAML
    #[error("Failed to parse YAML in {path}: {source}")]
    ParseYaml {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: serde_yaml::Error,
    },

    /// Extension is not .toml, .yaml or .yml
    #[error("Unsupported config format: {0} (expected .toml, .yaml, or .yml)")]
    UnsupportedFormat(PathBuf),

    /// File parsed but its contents are unusable
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Server configuration as written on disk
///
/// ```toml
/// name = "arxiv"
/// origin_citation = "arXiv API, Cornell University"
/// mcp_citation = "Hatch arXiv MCP server"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HatchConfig {
    /// Server name, used in citation URIs
    pub name: String,
    /// Citation of the original software
    #[serde(default)]
    pub origin_citation: Option<String>,
    /// Citation of the MCP server implementation
    #[serde(default)]
    pub mcp_citation: Option<String>,
    /// Log filter directive (e.g. `info`, `hatch_mcp_server=debug`)
    #[serde(default)]
    pub log_level: Option<String>,
}

impl HatchConfig {
    /// Configuration with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin_citation: None,
            mcp_citation: None,
            log_level: None,
        }
    }

    /// Builder for a [`HatchMCP`] carrying this configuration's citations
    pub fn into_builder(self) -> HatchMCPBuilder {
        let mut builder = HatchMCP::builder(self.name);
        if let Some(origin) = self.origin_citation {
            builder = builder.origin_citation(origin);
        }
        if let Some(mcp) = self.mcp_citation {
            builder = builder.mcp_citation(mcp);
        }
        builder
    }

    fn validate(&self) -> Result<(), LoaderError> {
        if self.name.trim().is_empty() {
            return Err(LoaderError::Invalid("name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Loader for server configuration files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default location: `<config dir>/hatch-mcp/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hatch-mcp").join("config.toml"))
    }

    /// Load and validate a `.toml`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<HatchConfig, LoaderError> {
        let path = path.as_ref();
        let format = path.extension().and_then(|s| s.to_str());
        if !matches!(format, Some("toml" | "yaml" | "yml")) {
            return Err(LoaderError::UnsupportedFormat(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| LoaderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: HatchConfig = match format {
            Some("toml") => toml::from_str(&content).map_err(|e| LoaderError::ParseToml {
                path: path.to_path_buf(),
                source: e,
            })?,
            _ => serde_yaml::from_str(&content).map_err(|e| LoaderError::ParseYaml {
                path: path.to_path_buf(),
                source: e,
            })?,
        };
        config.validate()?;

        info!(path = %path.display(), server = %config.name, "Loaded server config");
        Ok(config)
    }
}
