//! Configuration types for ticketlens.
//!
//! [`Config::load`] reads `~/.config/ticketlens/config.toml` (or an explicit
//! path), layered on top of the embedded defaults. The default file is
//! created on first use. [`Config::defaults`] returns the same defaults
//! without touching the filesystem (useful in tests).

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[server]
bind             = "127.0.0.1:5000"
max_upload_bytes = 16777216

[ingest]
sniff_bytes = 4096

[report]
top_technicians = 10

[log]
level = "info"
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Uploads larger than this are rejected before ingestion starts.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String { "127.0.0.1:5000".to_string() }
fn default_max_upload_bytes() -> usize { 16 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// `[ingest]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Prefix length used for delimiter sniffing.
    #[serde(default = "default_sniff_bytes")]
    pub sniff_bytes: usize,
}

fn default_sniff_bytes() -> usize { crate::reader::DEFAULT_SNIFF_BYTES }

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sniff_bytes: default_sniff_bytes(),
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_technicians")]
    pub top_technicians: usize,
}

fn default_top_technicians() -> usize { crate::report::DEFAULT_TOP_TECHNICIANS }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_technicians: default_top_technicians(),
        }
    }
}

/// `[log]` section. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path` if given (it must exist), otherwise the default user file,
    /// creating it with the built-in defaults if it does not exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => {
                let p = config_path();
                if !p.exists() {
                    if let Some(parent) = p.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&p, DEFAULT_CONFIG.trim_start())?;
                }
                (p, false)
            }
        };

        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from(path.as_path()).required(required))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
                .join(".config")
        })
        .join("ticketlens")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
        assert_eq!(cfg.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.ingest.sniff_bytes, 4096);
        assert_eq!(cfg.report.top_technicians, 10);
        assert_eq!(cfg.log.level, "info");
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[report]\ntop_technicians = 3\n").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.report.top_technicians, 3);
        assert_eq!(cfg.ingest.sniff_bytes, 4096);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/ticketlens/config.toml");
        assert!(Config::load(Some(path)).is_err());
    }
}
