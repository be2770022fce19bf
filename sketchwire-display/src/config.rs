//! Display daemon configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the display daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Persistence settings.
    pub storage: StorageConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to listen on for the live channel and store/retrieve
    /// exchanges.
    pub bind_addr: String,
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// File the saved drawing is written to (raw 1024 bytes).
    pub bitmap_path: String,
    /// Publish the saved drawing as the current frame on startup.
    pub preload_saved: bool,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7411".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bitmap_path: "saved_draw.bin".into(),
            preload_saved: true,
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl DisplayConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let cfg = Self::default();
        let text = toml::to_string_pretty(&cfg)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, text)
    }
}

// ── Tests ────────────────────────────────────────────────────────
