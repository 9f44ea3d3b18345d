use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/trackstash/config.toml` or `~/.config/trackstash/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TRACKSTASH__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub catalog: CatalogSettings,
    pub download: DownloadSettings,
    pub player: PlayerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            catalog: CatalogSettings::default(),
            download: DownloadSettings::default(),
            player: PlayerSettings::default(),
        }
    }
}

/// Connection details for the HTTP object store tracks are uploaded to.
///
/// All fields default to empty; `add` and `delete` refuse to run until
/// `endpoint` and `bucket` are configured. Credentials are passed through
/// to the store as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Where the track catalog YAML lives. Tilde-expanded at startup.
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: "~/.trackstash/catalog.yaml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadSettings {
    /// Directory downloaded audio is written to. Tilde-expanded at startup.
    pub dir: String,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            dir: "~/Downloads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Read-ahead buffer in front of the HTTP stream (KiB).
    pub buffer_kib: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self { buffer_kib: 256 }
    }
}
