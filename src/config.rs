use crate::core::{PgminError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Fallback login role when neither the caller nor any configuration layer
/// names one.
pub const DEFAULT_USER: &str = "postgres";

/// Fallback server port.
pub const DEFAULT_PORT: &str = "5432";

/// Top-level settings structure parsed from a TOML file.
///
/// The same structure is used for both configuration layers: the
/// process-wide options file and the externally supplied pillar file.
#[derive(Debug, Deserialize, Default)]
pub struct Settings {
    pub postgres: Option<PostgresSettings>,
}

/// Connection-related settings under the `[postgres]` table.
#[derive(Debug, Deserialize, Default)]
pub struct PostgresSettings {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub sudo_user: Option<String>,
}

/// Per-call explicit connection arguments. Every operation accepts these;
/// any field left `None` falls through to the configuration layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnOverrides {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub sudo_user: Option<String>,
}

/// Connection parameters after resolution. Built fresh per operation call
/// and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParams {
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub sudo_user: Option<String>,
}

/// The two read-only configuration layers, keyed by dotted names such as
/// `postgres.user`. Options shadow pillar for every key.
///
/// Constructed once by the embedding caller and threaded explicitly into the
/// operation layer; pgmin keeps no global configuration state.
#[derive(Debug, Clone, Default)]
pub struct ConfigContext {
    opts: HashMap<String, String>,
    pillar: HashMap<String, String>,
}

impl ConfigContext {
    pub fn new(opts: HashMap<String, String>, pillar: HashMap<String, String>) -> Self {
        Self { opts, pillar }
    }

    /// Builds a context from the two parsed settings files.
    pub fn from_settings(opts: &Settings, pillar: &Settings) -> Self {
        Self {
            opts: flatten(opts),
            pillar: flatten(pillar),
        }
    }

    /// Looks up a dotted key, options first, then pillar.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.opts
            .get(key)
            .or_else(|| self.pillar.get(key))
            .map(String::as_str)
    }

    /// Resolves connection parameters for one operation call.
    ///
    /// Per field, first non-empty value wins: explicit argument, then the
    /// `postgres.*` option, then the pillar key, then the hardcoded default
    /// (user and port only; host and sudo_user have no default). No
    /// validation is performed on any field.
    pub fn resolve(&self, overrides: &ConnOverrides) -> ConnectionParams {
        ConnectionParams {
            user: self.pick(&overrides.user, "postgres.user", Some(DEFAULT_USER)),
            host: self.pick(&overrides.host, "postgres.host", None),
            port: self.pick(&overrides.port, "postgres.port", Some(DEFAULT_PORT)),
            sudo_user: self.pick(&overrides.sudo_user, "postgres.sudo_user", None),
        }
    }

    fn pick(&self, explicit: &Option<String>, key: &str, default: Option<&str>) -> Option<String> {
        explicit
            .as_deref()
            .filter(|v| !v.is_empty())
            .or_else(|| self.lookup(key).filter(|v| !v.is_empty()))
            .or(default)
            .map(str::to_string)
    }
}

fn flatten(settings: &Settings) -> HashMap<String, String> {
    let mut map = HashMap::new();
    if let Some(pg) = &settings.postgres {
        let fields = [
            ("postgres.user", &pg.user),
            ("postgres.host", &pg.host),
            ("postgres.port", &pg.port),
            ("postgres.sudo_user", &pg.sudo_user),
        ];
        for (key, value) in fields {
            if let Some(v) = value {
                map.insert(key.to_string(), v.clone());
            }
        }
    }
    map
}

/// Loads settings from a TOML file at the given path.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| PgminError::Config(format!("could not read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| PgminError::Config(format!("could not parse {}: {}", path.display(), e)))
}

/// Returns the pgmin configuration directory under the platform config dir.
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pgmin")
}
