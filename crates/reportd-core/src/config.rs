//! Service configuration.
//!
//! Resolution order is defaults, then an optional YAML file, then
//! environment overrides. The resolved [`ReportConfig`] is passed
//! explicitly into every pipeline call.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "REPORTD_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory holding the report templates.
    pub reports_dir: PathBuf,
    /// Directory receiving generated artifacts.
    pub temp_dir: PathBuf,
    /// Directory holding optional support resources.
    pub resources_dir: PathBuf,
    /// Extension of template files, without the dot.
    pub template_extension: String,
    /// Support resource attached when it exists in `resources_dir`.
    pub support_resource: String,
    /// Locale passed to the engine.
    pub locale: String,
    /// Age after which temp artifacts are swept, in hours.
    pub retention_hours: u64,
    pub database: DatabaseConfig,
    pub driver: DriverConfig,
    pub engine: EngineConfig,
    pub server: ServerConfig,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self::with_storage_root("storage/reports")
    }
}

impl ReportConfig {
    /// Defaults with the three storage directories laid out under `root`.
    pub fn with_storage_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            reports_dir: root.to_path_buf(),
            temp_dir: root.join("temp"),
            resources_dir: root.join("resources"),
            template_extension: "jrxml".to_string(),
            support_resource: "moneyformatter.jar".to_string(),
            locale: "en".to_string(),
            retention_hours: 24,
            database: DatabaseConfig::default(),
            driver: DriverConfig::default(),
            engine: EngineConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Load from `REPORTD_CONFIG` (if set) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::load(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        Ok(config)
    }

    /// Load a YAML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("REPORTD_STORAGE") {
            let root = PathBuf::from(root);
            self.temp_dir = root.join("temp");
            self.resources_dir = root.join("resources");
            self.reports_dir = root;
        }
        if let Some(dir) = lookup("REPORTD_JDBC_DIR") {
            self.driver.dir = PathBuf::from(dir);
        }
        if let Some(program) = lookup("REPORTD_ENGINE") {
            self.engine.program = program;
        }
        if let Some(addr) = lookup("REPORTD_ADDR") {
            self.server.addr = addr;
        }
        if let Some(debug) = lookup("APP_DEBUG") {
            self.server.debug = parse_bool("APP_DEBUG", &debug)?;
        }
        if let Some(locale) = lookup("APP_LOCALE") {
            self.locale = locale;
        }
        self.database.apply_env(&lookup)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours * 3600)
    }

    /// Path of the configured support resource.
    pub fn support_resource_path(&self) -> PathBuf {
        self.resources_dir.join(&self.support_resource)
    }
}

/// Database connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1433,
            database: "aalerpdb".to_string(),
            username: "atdn".to_string(),
            password: "atdn".to_string(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl DatabaseConfig {
    fn apply_env<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    var: "DB_PORT".to_string(),
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(database) = lookup("DB_DATABASE") {
            self.database = database;
        }
        if let Some(username) = lookup("DB_USERNAME") {
            self.username = username;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.password = password;
        }
        Ok(())
    }
}

/// Native JDBC driver expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Directory the engine loads drivers from.
    pub dir: PathBuf,
    /// Preferred driver file name.
    pub expected_file: String,
    /// File name prefix shared by acceptable driver versions.
    pub family_prefix: String,
    /// Driver file extension, without the dot.
    pub extension: String,
    pub class_name: String,
    /// Engine-side data source type tag.
    pub kind: String,
    pub url_scheme: String,
    pub download_url: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("vendor/jasperstarter/jdbc"),
            expected_file: "mssql-jdbc-13.2.0.jre8.jar".to_string(),
            family_prefix: "mssql-jdbc-".to_string(),
            extension: "jar".to_string(),
            class_name: "com.microsoft.sqlserver.jdbc.SQLServerDriver".to_string(),
            kind: "generic".to_string(),
            url_scheme: "jdbc:sqlserver".to_string(),
            download_url: "https://docs.microsoft.com/en-us/sql/connect/jdbc/download-microsoft-jdbc-driver-for-sql-server".to_string(),
        }
    }
}

/// External rendering engine command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub program: String,
    /// Arguments placed before the `process` subcommand.
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "jasperstarter".to_string(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    /// Expose failure details in error responses.
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8787".to_string(),
            debug: false,
        }
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
