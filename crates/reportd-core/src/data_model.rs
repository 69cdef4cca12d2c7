//! Data Model: report identity, parameters, formats, connection and artifacts
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ReportError;

/// Name of a report template. Never a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReportName(String);

impl ReportName {
    pub fn new(name: impl Into<String>) -> Result<Self, ReportError> {
        let name = name.into();
        let invalid = name.trim().is_empty()
            || name == "."
            || name.contains("..")
            || name.contains(['/', '\\', '\0', '"'])
            || name.chars().any(char::is_control);
        if invalid {
            return Err(ReportError::InvalidReportName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ReportName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ReportName::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A template resolved on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTemplate {
    pub name: ReportName,
    pub path: PathBuf,
}

/// Output document format. One per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Xlsx,
    Docx,
    Csv,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Pdf, Self::Xlsx, Self::Docx, Self::Csv];

    /// File extension, also the engine's format keyword.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
            Self::Docx => "docx",
            Self::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Csv => "text/csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Scalar report parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(serde_json::Number),
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// Caller-supplied parameters, passed to the template as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportParameters(BTreeMap<String, ParamValue>);

impl ReportParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameter names are identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn is_valid_key(key: &str) -> bool {
        let mut chars = key.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// First parameter name that is not a valid identifier.
    pub fn invalid_key(&self) -> Option<&str> {
        self.0.keys().map(String::as_str).find(|k| !Self::is_valid_key(k))
    }
}

impl FromIterator<(String, ParamValue)> for ReportParameters {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Everything needed to reach the report data source.
///
/// The connection URL is derived from host, port and database when the
/// descriptor is constructed and cannot be set on its own.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionDescriptor {
    driver_kind: String,
    host: String,
    port: u16,
    database: String,
    username: String,
    #[serde(skip_serializing)]
    password: String,
    driver_class: String,
    connection_url: String,
    driver_dir: PathBuf,
}

/// Connection URL parameters that are always on.
pub const ENCRYPT: bool = true;
pub const TRUST_SERVER_CERTIFICATE: bool = true;

impl ConnectionDescriptor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver_kind: impl Into<String>,
        url_scheme: &str,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        driver_class: impl Into<String>,
        driver_dir: impl Into<PathBuf>,
    ) -> Self {
        let host = host.into();
        let database = database.into();
        let connection_url = format!(
            "{}://{}:{};databaseName={};encrypt={};trustServerCertificate={}",
            url_scheme, host, port, database, ENCRYPT, TRUST_SERVER_CERTIFICATE
        );
        Self {
            driver_kind: driver_kind.into(),
            host,
            port,
            database,
            username: username.into(),
            password: password.into(),
            driver_class: driver_class.into(),
            connection_url,
            driver_dir: driver_dir.into(),
        }
    }

    pub fn driver_kind(&self) -> &str {
        &self.driver_kind
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn driver_class(&self) -> &str {
        &self.driver_class
    }

    pub fn connection_url(&self) -> &str {
        &self.connection_url
    }

    pub fn driver_dir(&self) -> &Path {
        &self.driver_dir
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("driver_kind", &self.driver_kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("driver_class", &self.driver_class)
            .field("connection_url", &self.connection_url)
            .field("driver_dir", &self.driver_dir)
            .finish()
    }
}

/// Options handed to the rendering engine for one invocation.
#[derive(Debug, Clone)]
pub struct InvocationOptions {
    formats: [OutputFormat; 1],
    locale: String,
    params: ReportParameters,
    resources: Option<PathBuf>,
    connection: ConnectionDescriptor,
}

impl InvocationOptions {
    pub fn new(
        format: OutputFormat,
        locale: impl Into<String>,
        params: ReportParameters,
        resources: Option<PathBuf>,
        connection: ConnectionDescriptor,
    ) -> Self {
        Self {
            formats: [format],
            locale: locale.into(),
            params,
            resources,
            connection,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.formats[0]
    }

    /// The format set as the engine sees it; always a singleton.
    pub fn formats(&self) -> &[OutputFormat] {
        &self.formats
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn params(&self) -> &ReportParameters {
        &self.params
    }

    pub fn resources(&self) -> Option<&Path> {
        self.resources.as_deref()
    }

    pub fn connection(&self) -> &ConnectionDescriptor {
        &self.connection
    }
}

/// A generated report document on disk.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedArtifact {
    pub report: ReportName,
    pub format: OutputFormat,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl GeneratedArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.report, self.format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_name_rejects_paths() {
        for bad in ["", "  ", "../etc/passwd", "a/b", "a\\b", "..", ".", "x\0y", "q\"x"] {
            assert!(ReportName::new(bad).is_err(), "accepted {:?}", bad);
        }
        assert_eq!(ReportName::new("gross_with_vat").unwrap().as_str(), "gross_with_vat");
    }

    #[test]
    fn report_name_deserialize_validates() {
        let ok: ReportName = serde_json::from_str("\"sales-2024\"").unwrap();
        assert_eq!(ok.as_str(), "sales-2024");
        assert!(serde_json::from_str::<ReportName>("\"../x\"").is_err());
    }

    #[test]
    fn format_serde() {
        let xlsx: OutputFormat = serde_json::from_str("\"xlsx\"").unwrap();
        assert_eq!(xlsx.extension(), "xlsx");
        assert!(serde_json::from_str::<OutputFormat>("\"odt\"").is_err());
    }

    #[test]
    fn params_accept_scalars() {
        let params: ReportParameters = serde_json::from_str(
            r#"{"from": "2024-01-01", "limit": 10, "customer": "ACME"}"#,
        )
        .unwrap();
        assert_eq!(
            params.get("from"),
            Some(&ParamValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
        assert_eq!(params.get("limit").map(|v| v.to_string()), Some("10".to_string()));
        assert_eq!(params.get("customer"), Some(&ParamValue::from("ACME")));
    }

    #[test]
    fn param_keys_must_be_identifiers() {
        for good in ["from", "xcus", "_private", "Customer2"] {
            assert!(ReportParameters::is_valid_key(good), "rejected {:?}", good);
        }
        for bad in ["", "-r", "a=b", "2nd", "with space", "dash-ed"] {
            assert!(!ReportParameters::is_valid_key(bad), "accepted {:?}", bad);
        }
        let params = ReportParameters::new().with("from", "2024-01-01").with("-P", "x");
        assert_eq!(params.invalid_key(), Some("-P"));
        assert_eq!(ReportParameters::new().with("to", "x").invalid_key(), None);
    }

    #[test]
    fn connection_url_is_derived() {
        let conn = ConnectionDescriptor::new(
            "generic",
            "jdbc:sqlserver",
            "db.internal",
            1444,
            "ledger",
            "svc",
            "secret",
            "com.microsoft.sqlserver.jdbc.SQLServerDriver",
            "/opt/jdbc",
        );
        assert_eq!(
            conn.connection_url(),
            "jdbc:sqlserver://db.internal:1444;databaseName=ledger;encrypt=true;trustServerCertificate=true"
        );
        let debug = format!("{:?}", conn);
        assert!(!debug.contains("secret"));
        let json = serde_json::to_value(&conn).unwrap();
        assert!(json.get("password").is_none());
    }
}
