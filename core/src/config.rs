//! Client configuration and the TOML file loader.
//!
//! A config file holds one section per deployment, each a flat table of
//! text values:
//!
//! ```toml
//! [nckvs]
//! base_url = "http://example.com/weatherinfo/nckvsrpc/api/rest"
//! login_name = "user"
//! login_pass = "pass"
//! datatypename = "testtype"
//! datatypeversion = "2"
//! encoded_fields = "tags, history"
//! ```
//!
//! Loading only coerces types: `datatypeversion` becomes an integer and
//! `encoded_fields` a list of trimmed names. Unknown keys are rejected so a
//! misspelt option fails loudly instead of being ignored.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::codec::EncodingPolicy;
use crate::error::ConfigError;
use crate::types::SessionParams;

/// Section read by `ClientConfig::from_file` when none is named.
pub const DEFAULT_SECTION: &str = "nckvs";

const DEFAULT_DATATYPEVERSION: u32 = 1;

/// Routing, identity and codec settings for one `KvsClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub datatypename: String,
    pub datatypeversion: u32,
    pub session: SessionParams,
    pub encoding: EncodingPolicy,
}

impl ClientConfig {
    pub fn new(base_url: &str, login_name: &str, login_pass: &str, datatypename: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            datatypename: datatypename.to_string(),
            datatypeversion: DEFAULT_DATATYPEVERSION,
            session: SessionParams {
                login_name: login_name.to_string(),
                login_pass: login_pass.to_string(),
                ..SessionParams::default()
            },
            encoding: EncodingPolicy::default(),
        }
    }

    pub fn with_datatypeversion(mut self, version: u32) -> Self {
        self.datatypeversion = version;
        self
    }

    pub fn with_app(mut self, servername: &str, username: &str) -> Self {
        self.session.app_servername = servername.to_string();
        self.session.app_username = username.to_string();
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.session.timezone = timezone.to_string();
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingPolicy) -> Self {
        self.encoding = encoding;
        self
    }

    /// Read `section` from the TOML file at `path`.
    pub fn from_file(path: impl AsRef<Path>, section: &str) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, section)
    }

    pub fn from_toml_str(contents: &str, section: &str) -> Result<Self, ConfigError> {
        let doc: toml::Table = toml::from_str(contents)?;
        let table = doc
            .get(section)
            .cloned()
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        let raw: RawSection = table.try_into()?;
        raw.into_config()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
    base_url: Option<String>,
    login_name: Option<String>,
    login_pass: Option<String>,
    datatypename: Option<String>,
    #[serde(default)]
    app_servername: String,
    #[serde(default)]
    app_username: String,
    #[serde(default)]
    timezone: String,
    datatypeversion: Option<Number>,
    encoded_fields: Option<FieldList>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Number {
    Int(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldList {
    Csv(String),
    List(Vec<String>),
}

impl RawSection {
    fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let base_url = self.base_url.ok_or(ConfigError::MissingKey("base_url"))?;
        let login_name = self.login_name.ok_or(ConfigError::MissingKey("login_name"))?;
        let login_pass = self.login_pass.ok_or(ConfigError::MissingKey("login_pass"))?;
        let datatypename = self.datatypename.ok_or(ConfigError::MissingKey("datatypename"))?;

        let datatypeversion = match self.datatypeversion {
            None => DEFAULT_DATATYPEVERSION,
            Some(n) => parse_version(n)?,
        };
        let encoding = resolve_encoding(self.encoding.as_deref(), self.encoded_fields)?;

        Ok(ClientConfig::new(&base_url, &login_name, &login_pass, &datatypename)
            .with_datatypeversion(datatypeversion)
            .with_app(&self.app_servername, &self.app_username)
            .with_timezone(&self.timezone)
            .with_encoding(encoding))
    }
}

fn parse_version(n: Number) -> Result<u32, ConfigError> {
    let invalid = |value: String| ConfigError::InvalidValue {
        key: "datatypeversion",
        value,
    };
    match n {
        Number::Int(i) => u32::try_from(i).map_err(|_| invalid(i.to_string())),
        Number::Text(s) => s.trim().parse().map_err(|_| invalid(s)),
    }
}

fn resolve_encoding(mode: Option<&str>, fields: Option<FieldList>) -> Result<EncodingPolicy, ConfigError> {
    let names = fields.map(|list| match list {
        FieldList::Csv(s) => split_names(s.split(',')),
        FieldList::List(v) => split_names(v.iter().map(String::as_str)),
    });

    match (mode.map(str::trim), names) {
        (Some("containers"), Some(_)) => Err(ConfigError::ConflictingEncoding),
        (Some("containers"), None) | (None, None) => Ok(EncodingPolicy::Containers),
        (Some("fields") | None, Some(names)) => Ok(EncodingPolicy::Fields(names)),
        (Some("fields"), None) => Err(ConfigError::MissingKey("encoded_fields")),
        (Some(other), _) => Err(ConfigError::InvalidValue {
            key: "encoding",
            value: other.to_string(),
        }),
    }
}

fn split_names<'a>(parts: impl Iterator<Item = &'a str>) -> std::collections::BTreeSet<String> {
    parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
