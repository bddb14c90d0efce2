use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

pub mod instance;

pub use instance::{ComponentOptions, InstanceDefinition};

// Ambient cluster configuration
pub const HADOOP_SECURITY_AUTHENTICATION: &str = "hadoop.security.authentication";

// Application master component configuration
pub const COMPONENT_AM: &str = "slider-appmaster";
pub const KEY_KEYTAB_PRINCIPAL: &str = "slider.keytab.principal.name";
pub const KEY_AM_KEYTAB_LOCAL_PATH: &str = "slider.am.keytab.local.path";
pub const KEY_AM_LOGIN_KEYTAB_NAME: &str = "slider.am.login.keytab.name";
pub const KEY_HDFS_KEYTAB_DIR: &str = "slider.hdfs.keytab.dir";

#[derive(Snafu, Debug)]
pub enum Error {
    #[snafu(display("unknown authentication method {value:?} for {key}. Should be one of {methods:?}"))]
    UnknownAuthenticationMethod {
        source: strum::ParseError,
        key: &'static str,
        value: String,
        methods: Vec<String>,
    },

    #[snafu(display("failed to read configuration file {}", path.display()))]
    ReadConfigFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse YAML configuration file {}", path.display()))]
    ParseYamlConfigFile {
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse JSON configuration file {}", path.display()))]
    ParseJsonConfigFile {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[snafu(display("property override {property:?} is not of the form KEY=VALUE"))]
    InvalidPropertyOverride { property: String },
}

type Result<T, E = Error> = std::result::Result<T, E>;

/// Authentication methods understood in `hadoop.security.authentication`.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AuthenticationMethod {
    Simple,
    Kerberos,
    Token,
    Certificate,
    KerberosSsl,
    Proxy,
}

impl AuthenticationMethod {
    pub fn methods() -> Vec<String> {
        let mut methods = vec![];
        for method in Self::iter() {
            methods.push(method.to_string())
        }
        methods
    }

    /// Everything except `simple` requires the cluster to authenticate its callers.
    pub fn is_secure(&self) -> bool {
        !matches!(self, AuthenticationMethod::Simple)
    }
}

/// The ambient cluster configuration, a flat map of property names to values.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HadoopConfiguration {
    properties: BTreeMap<String, String>,
}

impl HadoopConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        load_document(path)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Applies a `KEY=VALUE` override on top of the loaded properties.
    pub fn apply_override(&mut self, property: &str) -> Result<()> {
        let (key, value) = property
            .split_once('=')
            .filter(|(key, _)| !key.trim().is_empty())
            .context(InvalidPropertyOverrideSnafu { property })?;
        self.set(key.trim(), value.trim());
        Ok(())
    }

    /// The configured authentication method, `simple` when unset.
    pub fn authentication_method(&self) -> Result<AuthenticationMethod> {
        match self
            .get(HADOOP_SECURITY_AUTHENTICATION)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(value) => {
                AuthenticationMethod::from_str(value).with_context(|_| {
                    UnknownAuthenticationMethodSnafu {
                        key: HADOOP_SECURITY_AUTHENTICATION,
                        value,
                        methods: AuthenticationMethod::methods(),
                    }
                })
            }
            None => Ok(AuthenticationMethod::Simple),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HadoopConfiguration {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            properties: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Reads a JSON (`.json`) or YAML (anything else) document.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).context(ReadConfigFileSnafu { path })?;
    match path.extension().and_then(|extension| extension.to_str()) {
        Some("json") => serde_json::from_str(&contents).context(ParseJsonConfigFileSnafu { path }),
        _ => serde_yaml::from_str(&contents).context(ParseYamlConfigFileSnafu { path }),
    }
}
