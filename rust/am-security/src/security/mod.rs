//! Kerberos security configuration of the application master.
//!
//! A [`SecurityConfiguration`] only exists once its settings have been validated: either the
//! cluster does not require authentication, or there is a principal to log in with and exactly
//! one way to get hold of its keytab.

use std::{io, path::PathBuf};

use snafu::{ensure, Snafu};
use strum::{Display, EnumDiscriminants};

use crate::{
    config::{self, ComponentOptions, HadoopConfiguration, InstanceDefinition, COMPONENT_AM},
    filesystem::RemotePath,
    identity::{Identity, IdentityProvider},
};

pub mod keytab;
pub mod principal;
pub mod staging;
mod validation;

pub use keytab::KeytabSource;
pub use staging::SecureKeytabFetcher;

/// Coarse classification of [`Error`], stable across variants.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
    /// The settings are incomplete or contradict each other.
    BadConfiguration,
    /// The environment failed while looking up the login identity.
    BadState,
    /// The local staging directory or keytab could not be set up.
    StagingError,
    /// Reading from the shared filesystem or the identity subsystem failed.
    Io,
}

#[derive(Snafu, Debug, EnumDiscriminants)]
#[strum_discriminants(derive(strum::IntoStaticStr))]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("the cluster name must not be empty"))]
    EmptyClusterName,

    #[snafu(display("invalid cluster configuration"))]
    InvalidHadoopConfiguration { source: config::Error },

    #[snafu(display(
        "no principal configured for the application and the lookup of the login user failed. \
        Please ensure a value for {key} exists in the application configuration or the login issue is addressed"
    ))]
    LoginIdentityLookup { source: io::Error, key: &'static str },

    #[snafu(display(
        "no principal configured for the application and no login user found. \
        Please ensure a value for {key} exists in the application configuration or the login issue is addressed"
    ))]
    NoPrincipal { key: &'static str },

    #[snafu(display("failed to look up the login user to use as principal"))]
    ResolvePrincipal { source: io::Error },

    #[snafu(display(
        "either a keytab path on the cluster host ({local_key}) or a keytab to be retrieved \
        from the shared filesystem ({remote_key}) is required. Please configure one of the keytab retrieval mechanisms"
    ))]
    NoKeytabSource {
        local_key: &'static str,
        remote_key: &'static str,
    },

    #[snafu(display(
        "both a keytab on the cluster host ({local_key}={local_path}) and a keytab to be retrieved \
        from the shared filesystem ({remote_key}={remote_name}) are specified. Please configure only one keytab retrieval mechanism"
    ))]
    AmbiguousKeytabSource {
        local_key: &'static str,
        local_path: String,
        remote_key: &'static str,
        remote_name: String,
    },

    #[snafu(display("keytab name {keytab_name:?} configured in {key} must be a plain file name"))]
    InvalidKeytabName {
        keytab_name: String,
        key: &'static str,
    },

    #[snafu(display(
        "keytab directory {keytab_dir:?} configured in {key} must not leave the shared home directory"
    ))]
    InvalidKeytabDirectory {
        keytab_dir: String,
        key: &'static str,
    },

    #[snafu(display("unable to create local keytab directory {}", path.display()))]
    CreateStagingDirectory { source: io::Error, path: PathBuf },

    #[snafu(display("failed to set permissions {mode:04o} on {}", path.display()))]
    SetPermissions {
        source: io::Error,
        path: PathBuf,
        mode: u32,
    },

    #[snafu(display("failed to copy keytab {remote} to {}", local.display()))]
    CopyKeytab {
        source: io::Error,
        remote: RemotePath,
        local: PathBuf,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyClusterName
            | Error::InvalidHadoopConfiguration { .. }
            | Error::NoPrincipal { .. }
            | Error::NoKeytabSource { .. }
            | Error::AmbiguousKeytabSource { .. }
            | Error::InvalidKeytabName { .. }
            | Error::InvalidKeytabDirectory { .. } => ErrorKind::BadConfiguration,
            Error::LoginIdentityLookup { .. } => ErrorKind::BadState,
            Error::CreateStagingDirectory { .. } | Error::SetPermissions { .. } => {
                ErrorKind::StagingError
            }
            Error::ResolvePrincipal { .. } | Error::CopyKeytab { .. } => ErrorKind::Io,
        }
    }

    /// Short, stable name of the variant, usable as a log field.
    pub fn category(&self) -> &'static str {
        ErrorDiscriminants::from(self).into()
    }
}

/// The validated security settings of one application master.
#[derive(Debug)]
pub struct SecurityConfiguration {
    configuration: HadoopConfiguration,
    instance_definition: InstanceDefinition,
    cluster_name: String,
    identity_provider: Box<dyn IdentityProvider>,
    fetcher: SecureKeytabFetcher,
}

impl SecurityConfiguration {
    /// Validates the settings, nothing invalid is ever constructed.
    pub fn new(
        configuration: HadoopConfiguration,
        instance_definition: InstanceDefinition,
        cluster_name: impl Into<String>,
        identity_provider: impl IdentityProvider + 'static,
    ) -> Result<Self> {
        let cluster_name = cluster_name.into();
        ensure!(!cluster_name.is_empty(), EmptyClusterNameSnafu);

        let security_configuration = Self {
            configuration,
            instance_definition,
            cluster_name,
            identity_provider: Box::new(identity_provider),
            fetcher: SecureKeytabFetcher::default(),
        };
        validation::validate(&security_configuration)?;
        Ok(security_configuration)
    }

    /// Stage downloaded keytabs below `staging_root` instead of the system temporary directory.
    pub fn with_staging_root(mut self, staging_root: impl Into<PathBuf>) -> Self {
        self.fetcher = SecureKeytabFetcher::new(staging_root);
        self
    }

    /// Whether the cluster requires Kerberos authentication.
    pub fn is_security_enabled(&self) -> bool {
        // Construction has rejected unknown methods, anything but `simple` counts as secure
        !matches!(
            self.configuration.authentication_method(),
            Ok(config::AuthenticationMethod::Simple)
        )
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    fn am_options(&self) -> ComponentOptions<'_> {
        self.instance_definition.component(COMPONENT_AM)
    }

    fn login_identity(&self) -> io::Result<Option<Identity>> {
        self.identity_provider.login_identity()
    }
}
