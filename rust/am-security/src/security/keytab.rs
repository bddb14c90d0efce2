use std::path::{Component, Path, PathBuf};

use snafu::{ensure, OptionExt};

use crate::{
    config::{
        ComponentOptions, KEY_AM_KEYTAB_LOCAL_PATH, KEY_AM_LOGIN_KEYTAB_NAME, KEY_HDFS_KEYTAB_DIR,
    },
    filesystem::SharedFileSystem,
    security::{AmbiguousKeytabSourceSnafu, NoKeytabSourceSnafu, Result, SecurityConfiguration},
};

/// Where the application master gets its keytab from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeytabSource {
    /// A keytab that is already provisioned on the host.
    Local(PathBuf),
    /// A keytab published on the shared filesystem, which has to be staged locally first.
    Remote(String),
}

impl KeytabSource {
    /// Exactly one of the two keytab settings has to be present.
    pub fn from_options(options: &ComponentOptions<'_>) -> Result<Self> {
        match (
            options.get(KEY_AM_KEYTAB_LOCAL_PATH),
            options.get(KEY_AM_LOGIN_KEYTAB_NAME),
        ) {
            (Some(local_path), None) => Ok(KeytabSource::Local(PathBuf::from(local_path))),
            (None, Some(remote_name)) => Ok(KeytabSource::Remote(remote_name.to_string())),
            (None, None) => NoKeytabSourceSnafu {
                local_key: KEY_AM_KEYTAB_LOCAL_PATH,
                remote_key: KEY_AM_LOGIN_KEYTAB_NAME,
            }
            .fail(),
            (Some(local_path), Some(remote_name)) => AmbiguousKeytabSourceSnafu {
                local_key: KEY_AM_KEYTAB_LOCAL_PATH,
                local_path,
                remote_key: KEY_AM_LOGIN_KEYTAB_NAME,
                remote_name,
            }
            .fail(),
        }
    }
}

impl SecurityConfiguration {
    pub fn keytab_source(&self) -> Result<KeytabSource> {
        KeytabSource::from_options(&self.am_options())
    }

    /// Returns the local keytab to log `principal` in with.
    ///
    /// Host keytabs are used as they are. Keytabs on the shared filesystem are downloaded into a
    /// fresh directory that only the current user can access, see [`super::SecureKeytabFetcher`].
    pub fn keytab_file(&self, fs: &dyn SharedFileSystem, principal: &str) -> Result<PathBuf> {
        let am = self.am_options();
        // The host keytab wins, both settings can only coexist on unsecured clusters
        if let Some(keytab_path) = am.get(KEY_AM_KEYTAB_LOCAL_PATH) {
            tracing::info!(
                keytab = keytab_path,
                principal,
                "Leveraging host keytab file to login principal"
            );
            return Ok(PathBuf::from(keytab_path));
        }

        let keytab_name = am.get(KEY_AM_LOGIN_KEYTAB_NAME).context(NoKeytabSourceSnafu {
            local_key: KEY_AM_KEYTAB_LOCAL_PATH,
            remote_key: KEY_AM_LOGIN_KEYTAB_NAME,
        })?;
        tracing::info!(
            keytab_name,
            principal,
            "No host keytab file path specified. Downloading keytab from the shared filesystem"
        );
        self.fetcher.fetch(
            fs,
            am.get(KEY_HDFS_KEYTAB_DIR),
            keytab_name,
            &self.cluster_name,
        )
    }
}

/// Rejects names that would place the staged keytab outside its staging directory.
pub(crate) fn ensure_plain_file_name(keytab_name: &str) -> Result<()> {
    let path = Path::new(keytab_name);
    ensure!(
        path.file_name().and_then(|name| name.to_str()) == Some(keytab_name),
        super::InvalidKeytabNameSnafu {
            keytab_name,
            key: KEY_AM_LOGIN_KEYTAB_NAME,
        }
    );
    Ok(())
}

/// Rejects keytab directories that would resolve outside the shared home directory.
pub(crate) fn ensure_contained_keytab_dir(keytab_dir: &str) -> Result<()> {
    ensure!(
        !Path::new(keytab_dir)
            .components()
            .any(|component| matches!(component, Component::ParentDir)),
        super::InvalidKeytabDirectorySnafu {
            keytab_dir,
            key: KEY_HDFS_KEYTAB_DIR,
        }
    );
    Ok(())
}
