//! Staging of keytabs from the shared filesystem onto local storage.
//!
//! Every download ends up in its own, freshly created directory below the staging root:
//!
//! ```text
//! <staging root>/keytab-<unix millis>-<uuid>/      0700
//! <staging root>/keytab-<unix millis>-<uuid>/<name> 0400
//! ```
//!
//! Staging directories are never reused and never cleaned up here, that is left to the host.

use std::{
    env,
    fs::{self, DirBuilder, Permissions},
    os::unix::fs::{DirBuilderExt, PermissionsExt},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use snafu::ResultExt;
use uuid::Uuid;

use crate::{
    filesystem::SharedFileSystem,
    security::{
        keytab::{ensure_contained_keytab_dir, ensure_plain_file_name},
        CopyKeytabSnafu, CreateStagingDirectorySnafu, Result, SetPermissionsSnafu,
    },
};

/// Owner may do anything, group and other nothing.
pub const STAGING_DIRECTORY_MODE: u32 = 0o700;
/// Owner may read, nobody may write or execute.
pub const STAGED_KEYTAB_MODE: u32 = 0o400;

const STAGING_DIRECTORY_PREFIX: &str = "keytab";

#[derive(Clone, Debug)]
pub struct SecureKeytabFetcher {
    staging_root: PathBuf,
}

impl Default for SecureKeytabFetcher {
    fn default() -> Self {
        Self::new(env::temp_dir())
    }
}

impl SecureKeytabFetcher {
    pub fn new(staging_root: impl Into<PathBuf>) -> Self {
        Self {
            staging_root: staging_root.into(),
        }
    }

    /// Downloads `keytab_name` of `cluster_name` and returns the path of the local copy.
    ///
    /// Each step has to finish before the next one starts. The keytab only becomes read-only
    /// after the copy, as writing it needs write access.
    pub fn fetch(
        &self,
        fs: &dyn SharedFileSystem,
        keytab_dir: Option<&str>,
        keytab_name: &str,
        cluster_name: &str,
    ) -> Result<PathBuf> {
        ensure_plain_file_name(keytab_name)?;
        if let Some(keytab_dir) = keytab_dir {
            ensure_contained_keytab_dir(keytab_dir)?;
        }

        let staging_directory = self.create_staging_directory()?;

        let remote_keytab = fs.build_keytab_path(keytab_dir, keytab_name, cluster_name);
        let local_keytab = staging_directory.join(keytab_name);
        fs.copy_to_local(&remote_keytab, &local_keytab)
            .with_context(|_| CopyKeytabSnafu {
                remote: remote_keytab.clone(),
                local: local_keytab.clone(),
            })?;

        set_mode(&local_keytab, STAGED_KEYTAB_MODE)?;

        tracing::info!(
            remote_keytab = %remote_keytab,
            local_keytab = %local_keytab.display(),
            cluster_name,
            "Staged keytab from the shared filesystem"
        );
        Ok(local_keytab)
    }

    fn create_staging_directory(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.staging_root).context(CreateStagingDirectorySnafu {
            path: &self.staging_root,
        })?;

        self.create_staging_directory_named(&staging_directory_name())
    }

    /// Non-recursive, an existing directory is an error rather than something to reuse.
    fn create_staging_directory_named(&self, name: &str) -> Result<PathBuf> {
        let staging_directory = self.staging_root.join(name);
        DirBuilder::new()
            .mode(STAGING_DIRECTORY_MODE)
            .create(&staging_directory)
            .context(CreateStagingDirectorySnafu {
                path: &staging_directory,
            })?;
        // DirBuilder::mode is subject to the umask
        set_mode(&staging_directory, STAGING_DIRECTORY_MODE)?;

        tracing::debug!(
            staging_directory = %staging_directory.display(),
            "created keytab staging directory"
        );
        Ok(staging_directory)
    }
}

fn staging_directory_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!(
        "{STAGING_DIRECTORY_PREFIX}-{millis}-{uuid}",
        uuid = Uuid::new_v4().simple()
    )
}

fn set_mode(path: &Path, mode: u32) -> Result<()> {
    fs::set_permissions(path, Permissions::from_mode(mode))
        .context(SetPermissionsSnafu { path, mode })
}
