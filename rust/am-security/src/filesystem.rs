//! Access to the shared cluster filesystem keytabs are published on.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

/// Cluster data lives below `<home>/.slider/cluster/<cluster name>`.
pub const CLUSTER_DIRECTORY: &str = ".slider/cluster";
pub const KEYTAB_DIRECTORY: &str = "keytabs";

/// Mode of a freshly copied local file, before the caller tightens it any further.
pub const LOCAL_COPY_MODE: u32 = 0o600;

/// Location of a file on the shared filesystem.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemotePath(PathBuf);

impl RemotePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

pub trait SharedFileSystem: fmt::Debug {
    /// Where the keytab `keytab_name` of `cluster_name` is stored.
    ///
    /// `keytab_dir` is relative to the home directory and replaces the per-cluster default.
    /// Callers reject directories with `..` components before asking, this only joins paths.
    fn build_keytab_path(
        &self,
        keytab_dir: Option<&str>,
        keytab_name: &str,
        cluster_name: &str,
    ) -> RemotePath;

    /// Copies `source` to the local `destination`, which must not exist yet.
    /// The source is never deleted.
    fn copy_to_local(&self, source: &RemotePath, destination: &Path) -> io::Result<()>;
}

/// A shared filesystem that is reachable through a local mount point (NFS, FUSE, ...).
#[derive(Clone, Debug)]
pub struct MountedSharedFileSystem {
    root: PathBuf,
    home: PathBuf,
}

impl MountedSharedFileSystem {
    /// `user` owns the home directory `/user/<user>` below `root`.
    pub fn new(root: impl Into<PathBuf>, user: &str) -> Self {
        Self {
            root: root.into(),
            home: Path::new("user").join(user),
        }
    }

    pub fn home_directory(&self) -> PathBuf {
        self.root.join(&self.home)
    }

    fn cluster_directory(&self, cluster_name: &str) -> PathBuf {
        self.home_directory()
            .join(CLUSTER_DIRECTORY)
            .join(cluster_name)
    }
}

impl SharedFileSystem for MountedSharedFileSystem {
    fn build_keytab_path(
        &self,
        keytab_dir: Option<&str>,
        keytab_name: &str,
        cluster_name: &str,
    ) -> RemotePath {
        let base = match keytab_dir {
            // Absolute directories are still resolved within the mount
            Some(keytab_dir) if keytab_dir.starts_with('/') => {
                self.root.join(keytab_dir.trim_start_matches('/'))
            }
            Some(keytab_dir) => self.home_directory().join(keytab_dir),
            None => self.cluster_directory(cluster_name).join(KEYTAB_DIRECTORY),
        };
        RemotePath::new(base.join(keytab_name))
    }

    fn copy_to_local(&self, source: &RemotePath, destination: &Path) -> io::Result<()> {
        let mut reader = File::open(source.as_path())?;
        let mut writer = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(LOCAL_COPY_MODE)
            .open(destination)?;
        let copied = io::copy(&mut reader, &mut writer)?;
        writer.sync_all()?;
        tracing::debug!(
            source = %source,
            destination = %destination.display(),
            bytes = copied,
            "copied file from shared filesystem"
        );
        Ok(())
    }
}
