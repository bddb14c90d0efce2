//! The ambient login identity of the running process.

use std::{env, fmt, io};

/// Overrides the OS user as the login identity, the same way Hadoop clients do.
pub const HADOOP_USER_NAME_ENV: &str = "HADOOP_USER_NAME";

/// A user name, which may be a Kerberos principal such as `am/host@REALM`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    user_name: String,
}

impl Identity {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
        }
    }

    /// The user name without any instance (`/host`) or realm (`@REALM`) part.
    pub fn short_name(&self) -> &str {
        self.user_name
            .split(|c: char| c == '/' || c == '@')
            .next()
            .unwrap_or_default()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_name)
    }
}

/// Source of the login identity.
///
/// `Ok(None)` means the lookup itself worked but there is no identity to use, which is a
/// configuration problem rather than an environmental one.
pub trait IdentityProvider: fmt::Debug {
    fn login_identity(&self) -> io::Result<Option<Identity>>;
}

/// Uses `HADOOP_USER_NAME` if set, the user owning the process otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessIdentityProvider;

impl IdentityProvider for ProcessIdentityProvider {
    fn login_identity(&self) -> io::Result<Option<Identity>> {
        if let Some(user_name) = env::var(HADOOP_USER_NAME_ENV)
            .ok()
            .filter(|user_name| !user_name.is_empty())
        {
            tracing::debug!(
                user_name = %user_name,
                "using login identity from {HADOOP_USER_NAME_ENV}"
            );
            return Ok(Some(Identity::new(user_name)));
        }

        let user_name = whoami::fallible::username()?;
        Ok(Some(user_name)
            .filter(|user_name| !user_name.is_empty())
            .map(Identity::new))
    }
}

/// A fixed lookup result, for callers that already know who they are running as.
#[derive(Debug)]
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
}

impl StaticIdentityProvider {
    pub fn new(identity: Option<Identity>) -> Self {
        Self { identity }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn login_identity(&self) -> io::Result<Option<Identity>> {
        Ok(self.identity.clone())
    }
}
